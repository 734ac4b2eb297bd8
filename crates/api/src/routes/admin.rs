use axum::routing::put;
use axum::Router;

use crate::handlers::admin;
use crate::state::AppState;

/// Routes mounted at `/admin`. Every handler requires the `admin` role.
///
/// ```text
/// PUT    /users/{user_id}/courses/{course_id}/override    -> set_override
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/users/{user_id}/courses/{course_id}/override",
        put(admin::set_override),
    )
}
