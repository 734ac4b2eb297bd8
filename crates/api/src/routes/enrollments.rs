use axum::routing::get;
use axum::Router;

use crate::handlers::enrollment;
use crate::state::AppState;

/// Routes mounted at `/enrollments`.
///
/// ```text
/// GET    /        -> list_mine
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(enrollment::list_mine))
}
