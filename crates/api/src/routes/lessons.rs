use axum::routing::{post, put};
use axum::Router;

use crate::handlers::progress;
use crate::state::AppState;

/// Routes mounted at `/lessons`.
///
/// ```text
/// POST   /{lesson_id}/complete      -> complete
/// PUT    /{lesson_id}/progress      -> record_position
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{lesson_id}/complete", post(progress::complete))
        .route("/{lesson_id}/progress", put(progress::record_position))
}
