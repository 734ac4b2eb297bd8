//! Course-scoped enrollment and access routes.

use axum::routing::{get, put};
use axum::Router;

use crate::handlers::{access, enrollment};
use crate::state::AppState;

/// Routes mounted at `/courses`.
///
/// ```text
/// POST   /{course_id}/enrollment                      -> enroll
/// GET    /{course_id}/enrollment                      -> get_mine
/// PUT    /{course_id}/enrollment/preferences          -> update_preferences
/// GET    /{course_id}/access                          -> check_course
/// GET    /{course_id}/eligibility                     -> eligibility
/// GET    /{course_id}/lessons/accessible              -> accessible_lessons
/// GET    /{course_id}/lessons/{lesson_id}/access      -> check_lesson
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/{course_id}/enrollment",
            get(enrollment::get_mine).post(enrollment::enroll),
        )
        .route(
            "/{course_id}/enrollment/preferences",
            put(enrollment::update_preferences),
        )
        .route("/{course_id}/access", get(access::check_course))
        .route("/{course_id}/eligibility", get(access::eligibility))
        .route(
            "/{course_id}/lessons/accessible",
            get(access::accessible_lessons),
        )
        .route(
            "/{course_id}/lessons/{lesson_id}/access",
            get(access::check_lesson),
        )
}
