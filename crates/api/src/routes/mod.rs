pub mod admin;
pub mod courses;
pub mod enrollments;
pub mod health;
pub mod lessons;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Every route requires a Bearer token; the learner is the token subject.
///
/// ```text
/// /enrollments                                           my enrollments
///
/// /courses/{course_id}/enrollment                        enroll (POST), view (GET)
/// /courses/{course_id}/enrollment/preferences            change preferred days (PUT)
/// /courses/{course_id}/access                            course access decision
/// /courses/{course_id}/eligibility                       may I enroll?
/// /courses/{course_id}/lessons/accessible                open and upcoming lessons
/// /courses/{course_id}/lessons/{lesson_id}/access        lesson access decision
///
/// /lessons/{lesson_id}/complete                          mark complete (POST)
/// /lessons/{lesson_id}/progress                          watch position (PUT)
///
/// /admin/users/{user_id}/courses/{course_id}/override    toggle override (PUT, admin)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/enrollments", enrollments::router())
        .nest("/courses", courses::router())
        .nest("/lessons", lessons::router())
        .nest("/admin", admin::router())
}
