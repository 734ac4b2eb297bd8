//! Read-only access decisions for the authenticated learner.

use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use coursegate_core::access::{
    AccessCheck, AccessEvaluator, AccessibleLessons, EnrollmentEligibility,
};
use coursegate_core::error::CoreError;
use coursegate_core::store::EnrollmentStore;
use coursegate_core::types::DbId;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/courses/{course_id}/access
pub async fn check_course(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(course_id): Path<DbId>,
) -> AppResult<Json<DataResponse<AccessCheck>>> {
    let store = state.store();
    let check = AccessEvaluator::new(&store)
        .check_access(auth.user_id, course_id, None, Utc::now())
        .await?;
    log_decision(auth.user_id, course_id, None, &check);
    Ok(Json(DataResponse { data: check }))
}

/// GET /api/v1/courses/{course_id}/lessons/{lesson_id}/access
///
/// 404 if the lesson does not belong to the course.
pub async fn check_lesson(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((course_id, lesson_id)): Path<(DbId, DbId)>,
) -> AppResult<Json<DataResponse<AccessCheck>>> {
    let store = state.store();
    if store.find_lesson_course(lesson_id).await? != Some(course_id) {
        return Err(CoreError::NotFound {
            entity: "Lesson",
            id: lesson_id,
        }
        .into());
    }
    let check = AccessEvaluator::new(&store)
        .check_access(auth.user_id, course_id, Some(lesson_id), Utc::now())
        .await?;
    log_decision(auth.user_id, course_id, Some(lesson_id), &check);
    Ok(Json(DataResponse { data: check }))
}

/// GET /api/v1/courses/{course_id}/eligibility
pub async fn eligibility(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(course_id): Path<DbId>,
) -> AppResult<Json<DataResponse<EnrollmentEligibility>>> {
    let store = state.store();
    let result = AccessEvaluator::new(&store)
        .can_enroll_in_course(auth.user_id, course_id)
        .await?;
    Ok(Json(DataResponse { data: result }))
}

/// GET /api/v1/courses/{course_id}/lessons/accessible
pub async fn accessible_lessons(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(course_id): Path<DbId>,
) -> AppResult<Json<DataResponse<AccessibleLessons>>> {
    let store = state.store();
    let lessons = AccessEvaluator::new(&store)
        .get_accessible_lessons(auth.user_id, course_id, Utc::now())
        .await?;
    Ok(Json(DataResponse { data: lessons }))
}

fn log_decision(user_id: DbId, course_id: DbId, lesson_id: Option<DbId>, check: &AccessCheck) {
    if check.has_access {
        tracing::debug!(
            user_id,
            course_id,
            ?lesson_id,
            access_type = ?check.access_type,
            "Access granted"
        );
    } else {
        tracing::warn!(
            user_id,
            course_id,
            ?lesson_id,
            reason = ?check.reason,
            "Access denied"
        );
    }
}
