//! Handlers for a learner's enrollments.
//!
//! The learner is always the authenticated user; a learner can never read or
//! change another learner's enrollment through these routes.

use axum::extract::{Path, State};
use axum::Json;
use chrono::{Duration, NaiveDate, Utc};
use coursegate_core::enrollment::{EnrollRequest, EnrollmentManager, EnrollmentView};
use coursegate_core::error::CoreError;
use coursegate_core::store::EnrollmentRecord;
use coursegate_core::types::DbId;
use coursegate_core::weekday::DayOfWeek;
use serde::Deserialize;
use validator::Validate;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::{created, Created, DataResponse};
use crate::state::AppState;

/// Body of `POST /courses/{course_id}/enrollment`. Every field is optional.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct EnrollInput {
    /// Defaults to Monday/Wednesday/Friday when absent or empty.
    #[validate(length(max = 7))]
    pub preferred_days: Option<Vec<DayOfWeek>>,
    /// Defaults to today (UTC). Only admins may pick a past date; nobody may
    /// go further ahead than `MAX_START_AHEAD_DAYS`.
    pub start_date: Option<NaiveDate>,
}

/// Body of `PUT /courses/{course_id}/enrollment/preferences`.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePreferencesInput {
    /// An empty list switches the remaining lessons to a weekly cadence.
    #[validate(length(max = 7))]
    pub preferred_days: Vec<DayOfWeek>,
}

/// GET /api/v1/enrollments
pub async fn list_mine(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<DataResponse<Vec<EnrollmentView>>>> {
    let store = state.store();
    let views = EnrollmentManager::new(&store)
        .get_user_enrollments(auth.user_id, Utc::now())
        .await?;
    tracing::debug!(user_id = auth.user_id, count = views.len(), "Listed enrollments");
    Ok(Json(DataResponse { data: views }))
}

/// POST /api/v1/courses/{course_id}/enrollment
pub async fn enroll(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(course_id): Path<DbId>,
    input: Option<Json<EnrollInput>>,
) -> AppResult<Created<EnrollmentRecord>> {
    let Json(input) = input.unwrap_or_default();
    input.validate()?;
    let now = Utc::now();
    if let Some(start) = input.start_date {
        check_start_date(
            start,
            now.date_naive(),
            auth.is_admin(),
            state.config.max_start_ahead_days,
        )?;
    }

    let store = state.store();
    let enrollment = EnrollmentManager::new(&store)
        .enroll(
            EnrollRequest {
                user_id: auth.user_id,
                course_id,
                preferred_days: input.preferred_days,
                start_date: input.start_date,
            },
            now,
        )
        .await?;

    tracing::info!(
        user_id = auth.user_id,
        course_id,
        enrollment_id = enrollment.id,
        start_date = %enrollment.start_date,
        "Learner enrolled"
    );
    Ok(created(enrollment))
}

/// GET /api/v1/courses/{course_id}/enrollment
pub async fn get_mine(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(course_id): Path<DbId>,
) -> AppResult<Json<DataResponse<EnrollmentView>>> {
    let store = state.store();
    let view = EnrollmentManager::new(&store)
        .get_enrollment(auth.user_id, course_id, Utc::now())
        .await?;
    Ok(Json(DataResponse { data: view }))
}

/// PUT /api/v1/courses/{course_id}/enrollment/preferences
pub async fn update_preferences(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(course_id): Path<DbId>,
    Json(input): Json<UpdatePreferencesInput>,
) -> AppResult<Json<DataResponse<EnrollmentRecord>>> {
    input.validate()?;

    let store = state.store();
    let enrollment = EnrollmentManager::new(&store)
        .update_preferences(auth.user_id, course_id, &input.preferred_days, Utc::now())
        .await?;

    tracing::info!(
        user_id = auth.user_id,
        course_id,
        days = ?enrollment.preferred_days,
        "Preferred days updated"
    );
    Ok(Json(DataResponse { data: enrollment }))
}

/// A backdated start opens every lesson dated before today at once, so it is
/// reserved for admins.
fn check_start_date(
    start: NaiveDate,
    today: NaiveDate,
    may_backdate: bool,
    max_ahead_days: i64,
) -> Result<(), CoreError> {
    if start < today && !may_backdate {
        return Err(CoreError::Validation(format!(
            "start_date {start} is in the past"
        )));
    }
    if start > today + Duration::days(max_ahead_days) {
        return Err(CoreError::Validation(format!(
            "start_date {start} is more than {max_ahead_days} days ahead"
        )));
    }
    Ok(())
}
