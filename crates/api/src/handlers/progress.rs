//! Lesson completion and watch position for the authenticated learner.
//!
//! Both writes require the same access the learner would need to open the
//! lesson.

use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use coursegate_core::enrollment::EnrollmentManager;
use coursegate_core::store::ProgressRecord;
use coursegate_core::types::DbId;
use serde::Deserialize;
use validator::Validate;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct WatchPositionInput {
    #[validate(range(min = 0))]
    pub watch_position_secs: i32,
}

/// POST /api/v1/lessons/{lesson_id}/complete
pub async fn complete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(lesson_id): Path<DbId>,
) -> AppResult<Json<DataResponse<ProgressRecord>>> {
    let store = state.store();
    let progress = EnrollmentManager::new(&store)
        .mark_lesson_complete(auth.user_id, lesson_id, Utc::now())
        .await?;
    tracing::info!(user_id = auth.user_id, lesson_id, "Lesson completed");
    Ok(Json(DataResponse { data: progress }))
}

/// PUT /api/v1/lessons/{lesson_id}/progress
pub async fn record_position(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(lesson_id): Path<DbId>,
    Json(input): Json<WatchPositionInput>,
) -> AppResult<Json<DataResponse<ProgressRecord>>> {
    input.validate()?;

    let store = state.store();
    let progress = EnrollmentManager::new(&store)
        .record_watch_position(
            auth.user_id,
            lesson_id,
            input.watch_position_secs,
            Utc::now(),
        )
        .await?;
    tracing::debug!(
        user_id = auth.user_id,
        lesson_id,
        position = input.watch_position_secs,
        "Watch position recorded"
    );
    Ok(Json(DataResponse { data: progress }))
}
