//! Admin-only enrollment management.

use axum::extract::{Path, State};
use axum::Json;
use coursegate_core::enrollment::EnrollmentManager;
use coursegate_core::store::EnrollmentRecord;
use coursegate_core::types::DbId;
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct OverrideInput {
    pub enabled: bool,
}

/// PUT /api/v1/admin/users/{user_id}/courses/{course_id}/override
///
/// Grants or revokes unconditional access to one learner's enrollment.
pub async fn set_override(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path((user_id, course_id)): Path<(DbId, DbId)>,
    Json(input): Json<OverrideInput>,
) -> AppResult<Json<DataResponse<EnrollmentRecord>>> {
    let store = state.store();
    let enrollment = EnrollmentManager::new(&store)
        .set_admin_override(user_id, course_id, input.enabled)
        .await?;
    tracing::info!(
        admin_id = admin.user_id,
        user_id,
        course_id,
        enabled = input.enabled,
        "Admin override toggled"
    );
    Ok(Json(DataResponse { data: enrollment }))
}
