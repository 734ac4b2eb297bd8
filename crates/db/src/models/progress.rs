//! Per-learner lesson progress.

use serde::Serialize;
use sqlx::FromRow;
use coursegate_core::types::{DbId, Timestamp};

/// A row from the `lesson_progress` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LessonProgress {
    pub id: DbId,
    pub user_id: DbId,
    pub lesson_id: DbId,
    pub completed: bool,
    pub completed_at: Option<Timestamp>,
    pub watch_position_secs: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
