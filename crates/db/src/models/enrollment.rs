//! Enrollment and lesson unlock models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use coursegate_core::schedule::UnlockPlanId;
use coursegate_core::types::{DbId, Timestamp};

/// An enrollment row from the `enrollments` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Enrollment {
    pub id: DbId,
    pub user_id: DbId,
    pub course_id: DbId,
    /// Day numbers, 0 = Sunday.
    pub preferred_days: Vec<i16>,
    pub start_date: NaiveDate,
    pub unlock_plan_id: UnlockPlanId,
    pub admin_override: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new enrollment.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateEnrollment {
    pub user_id: DbId,
    pub course_id: DbId,
    pub preferred_days: Vec<i16>,
    pub start_date: NaiveDate,
    pub unlock_plan_id: UnlockPlanId,
}

/// A row from the `lesson_unlocks` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LessonUnlock {
    pub id: DbId,
    pub enrollment_id: DbId,
    pub lesson_id: DbId,
    pub unlock_at: NaiveDate,
    pub is_unlocked: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// One calendar entry to insert or merge into `lesson_unlocks`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct UpsertLessonUnlock {
    pub lesson_id: DbId,
    pub unlock_at: NaiveDate,
    pub is_unlocked: bool,
}
