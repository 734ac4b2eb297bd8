//! Storage seam between the enrollment domain logic and persistence.
//!
//! The Access Evaluator only needs [`AccessStore`] (reads); the lifecycle
//! manager needs the full [`EnrollmentStore`]. The PostgreSQL implementation
//! lives in the db crate; unit tests use an in-memory one.

use std::future::Future;

use serde::Serialize;

use crate::error::CoreError;
use crate::schedule::{ScheduleLesson, ScheduledUnlock, UnlockPlan};
use crate::tier::Tier;
use crate::types::{Date, DbId, Timestamp};
use crate::weekday::DayOfWeek;

pub type StoreResult<T> = Result<T, CoreError>;

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// Course settings the scheduler and access checks depend on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseRecord {
    pub id: DbId,
    pub title: String,
    pub tier: Tier,
    pub min_duration_weeks: i32,
    /// Authoring guideline only; never enforced by the scheduler.
    pub max_lessons_per_week: Option<i32>,
    pub allow_day_choice: bool,
    pub is_capped: bool,
    pub max_enrollments: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LessonOutline {
    pub id: DbId,
    pub title: String,
    pub order_index: i32,
    pub duration_secs: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleOutline {
    pub id: DbId,
    pub title: String,
    pub order_index: i32,
    pub lessons: Vec<LessonOutline>,
}

/// A course with its modules and lessons, both ordered by `order_index`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseOutline {
    pub course: CourseRecord,
    pub modules: Vec<ModuleOutline>,
}

impl CourseOutline {
    /// Every lesson of the course in scheduler form.
    pub fn schedule_lessons(&self) -> Vec<ScheduleLesson> {
        self.modules
            .iter()
            .flat_map(|module| {
                module.lessons.iter().map(move |lesson| ScheduleLesson {
                    lesson_id: lesson.id,
                    module_order: module.order_index,
                    order_index: lesson.order_index,
                })
            })
            .collect()
    }

    pub fn lesson_count(&self) -> usize {
        self.modules.iter().map(|m| m.lessons.len()).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrollmentRecord {
    pub id: DbId,
    pub user_id: DbId,
    pub course_id: DbId,
    pub preferred_days: Vec<DayOfWeek>,
    pub start_date: Date,
    pub unlock_plan: UnlockPlan,
    pub admin_override: bool,
    pub created_at: Timestamp,
}

/// Input for creating an enrollment together with its unlock calendar.
#[derive(Debug, Clone)]
pub struct NewEnrollment {
    pub user_id: DbId,
    pub course_id: DbId,
    pub preferred_days: Vec<DayOfWeek>,
    pub start_date: Date,
    pub unlock_plan: UnlockPlan,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressRecord {
    pub user_id: DbId,
    pub lesson_id: DbId,
    pub completed: bool,
    pub completed_at: Option<Timestamp>,
    pub watch_position_secs: i32,
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Read access needed to make access decisions.
pub trait AccessStore: Send + Sync {
    fn find_course(
        &self,
        course_id: DbId,
    ) -> impl Future<Output = StoreResult<Option<CourseRecord>>> + Send;

    fn find_enrollment(
        &self,
        user_id: DbId,
        course_id: DbId,
    ) -> impl Future<Output = StoreResult<Option<EnrollmentRecord>>> + Send;

    /// Tiers of every purchase the user holds (duplicates allowed).
    fn list_tier_purchases(
        &self,
        user_id: DbId,
    ) -> impl Future<Output = StoreResult<Vec<Tier>>> + Send;

    fn find_lesson_unlock(
        &self,
        enrollment_id: DbId,
        lesson_id: DbId,
    ) -> impl Future<Output = StoreResult<Option<ScheduledUnlock>>> + Send;

    /// All unlock rows of an enrollment, ordered by date then lesson order.
    fn list_lesson_unlocks(
        &self,
        enrollment_id: DbId,
    ) -> impl Future<Output = StoreResult<Vec<ScheduledUnlock>>> + Send;

    fn count_enrollments(&self, course_id: DbId) -> impl Future<Output = StoreResult<i64>> + Send;
}

/// Full storage contract for the enrollment lifecycle.
pub trait EnrollmentStore: AccessStore {
    fn find_course_outline(
        &self,
        course_id: DbId,
    ) -> impl Future<Output = StoreResult<Option<CourseOutline>>> + Send;

    /// Course that owns the lesson, if the lesson exists.
    fn find_lesson_course(
        &self,
        lesson_id: DbId,
    ) -> impl Future<Output = StoreResult<Option<DbId>>> + Send;

    fn list_user_enrollments(
        &self,
        user_id: DbId,
    ) -> impl Future<Output = StoreResult<Vec<EnrollmentRecord>>> + Send;

    fn count_completed_lessons(
        &self,
        user_id: DbId,
        course_id: DbId,
    ) -> impl Future<Output = StoreResult<i64>> + Send;

    /// Persist the enrollment and every unlock row as one atomic unit.
    ///
    /// Must fail with [`CoreError::Conflict`] if the user is already
    /// enrolled, including when a concurrent call wins the race.
    fn create_enrollment(
        &self,
        input: &NewEnrollment,
        unlocks: &[ScheduledUnlock],
    ) -> impl Future<Output = StoreResult<EnrollmentRecord>> + Send;

    /// Store new preferred days and upsert every unlock row in one
    /// transaction. Rows are never deleted and an unlocked row stays
    /// unlocked with its original date.
    fn reschedule_enrollment(
        &self,
        enrollment_id: DbId,
        preferred_days: &[DayOfWeek],
        unlocks: &[ScheduledUnlock],
    ) -> impl Future<Output = StoreResult<EnrollmentRecord>> + Send;

    fn set_admin_override(
        &self,
        enrollment_id: DbId,
        enabled: bool,
    ) -> impl Future<Output = StoreResult<EnrollmentRecord>> + Send;

    /// Upsert the progress row as completed at `completed_at`.
    fn mark_lesson_completed(
        &self,
        user_id: DbId,
        lesson_id: DbId,
        completed_at: Timestamp,
    ) -> impl Future<Output = StoreResult<ProgressRecord>> + Send;

    /// Upsert the watch position without touching completion.
    fn record_watch_position(
        &self,
        user_id: DbId,
        lesson_id: DbId,
        position_secs: i32,
    ) -> impl Future<Output = StoreResult<ProgressRecord>> + Send;
}
