//! PostgreSQL implementation of the domain storage traits.

use sqlx::PgPool;
use coursegate_core::error::CoreError;
use coursegate_core::schedule::{ScheduledUnlock, UnlockPlan};
use coursegate_core::store::{
    AccessStore, CourseOutline, CourseRecord, EnrollmentRecord, EnrollmentStore, LessonOutline,
    ModuleOutline, NewEnrollment, ProgressRecord, StoreResult,
};
use coursegate_core::tier::Tier;
use coursegate_core::types::{DbId, Timestamp};
use coursegate_core::weekday::DayOfWeek;

use crate::models::course::{Course, Lesson};
use crate::models::enrollment::{CreateEnrollment, Enrollment, LessonUnlock, UpsertLessonUnlock};
use crate::models::progress::LessonProgress;
use crate::repositories::{
    CourseRepo, EnrollmentRepo, LessonRepo, LessonUnlockRepo, ProgressRepo, TierPurchaseRepo,
};

/// Storage backed by a connection pool. Cheap to clone.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl AccessStore for PgStore {
    async fn find_course(&self, course_id: DbId) -> StoreResult<Option<CourseRecord>> {
        CourseRepo::find_by_id(&self.pool, course_id)
            .await
            .map_err(map_db_error)?
            .map(course_record)
            .transpose()
    }

    async fn find_enrollment(
        &self,
        user_id: DbId,
        course_id: DbId,
    ) -> StoreResult<Option<EnrollmentRecord>> {
        EnrollmentRepo::find_by_user_and_course(&self.pool, user_id, course_id)
            .await
            .map_err(map_db_error)?
            .map(enrollment_record)
            .transpose()
    }

    async fn list_tier_purchases(&self, user_id: DbId) -> StoreResult<Vec<Tier>> {
        TierPurchaseRepo::list_by_user(&self.pool, user_id)
            .await
            .map_err(map_db_error)?
            .into_iter()
            .map(|p| tier_from_id(p.tier_id))
            .collect()
    }

    async fn find_lesson_unlock(
        &self,
        enrollment_id: DbId,
        lesson_id: DbId,
    ) -> StoreResult<Option<ScheduledUnlock>> {
        let row = LessonUnlockRepo::find(&self.pool, enrollment_id, lesson_id)
            .await
            .map_err(map_db_error)?;
        Ok(row.map(scheduled_unlock))
    }

    async fn list_lesson_unlocks(&self, enrollment_id: DbId) -> StoreResult<Vec<ScheduledUnlock>> {
        let rows = LessonUnlockRepo::list_by_enrollment(&self.pool, enrollment_id)
            .await
            .map_err(map_db_error)?;
        Ok(rows.into_iter().map(scheduled_unlock).collect())
    }

    async fn count_enrollments(&self, course_id: DbId) -> StoreResult<i64> {
        EnrollmentRepo::count_by_course(&self.pool, course_id)
            .await
            .map_err(map_db_error)
    }
}

impl EnrollmentStore for PgStore {
    async fn find_course_outline(&self, course_id: DbId) -> StoreResult<Option<CourseOutline>> {
        let Some(course) = CourseRepo::find_by_id(&self.pool, course_id)
            .await
            .map_err(map_db_error)?
        else {
            return Ok(None);
        };
        let modules = CourseRepo::list_modules(&self.pool, course_id)
            .await
            .map_err(map_db_error)?;
        let lessons = LessonRepo::list_by_course(&self.pool, course_id)
            .await
            .map_err(map_db_error)?;

        let modules = modules
            .into_iter()
            .map(|module| ModuleOutline {
                lessons: lessons
                    .iter()
                    .filter(|l| l.module_id == module.id)
                    .map(lesson_outline)
                    .collect(),
                id: module.id,
                title: module.title,
                order_index: module.order_index,
            })
            .collect();

        Ok(Some(CourseOutline {
            course: course_record(course)?,
            modules,
        }))
    }

    async fn find_lesson_course(&self, lesson_id: DbId) -> StoreResult<Option<DbId>> {
        LessonRepo::find_course_id(&self.pool, lesson_id)
            .await
            .map_err(map_db_error)
    }

    async fn list_user_enrollments(&self, user_id: DbId) -> StoreResult<Vec<EnrollmentRecord>> {
        EnrollmentRepo::list_by_user(&self.pool, user_id)
            .await
            .map_err(map_db_error)?
            .into_iter()
            .map(enrollment_record)
            .collect()
    }

    async fn count_completed_lessons(&self, user_id: DbId, course_id: DbId) -> StoreResult<i64> {
        ProgressRepo::count_completed_in_course(&self.pool, user_id, course_id)
            .await
            .map_err(map_db_error)
    }

    async fn create_enrollment(
        &self,
        input: &NewEnrollment,
        unlocks: &[ScheduledUnlock],
    ) -> StoreResult<EnrollmentRecord> {
        let create = CreateEnrollment {
            user_id: input.user_id,
            course_id: input.course_id,
            preferred_days: day_numbers(&input.preferred_days),
            start_date: input.start_date,
            unlock_plan_id: input.unlock_plan.id(),
        };
        let row = EnrollmentRepo::create_with_unlocks(&self.pool, &create, &upsert_entries(unlocks))
            .await
            .map_err(map_db_error)?
            .ok_or_else(|| {
                coursegate_core::enrollment::already_enrolled(input.user_id, input.course_id)
            })?;
        tracing::debug!(
            enrollment_id = row.id,
            lessons = unlocks.len(),
            "Stored enrollment calendar"
        );
        enrollment_record(row)
    }

    async fn reschedule_enrollment(
        &self,
        enrollment_id: DbId,
        preferred_days: &[DayOfWeek],
        unlocks: &[ScheduledUnlock],
    ) -> StoreResult<EnrollmentRecord> {
        let row = EnrollmentRepo::reschedule(
            &self.pool,
            enrollment_id,
            &day_numbers(preferred_days),
            &upsert_entries(unlocks),
        )
        .await
        .map_err(map_db_error)?
        .ok_or(CoreError::NotFound {
            entity: "Enrollment",
            id: enrollment_id,
        })?;
        tracing::debug!(
            enrollment_id,
            lessons = unlocks.len(),
            "Merged recalculated calendar"
        );
        enrollment_record(row)
    }

    async fn set_admin_override(
        &self,
        enrollment_id: DbId,
        enabled: bool,
    ) -> StoreResult<EnrollmentRecord> {
        let row = EnrollmentRepo::set_admin_override(&self.pool, enrollment_id, enabled)
            .await
            .map_err(map_db_error)?
            .ok_or(CoreError::NotFound {
                entity: "Enrollment",
                id: enrollment_id,
            })?;
        enrollment_record(row)
    }

    async fn mark_lesson_completed(
        &self,
        user_id: DbId,
        lesson_id: DbId,
        completed_at: Timestamp,
    ) -> StoreResult<ProgressRecord> {
        let row = ProgressRepo::mark_completed(&self.pool, user_id, lesson_id, completed_at)
            .await
            .map_err(map_db_error)?;
        Ok(progress_record(row))
    }

    async fn record_watch_position(
        &self,
        user_id: DbId,
        lesson_id: DbId,
        position_secs: i32,
    ) -> StoreResult<ProgressRecord> {
        let row = ProgressRepo::record_watch_position(&self.pool, user_id, lesson_id, position_secs)
            .await
            .map_err(map_db_error)?;
        Ok(progress_record(row))
    }
}

// ---------------------------------------------------------------------------
// Row conversion
// ---------------------------------------------------------------------------

/// Translate a driver error into the domain error space.
///
/// Unique violations on `uq_` constraints become conflicts and foreign key
/// violations become validation errors; everything else is internal.
pub fn map_db_error(err: sqlx::Error) -> CoreError {
    if let sqlx::Error::Database(db_err) = &err {
        match db_err.code().as_deref() {
            Some("23505") => {
                let constraint = db_err.constraint().unwrap_or("unknown");
                if constraint.starts_with("uq_") {
                    return CoreError::Conflict(format!(
                        "Duplicate value violates unique constraint: {constraint}"
                    ));
                }
            }
            Some("23503") => {
                let constraint = db_err.constraint().unwrap_or("unknown");
                return CoreError::Validation(format!(
                    "Referenced row does not exist: {constraint}"
                ));
            }
            _ => {}
        }
    }
    tracing::error!(error = %err, "Database error");
    CoreError::Internal("An internal error occurred".to_string())
}

fn tier_from_id(id: i16) -> StoreResult<Tier> {
    Tier::from_level(id).ok_or_else(|| CoreError::Internal(format!("Unknown tier id {id}")))
}

fn course_record(row: Course) -> StoreResult<CourseRecord> {
    Ok(CourseRecord {
        id: row.id,
        title: row.title,
        tier: tier_from_id(row.tier_id)?,
        min_duration_weeks: row.min_duration_weeks,
        max_lessons_per_week: row.max_lessons_per_week,
        allow_day_choice: row.allow_day_choice,
        is_capped: row.is_capped,
        max_enrollments: row.max_enrollments,
    })
}

fn lesson_outline(row: &Lesson) -> LessonOutline {
    LessonOutline {
        id: row.id,
        title: row.title.clone(),
        order_index: row.order_index,
        duration_secs: row.duration_secs,
    }
}

fn enrollment_record(row: Enrollment) -> StoreResult<EnrollmentRecord> {
    let preferred_days = row
        .preferred_days
        .iter()
        .map(|&n| {
            DayOfWeek::from_number(n)
                .ok_or_else(|| CoreError::Internal(format!("Invalid day number {n}")))
        })
        .collect::<StoreResult<Vec<_>>>()?;
    let unlock_plan = UnlockPlan::from_id(row.unlock_plan_id).ok_or_else(|| {
        CoreError::Internal(format!("Unknown unlock plan id {}", row.unlock_plan_id))
    })?;
    Ok(EnrollmentRecord {
        id: row.id,
        user_id: row.user_id,
        course_id: row.course_id,
        preferred_days,
        start_date: row.start_date,
        unlock_plan,
        admin_override: row.admin_override,
        created_at: row.created_at,
    })
}

fn scheduled_unlock(row: LessonUnlock) -> ScheduledUnlock {
    ScheduledUnlock {
        lesson_id: row.lesson_id,
        unlock_at: row.unlock_at,
        is_unlocked: row.is_unlocked,
    }
}

fn progress_record(row: LessonProgress) -> ProgressRecord {
    ProgressRecord {
        user_id: row.user_id,
        lesson_id: row.lesson_id,
        completed: row.completed,
        completed_at: row.completed_at,
        watch_position_secs: row.watch_position_secs,
    }
}

fn day_numbers(days: &[DayOfWeek]) -> Vec<i16> {
    days.iter().map(|d| d.number()).collect()
}

fn upsert_entries(unlocks: &[ScheduledUnlock]) -> Vec<UpsertLessonUnlock> {
    unlocks
        .iter()
        .map(|u| UpsertLessonUnlock {
            lesson_id: u.lesson_id,
            unlock_at: u.unlock_at,
            is_unlocked: u.is_unlocked,
        })
        .collect()
}
