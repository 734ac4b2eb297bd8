//! Repository for the `enrollments` table.
//!
//! Writes that touch the unlock calendar run in one transaction together
//! with their `lesson_unlocks` rows.

use sqlx::PgPool;
use coursegate_core::types::DbId;

use crate::models::enrollment::{CreateEnrollment, Enrollment, UpsertLessonUnlock};
use crate::repositories::LessonUnlockRepo;

const COLUMNS: &str = "id, user_id, course_id, preferred_days, start_date, unlock_plan_id, \
     admin_override, created_at, updated_at";

pub struct EnrollmentRepo;

impl EnrollmentRepo {
    /// Insert an enrollment and its full unlock calendar atomically.
    ///
    /// Returns `None` (and writes nothing) if the user is already enrolled
    /// in the course, including when a concurrent insert won the race.
    pub async fn create_with_unlocks(
        pool: &PgPool,
        input: &CreateEnrollment,
        unlocks: &[UpsertLessonUnlock],
    ) -> Result<Option<Enrollment>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO enrollments (user_id, course_id, preferred_days, start_date, unlock_plan_id)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT ON CONSTRAINT uq_enrollments_user_course DO NOTHING
             RETURNING {COLUMNS}"
        );
        let Some(enrollment) = sqlx::query_as::<_, Enrollment>(&query)
            .bind(input.user_id)
            .bind(input.course_id)
            .bind(&input.preferred_days)
            .bind(input.start_date)
            .bind(input.unlock_plan_id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        LessonUnlockRepo::upsert_many(&mut *tx, enrollment.id, unlocks).await?;

        tx.commit().await?;
        Ok(Some(enrollment))
    }

    pub async fn find_by_user_and_course(
        pool: &PgPool,
        user_id: DbId,
        course_id: DbId,
    ) -> Result<Option<Enrollment>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM enrollments WHERE user_id = $1 AND course_id = $2"
        );
        sqlx::query_as::<_, Enrollment>(&query)
            .bind(user_id)
            .bind(course_id)
            .fetch_optional(pool)
            .await
    }

    /// List a user's enrollments, newest first.
    pub async fn list_by_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<Enrollment>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM enrollments
             WHERE user_id = $1
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, Enrollment>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    pub async fn count_by_course(pool: &PgPool, course_id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM enrollments WHERE course_id = $1")
            .bind(course_id)
            .fetch_one(pool)
            .await
    }

    /// Store new preferred days and merge the recalculated calendar in one
    /// transaction. Returns `None` if the enrollment does not exist.
    pub async fn reschedule(
        pool: &PgPool,
        id: DbId,
        preferred_days: &[i16],
        unlocks: &[UpsertLessonUnlock],
    ) -> Result<Option<Enrollment>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE enrollments SET preferred_days = $2
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let Some(enrollment) = sqlx::query_as::<_, Enrollment>(&query)
            .bind(id)
            .bind(preferred_days)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        LessonUnlockRepo::upsert_many(&mut *tx, id, unlocks).await?;

        tx.commit().await?;
        Ok(Some(enrollment))
    }

    /// Returns `None` if the enrollment does not exist.
    pub async fn set_admin_override(
        pool: &PgPool,
        id: DbId,
        enabled: bool,
    ) -> Result<Option<Enrollment>, sqlx::Error> {
        let query = format!(
            "UPDATE enrollments SET admin_override = $2
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Enrollment>(&query)
            .bind(id)
            .bind(enabled)
            .fetch_optional(pool)
            .await
    }
}
