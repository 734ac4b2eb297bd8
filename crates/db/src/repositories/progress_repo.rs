//! Repository for the `lesson_progress` table.

use sqlx::PgPool;
use coursegate_core::types::{DbId, Timestamp};

use crate::models::progress::LessonProgress;

const COLUMNS: &str = "id, user_id, lesson_id, completed, completed_at, watch_position_secs, \
     created_at, updated_at";

pub struct ProgressRepo;

impl ProgressRepo {
    pub async fn find(
        pool: &PgPool,
        user_id: DbId,
        lesson_id: DbId,
    ) -> Result<Option<LessonProgress>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM lesson_progress WHERE user_id = $1 AND lesson_id = $2"
        );
        sqlx::query_as::<_, LessonProgress>(&query)
            .bind(user_id)
            .bind(lesson_id)
            .fetch_optional(pool)
            .await
    }

    /// Upsert the row as completed, stamping `completed_at`.
    pub async fn mark_completed(
        pool: &PgPool,
        user_id: DbId,
        lesson_id: DbId,
        completed_at: Timestamp,
    ) -> Result<LessonProgress, sqlx::Error> {
        let query = format!(
            "INSERT INTO lesson_progress (user_id, lesson_id, completed, completed_at)
             VALUES ($1, $2, TRUE, $3)
             ON CONFLICT ON CONSTRAINT uq_lesson_progress_user_lesson DO UPDATE SET
                completed = TRUE,
                completed_at = EXCLUDED.completed_at
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, LessonProgress>(&query)
            .bind(user_id)
            .bind(lesson_id)
            .bind(completed_at)
            .fetch_one(pool)
            .await
    }

    /// Upsert the watch position, leaving completion untouched.
    pub async fn record_watch_position(
        pool: &PgPool,
        user_id: DbId,
        lesson_id: DbId,
        position_secs: i32,
    ) -> Result<LessonProgress, sqlx::Error> {
        let query = format!(
            "INSERT INTO lesson_progress (user_id, lesson_id, watch_position_secs)
             VALUES ($1, $2, $3)
             ON CONFLICT ON CONSTRAINT uq_lesson_progress_user_lesson DO UPDATE SET
                watch_position_secs = EXCLUDED.watch_position_secs
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, LessonProgress>(&query)
            .bind(user_id)
            .bind(lesson_id)
            .bind(position_secs)
            .fetch_one(pool)
            .await
    }

    /// Number of completed lessons a user has in one course.
    pub async fn count_completed_in_course(
        pool: &PgPool,
        user_id: DbId,
        course_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM lesson_progress p
             JOIN lessons l ON l.id = p.lesson_id
             JOIN course_modules m ON m.id = l.module_id
             WHERE p.user_id = $1 AND m.course_id = $2 AND p.completed",
        )
        .bind(user_id)
        .bind(course_id)
        .fetch_one(pool)
        .await
    }
}
