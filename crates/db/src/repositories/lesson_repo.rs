//! Repository for the `lessons` table.

use sqlx::PgPool;
use coursegate_core::types::DbId;

use crate::models::course::{CreateLesson, Lesson};

const COLUMNS: &str = "l.id, l.module_id, l.title, l.order_index, l.unlock_offset, \
     l.duration_secs, l.created_at, l.updated_at";

pub struct LessonRepo;

impl LessonRepo {
    /// Insert a new lesson, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateLesson) -> Result<Lesson, sqlx::Error> {
        let query = format!(
            "INSERT INTO lessons AS l (module_id, title, order_index, unlock_offset, duration_secs)
             VALUES ($1, $2, $3, COALESCE($4, 0), $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Lesson>(&query)
            .bind(input.module_id)
            .bind(&input.title)
            .bind(input.order_index)
            .bind(input.unlock_offset)
            .bind(input.duration_secs)
            .fetch_one(pool)
            .await
    }

    /// Every lesson of a course, ordered by module order then lesson order.
    pub async fn list_by_course(
        pool: &PgPool,
        course_id: DbId,
    ) -> Result<Vec<Lesson>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM lessons l
             JOIN course_modules m ON m.id = l.module_id
             WHERE m.course_id = $1
             ORDER BY m.order_index ASC, l.order_index ASC, l.id ASC"
        );
        sqlx::query_as::<_, Lesson>(&query)
            .bind(course_id)
            .fetch_all(pool)
            .await
    }

    /// Course that owns a lesson. `None` if the lesson does not exist.
    pub async fn find_course_id(
        pool: &PgPool,
        lesson_id: DbId,
    ) -> Result<Option<DbId>, sqlx::Error> {
        sqlx::query_scalar::<_, DbId>(
            "SELECT m.course_id FROM lessons l
             JOIN course_modules m ON m.id = l.module_id
             WHERE l.id = $1",
        )
        .bind(lesson_id)
        .fetch_optional(pool)
        .await
    }
}
