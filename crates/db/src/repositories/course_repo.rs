//! Repository for the `courses` and `course_modules` tables.

use sqlx::PgPool;
use coursegate_core::types::DbId;

use crate::models::course::{Course, CourseModule, CreateCourse, CreateCourseModule};

const COLUMNS: &str = "id, title, description, tier_id, min_duration_weeks, \
     max_lessons_per_week, allow_day_choice, is_capped, max_enrollments, \
     created_at, updated_at";

const MODULE_COLUMNS: &str = "id, course_id, title, order_index, created_at, updated_at";

/// Read access to the course catalog plus inserts used for seeding.
pub struct CourseRepo;

impl CourseRepo {
    /// Insert a new course, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateCourse) -> Result<Course, sqlx::Error> {
        let query = format!(
            "INSERT INTO courses (title, description, tier_id, min_duration_weeks,
                                  max_lessons_per_week, allow_day_choice, is_capped,
                                  max_enrollments)
             VALUES ($1, $2, $3, COALESCE($4, 0), $5, COALESCE($6, TRUE),
                     COALESCE($7, FALSE), $8)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Course>(&query)
            .bind(&input.title)
            .bind(&input.description)
            .bind(input.tier_id)
            .bind(input.min_duration_weeks)
            .bind(input.max_lessons_per_week)
            .bind(input.allow_day_choice)
            .bind(input.is_capped)
            .bind(input.max_enrollments)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Course>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM courses WHERE id = $1");
        sqlx::query_as::<_, Course>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn create_module(
        pool: &PgPool,
        input: &CreateCourseModule,
    ) -> Result<CourseModule, sqlx::Error> {
        let query = format!(
            "INSERT INTO course_modules (course_id, title, order_index)
             VALUES ($1, $2, $3)
             RETURNING {MODULE_COLUMNS}"
        );
        sqlx::query_as::<_, CourseModule>(&query)
            .bind(input.course_id)
            .bind(&input.title)
            .bind(input.order_index)
            .fetch_one(pool)
            .await
    }

    /// List a course's modules ordered by `order_index`.
    pub async fn list_modules(
        pool: &PgPool,
        course_id: DbId,
    ) -> Result<Vec<CourseModule>, sqlx::Error> {
        let query = format!(
            "SELECT {MODULE_COLUMNS} FROM course_modules
             WHERE course_id = $1
             ORDER BY order_index ASC, id ASC"
        );
        sqlx::query_as::<_, CourseModule>(&query)
            .bind(course_id)
            .fetch_all(pool)
            .await
    }
}
