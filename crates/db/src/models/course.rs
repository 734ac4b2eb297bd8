//! Course catalog models: courses, their modules and lessons.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use coursegate_core::tier::TierId;
use coursegate_core::types::{DbId, Timestamp};

/// A course row from the `courses` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Course {
    pub id: DbId,
    pub title: String,
    pub description: Option<String>,
    pub tier_id: TierId,
    pub min_duration_weeks: i32,
    pub max_lessons_per_week: Option<i32>,
    pub allow_day_choice: bool,
    pub is_capped: bool,
    pub max_enrollments: Option<i32>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new course.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCourse {
    pub title: String,
    pub description: Option<String>,
    pub tier_id: TierId,
    /// Defaults to 0 (no minimum) if omitted.
    pub min_duration_weeks: Option<i32>,
    pub max_lessons_per_week: Option<i32>,
    /// Defaults to `true` if omitted.
    pub allow_day_choice: Option<bool>,
    /// Defaults to `false` if omitted.
    pub is_capped: Option<bool>,
    pub max_enrollments: Option<i32>,
}

/// A row from the `course_modules` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CourseModule {
    pub id: DbId,
    pub course_id: DbId,
    pub title: String,
    pub order_index: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCourseModule {
    pub course_id: DbId,
    pub title: String,
    pub order_index: i32,
}

/// A row from the `lessons` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Lesson {
    pub id: DbId,
    pub module_id: DbId,
    pub title: String,
    pub order_index: i32,
    pub unlock_offset: i32,
    pub duration_secs: Option<i32>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateLesson {
    pub module_id: DbId,
    pub title: String,
    pub order_index: i32,
    pub unlock_offset: Option<i32>,
    pub duration_secs: Option<i32>,
}
