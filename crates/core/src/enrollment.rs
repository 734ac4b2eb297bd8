//! Enrollment lifecycle: enroll, change day preferences, record progress,
//! and compose enrollment views.
//!
//! This is the only component that writes. It builds calendars with the
//! scheduler and gates progress writes with the [`AccessEvaluator`].

use serde::Serialize;

use crate::access::{AccessCheck, AccessEvaluator};
use crate::error::CoreError;
use crate::schedule::{
    generate_unlock_schedule, recalculate_unlock_schedule, ScheduleLesson, ScheduledUnlock,
    UnlockPlan,
};
use crate::store::{
    CourseOutline, EnrollmentRecord, EnrollmentStore, NewEnrollment, ProgressRecord,
};
use crate::types::{Date, DbId, Timestamp};
use crate::weekday::{normalize_days, DayOfWeek, DEFAULT_PREFERRED_DAYS};

/// Upper bound accepted for a stored watch position (24 hours).
pub const MAX_WATCH_POSITION_SECS: i32 = 86_400;

// ---------------------------------------------------------------------------
// Inputs / views
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct EnrollRequest {
    pub user_id: DbId,
    pub course_id: DbId,
    /// Defaults to Monday/Wednesday/Friday when absent or empty.
    pub preferred_days: Option<Vec<DayOfWeek>>,
    /// Defaults to today.
    pub start_date: Option<Date>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CourseProgress {
    pub completed_lessons: i64,
    pub total_lessons: i64,
    /// Rounded to the nearest whole percent.
    pub completion_percent: i64,
}

impl CourseProgress {
    pub fn new(completed_lessons: i64, total_lessons: i64) -> Self {
        let completion_percent = if total_lessons > 0 {
            (completed_lessons * 200 + total_lessons) / (total_lessons * 2)
        } else {
            0
        };
        Self {
            completed_lessons,
            total_lessons,
            completion_percent,
        }
    }
}

/// Stored enrollment joined with its course structure, calendar, a fresh
/// access decision and fresh progress.
#[derive(Debug, Clone, Serialize)]
pub struct EnrollmentView {
    pub enrollment: EnrollmentRecord,
    pub course: CourseOutline,
    pub unlocks: Vec<ScheduledUnlock>,
    pub access_info: AccessCheck,
    pub progress: CourseProgress,
}

// ---------------------------------------------------------------------------
// Manager
// ---------------------------------------------------------------------------

pub struct EnrollmentManager<'a, S> {
    store: &'a S,
}

impl<'a, S: EnrollmentStore> EnrollmentManager<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Enroll a learner and persist the full initial unlock calendar.
    ///
    /// Rejects a missing course (NotFound), an existing enrollment
    /// (Conflict), a course without lessons (InvalidState), and a learner
    /// whose tier or the course capacity does not allow it (AccessDenied).
    pub async fn enroll(
        &self,
        request: EnrollRequest,
        now: Timestamp,
    ) -> Result<EnrollmentRecord, CoreError> {
        let outline = self.require_outline(request.course_id).await?;

        if self
            .store
            .find_enrollment(request.user_id, request.course_id)
            .await?
            .is_some()
        {
            return Err(already_enrolled(request.user_id, request.course_id));
        }

        let lessons = outline.schedule_lessons();
        if lessons.is_empty() {
            return Err(CoreError::InvalidState(format!(
                "Course {} has no lessons",
                request.course_id
            )));
        }

        let eligibility = AccessEvaluator::new(self.store)
            .can_enroll_in_course(request.user_id, request.course_id)
            .await?;
        if !eligibility.can_enroll {
            return Err(CoreError::AccessDenied {
                reason: eligibility
                    .reason
                    .unwrap_or_else(|| "Enrollment not allowed".to_string()),
                required_tier: eligibility.required_tier,
                unlock_at: None,
            });
        }

        let preferred_days = match request.preferred_days.as_deref() {
            Some(days) if !days.is_empty() => normalize_days(days),
            _ => DEFAULT_PREFERRED_DAYS.to_vec(),
        };
        let start_date = request.start_date.unwrap_or_else(|| now.date_naive());
        let course = &outline.course;

        let unlocks = generate_unlock_schedule(
            &lessons,
            &preferred_days,
            start_date,
            course.min_duration_weeks,
            now,
        );

        let input = NewEnrollment {
            user_id: request.user_id,
            course_id: request.course_id,
            preferred_days,
            start_date,
            unlock_plan: UnlockPlan::for_course(course.allow_day_choice),
        };
        self.store.create_enrollment(&input, &unlocks).await
    }

    /// Replace the learner's preferred days and reschedule every lesson not
    /// yet open. Open lessons keep their date and stay unlocked.
    pub async fn update_preferences(
        &self,
        user_id: DbId,
        course_id: DbId,
        preferred_days: &[DayOfWeek],
        now: Timestamp,
    ) -> Result<EnrollmentRecord, CoreError> {
        let enrollment = self.require_enrollment(user_id, course_id).await?;
        if !enrollment.unlock_plan.allows_day_changes() {
            return Err(CoreError::InvalidState(
                "This course does not allow changing unlock days".to_string(),
            ));
        }

        let outline = self.require_outline(course_id).await?;
        let existing = self.store.list_lesson_unlocks(enrollment.id).await?;

        // Only lessons that were part of the calendar at enrollment time.
        let lessons: Vec<ScheduleLesson> = outline
            .schedule_lessons()
            .into_iter()
            .filter(|l| existing.iter().any(|u| u.lesson_id == l.lesson_id))
            .collect();

        let days = normalize_days(preferred_days);
        let unlocks = recalculate_unlock_schedule(
            &existing,
            &lessons,
            &days,
            outline.course.min_duration_weeks,
            now,
        );

        self.store
            .reschedule_enrollment(enrollment.id, &days, &unlocks)
            .await
    }

    /// Mark a lesson complete once the learner is allowed to see it.
    pub async fn mark_lesson_complete(
        &self,
        user_id: DbId,
        lesson_id: DbId,
        now: Timestamp,
    ) -> Result<ProgressRecord, CoreError> {
        self.require_lesson_access(user_id, lesson_id, now).await?;
        self.store
            .mark_lesson_completed(user_id, lesson_id, now)
            .await
    }

    /// Store the playback position for a lesson the learner can access.
    pub async fn record_watch_position(
        &self,
        user_id: DbId,
        lesson_id: DbId,
        position_secs: i32,
        now: Timestamp,
    ) -> Result<ProgressRecord, CoreError> {
        if !(0..=MAX_WATCH_POSITION_SECS).contains(&position_secs) {
            return Err(CoreError::Validation(format!(
                "watch position must be between 0 and {MAX_WATCH_POSITION_SECS} seconds"
            )));
        }
        self.require_lesson_access(user_id, lesson_id, now).await?;
        self.store
            .record_watch_position(user_id, lesson_id, position_secs)
            .await
    }

    pub async fn set_admin_override(
        &self,
        user_id: DbId,
        course_id: DbId,
        enabled: bool,
    ) -> Result<EnrollmentRecord, CoreError> {
        let enrollment = self.require_enrollment(user_id, course_id).await?;
        self.store.set_admin_override(enrollment.id, enabled).await
    }

    pub async fn get_enrollment(
        &self,
        user_id: DbId,
        course_id: DbId,
        now: Timestamp,
    ) -> Result<EnrollmentView, CoreError> {
        let enrollment = self.require_enrollment(user_id, course_id).await?;
        self.compose_view(enrollment, now).await
    }

    pub async fn get_user_enrollments(
        &self,
        user_id: DbId,
        now: Timestamp,
    ) -> Result<Vec<EnrollmentView>, CoreError> {
        let enrollments = self.store.list_user_enrollments(user_id).await?;
        let mut views = Vec::with_capacity(enrollments.len());
        for enrollment in enrollments {
            views.push(self.compose_view(enrollment, now).await?);
        }
        Ok(views)
    }

    // -- helpers --

    async fn compose_view(
        &self,
        enrollment: EnrollmentRecord,
        now: Timestamp,
    ) -> Result<EnrollmentView, CoreError> {
        let course = self.require_outline(enrollment.course_id).await?;
        let unlocks = self.store.list_lesson_unlocks(enrollment.id).await?;
        let access_info = AccessEvaluator::new(self.store)
            .check_access(enrollment.user_id, enrollment.course_id, None, now)
            .await?;
        let completed = self
            .store
            .count_completed_lessons(enrollment.user_id, enrollment.course_id)
            .await?;
        let progress = CourseProgress::new(completed, course.lesson_count() as i64);

        Ok(EnrollmentView {
            enrollment,
            course,
            unlocks,
            access_info,
            progress,
        })
    }

    async fn require_lesson_access(
        &self,
        user_id: DbId,
        lesson_id: DbId,
        now: Timestamp,
    ) -> Result<AccessCheck, CoreError> {
        let course_id = self
            .store
            .find_lesson_course(lesson_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Lesson",
                id: lesson_id,
            })?;
        AccessEvaluator::new(self.store)
            .check_access(user_id, course_id, Some(lesson_id), now)
            .await?
            .into_result()
    }

    async fn require_outline(&self, course_id: DbId) -> Result<CourseOutline, CoreError> {
        self.store
            .find_course_outline(course_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Course",
                id: course_id,
            })
    }

    async fn require_enrollment(
        &self,
        user_id: DbId,
        course_id: DbId,
    ) -> Result<EnrollmentRecord, CoreError> {
        self.store
            .find_enrollment(user_id, course_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Enrollment",
                id: course_id,
            })
    }
}

/// Error returned when a (user, course) enrollment already exists.
pub fn already_enrolled(user_id: DbId, course_id: DbId) -> CoreError {
    CoreError::Conflict(format!(
        "User {user_id} is already enrolled in course {course_id}"
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
