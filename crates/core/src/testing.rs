//! In-memory [`EnrollmentStore`] for unit tests.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{TimeZone, Utc};

use crate::error::CoreError;
use crate::schedule::{ScheduledUnlock, UnlockPlan};
use crate::store::{
    AccessStore, CourseOutline, CourseRecord, EnrollmentRecord, EnrollmentStore, LessonOutline,
    ModuleOutline, NewEnrollment, ProgressRecord, StoreResult,
};
use crate::tier::Tier;
use crate::types::{DbId, Timestamp};
use crate::weekday::{DayOfWeek, DEFAULT_PREFERRED_DAYS};

/// Lessons per generated module.
const LESSONS_PER_MODULE: usize = 3;

pub fn sample_course(id: DbId, tier: Tier) -> CourseRecord {
    CourseRecord {
        id,
        title: format!("Course {id}"),
        tier,
        min_duration_weeks: 0,
        max_lessons_per_week: Some(3),
        allow_day_choice: true,
        is_capped: false,
        max_enrollments: None,
    }
}

#[derive(Default)]
struct State {
    courses: HashMap<DbId, CourseOutline>,
    enrollments: Vec<EnrollmentRecord>,
    unlocks: HashMap<(DbId, DbId), ScheduledUnlock>,
    purchases: Vec<(DbId, Tier)>,
    progress: HashMap<(DbId, DbId), ProgressRecord>,
    next_id: DbId,
}

impl State {
    fn next_id(&mut self) -> DbId {
        self.next_id += 1;
        self.next_id
    }

    fn lesson_position(&self, lesson_id: DbId) -> (i32, i32) {
        self.courses
            .values()
            .flat_map(|c| c.schedule_lessons())
            .find(|l| l.lesson_id == lesson_id)
            .map(|l| (l.module_order, l.order_index))
            .unwrap_or((i32::MAX, i32::MAX))
    }

    fn enrollment_mut(&mut self, enrollment_id: DbId) -> StoreResult<&mut EnrollmentRecord> {
        self.enrollments
            .iter_mut()
            .find(|e| e.id == enrollment_id)
            .ok_or(CoreError::NotFound {
                entity: "Enrollment",
                id: enrollment_id,
            })
    }
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a course with `lesson_count` lessons split into modules.
    pub fn add_course(&self, course: CourseRecord, lesson_count: usize) -> CourseOutline {
        let course_id = course.id;
        let modules = (0..lesson_count)
            .collect::<Vec<_>>()
            .chunks(LESSONS_PER_MODULE)
            .enumerate()
            .map(|(m, chunk)| ModuleOutline {
                id: course_id * 10 + m as DbId,
                title: format!("Module {m}"),
                order_index: m as i32,
                lessons: chunk
                    .iter()
                    .map(|&i| LessonOutline {
                        id: course_id * 100 + i as DbId + 1,
                        title: format!("Lesson {i}"),
                        order_index: (i % LESSONS_PER_MODULE) as i32,
                        duration_secs: Some(600),
                    })
                    .collect(),
            })
            .collect();
        let outline = CourseOutline { course, modules };
        self.state
            .lock()
            .unwrap()
            .courses
            .insert(course_id, outline.clone());
        outline
    }

    pub fn grant_tier(&self, user_id: DbId, tier: Tier) {
        self.state.lock().unwrap().purchases.push((user_id, tier));
    }

    /// Insert an enrollment directly, bypassing the lifecycle rules.
    pub fn insert_enrollment(
        &self,
        user_id: DbId,
        course_id: DbId,
        unlocks: &[ScheduledUnlock],
    ) -> DbId {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id();
        state.enrollments.push(EnrollmentRecord {
            id,
            user_id,
            course_id,
            preferred_days: DEFAULT_PREFERRED_DAYS.to_vec(),
            start_date: chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            unlock_plan: UnlockPlan::Generated,
            admin_override: false,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        });
        for u in unlocks {
            state.unlocks.insert((id, u.lesson_id), *u);
        }
        id
    }

    pub fn set_override(&self, enrollment_id: DbId, enabled: bool) {
        let mut state = self.state.lock().unwrap();
        state.enrollment_mut(enrollment_id).unwrap().admin_override = enabled;
    }

    pub fn enrollment_count(&self) -> usize {
        self.state.lock().unwrap().enrollments.len()
    }

    pub fn progress_of(&self, user_id: DbId, lesson_id: DbId) -> Option<ProgressRecord> {
        self.state
            .lock()
            .unwrap()
            .progress
            .get(&(user_id, lesson_id))
            .cloned()
    }

    fn sorted_unlocks(state: &State, enrollment_id: DbId) -> Vec<ScheduledUnlock> {
        let mut rows: Vec<ScheduledUnlock> = state
            .unlocks
            .iter()
            .filter(|((e, _), _)| *e == enrollment_id)
            .map(|(_, u)| *u)
            .collect();
        rows.sort_by_key(|u| (u.unlock_at, state.lesson_position(u.lesson_id)));
        rows
    }
}

impl AccessStore for MemoryStore {
    async fn find_course(&self, course_id: DbId) -> StoreResult<Option<CourseRecord>> {
        let state = self.state.lock().unwrap();
        Ok(state.courses.get(&course_id).map(|c| c.course.clone()))
    }

    async fn find_enrollment(
        &self,
        user_id: DbId,
        course_id: DbId,
    ) -> StoreResult<Option<EnrollmentRecord>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .enrollments
            .iter()
            .find(|e| e.user_id == user_id && e.course_id == course_id)
            .cloned())
    }

    async fn list_tier_purchases(&self, user_id: DbId) -> StoreResult<Vec<Tier>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .purchases
            .iter()
            .filter(|(u, _)| *u == user_id)
            .map(|(_, t)| *t)
            .collect())
    }

    async fn find_lesson_unlock(
        &self,
        enrollment_id: DbId,
        lesson_id: DbId,
    ) -> StoreResult<Option<ScheduledUnlock>> {
        let state = self.state.lock().unwrap();
        Ok(state.unlocks.get(&(enrollment_id, lesson_id)).copied())
    }

    async fn list_lesson_unlocks(&self, enrollment_id: DbId) -> StoreResult<Vec<ScheduledUnlock>> {
        let state = self.state.lock().unwrap();
        Ok(Self::sorted_unlocks(&state, enrollment_id))
    }

    async fn count_enrollments(&self, course_id: DbId) -> StoreResult<i64> {
        let state = self.state.lock().unwrap();
        Ok(state
            .enrollments
            .iter()
            .filter(|e| e.course_id == course_id)
            .count() as i64)
    }
}

impl EnrollmentStore for MemoryStore {
    async fn find_course_outline(&self, course_id: DbId) -> StoreResult<Option<CourseOutline>> {
        let state = self.state.lock().unwrap();
        Ok(state.courses.get(&course_id).cloned())
    }

    async fn find_lesson_course(&self, lesson_id: DbId) -> StoreResult<Option<DbId>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .courses
            .values()
            .find(|c| c.schedule_lessons().iter().any(|l| l.lesson_id == lesson_id))
            .map(|c| c.course.id))
    }

    async fn list_user_enrollments(&self, user_id: DbId) -> StoreResult<Vec<EnrollmentRecord>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .enrollments
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn count_completed_lessons(&self, user_id: DbId, course_id: DbId) -> StoreResult<i64> {
        let state = self.state.lock().unwrap();
        let Some(course) = state.courses.get(&course_id) else {
            return Ok(0);
        };
        let count = course
            .schedule_lessons()
            .iter()
            .filter(|l| {
                state
                    .progress
                    .get(&(user_id, l.lesson_id))
                    .is_some_and(|p| p.completed)
            })
            .count();
        Ok(count as i64)
    }

    async fn create_enrollment(
        &self,
        input: &NewEnrollment,
        unlocks: &[ScheduledUnlock],
    ) -> StoreResult<EnrollmentRecord> {
        let mut state = self.state.lock().unwrap();
        if state
            .enrollments
            .iter()
            .any(|e| e.user_id == input.user_id && e.course_id == input.course_id)
        {
            return Err(CoreError::Conflict("already enrolled".to_string()));
        }
        let id = state.next_id();
        let record = EnrollmentRecord {
            id,
            user_id: input.user_id,
            course_id: input.course_id,
            preferred_days: input.preferred_days.clone(),
            start_date: input.start_date,
            unlock_plan: input.unlock_plan,
            admin_override: false,
            created_at: fixed_now(),
        };
        state.enrollments.push(record.clone());
        for u in unlocks {
            state.unlocks.insert((id, u.lesson_id), *u);
        }
        Ok(record)
    }

    async fn reschedule_enrollment(
        &self,
        enrollment_id: DbId,
        preferred_days: &[DayOfWeek],
        unlocks: &[ScheduledUnlock],
    ) -> StoreResult<EnrollmentRecord> {
        let mut state = self.state.lock().unwrap();
        for u in unlocks {
            state
                .unlocks
                .entry((enrollment_id, u.lesson_id))
                .and_modify(|row| {
                    if !row.is_unlocked {
                        row.unlock_at = u.unlock_at;
                    }
                    row.is_unlocked |= u.is_unlocked;
                })
                .or_insert(*u);
        }
        let enrollment = state.enrollment_mut(enrollment_id)?;
        enrollment.preferred_days = preferred_days.to_vec();
        Ok(enrollment.clone())
    }

    async fn set_admin_override(
        &self,
        enrollment_id: DbId,
        enabled: bool,
    ) -> StoreResult<EnrollmentRecord> {
        let mut state = self.state.lock().unwrap();
        let enrollment = state.enrollment_mut(enrollment_id)?;
        enrollment.admin_override = enabled;
        Ok(enrollment.clone())
    }

    async fn mark_lesson_completed(
        &self,
        user_id: DbId,
        lesson_id: DbId,
        completed_at: Timestamp,
    ) -> StoreResult<ProgressRecord> {
        let mut state = self.state.lock().unwrap();
        let row = state
            .progress
            .entry((user_id, lesson_id))
            .or_insert_with(|| empty_progress(user_id, lesson_id));
        row.completed = true;
        row.completed_at = Some(completed_at);
        Ok(row.clone())
    }

    async fn record_watch_position(
        &self,
        user_id: DbId,
        lesson_id: DbId,
        position_secs: i32,
    ) -> StoreResult<ProgressRecord> {
        let mut state = self.state.lock().unwrap();
        let row = state
            .progress
            .entry((user_id, lesson_id))
            .or_insert_with(|| empty_progress(user_id, lesson_id));
        row.watch_position_secs = position_secs;
        Ok(row.clone())
    }
}

fn empty_progress(user_id: DbId, lesson_id: DbId) -> ProgressRecord {
    ProgressRecord {
        user_id,
        lesson_id,
        completed: false,
        completed_at: None,
        watch_position_secs: 0,
    }
}

fn fixed_now() -> Timestamp {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}
