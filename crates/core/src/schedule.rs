//! Unlock calendar generation and recalculation.
//!
//! Turns an ordered lesson list, a set of preferred weekdays, a start date and
//! a minimum course duration into one unlock date per lesson. Everything here
//! is pure: callers pass in "now" and persist the result themselves.

use std::collections::HashSet;

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

use crate::types::{start_of_day, Date, DbId, Timestamp};
use crate::weekday::{normalize_days, DayOfWeek};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const DAYS_PER_WEEK: i64 = 7;

/// Upper bound on the day-by-day walk looking for preferred days (two years).
pub const MAX_WALK_DAYS: i64 = 730;

/// How far (in each direction) a stretched target may move to land on a
/// preferred day.
pub const SNAP_WINDOW_DAYS: i64 = 7;

// ---------------------------------------------------------------------------
// Unlock plan
// ---------------------------------------------------------------------------

/// Plan id type matching the SMALLINT `unlock_plans` lookup table.
pub type UnlockPlanId = i16;

/// Whether an enrollment's day preferences may change after enrollment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UnlockPlan {
    Fixed = 1,
    Generated = 2,
}

impl UnlockPlan {
    /// Courses that let learners pick days get a recalculable plan.
    pub fn for_course(allow_day_choice: bool) -> Self {
        if allow_day_choice {
            UnlockPlan::Generated
        } else {
            UnlockPlan::Fixed
        }
    }

    pub fn id(self) -> UnlockPlanId {
        self as UnlockPlanId
    }

    pub fn from_id(id: UnlockPlanId) -> Option<Self> {
        match id {
            1 => Some(UnlockPlan::Fixed),
            2 => Some(UnlockPlan::Generated),
            _ => None,
        }
    }

    pub fn allows_day_changes(self) -> bool {
        self == UnlockPlan::Generated
    }
}

// ---------------------------------------------------------------------------
// Schedule types
// ---------------------------------------------------------------------------

/// A lesson as seen by the scheduler: its id and position in the course.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleLesson {
    pub lesson_id: DbId,
    /// `order_index` of the lesson's module within the course.
    pub module_order: i32,
    /// `order_index` of the lesson within its module.
    pub order_index: i32,
}

impl ScheduleLesson {
    fn sort_key(&self) -> (i32, i32, DbId) {
        (self.module_order, self.order_index, self.lesson_id)
    }
}

/// One entry of an unlock calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScheduledUnlock {
    pub lesson_id: DbId,
    pub unlock_at: Date,
    /// Sticky: once true it is never reset by a recalculation.
    pub is_unlocked: bool,
}

impl ScheduledUnlock {
    /// A lesson is open once flagged, or once its unlock day has begun.
    pub fn is_open_at(&self, now: Timestamp) -> bool {
        self.is_unlocked || start_of_day(self.unlock_at) < now
    }
}

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

/// Build the unlock calendar for `lessons`.
///
/// Lessons are ordered by module then lesson `order_index` regardless of the
/// input order. With no preferred days the calendar is one lesson per week
/// from `start_date`. Otherwise each lesson takes the next preferred day on or
/// after `start_date`, and if the result is shorter than
/// `min_duration_weeks` the dates after the first are spread evenly up to the
/// minimum end date.
///
/// Entries whose date is on or before `now`'s day start out unlocked.
pub fn generate_unlock_schedule(
    lessons: &[ScheduleLesson],
    preferred_days: &[DayOfWeek],
    start_date: Date,
    min_duration_weeks: i32,
    now: Timestamp,
) -> Vec<ScheduledUnlock> {
    if lessons.is_empty() {
        return Vec::new();
    }

    let mut ordered = lessons.to_vec();
    ordered.sort_by_key(ScheduleLesson::sort_key);

    let days = normalize_days(preferred_days);
    let mut dates = if days.is_empty() {
        weekly_dates(start_date, ordered.len())
    } else {
        walk_preferred_days(start_date, &days, ordered.len())
    };
    stretch_to_min_duration(&mut dates, &days, start_date, min_duration_weeks);

    let today = now.date_naive();
    ordered
        .iter()
        .zip(dates)
        .map(|(lesson, unlock_at)| ScheduledUnlock {
            lesson_id: lesson.lesson_id,
            unlock_at,
            is_unlocked: unlock_at <= today,
        })
        .collect()
}

/// Rebuild a calendar for new day preferences without revoking access.
///
/// Entries already open at `now` are copied as-is (forced unlocked). All
/// other lessons are rescheduled from today with `new_preferred_days`. The
/// result holds the kept entries first, then the regenerated ones.
pub fn recalculate_unlock_schedule(
    existing: &[ScheduledUnlock],
    lessons: &[ScheduleLesson],
    new_preferred_days: &[DayOfWeek],
    min_duration_weeks: i32,
    now: Timestamp,
) -> Vec<ScheduledUnlock> {
    let mut result: Vec<ScheduledUnlock> = existing
        .iter()
        .filter(|u| u.is_open_at(now))
        .map(|u| ScheduledUnlock {
            is_unlocked: true,
            ..*u
        })
        .collect();

    let kept: HashSet<DbId> = result.iter().map(|u| u.lesson_id).collect();
    let remaining: Vec<ScheduleLesson> = lessons
        .iter()
        .filter(|l| !kept.contains(&l.lesson_id))
        .copied()
        .collect();

    result.extend(generate_unlock_schedule(
        &remaining,
        new_preferred_days,
        now.date_naive(),
        min_duration_weeks,
        now,
    ));
    result
}

// ---------------------------------------------------------------------------
// Date helpers
// ---------------------------------------------------------------------------

/// Saturating day arithmetic; calendars never get near chrono's limits.
fn add_days(date: Date, days: i64) -> Date {
    date.checked_add_signed(TimeDelta::days(days))
        .unwrap_or(if days >= 0 { Date::MAX } else { Date::MIN })
}

fn matches(date: Date, days: &[DayOfWeek]) -> bool {
    days.is_empty() || days.contains(&DayOfWeek::of(date))
}

fn weekly_dates(start_date: Date, count: usize) -> Vec<Date> {
    (0..count as i64)
        .map(|i| add_days(start_date, i * DAYS_PER_WEEK))
        .collect()
}

/// Collect `count` distinct preferred days walking forward from `start_date`.
///
/// If the walk cap runs out first, the rest are padded a week apart from the
/// last date found.
fn walk_preferred_days(start_date: Date, days: &[DayOfWeek], count: usize) -> Vec<Date> {
    let mut dates = Vec::with_capacity(count);
    let limit = add_days(start_date, MAX_WALK_DAYS);

    let mut cursor = start_date;
    while dates.len() < count && cursor < limit {
        if matches(cursor, days) {
            dates.push(cursor);
        }
        cursor = add_days(cursor, 1);
    }

    let mut last = dates.last().copied().unwrap_or(start_date);
    while dates.len() < count {
        last = add_days(last, DAYS_PER_WEEK);
        dates.push(last);
    }
    dates
}

/// Spread dates 2..N evenly between the first date and the minimum end date.
///
/// Intermediate targets snap to the nearest preferred day (forward wins ties);
/// the final lesson snaps forward so the calendar never ends early.
fn stretch_to_min_duration(
    dates: &mut [Date],
    days: &[DayOfWeek],
    start_date: Date,
    min_duration_weeks: i32,
) {
    if dates.len() < 2 || min_duration_weeks <= 0 {
        return;
    }

    let min_end = add_days(start_date, i64::from(min_duration_weeks) * DAYS_PER_WEEK);
    let last_index = dates.len() - 1;
    if dates[last_index] >= min_end {
        return;
    }

    let first = dates[0];
    let span = (min_end - first).num_days();
    let steps = last_index as i64;

    let mut previous = first;
    for (i, slot) in dates.iter_mut().enumerate().skip(1) {
        let offset = (span * i as i64 + steps / 2) / steps;
        let target = add_days(first, offset);
        let snapped = if i == last_index {
            next_matching(target, days)
        } else {
            nearest_matching(target, days)
        };
        // Keep the calendar non-decreasing.
        let snapped = snapped.max(previous);
        *slot = snapped;
        previous = snapped;
    }
}

fn nearest_matching(target: Date, days: &[DayOfWeek]) -> Date {
    for offset in 0..=SNAP_WINDOW_DAYS {
        let forward = add_days(target, offset);
        if matches(forward, days) {
            return forward;
        }
        let backward = add_days(target, -offset);
        if matches(backward, days) {
            return backward;
        }
    }
    target
}

fn next_matching(target: Date, days: &[DayOfWeek]) -> Date {
    (0..=SNAP_WINDOW_DAYS)
        .map(|offset| add_days(target, offset))
        .find(|d| matches(*d, days))
        .unwrap_or(target)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
