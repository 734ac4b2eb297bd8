//! Access decisions for courses and lessons.
//!
//! The decision is layered: an enrollment's admin override wins outright,
//! otherwise the learner's highest purchased tier must cover the course tier,
//! and for a specific lesson its unlock date must have been reached as well.
//! Tier entitlement and time unlock are independent gates; both must pass.
//!
//! Nothing in this module writes to storage.

use serde::Serialize;

use crate::error::CoreError;
use crate::schedule::ScheduledUnlock;
use crate::store::{AccessStore, CourseRecord, EnrollmentRecord};
use crate::tier::Tier;
use crate::types::{Date, DbId, Timestamp};

// ---------------------------------------------------------------------------
// Decision types
// ---------------------------------------------------------------------------

/// Which authorization path produced a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccessType {
    AdminOverride,
    TierPurchase,
    Denied,
}

/// Result of [`evaluate_access`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccessCheck {
    pub has_access: bool,
    pub access_type: AccessType,
    pub user_tier: Option<Tier>,
    pub required_tier: Option<Tier>,
    pub reason: Option<String>,
    /// Set when a lesson is denied only because it is still locked.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unlock_at: Option<Date>,
}

impl AccessCheck {
    fn granted(access_type: AccessType, user_tier: Option<Tier>, required_tier: Tier) -> Self {
        Self {
            has_access: true,
            access_type,
            user_tier,
            required_tier: Some(required_tier),
            reason: None,
            unlock_at: None,
        }
    }

    fn denied(user_tier: Option<Tier>, required_tier: Tier, reason: String) -> Self {
        Self {
            has_access: false,
            access_type: AccessType::Denied,
            user_tier,
            required_tier: Some(required_tier),
            reason: Some(reason),
            unlock_at: None,
        }
    }

    /// Convert a denial into [`CoreError::AccessDenied`]; grants pass through.
    pub fn into_result(self) -> Result<AccessCheck, CoreError> {
        if self.has_access {
            return Ok(self);
        }
        // A lesson-lock denial already has the tier; only name it when it
        // is what blocked the request.
        let required_tier = if self.unlock_at.is_some() {
            None
        } else {
            self.required_tier
        };
        Err(CoreError::AccessDenied {
            reason: self.reason.unwrap_or_else(|| "Access denied".to_string()),
            required_tier,
            unlock_at: self.unlock_at,
        })
    }
}

/// Lessons of an enrollment split by whether they are open yet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccessibleLessons {
    pub accessible_lesson_ids: Vec<DbId>,
    /// Ordered by unlock date ascending.
    pub upcoming_unlocks: Vec<UpcomingUnlock>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UpcomingUnlock {
    pub lesson_id: DbId,
    pub unlock_at: Date,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrollmentEligibility {
    pub can_enroll: bool,
    pub reason: Option<String>,
    /// Present when the denial is a tier shortfall.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_tier: Option<Tier>,
}

// ---------------------------------------------------------------------------
// Pure evaluation
// ---------------------------------------------------------------------------

/// Decide access to a course, or to one of its lessons when `lesson_unlock`
/// is supplied.
///
/// `lesson_unlock` should be the learner's unlock row for the lesson; a
/// lesson without a row in the calendar is gated by tier only.
pub fn evaluate_access(
    enrollment: Option<&EnrollmentRecord>,
    owned_tiers: &[Tier],
    required_tier: Tier,
    lesson_unlock: Option<&ScheduledUnlock>,
    now: Timestamp,
) -> AccessCheck {
    let user_tier = Tier::highest(owned_tiers.iter().copied());

    if enrollment.is_some_and(|e| e.admin_override) {
        return AccessCheck::granted(AccessType::AdminOverride, user_tier, required_tier);
    }

    let Some(owned) = user_tier else {
        return AccessCheck::denied(None, required_tier, "No tier purchased".to_string());
    };

    if !owned.grants(required_tier) {
        return AccessCheck::denied(
            Some(owned),
            required_tier,
            format!("This course requires {required_tier}; you own {owned}"),
        );
    }

    if let Some(unlock) = lesson_unlock.filter(|u| !u.is_open_at(now)) {
        let mut check = AccessCheck::denied(
            Some(owned),
            required_tier,
            lock_reason(unlock.unlock_at, now.date_naive()),
        );
        check.unlock_at = Some(unlock.unlock_at);
        return check;
    }

    AccessCheck::granted(AccessType::TierPurchase, Some(owned), required_tier)
}

fn lock_reason(unlock_at: Date, today: Date) -> String {
    match (unlock_at - today).num_days() {
        days if days <= 0 => format!("This lesson unlocks on {unlock_at}"),
        1 => format!("This lesson unlocks on {unlock_at} (in 1 day)"),
        days => format!("This lesson unlocks on {unlock_at} (in {days} days)"),
    }
}

/// Split unlock rows into open lessons and upcoming ones.
///
/// Independent of tier checks: this answers only "what is unlocked".
pub fn partition_unlocks(unlocks: &[ScheduledUnlock], now: Timestamp) -> AccessibleLessons {
    let (open, locked): (Vec<&ScheduledUnlock>, Vec<&ScheduledUnlock>) =
        unlocks.iter().partition(|u| u.is_open_at(now));

    let mut upcoming_unlocks: Vec<UpcomingUnlock> = locked
        .into_iter()
        .map(|u| UpcomingUnlock {
            lesson_id: u.lesson_id,
            unlock_at: u.unlock_at,
        })
        .collect();
    upcoming_unlocks.sort_by_key(|u| u.unlock_at);

    AccessibleLessons {
        accessible_lesson_ids: open.into_iter().map(|u| u.lesson_id).collect(),
        upcoming_unlocks,
    }
}

/// Decide whether a learner may enroll, given the course's current
/// enrollment count.
pub fn evaluate_enrollment_eligibility(
    owned_tiers: &[Tier],
    course: &CourseRecord,
    current_enrollments: i64,
) -> EnrollmentEligibility {
    let tier_ok = Tier::highest(owned_tiers.iter().copied())
        .is_some_and(|owned| owned.grants(course.tier));
    if !tier_ok {
        return EnrollmentEligibility {
            can_enroll: false,
            reason: Some(format!("This course requires {}", course.tier)),
            required_tier: Some(course.tier),
        };
    }

    if course.is_capped {
        if let Some(max) = course.max_enrollments {
            if current_enrollments >= i64::from(max) {
                return EnrollmentEligibility {
                    can_enroll: false,
                    reason: Some("This course has reached its enrollment limit".to_string()),
                    required_tier: None,
                };
            }
        }
    }

    EnrollmentEligibility {
        can_enroll: true,
        reason: None,
        required_tier: None,
    }
}

// ---------------------------------------------------------------------------
// Store-backed evaluator
// ---------------------------------------------------------------------------

/// Runs access decisions against persisted tier, enrollment and unlock data.
pub struct AccessEvaluator<'a, S> {
    store: &'a S,
}

impl<'a, S: AccessStore> AccessEvaluator<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Check course access, or lesson access when `lesson_id` is given.
    ///
    /// Always reads the current unlock row; nothing is cached.
    pub async fn check_access(
        &self,
        user_id: DbId,
        course_id: DbId,
        lesson_id: Option<DbId>,
        now: Timestamp,
    ) -> Result<AccessCheck, CoreError> {
        let course = self.require_course(course_id).await?;
        let enrollment = self.store.find_enrollment(user_id, course_id).await?;
        let owned = self.store.list_tier_purchases(user_id).await?;

        let lesson_unlock = match (lesson_id, &enrollment) {
            (Some(lesson_id), Some(e)) if !e.admin_override => {
                self.store.find_lesson_unlock(e.id, lesson_id).await?
            }
            _ => None,
        };

        Ok(evaluate_access(
            enrollment.as_ref(),
            &owned,
            course.tier,
            lesson_unlock.as_ref(),
            now,
        ))
    }

    /// Open and upcoming lessons of the learner's enrollment in a course.
    pub async fn get_accessible_lessons(
        &self,
        user_id: DbId,
        course_id: DbId,
        now: Timestamp,
    ) -> Result<AccessibleLessons, CoreError> {
        let enrollment = self
            .store
            .find_enrollment(user_id, course_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Enrollment",
                id: course_id,
            })?;
        let unlocks = self.store.list_lesson_unlocks(enrollment.id).await?;
        Ok(partition_unlocks(&unlocks, now))
    }

    pub async fn can_enroll_in_course(
        &self,
        user_id: DbId,
        course_id: DbId,
    ) -> Result<EnrollmentEligibility, CoreError> {
        let course = self.require_course(course_id).await?;
        let owned = self.store.list_tier_purchases(user_id).await?;
        let current = if course.is_capped {
            self.store.count_enrollments(course_id).await?
        } else {
            0
        };
        Ok(evaluate_enrollment_eligibility(&owned, &course, current))
    }

    async fn require_course(&self, course_id: DbId) -> Result<CourseRecord, CoreError> {
        self.store
            .find_course(course_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Course",
                id: course_id,
            })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
