//! Integration tests for `PgStore` driven through the domain services.

use assert_matches::assert_matches;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use sqlx::PgPool;

use coursegate_core::access::{AccessEvaluator, AccessType};
use coursegate_core::enrollment::{EnrollRequest, EnrollmentManager};
use coursegate_core::error::CoreError;
use coursegate_core::schedule::{ScheduledUnlock, UnlockPlan};
use coursegate_core::store::{AccessStore, EnrollmentStore, NewEnrollment};
use coursegate_core::tier::Tier;
use coursegate_core::types::DbId;
use coursegate_core::weekday::DayOfWeek;
use coursegate_db::models::course::{CreateCourse, CreateCourseModule, CreateLesson};
use coursegate_db::models::tier_purchase::CreateTierPurchase;
use coursegate_db::models::user::CreateUser;
use coursegate_db::repositories::{
    CourseRepo, EnrollmentRepo, LessonRepo, ProgressRepo, TierPurchaseRepo, UserRepo,
};
use coursegate_db::store::PgStore;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Monday 2024-01-01, midday.
fn monday_noon() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
}

async fn seed_user(pool: &PgPool, email: &str) -> DbId {
    let input = CreateUser {
        email: email.to_string(),
        display_name: email.to_string(),
        role: None,
    };
    UserRepo::create(pool, &input).await.unwrap().id
}

async fn grant(pool: &PgPool, user_id: DbId, tier: Tier) {
    let input = CreateTierPurchase {
        user_id,
        tier_id: tier.level(),
        external_reference: None,
    };
    TierPurchaseRepo::create(pool, &input).await.unwrap();
}

/// Create a course with `modules` modules of `per_module` lessons each.
///
/// Modules and lessons are inserted in reverse order so reads must sort.
/// Returns the course id and its lesson ids in course order.
async fn seed_course(pool: &PgPool, tier: Tier, modules: usize, per_module: usize) -> (DbId, Vec<DbId>) {
    let course = CourseRepo::create(
        pool,
        &CreateCourse {
            title: "Rust Fundamentals".to_string(),
            description: None,
            tier_id: tier.level(),
            min_duration_weeks: None,
            max_lessons_per_week: Some(3),
            allow_day_choice: None,
            is_capped: None,
            max_enrollments: None,
        },
    )
    .await
    .unwrap();

    let mut ids = vec![vec![0; per_module]; modules];
    for m in (0..modules).rev() {
        let module = CourseRepo::create_module(
            pool,
            &CreateCourseModule {
                course_id: course.id,
                title: format!("Module {m}"),
                order_index: m as i32,
            },
        )
        .await
        .unwrap();
        for l in (0..per_module).rev() {
            let lesson = LessonRepo::create(
                pool,
                &CreateLesson {
                    module_id: module.id,
                    title: format!("Lesson {m}.{l}"),
                    order_index: l as i32,
                    unlock_offset: None,
                    duration_secs: Some(600),
                },
            )
            .await
            .unwrap();
            ids[m][l] = lesson.id;
        }
    }
    (course.id, ids.into_iter().flatten().collect())
}

fn enroll_request(user_id: DbId, course_id: DbId) -> EnrollRequest {
    EnrollRequest {
        user_id,
        course_id,
        preferred_days: None,
        start_date: None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn outline_is_ordered_by_module_then_lesson(pool: PgPool) {
    let (course_id, lesson_ids) = seed_course(&pool, Tier::Tier1, 2, 3).await;
    let store = PgStore::new(pool);

    let outline = store.find_course_outline(course_id).await.unwrap().unwrap();

    assert_eq!(outline.course.tier, Tier::Tier1);
    let orders: Vec<i32> = outline.modules.iter().map(|m| m.order_index).collect();
    assert_eq!(orders, vec![0, 1]);
    let scheduled: Vec<DbId> = outline
        .schedule_lessons()
        .iter()
        .map(|l| l.lesson_id)
        .collect();
    assert_eq!(scheduled, lesson_ids);
    assert_eq!(store.find_lesson_course(lesson_ids[4]).await.unwrap(), Some(course_id));
    assert_eq!(store.find_lesson_course(-1).await.unwrap(), None);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn enroll_persists_full_calendar(pool: PgPool) {
    let user_id = seed_user(&pool, "learner@example.com").await;
    let (course_id, lesson_ids) = seed_course(&pool, Tier::Tier1, 2, 3).await;
    grant(&pool, user_id, Tier::Tier1).await;
    let store = PgStore::new(pool);

    let enrollment = EnrollmentManager::new(&store)
        .enroll(enroll_request(user_id, course_id), monday_noon())
        .await
        .unwrap();

    assert_eq!(enrollment.start_date, date(2024, 1, 1));
    assert_eq!(enrollment.unlock_plan, UnlockPlan::Generated);
    assert_eq!(
        enrollment.preferred_days,
        vec![DayOfWeek::Monday, DayOfWeek::Wednesday, DayOfWeek::Friday]
    );

    let unlocks = store.list_lesson_unlocks(enrollment.id).await.unwrap();
    let dates: Vec<NaiveDate> = unlocks.iter().map(|u| u.unlock_at).collect();
    assert_eq!(
        dates,
        vec![
            date(2024, 1, 1),
            date(2024, 1, 3),
            date(2024, 1, 5),
            date(2024, 1, 8),
            date(2024, 1, 10),
            date(2024, 1, 12),
        ]
    );
    let ordered: Vec<DbId> = unlocks.iter().map(|u| u.lesson_id).collect();
    assert_eq!(ordered, lesson_ids);
    assert!(unlocks[0].is_unlocked);
    assert!(unlocks[1..].iter().all(|u| !u.is_unlocked));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn second_enrollment_conflicts(pool: PgPool) {
    let user_id = seed_user(&pool, "learner@example.com").await;
    let (course_id, _) = seed_course(&pool, Tier::Tier1, 1, 2).await;
    grant(&pool, user_id, Tier::Tier3).await;
    let store = PgStore::new(pool.clone());
    let manager = EnrollmentManager::new(&store);

    manager
        .enroll(enroll_request(user_id, course_id), monday_noon())
        .await
        .unwrap();
    let err = manager
        .enroll(enroll_request(user_id, course_id), monday_noon())
        .await
        .unwrap_err();

    assert_matches!(err, CoreError::Conflict(_));
    assert_eq!(EnrollmentRepo::count_by_course(&pool, course_id).await.unwrap(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn concurrent_creates_store_one_enrollment(pool: PgPool) {
    let user_id = seed_user(&pool, "learner@example.com").await;
    let (course_id, lesson_ids) = seed_course(&pool, Tier::Tier1, 1, 2).await;
    let store = PgStore::new(pool.clone());

    let input = NewEnrollment {
        user_id,
        course_id,
        preferred_days: vec![DayOfWeek::Monday],
        start_date: date(2024, 1, 1),
        unlock_plan: UnlockPlan::Generated,
    };
    let unlocks: Vec<ScheduledUnlock> = lesson_ids
        .iter()
        .enumerate()
        .map(|(i, &lesson_id)| ScheduledUnlock {
            lesson_id,
            unlock_at: date(2024, 1, 1 + 7 * i as u32),
            is_unlocked: false,
        })
        .collect();

    let (a, b) = tokio::join!(
        store.create_enrollment(&input, &unlocks),
        store.create_enrollment(&input, &unlocks),
    );

    let results = [a, b];
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .any(|r| matches!(r, Err(CoreError::Conflict(_)))));

    let rows: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM lesson_unlocks")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(rows.0, 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn reschedule_never_relocks_or_moves_unlocked_rows(pool: PgPool) {
    let user_id = seed_user(&pool, "learner@example.com").await;
    let (course_id, lesson_ids) = seed_course(&pool, Tier::Tier1, 1, 2).await;
    let store = PgStore::new(pool);

    let enrollment = store
        .create_enrollment(
            &NewEnrollment {
                user_id,
                course_id,
                preferred_days: vec![DayOfWeek::Monday],
                start_date: date(2024, 1, 1),
                unlock_plan: UnlockPlan::Generated,
            },
            &[
                ScheduledUnlock {
                    lesson_id: lesson_ids[0],
                    unlock_at: date(2024, 1, 1),
                    is_unlocked: true,
                },
                ScheduledUnlock {
                    lesson_id: lesson_ids[1],
                    unlock_at: date(2024, 1, 8),
                    is_unlocked: false,
                },
            ],
        )
        .await
        .unwrap();

    let updated = store
        .reschedule_enrollment(
            enrollment.id,
            &[DayOfWeek::Thursday],
            &[
                ScheduledUnlock {
                    lesson_id: lesson_ids[0],
                    unlock_at: date(2024, 2, 1),
                    is_unlocked: false,
                },
                ScheduledUnlock {
                    lesson_id: lesson_ids[1],
                    unlock_at: date(2024, 1, 4),
                    is_unlocked: false,
                },
            ],
        )
        .await
        .unwrap();

    assert_eq!(updated.preferred_days, vec![DayOfWeek::Thursday]);
    let first = store
        .find_lesson_unlock(enrollment.id, lesson_ids[0])
        .await
        .unwrap()
        .unwrap();
    assert_eq!(first.unlock_at, date(2024, 1, 1));
    assert!(first.is_unlocked);
    let second = store
        .find_lesson_unlock(enrollment.id, lesson_ids[1])
        .await
        .unwrap()
        .unwrap();
    assert_eq!(second.unlock_at, date(2024, 1, 4));
    assert!(!second.is_unlocked);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn update_preferences_keeps_opened_lessons(pool: PgPool) {
    let user_id = seed_user(&pool, "learner@example.com").await;
    let (course_id, _) = seed_course(&pool, Tier::Tier1, 2, 3).await;
    grant(&pool, user_id, Tier::Tier1).await;
    let store = PgStore::new(pool);
    let manager = EnrollmentManager::new(&store);

    let enrollment = manager
        .enroll(enroll_request(user_id, course_id), monday_noon())
        .await
        .unwrap();

    // Thursday: Jan 1 and Jan 3 are open, Jan 5 is not.
    let thursday = Utc.with_ymd_and_hms(2024, 1, 4, 9, 0, 0).unwrap();
    manager
        .update_preferences(user_id, course_id, &[DayOfWeek::Tuesday], thursday)
        .await
        .unwrap();

    let dates: Vec<NaiveDate> = store
        .list_lesson_unlocks(enrollment.id)
        .await
        .unwrap()
        .iter()
        .map(|u| u.unlock_at)
        .collect();
    assert_eq!(
        dates,
        vec![
            date(2024, 1, 1),
            date(2024, 1, 3),
            date(2024, 1, 9),
            date(2024, 1, 16),
            date(2024, 1, 23),
            date(2024, 1, 30),
        ]
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn access_requires_a_purchased_tier(pool: PgPool) {
    let user_id = seed_user(&pool, "learner@example.com").await;
    let (course_id, _) = seed_course(&pool, Tier::Tier2, 1, 1).await;
    let store = PgStore::new(pool.clone());
    let evaluator = AccessEvaluator::new(&store);

    let denied = evaluator
        .check_access(user_id, course_id, None, monday_noon())
        .await
        .unwrap();
    assert!(!denied.has_access);
    assert_eq!(denied.access_type, AccessType::Denied);

    grant(&pool, user_id, Tier::Tier1).await;
    let eligibility = evaluator.can_enroll_in_course(user_id, course_id).await.unwrap();
    assert!(!eligibility.can_enroll);
    assert_eq!(eligibility.required_tier, Some(Tier::Tier2));

    grant(&pool, user_id, Tier::Tier3).await;
    assert_eq!(store.list_tier_purchases(user_id).await.unwrap().len(), 2);
    let granted = evaluator
        .check_access(user_id, course_id, None, monday_noon())
        .await
        .unwrap();
    assert!(granted.has_access);
    assert_eq!(granted.user_tier, Some(Tier::Tier3));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn progress_upserts_completion_and_position(pool: PgPool) {
    let user_id = seed_user(&pool, "learner@example.com").await;
    let (course_id, lesson_ids) = seed_course(&pool, Tier::Tier1, 1, 3).await;
    grant(&pool, user_id, Tier::Tier1).await;
    let store = PgStore::new(pool.clone());
    let manager = EnrollmentManager::new(&store);
    manager
        .enroll(enroll_request(user_id, course_id), monday_noon())
        .await
        .unwrap();

    manager
        .record_watch_position(user_id, lesson_ids[0], 120, monday_noon())
        .await
        .unwrap();
    manager
        .mark_lesson_complete(user_id, lesson_ids[0], monday_noon())
        .await
        .unwrap();

    let row = ProgressRepo::find(&pool, user_id, lesson_ids[0])
        .await
        .unwrap()
        .unwrap();
    assert!(row.completed);
    assert_eq!(row.completed_at, Some(monday_noon()));
    assert_eq!(row.watch_position_secs, 120);
    assert_eq!(
        store.count_completed_lessons(user_id, course_id).await.unwrap(),
        1
    );

    // Lesson 2 unlocks on Wednesday.
    let err = manager
        .mark_lesson_complete(user_id, lesson_ids[1], monday_noon())
        .await
        .unwrap_err();
    assert_matches!(err, CoreError::AccessDenied { unlock_at: Some(d), .. } if d == date(2024, 1, 3));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn admin_override_is_persisted(pool: PgPool) {
    let user_id = seed_user(&pool, "learner@example.com").await;
    let (course_id, lesson_ids) = seed_course(&pool, Tier::Tier1, 1, 3).await;
    grant(&pool, user_id, Tier::Tier1).await;
    let store = PgStore::new(pool);
    let manager = EnrollmentManager::new(&store);
    manager
        .enroll(enroll_request(user_id, course_id), monday_noon())
        .await
        .unwrap();

    let updated = manager
        .set_admin_override(user_id, course_id, true)
        .await
        .unwrap();
    assert!(updated.admin_override);

    let check = AccessEvaluator::new(&store)
        .check_access(user_id, course_id, Some(lesson_ids[2]), monday_noon())
        .await
        .unwrap();
    assert!(check.has_access);
    assert_eq!(check.access_type, AccessType::AdminOverride);
}
