//! Shared harness for HTTP integration tests.
//!
//! Builds the production router against the `#[sqlx::test]` pool, mints
//! access tokens, and seeds catalog rows directly through the repositories.

#![allow(dead_code)]

use std::net::IpAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use coursegate_api::auth::jwt::{generate_access_token, JwtConfig};
use coursegate_api::config::ServerConfig;
use coursegate_api::router::build_app_router;
use coursegate_api::state::AppState;
use coursegate_core::roles::{ROLE_ADMIN, ROLE_LEARNER};
use coursegate_core::tier::Tier;
use coursegate_core::types::DbId;
use coursegate_db::models::course::{CreateCourse, CreateCourseModule, CreateLesson};
use coursegate_db::models::tier_purchase::CreateTierPurchase;
use coursegate_db::models::user::CreateUser;
use coursegate_db::repositories::{CourseRepo, LessonRepo, TierPurchaseRepo, UserRepo};

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: IpAddr::from([127, 0, 0, 1]),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        max_start_ahead_days: 365,
        jwt: JwtConfig {
            secret: "integration-test-secret".to_string(),
            access_token_expiry_mins: 15,
        },
    }
}

/// Build the full application router with all middleware layers.
pub fn build_test_app(pool: PgPool) -> Router {
    let config = test_config();
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
    };
    build_app_router(state, &config)
}

pub fn learner_token(user_id: DbId) -> String {
    generate_access_token(user_id, ROLE_LEARNER, &test_config().jwt).unwrap()
}

pub fn admin_token(user_id: DbId) -> String {
    generate_access_token(user_id, ROLE_ADMIN, &test_config().jwt).unwrap()
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

async fn send(
    app: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None, None).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::GET, uri, Some(token), None).await
}

pub async fn post_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::POST, uri, Some(token), None).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    send(app, Method::POST, uri, Some(token), Some(body)).await
}

pub async fn put_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    send(app, Method::PUT, uri, Some(token), Some(body)).await
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Seed data
// ---------------------------------------------------------------------------

pub async fn seed_user(pool: &PgPool, email: &str) -> DbId {
    let input = CreateUser {
        email: email.to_string(),
        display_name: email.to_string(),
        role: None,
    };
    UserRepo::create(pool, &input).await.unwrap().id
}

pub async fn grant_tier(pool: &PgPool, user_id: DbId, tier: Tier) {
    let input = CreateTierPurchase {
        user_id,
        tier_id: tier.level(),
        external_reference: None,
    };
    TierPurchaseRepo::create(pool, &input).await.unwrap();
}

/// Options for [`seed_course`].
pub struct CourseSeed {
    pub tier: Tier,
    pub lessons: usize,
    pub allow_day_choice: bool,
    pub max_enrollments: Option<i32>,
}

impl Default for CourseSeed {
    fn default() -> Self {
        Self {
            tier: Tier::Tier1,
            lessons: 4,
            allow_day_choice: true,
            max_enrollments: None,
        }
    }
}

/// Create a single-module course. Returns the course id and lesson ids in order.
pub async fn seed_course(pool: &PgPool, seed: CourseSeed) -> (DbId, Vec<DbId>) {
    let course = CourseRepo::create(
        pool,
        &CreateCourse {
            title: "Ownership in Practice".to_string(),
            description: None,
            tier_id: seed.tier.level(),
            min_duration_weeks: None,
            max_lessons_per_week: None,
            allow_day_choice: Some(seed.allow_day_choice),
            is_capped: Some(seed.max_enrollments.is_some()),
            max_enrollments: seed.max_enrollments,
        },
    )
    .await
    .unwrap();
    let module = CourseRepo::create_module(
        pool,
        &CreateCourseModule {
            course_id: course.id,
            title: "Basics".to_string(),
            order_index: 0,
        },
    )
    .await
    .unwrap();

    let mut lesson_ids = Vec::with_capacity(seed.lessons);
    for i in 0..seed.lessons {
        let lesson = LessonRepo::create(
            pool,
            &CreateLesson {
                module_id: module.id,
                title: format!("Lesson {i}"),
                order_index: i as i32,
                unlock_offset: None,
                duration_secs: Some(900),
            },
        )
        .await
        .unwrap();
        lesson_ids.push(lesson.id);
    }
    (course.id, lesson_ids)
}
