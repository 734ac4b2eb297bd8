//! User entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use coursegate_core::types::{DbId, Timestamp};

/// A user row from the `users` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: DbId,
    pub email: String,
    pub display_name: String,
    /// `admin` or `learner`.
    pub role: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new user.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUser {
    pub email: String,
    pub display_name: String,
    /// Defaults to `learner` if omitted.
    pub role: Option<String>,
}
