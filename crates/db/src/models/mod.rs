//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Deserialize` create DTO for inserts

pub mod course;
pub mod enrollment;
pub mod progress;
pub mod tier_purchase;
pub mod user;
