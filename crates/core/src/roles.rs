//! Well-known role names carried in access-token claims.

/// Platform administrator. May toggle per-enrollment overrides.
pub const ROLE_ADMIN: &str = "admin";

/// Regular learner.
pub const ROLE_LEARNER: &str = "learner";
