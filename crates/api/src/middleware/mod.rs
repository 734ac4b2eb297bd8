//! Request extractors for identity ([`auth::AuthUser`]) and role checks
//! ([`rbac::RequireAdmin`]).

pub mod auth;
pub mod rbac;
