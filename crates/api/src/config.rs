//! Runtime settings for the coursegate HTTP service.

use std::fmt::Display;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use crate::auth::jwt::JwtConfig;

const DEFAULT_CORS_ORIGIN: &str = "http://localhost:5173";

/// Server settings. Everything except the JWT secret has a local-development
/// default.
///
/// | Env Var                 | Default                 |
/// |-------------------------|-------------------------|
/// | `HOST`                  | `0.0.0.0`               |
/// | `PORT`                  | `3000`                  |
/// | `CORS_ORIGINS`          | `http://localhost:5173` |
/// | `REQUEST_TIMEOUT_SECS`  | `30`                    |
/// | `SHUTDOWN_TIMEOUT_SECS` | `30`                    |
/// | `MAX_START_AHEAD_DAYS`  | `365`                   |
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    /// Comma-separated in `CORS_ORIGINS`; blanks are dropped.
    pub cors_origins: Vec<String>,
    pub request_timeout_secs: u64,
    /// Upper bound on draining in-flight requests after a shutdown signal.
    pub shutdown_timeout_secs: u64,
    /// How far in the future a learner may place the start of a calendar.
    pub max_start_ahead_days: i64,
    pub jwt: JwtConfig,
}

impl ServerConfig {
    /// Load from the process environment. Panics on unparsable values.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok(), JwtConfig::from_env())
    }

    /// Load from an arbitrary key lookup. Panics on unparsable values.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>, jwt: JwtConfig) -> Self {
        let cors_origins = match lookup("CORS_ORIGINS") {
            Some(raw) => split_origins(&raw),
            None => vec![DEFAULT_CORS_ORIGIN.to_string()],
        };

        Self {
            host: setting(&lookup, "HOST", IpAddr::from([0, 0, 0, 0])),
            port: setting(&lookup, "PORT", 3000),
            cors_origins,
            request_timeout_secs: setting(&lookup, "REQUEST_TIMEOUT_SECS", 30),
            shutdown_timeout_secs: setting(&lookup, "SHUTDOWN_TIMEOUT_SECS", 30),
            max_start_ahead_days: setting(&lookup, "MAX_START_AHEAD_DAYS", 365),
            jwt,
        }
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn setting<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .unwrap_or_else(|e| panic!("{key} has an invalid value {raw:?}: {e}")),
        None => default,
    }
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
