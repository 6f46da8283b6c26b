//! Environment-driven configuration for the EduLife backend.
//!
//! Each config struct has a `from_env()` constructor that reads its values
//! from environment variables with sensible development defaults. Secrets
//! (JWT secret, database URL) should always be set explicitly in production.
//!
//! # Environment Variables
//!
//! | Variable | Default | Used by |
//! |----------|---------|---------|
//! | `JWT_SECRET` | dev placeholder | [`JwtConfig`] |
//! | `JWT_ACCESS_EXPIRY` | 3600 (1 hour) | [`JwtConfig`] |
//! | `JWT_REFRESH_EXPIRY` | 604800 (7 days) | [`JwtConfig`] |
//! | `MAX_FAILED_LOGINS` | 5 | [`SecurityConfig`] |
//! | `LOCKOUT_DURATION_SECS` | 900 (15 min) | [`SecurityConfig`] |
//! | `LESSON_COMPLETION_THRESHOLD` | 0.9 | [`ProgressConfig`] |
//! | `PLATFORM_COMMISSION_RATE` | 0.30 | [`CommerceConfig`] |
//! | `DATABASE_URL` | (required) | [`DatabaseConfig`] |
//! | `DATABASE_MAX_CONNECTIONS` | 10 | [`DatabaseConfig`] |

use std::env;

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

#[derive(Clone, Debug)]
pub struct JwtConfig {
    pub secret: String,
    pub access_token_expiry: i64,
    pub refresh_token_expiry: i64,
}

impl JwtConfig {
    pub fn from_env() -> Self {
        Self {
            secret: env::var("JWT_SECRET")
                .unwrap_or_else(|_| "your-secret-key-change-in-production".to_string()),
            access_token_expiry: env_parse("JWT_ACCESS_EXPIRY", 3600), // 1 hour
            refresh_token_expiry: env_parse("JWT_REFRESH_EXPIRY", 604800), // 7 days
        }
    }
}

/// Failed-login lockout policy.
#[derive(Clone, Copy, Debug)]
pub struct SecurityConfig {
    /// Failed attempts before the account is locked.
    pub max_failed_logins: i32,
    /// How long a locked account stays locked, in seconds.
    pub lockout_duration_secs: i64,
}

impl SecurityConfig {
    pub fn from_env() -> Self {
        Self {
            max_failed_logins: env_parse("MAX_FAILED_LOGINS", 5),
            lockout_duration_secs: env_parse("LOCKOUT_DURATION_SECS", 900), // 15 minutes
        }
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_failed_logins: 5,
            lockout_duration_secs: 900,
        }
    }
}

/// Lesson completion policy.
#[derive(Clone, Copy, Debug)]
pub struct ProgressConfig {
    /// Watched ratio at which a lesson video counts as completed.
    pub completion_threshold: f64,
}

impl ProgressConfig {
    pub fn from_env() -> Self {
        Self {
            completion_threshold: env_parse("LESSON_COMPLETION_THRESHOLD", 0.9),
        }
    }
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            completion_threshold: 0.9,
        }
    }
}

/// Commerce policy: platform commission on course sales.
#[derive(Clone, Copy, Debug)]
pub struct CommerceConfig {
    /// Fraction of a gross course sale kept by the platform.
    pub commission_rate: f64,
}

impl CommerceConfig {
    pub fn from_env() -> Self {
        Self {
            commission_rate: env_parse("PLATFORM_COMMISSION_RATE", 0.30),
        }
    }
}

impl Default for CommerceConfig {
    fn default() -> Self {
        Self {
            commission_rate: 0.30,
        }
    }
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl DatabaseConfig {
    /// Reads the database configuration.
    ///
    /// # Panics
    ///
    /// Panics if `DATABASE_URL` is not set; the application cannot run
    /// without a database.
    pub fn from_env() -> Self {
        Self {
            url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            max_connections: env_parse("DATABASE_MAX_CONNECTIONS", 10),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_env() {
        let security = SecurityConfig::default();
        assert_eq!(security.max_failed_logins, 5);
        assert_eq!(security.lockout_duration_secs, 900);

        let progress = ProgressConfig::default();
        assert!((progress.completion_threshold - 0.9).abs() < f64::EPSILON);

        let commerce = CommerceConfig::default();
        assert!((commerce.commission_rate - 0.30).abs() < f64::EPSILON);
    }
}
