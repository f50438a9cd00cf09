use std::str::FromStr;

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub verified_ttl_minutes: i64,
    pub test_user_ttl_minutes: i64,
    pub leeway_seconds: u64,
}

/// One year.
const MAX_TTL_MINUTES: i64 = 60 * 24 * 365;

impl JwtConfig {
    /// Rejects settings that would make every token unusable.
    pub fn check(&self) -> anyhow::Result<()> {
        anyhow::ensure!(!self.secret.is_empty(), "JWT_SECRET must not be empty");
        for (key, minutes) in [
            ("JWT_TTL_MINUTES", self.ttl_minutes),
            ("JWT_VERIFIED_TTL_MINUTES", self.verified_ttl_minutes),
            ("JWT_TEST_USER_TTL_MINUTES", self.test_user_ttl_minutes),
        ] {
            anyhow::ensure!(
                (1..=MAX_TTL_MINUTES).contains(&minutes),
                "{key} must be between 1 and {MAX_TTL_MINUTES}, got {minutes}"
            );
        }
        Ok(())
    }
}

/// Argon2 cost parameters. Stored hashes embed their own parameters, so
/// changing these only affects newly hashed passwords.
#[derive(Debug, Clone, Deserialize)]
pub struct PasswordConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            memory_kib: argon2::Params::DEFAULT_M_COST,
            iterations: argon2::Params::DEFAULT_T_COST,
            parallelism: argon2::Params::DEFAULT_P_COST,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub password: PasswordConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is required")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET is required")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "blog-api".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "blog-api-users".into()),
            ttl_minutes: env_or("JWT_TTL_MINUTES", 15)?,
            verified_ttl_minutes: env_or("JWT_VERIFIED_TTL_MINUTES", 25)?,
            test_user_ttl_minutes: env_or("JWT_TEST_USER_TTL_MINUTES", 5)?,
            leeway_seconds: env_or("JWT_LEEWAY_SECONDS", 0)?,
        };
        jwt.check()?;

        let defaults = PasswordConfig::default();
        let password = PasswordConfig {
            memory_kib: env_or("PASSWORD_MEMORY_KIB", defaults.memory_kib)?,
            iterations: env_or("PASSWORD_ITERATIONS", defaults.iterations)?,
            parallelism: env_or("PASSWORD_PARALLELISM", defaults.parallelism)?,
        };

        Ok(Self {
            database_url,
            jwt,
            password,
        })
    }
}

/// Reads an optional numeric variable; a present but unparsable value is an error.
fn env_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{key}: invalid value {raw:?}: {e}")),
        Err(_) => Ok(default),
    }
}
