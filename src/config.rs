use std::time::Duration;

use anyhow::{bail, Context};
use axum_extra::extract::cookie::SameSite;
use serde::Deserialize;

pub const MEMORY_DATABASE_URL: &str = "memory";

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl DatabaseConfig {
    pub fn is_memory(&self) -> bool {
        self.url == MEMORY_DATABASE_URL
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub ttl_hours: i64,
    pub cookie_name: String,
    pub secure: bool,
    pub same_site: SameSite,
    pub domain: Option<String>,
}

/// Argon2id cost parameters used when hashing new passwords.
#[derive(Debug, Clone, Copy, Deserialize)]
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

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database: DatabaseConfig,
    pub session: SessionConfig,
    pub password: PasswordConfig,
    pub cors_allowed_origin: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8080,
            database: DatabaseConfig {
                url: MEMORY_DATABASE_URL.into(),
                max_connections: 10,
                acquire_timeout_secs: 10,
            },
            session: SessionConfig {
                ttl_hours: 24,
                cookie_name: "taskflow.sid".into(),
                secure: true,
                same_site: SameSite::None,
                domain: None,
            },
            password: PasswordConfig::default(),
            cors_allowed_origin: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();

        let database = DatabaseConfig {
            url: std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            max_connections: parse_env("DATABASE_MAX_CONNECTIONS")?
                .unwrap_or(defaults.database.max_connections),
            acquire_timeout_secs: parse_env("DATABASE_ACQUIRE_TIMEOUT_SECS")?
                .unwrap_or(defaults.database.acquire_timeout_secs),
        };

        let same_site = match std::env::var("SESSION_COOKIE_SAME_SITE") {
            Ok(v) => parse_same_site(&v)?,
            Err(_) => defaults.session.same_site,
        };
        let session = SessionConfig {
            ttl_hours: parse_env("SESSION_TTL_HOURS")?.unwrap_or(defaults.session.ttl_hours),
            cookie_name: std::env::var("SESSION_COOKIE_NAME")
                .unwrap_or(defaults.session.cookie_name),
            secure: parse_env("SESSION_COOKIE_SECURE")?.unwrap_or(defaults.session.secure),
            same_site,
            domain: std::env::var("SESSION_COOKIE_DOMAIN").ok().filter(|d| !d.is_empty()),
        };
        if session.ttl_hours <= 0 {
            bail!("SESSION_TTL_HOURS must be positive");
        }

        let password = PasswordConfig {
            memory_kib: parse_env("PASSWORD_MEMORY_KIB")?.unwrap_or(defaults.password.memory_kib),
            iterations: parse_env("PASSWORD_ITERATIONS")?.unwrap_or(defaults.password.iterations),
            parallelism: parse_env("PASSWORD_PARALLELISM")?
                .unwrap_or(defaults.password.parallelism),
        };

        Ok(Self {
            host: std::env::var("APP_HOST").unwrap_or(defaults.host),
            port: parse_env("APP_PORT")?.unwrap_or(defaults.port),
            database,
            session,
            password,
            cors_allowed_origin: std::env::var("CORS_ALLOWED_ORIGIN")
                .ok()
                .filter(|o| !o.is_empty()),
        })
    }
}

fn parse_env<T>(key: &str) -> anyhow::Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .with_context(|| format!("invalid value for {key}: {raw:?}")),
        Err(_) => Ok(None),
    }
}

pub(crate) fn parse_same_site(raw: &str) -> anyhow::Result<SameSite> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "none" => Ok(SameSite::None),
        "lax" => Ok(SameSite::Lax),
        "strict" => Ok(SameSite::Strict),
        other => bail!("invalid SESSION_COOKIE_SAME_SITE: {other:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_site_parsing_is_case_insensitive() {
        assert_eq!(parse_same_site("None").unwrap(), SameSite::None);
        assert_eq!(parse_same_site(" lax ").unwrap(), SameSite::Lax);
        assert_eq!(parse_same_site("STRICT").unwrap(), SameSite::Strict);
        assert!(parse_same_site("sometimes").is_err());
    }

    #[test]
    fn defaults_match_the_documented_cookie_policy() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.session.ttl_hours, 24);
        assert!(cfg.session.secure);
        assert_eq!(cfg.session.same_site, SameSite::None);
        assert!(cfg.database.is_memory());
    }
}
