//! Runtime configuration read from the environment (and `.env` when present).

use std::fmt;

const DEFAULT_DATABASE_URL: &str = "sqlite://data/quorum.db";
const DEFAULT_BIND: &str = "127.0.0.1:8083";
const DEFAULT_SESSION_MAX_AGE_HOURS: i64 = 24;
const DEFAULT_ADMIN_NICKNAME: &str = "admin";

/// Minimum length of a usable `SESSION_KEY`.
pub const SESSION_KEY_MIN_LEN: usize = 64;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind: String,
    pub session_max_age_hours: i64,
    pub session_key: Option<String>,
    pub admin_nickname: String,
}

#[derive(Debug)]
pub struct ConfigError {
    pub key: &'static str,
    pub value: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid value {:?} for {}", self.value, self.key)
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        // A missing .env file is fine.
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let session_max_age_hours = match lookup("QUORUM_SESSION_MAX_AGE_HOURS") {
            Some(raw) => match raw.trim().parse::<i64>() {
                Ok(hours) if hours > 0 => hours,
                _ => {
                    return Err(ConfigError {
                        key: "QUORUM_SESSION_MAX_AGE_HOURS",
                        value: raw,
                    });
                }
            },
            None => DEFAULT_SESSION_MAX_AGE_HOURS,
        };

        Ok(Config {
            database_url: lookup("QUORUM_DATABASE_URL")
                .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            bind: lookup("QUORUM_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string()),
            session_max_age_hours,
            session_key: lookup("SESSION_KEY"),
            admin_nickname: lookup("QUORUM_ADMIN_NICKNAME")
                .unwrap_or_else(|| DEFAULT_ADMIN_NICKNAME.to_string()),
        })
    }

    /// The session key if it is long enough to be used.
    pub fn usable_session_key(&self) -> Option<&str> {
        self.session_key
            .as_deref()
            .filter(|key| key.len() >= SESSION_KEY_MIN_LEN)
    }
}
