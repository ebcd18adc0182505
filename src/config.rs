//! Service configuration, read from the environment.
//!
//! Every knob has a typed default, so a bare `cargo run` serves an in-memory
//! store on port 3000. A `.env` file is loaded by `main` before this runs.

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_SAVE_BODY_LIMIT_BYTES: usize = 8 * 1024 * 1024;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub port: u16,
    /// Postgres connection string. `None` selects the in-memory store.
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    /// Largest accepted request body; saves carry whole page sets.
    pub save_body_limit_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            database_url: None,
            db_max_connections: DEFAULT_DB_MAX_CONNECTIONS,
            save_body_limit_bytes: DEFAULT_SAVE_BODY_LIMIT_BYTES,
        }
    }
}

impl Config {
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            port: env_parse("PORT", DEFAULT_PORT),
            database_url: std::env::var("DATABASE_URL").ok().filter(|url| !url.trim().is_empty()),
            db_max_connections: env_parse("DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS),
            save_body_limit_bytes: env_parse("SAVE_BODY_LIMIT_BYTES", DEFAULT_SAVE_BODY_LIMIT_BYTES),
        }
    }
}

pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}
