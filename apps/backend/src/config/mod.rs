//! Application configuration loaded from environment variables.

pub mod db;

use std::env;
use std::str::FromStr;
use std::time::Duration;

pub use db::StoreKind;

pub use crate::domain::rules::RoomRules;
use crate::error::AppError;
use crate::repos::RetentionPolicy;

#[derive(Debug, Clone)]
pub struct ArenaConfig {
    pub host: String,
    pub port: u16,
    pub store: StoreKind,
    pub database_url: Option<String>,
    pub rules: RoomRules,
    /// Finished and idle rooms older than this are purged
    pub retention: Duration,
    /// A room worker with no commands and no timers retires after this
    pub worker_idle: Duration,
    pub cors_allowed_origins: Vec<String>,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
            store: StoreKind::Memory,
            database_url: None,
            rules: RoomRules::default(),
            retention: Duration::from_secs(24 * 3600),
            worker_idle: Duration::from_secs(300),
            cors_allowed_origins: Vec::new(),
        }
    }
}

impl ArenaConfig {
    pub fn retention_policy(&self) -> RetentionPolicy {
        RetentionPolicy {
            room_ttl: self.retention,
            ..RetentionPolicy::default()
        }
    }

    /// Load and validate all configuration from the process environment.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through `lookup`; unset variables take defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let host = lookup("ARENA_HOST").unwrap_or(defaults.host);
        let port = parse_var(&lookup, "ARENA_PORT")?.unwrap_or(defaults.port);

        let store = match lookup("ARENA_STORE") {
            Some(raw) => raw.parse::<StoreKind>()?,
            None => defaults.store,
        };
        let database_url = db::database_url(store, lookup("DATABASE_URL").as_deref())?;

        let secs = |name: &str, default: Duration| -> Result<Duration, AppError> {
            Ok(parse_var::<u64, _>(&lookup, name)?
                .map(Duration::from_secs)
                .unwrap_or(default))
        };

        let rules = RoomRules {
            turn_len: secs("ARENA_TURN_SECS", defaults.rules.turn_len)?,
            grace: secs("ARENA_GRACE_SECS", defaults.rules.grace)?,
            countdown: secs("ARENA_COUNTDOWN_SECS", defaults.rules.countdown)?,
            bot_delay: parse_var::<u64, _>(&lookup, "ARENA_BOT_DELAY_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.rules.bot_delay),
        };
        if rules.turn_len.is_zero() {
            return Err(AppError::config("ARENA_TURN_SECS must be greater than zero"));
        }

        let retention = parse_var::<u64, _>(&lookup, "ARENA_RETENTION_HOURS")?
            .map(|h| Duration::from_secs(h * 3600))
            .unwrap_or(defaults.retention);
        let worker_idle = secs("ARENA_WORKER_IDLE_SECS", defaults.worker_idle)?;

        let cors_allowed_origins = lookup("CORS_ALLOWED_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            host,
            port,
            store,
            database_url,
            rules,
            retention,
            worker_idle,
            cors_allowed_origins,
        })
    }
}

fn parse_var<T, F>(lookup: &F, name: &str) -> Result<Option<T>, AppError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(None),
        Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|_| {
            AppError::config(format!("{name} must be a valid number, got '{raw}'"))
        }),
    }
}
