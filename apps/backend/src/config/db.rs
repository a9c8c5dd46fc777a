use std::fmt;
use std::str::FromStr;

use crate::error::AppError;

/// Which durable store backs the rooms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    /// In-process maps; lost on restart
    Memory,
    /// SQLite file (or `sqlite::memory:`)
    Sqlite,
    /// PostgreSQL
    Postgres,
}

impl FromStr for StoreKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "mem" => Ok(StoreKind::Memory),
            "sqlite" => Ok(StoreKind::Sqlite),
            "postgres" | "postgresql" | "pg" => Ok(StoreKind::Postgres),
            other => Err(AppError::config(format!(
                "ARENA_STORE must be one of memory|sqlite|postgres, got '{other}'"
            ))),
        }
    }
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StoreKind::Memory => "memory",
            StoreKind::Sqlite => "sqlite",
            StoreKind::Postgres => "postgres",
        })
    }
}

/// Resolve the connection URL for a SQL store.
///
/// SQLite falls back to a local file so `ARENA_STORE=sqlite` works without
/// further setup. Postgres requires `DATABASE_URL`.
pub fn database_url(kind: StoreKind, configured: Option<&str>) -> Result<Option<String>, AppError> {
    match (kind, configured) {
        (StoreKind::Memory, _) => Ok(None),
        (StoreKind::Sqlite, Some(url)) => Ok(Some(url.to_string())),
        (StoreKind::Sqlite, None) => Ok(Some("sqlite://arena.db?mode=rwc".to_string())),
        (StoreKind::Postgres, Some(url)) if url.starts_with("postgres") => Ok(Some(url.to_string())),
        (StoreKind::Postgres, Some(url)) => Err(AppError::config(format!(
            "DATABASE_URL must be a postgres URL when ARENA_STORE=postgres, got '{url}'"
        ))),
        (StoreKind::Postgres, None) => Err(AppError::config(
            "DATABASE_URL must be set when ARENA_STORE=postgres",
        )),
    }
}
