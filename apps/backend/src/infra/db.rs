use std::future::Future;
use std::time::Duration;

use migration::{migrate, MigrationCommand};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection};
use tracing::{info, warn};

use crate::error::AppError;

/// Retry a connection attempt with fixed interval delays.
/// Returns the result of the last attempt after all retries are exhausted.
async fn retry_connection<T, F, Fut>(
    mut connect_fn: F,
    max_attempts: u32,
    interval: Duration,
) -> Result<T, AppError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
{
    let mut last_error = None;
    for attempt in 1..=max_attempts {
        match connect_fn().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                warn!(attempt, max_attempts, error = %e, "Database connection attempt failed");
                last_error = Some(e);
                if attempt < max_attempts {
                    tokio::time::sleep(interval).await;
                }
            }
        }
    }
    Err(last_error.unwrap_or_else(|| AppError::config("No database connection attempts made")))
}

fn is_sqlite_memory(url: &str) -> bool {
    url.starts_with("sqlite::memory:") || url.contains("mode=memory")
}

/// Open a connection pool. Does NOT run migrations.
pub async fn connect_db(url: &str) -> Result<DatabaseConnection, AppError> {
    let mut opt = ConnectOptions::new(url);
    opt.acquire_timeout(Duration::from_secs(5))
        .sqlx_logging(false);
    if is_sqlite_memory(url) {
        // Every in-memory connection is its own database.
        opt.min_connections(1).max_connections(1);
    }

    if url.starts_with("postgres") {
        retry_connection(
            || {
                let opt = opt.clone();
                async move {
                    Database::connect(opt)
                        .await
                        .map_err(|e| AppError::config(format!("failed to connect to Postgres: {e}")))
                }
            },
            5,
            Duration::from_millis(500),
        )
        .await
    } else {
        Database::connect(opt)
            .await
            .map_err(|e| AppError::config(format!("failed to open SQLite database: {e}")))
    }
}

/// Connect and bring the schema up to date.
pub async fn bootstrap_db(url: &str) -> Result<DatabaseConnection, AppError> {
    let conn = connect_db(url).await?;
    migrate(&conn, MigrationCommand::Up)
        .await
        .map_err(|e| AppError::config(format!("migrations failed: {e}")))?;
    info!(backend = ?conn.get_database_backend(), "Database ready");
    Ok(conn)
}
