//! Database module for SQLite persistence.
//!
//! SQLite is the only state shared between the reconciler and the query API.

mod repository;

pub use repository::*;

use std::future::Future;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use crate::errors::AppError;

/// Upper bound for a single store operation.
pub const STORE_TIMEOUT: Duration = Duration::from_secs(15);

/// Initialize the database connection pool and create the schema.
pub async fn init_database(db_path: &Path) -> Result<SqlitePool, sqlx::Error> {
    // Ensure the parent directory exists
    if let Some(parent) = db_path.parent() {
        tokio::fs::create_dir_all(parent).await.ok();
    }

    let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

    let options = SqliteConnectOptions::from_str(&db_url)?
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
        .busy_timeout(Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    create_schema(&pool).await?;

    Ok(pool)
}

/// Create tables and indexes if they don't exist.
async fn create_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS articles (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            id TEXT NOT NULL UNIQUE,
            external_id TEXT NOT NULL,
            team_id TEXT NOT NULL,
            opta_match_id TEXT,
            title TEXT NOT NULL,
            kind TEXT NOT NULL,
            teaser TEXT,
            content TEXT NOT NULL,
            url TEXT NOT NULL,
            image_url TEXT NOT NULL,
            gallery_urls TEXT NOT NULL,
            video_url TEXT,
            published TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS idx_articles_external_id ON articles(external_id);
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Run a store operation under [`STORE_TIMEOUT`].
pub(crate) async fn with_timeout<T, F>(operation: &str, fut: F) -> Result<T, AppError>
where
    F: Future<Output = Result<T, AppError>>,
{
    bounded(STORE_TIMEOUT, operation, fut).await
}

async fn bounded<T, F>(limit: Duration, operation: &str, fut: F) -> Result<T, AppError>
where
    F: Future<Output = Result<T, AppError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            tracing::error!("Store operation '{}' exceeded {:?}", operation, limit);
            Err(AppError::Store(format!(
                "{} timed out after {} seconds",
                operation,
                limit.as_secs()
            )))
        }
    }
}
