use anyhow::Result;
use serde_json::Value;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use tracing::info;

use crate::models::profile::normalize_skills;

/// Current schema version. Bumping this requires a matching transform in
/// `migrate_profiles` for every row persisted under an older version.
pub const SCHEMA_VERSION: i64 = 2;

/// Creates and returns a SQLite connection pool.
pub async fn create_pool(database_url: &str) -> Result<SqlitePool> {
    info!("Opening SQLite database...");

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    info!("SQLite connection pool established");
    Ok(pool)
}

/// Creates tables and runs pending profile migrations. Must complete before
/// any read is served; callers see only the current document shape.
pub async fn init(pool: &SqlitePool) -> Result<()> {
    create_tables(pool).await?;
    migrate_profiles(pool).await?;
    Ok(())
}

async fn create_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS user_profile (
            id             INTEGER PRIMARY KEY CHECK (id = 1),
            document       TEXT NOT NULL,
            schema_version INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS resumes (
            id                     TEXT PRIMARY KEY,
            title                  TEXT NOT NULL,
            target_job_description TEXT,
            generated_content      TEXT NOT NULL,
            created_at             TEXT NOT NULL,
            updated_at             TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_resumes_updated_at ON resumes(updated_at)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Applies pending per-row schema transforms to persisted profiles.
///
/// v1 -> v2: `skills` changes from a flat list of strings to
/// `{technical, soft}`. The transform is pure and idempotent, so re-running
/// it against an already-migrated document is a no-op.
async fn migrate_profiles(pool: &SqlitePool) -> Result<()> {
    let stale: Vec<(i64, Value, i64)> = sqlx::query_as(
        "SELECT id, document, schema_version FROM user_profile WHERE schema_version < ?1",
    )
    .bind(SCHEMA_VERSION)
    .fetch_all(pool)
    .await?;

    for (id, mut document, version) in stale {
        if version < 2 {
            if let Some(skills) = document.get("skills") {
                document["skills"] = normalize_skills(skills);
            }
        }

        sqlx::query("UPDATE user_profile SET document = ?1, schema_version = ?2 WHERE id = ?3")
            .bind(&document)
            .bind(SCHEMA_VERSION)
            .bind(id)
            .execute(pool)
            .await?;

        info!("Migrated profile row {id} from schema v{version} to v{SCHEMA_VERSION}");
    }

    Ok(())
}

/// In-memory pool for tests. A single connection, because every connection
/// to `sqlite::memory:` opens a distinct database.
#[cfg(test)]
pub async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory SQLite pool");
    init(&pool).await.expect("schema init");
    pool
}
