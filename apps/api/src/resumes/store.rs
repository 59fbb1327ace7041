use chrono::Utc;
use serde_json::Value;
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::resume::ResumeRow;

/// Inserts a new resume holding a deep copy of the given profile snapshot.
/// The snapshot is independent from then on; later profile edits never
/// propagate into it.
pub async fn create(pool: &SqlitePool, title: &str, snapshot: Value) -> Result<Uuid, sqlx::Error> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO resumes (id, title, generated_content, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
    )
    .bind(id)
    .bind(title)
    .bind(&snapshot)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    info!("Created resume {id} ('{title}')");
    Ok(id)
}

/// Returns all resumes, most recently updated first.
pub async fn list(pool: &SqlitePool) -> Result<Vec<ResumeRow>, sqlx::Error> {
    sqlx::query_as::<_, ResumeRow>("SELECT * FROM resumes ORDER BY updated_at DESC")
        .fetch_all(pool)
        .await
}

pub async fn get(pool: &SqlitePool, id: Uuid) -> Result<Option<ResumeRow>, sqlx::Error> {
    sqlx::query_as::<_, ResumeRow>("SELECT * FROM resumes WHERE id = ?1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Replaces the generated content in place. Returns `false` when the id does
/// not exist.
pub async fn update_content(
    pool: &SqlitePool,
    id: Uuid,
    content: &Value,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE resumes SET generated_content = ?1, updated_at = ?2 WHERE id = ?3")
        .bind(content)
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Stores tailored content together with the job description it targets.
pub async fn update_tailored(
    pool: &SqlitePool,
    id: Uuid,
    content: &Value,
    job_description: &str,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE resumes
        SET generated_content = ?1, target_job_description = ?2, updated_at = ?3
        WHERE id = ?4
        "#,
    )
    .bind(content)
    .bind(job_description)
    .bind(Utc::now())
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn rename(pool: &SqlitePool, id: Uuid, title: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE resumes SET title = ?1, updated_at = ?2 WHERE id = ?3")
        .bind(title)
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Deletes the row. A missing id is a no-op, not an error.
pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<(), sqlx::Error> {
    let result = sqlx::query("DELETE FROM resumes WHERE id = ?1")
        .bind(id)
        .execute(pool)
        .await?;
    debug!("Deleted resume {id} (existed: {})", result.rows_affected() > 0);
    Ok(())
}
