use anyhow::anyhow;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::profile::UserProfile;
use crate::models::resume::ResumeRow;
use crate::resumes::store;
use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateResumeRequest {
    pub title: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameRequest {
    pub title: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TailorRequest {
    pub job_description: String,
}

/// GET /api/v1/resumes
pub async fn handle_list(
    State(state): State<AppState>,
) -> Result<Json<Vec<ResumeRow>>, AppError> {
    Ok(Json(store::list(&state.db).await?))
}

/// POST /api/v1/resumes
/// Clones the current profile wholesale into a new, independent resume.
pub async fn handle_create(
    State(state): State<AppState>,
    Json(req): Json<CreateResumeRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    state.profiles.ensure_exists().await?;
    let profile = state
        .profiles
        .get()
        .await?
        .ok_or_else(|| AppError::Internal(anyhow!("profile missing after initialization")))?;

    let title = req
        .title
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| format!("Resume {}", Utc::now().format("%Y-%m-%d")));
    let snapshot = serde_json::to_value(&profile).map_err(anyhow::Error::from)?;

    let id = store::create(&state.db, &title, snapshot).await?;
    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

/// GET /api/v1/resumes/:id
pub async fn handle_get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ResumeRow>, AppError> {
    store::get(&state.db, id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Resume {id} not found")))
}

/// PUT /api/v1/resumes/:id/content
pub async fn handle_update_content(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(content): Json<Value>,
) -> Result<StatusCode, AppError> {
    if !store::update_content(&state.db, id, &content).await? {
        return Err(AppError::NotFound(format!("Resume {id} not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /api/v1/resumes/:id/title
pub async fn handle_rename(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<RenameRequest>,
) -> Result<StatusCode, AppError> {
    if !store::rename(&state.db, id, &req.title).await? {
        return Err(AppError::NotFound(format!("Resume {id} not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/resumes/:id
/// Deleting an unknown id is a no-op, not an error.
pub async fn handle_delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    store::delete(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/resumes/:id/tailor
/// Rewrites the resume against a job description. The snapshot stored in the
/// resume (not the live profile) is the source, so tailoring an old resume
/// does not pull in newer profile edits.
pub async fn handle_tailor(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<TailorRequest>,
) -> Result<Json<Value>, AppError> {
    if req.job_description.trim().is_empty() {
        return Err(AppError::Validation(
            "jobDescription must not be empty".to_string(),
        ));
    }

    let resume = store::get(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Resume {id} not found")))?;

    let source: UserProfile = serde_json::from_value(resume.generated_content.clone())
        .map_err(|e| AppError::Validation(format!("resume content is not a profile snapshot: {e}")))?;

    let tailored = state.tailor.tailor(&source, &req.job_description).await?;

    // Merge the AI result over the existing snapshot: summary and the
    // rewritten experience list replace; everything else stays.
    let mut content = resume.generated_content;
    content["summary"] = json!(tailored.summary);
    content["experience"] = serde_json::to_value(&tailored.experience).map_err(anyhow::Error::from)?;

    store::update_tailored(&state.db, id, &content, &req.job_description).await?;
    Ok(Json(content))
}
