use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use anyhow::anyhow;
use serde_json::Value;

use crate::errors::AppError;
use crate::models::profile::{ContactPatch, Section, UserProfile};
use crate::state::AppState;

/// GET /api/v1/profile
/// Ensure-then-get: every entry point that needs profile data initializes
/// the singleton row first.
pub async fn handle_get_profile(
    State(state): State<AppState>,
) -> Result<Json<UserProfile>, AppError> {
    state.profiles.ensure_exists().await?;
    let profile = state
        .profiles
        .get()
        .await?
        .ok_or_else(|| AppError::Internal(anyhow!("profile missing after initialization")))?;
    Ok(Json(profile))
}

/// PATCH /api/v1/profile/contact
pub async fn handle_update_contact(
    State(state): State<AppState>,
    Json(patch): Json<ContactPatch>,
) -> Result<StatusCode, AppError> {
    state.profiles.update_contact(patch).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/v1/profile/sections/:section
pub async fn handle_replace_section(
    State(state): State<AppState>,
    Path(section): Path<String>,
    Json(mut value): Json<Value>,
) -> Result<StatusCode, AppError> {
    let section: Section = section.parse().map_err(AppError::Validation)?;

    if matches!(section, Section::Experience | Section::Volunteering) {
        strip_blank_achievements(&mut value);
    }

    state.profiles.replace_section(section, value).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/profile
/// Irreversible full data wipe; the profile is lazily re-created on the next
/// GET.
pub async fn handle_wipe(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    state.profiles.wipe_all().await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Blank achievement lines are draft-only UI state; drop them (and trim the
/// rest) before the section is persisted.
fn strip_blank_achievements(value: &mut Value) {
    let Some(items) = value.as_array_mut() else {
        return;
    };
    for item in items {
        let Some(achievements) = item.get_mut("achievements").and_then(Value::as_array_mut) else {
            continue;
        };
        *achievements = achievements
            .iter()
            .filter_map(|a| a.as_str())
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(|a| Value::String(a.to_string()))
            .collect();
    }
}
