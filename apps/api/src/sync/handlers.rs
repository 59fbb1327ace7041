use axum::{
    extract::State,
    http::{header, HeaderMap},
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};

use crate::drive::DriveClient;
use crate::errors::AppError;
use crate::state::AppState;
use crate::sync::{self, RestoreOutcome};

/// POST /api/v1/sync/backup
pub async fn handle_backup(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Value>, AppError> {
    let drive = DriveClient::new(bearer_token(&headers)?);
    sync::backup(&state.profiles, &drive).await?;
    Ok(Json(json!({ "status": "ok", "backedUpAt": Utc::now() })))
}

/// POST /api/v1/sync/restore
pub async fn handle_restore(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<RestoreOutcome>, AppError> {
    let drive = DriveClient::new(bearer_token(&headers)?);
    let outcome = sync::restore(&state.profiles, &drive).await?;
    Ok(Json(outcome))
}

/// The Google access token arrives per request; acquisition, consent, and
/// refresh all live in the UI's OAuth flow.
fn bearer_token(headers: &HeaderMap) -> Result<String, AppError> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .ok_or(AppError::Unauthorized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token_extracted() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer ya29.token"),
        );
        assert_eq!(bearer_token(&headers).unwrap(), "ya29.token");
    }

    #[test]
    fn test_missing_or_malformed_header_is_unauthorized() {
        assert!(matches!(
            bearer_token(&HeaderMap::new()),
            Err(AppError::Unauthorized)
        ));

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert!(matches!(
            bearer_token(&headers),
            Err(AppError::Unauthorized)
        ));
    }
}
