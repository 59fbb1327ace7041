//! Google Drive appDataFolder client, the single remote collaborator.
//!
//! One well-known JSON file mirrors the local profile. The file is always
//! addressed by a query on its fixed name; its Drive id is never cached, so
//! every save or load starts with a fresh lookup.

use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::debug;

const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";
const DRIVE_UPLOAD_BASE: &str = "https://www.googleapis.com/upload/drive/v3";

/// Fixed name of the backup file inside the appDataFolder.
pub const BACKUP_FILE_NAME: &str = "user_profile.json";

const MULTIPART_BOUNDARY: &str = "mapleleaf_profile_boundary";

#[derive(Debug, Error)]
pub enum DriveError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Drive API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<FileRef>,
}

#[derive(Debug, Deserialize)]
struct FileRef {
    id: String,
}

#[derive(Debug, Deserialize)]
struct DriveApiError {
    error: DriveApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct DriveApiErrorBody {
    message: String,
}

/// Client for the per-application private storage area of a Google Drive
/// account. Holds a bearer token supplied by the caller; token acquisition
/// and refresh are entirely external.
#[derive(Clone)]
pub struct DriveClient {
    http: Client,
    access_token: String,
    api_base: String,
    upload_base: String,
}

impl DriveClient {
    pub fn new(access_token: String) -> Self {
        Self {
            http: Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("Failed to build HTTP client"),
            access_token,
            api_base: DRIVE_API_BASE.to_string(),
            upload_base: DRIVE_UPLOAD_BASE.to_string(),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_base_urls(access_token: &str, api_base: &str, upload_base: &str) -> Self {
        Self {
            http: Client::new(),
            access_token: access_token.to_string(),
            api_base: api_base.trim_end_matches('/').to_string(),
            upload_base: upload_base.trim_end_matches('/').to_string(),
        }
    }

    /// Looks up the non-trashed backup file by its fixed name.
    /// Returns `None` when no backup exists yet.
    pub async fn find_file_id(&self) -> Result<Option<String>, DriveError> {
        let query = format!(
            "name = '{BACKUP_FILE_NAME}' and 'appDataFolder' in parents and trashed = false"
        );

        let response = self
            .http
            .get(format!("{}/files", self.api_base))
            .query(&[("q", query.as_str()), ("spaces", "appDataFolder")])
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        let response = check(response).await?;

        let list: FileList = response.json().await?;
        Ok(list.files.into_iter().next().map(|f| f.id))
    }

    /// Uploads the profile document, overwriting the existing backup in place
    /// or creating it with a single multipart request. Wholesale overwrite:
    /// no etag and no version check, so concurrent saves from two sessions are a
    /// lost-update race, accepted as a product limitation.
    pub async fn save_profile(&self, profile: &Value) -> Result<(), DriveError> {
        let content = serde_json::to_string(profile)?;

        match self.find_file_id().await? {
            Some(file_id) => {
                debug!("Overwriting existing Drive backup {file_id}");
                let response = self
                    .http
                    .patch(format!(
                        "{}/files/{file_id}?uploadType=media",
                        self.upload_base
                    ))
                    .bearer_auth(&self.access_token)
                    .header("Content-Type", "application/json")
                    .body(content)
                    .send()
                    .await?;
                check(response).await?;
            }
            None => {
                debug!("Creating new Drive backup file");
                let metadata = json!({
                    "name": BACKUP_FILE_NAME,
                    "parents": ["appDataFolder"],
                });

                // Metadata and content in one multipart/related request.
                let body = format!(
                    "--{b}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{meta}\r\n\
                     --{b}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{content}\r\n\
                     --{b}--",
                    b = MULTIPART_BOUNDARY,
                    meta = metadata,
                );

                let response = self
                    .http
                    .post(format!("{}/files?uploadType=multipart", self.upload_base))
                    .bearer_auth(&self.access_token)
                    .header(
                        "Content-Type",
                        format!("multipart/related; boundary={MULTIPART_BOUNDARY}"),
                    )
                    .body(body)
                    .send()
                    .await?;
                check(response).await?;
            }
        }

        Ok(())
    }

    /// Downloads and parses the backup file. A missing file is `Ok(None)`,
    /// not an error; callers show "no backup found" instead of "sync
    /// failed". No schema validation happens here; the restore orchestration
    /// normalizes the payload before trusting its shape.
    pub async fn load_profile(&self) -> Result<Option<Value>, DriveError> {
        let Some(file_id) = self.find_file_id().await? else {
            return Ok(None);
        };

        let response = self
            .http
            .get(format!("{}/files/{file_id}?alt=media", self.api_base))
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        let response = check(response).await?;

        let text = response.text().await?;
        Ok(Some(serde_json::from_str(&text)?))
    }
}

/// Maps a non-2xx response to `DriveError::Api`, preferring the message from
/// the Drive error body when it parses.
async fn check(response: Response) -> Result<Response, DriveError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<DriveApiError>(&body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| {
            if body.is_empty() {
                status.to_string()
            } else {
                body
            }
        });

    Err(DriveError::Api {
        status: status.as_u16(),
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> DriveClient {
        DriveClient::with_base_urls("test-token", &server.uri(), &server.uri())
    }

    fn file_list(ids: &[&str]) -> Value {
        json!({ "files": ids.iter().map(|id| json!({"id": id})).collect::<Vec<_>>() })
    }

    #[tokio::test]
    async fn test_find_file_id_returns_none_for_empty_folder() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/files"))
            .and(query_param("spaces", "appDataFolder"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"files": []})))
            .mount(&server)
            .await;

        assert_eq!(client(&server).find_file_id().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_load_profile_missing_file_is_not_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/files"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"files": []})))
            .mount(&server)
            .await;

        assert!(client(&server).load_profile().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_load_profile_downloads_located_file() {
        let server = MockServer::start().await;
        let backup = json!({"contact": {"fullName": "Anne Shirley"}, "skills": ["Python"]});

        Mock::given(method("GET"))
            .and(path("/files"))
            .and(query_param("spaces", "appDataFolder"))
            .respond_with(ResponseTemplate::new(200).set_body_json(file_list(&["abc123"])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/files/abc123"))
            .and(query_param("alt", "media"))
            .and(header("Authorization", "Bearer test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(backup.clone()))
            .mount(&server)
            .await;

        let loaded = client(&server).load_profile().await.unwrap().unwrap();
        assert_eq!(loaded, backup);
    }

    #[tokio::test]
    async fn test_save_profile_overwrites_existing_file_in_place() {
        let server = MockServer::start().await;
        let profile = json!({"contact": {"fullName": "Terry Fox"}});

        Mock::given(method("GET"))
            .and(path("/files"))
            .respond_with(ResponseTemplate::new(200).set_body_json(file_list(&["abc123"])))
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path("/files/abc123"))
            .and(query_param("uploadType", "media"))
            .and(body_string_contains("Terry Fox"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "abc123"})))
            .expect(1)
            .mount(&server)
            .await;

        client(&server).save_profile(&profile).await.unwrap();
    }

    #[tokio::test]
    async fn test_save_profile_creates_file_via_multipart_when_absent() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/files"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"files": []})))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/files"))
            .and(query_param("uploadType", "multipart"))
            .and(body_string_contains(BACKUP_FILE_NAME))
            .and(body_string_contains("appDataFolder"))
            .and(body_string_contains("Marguerite"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "new-id"})))
            .expect(1)
            .mount(&server)
            .await;

        client(&server)
            .save_profile(&json!({"contact": {"fullName": "Marguerite"}}))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_api_error_message_extracted_from_error_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/files"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": {"code": 401, "message": "Invalid Credentials"}
            })))
            .mount(&server)
            .await;

        let err = client(&server).find_file_id().await.unwrap_err();
        match err {
            DriveError::Api { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "Invalid Credentials");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_api_error_with_unparseable_body_keeps_raw_text() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/files"))
            .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
            .mount(&server)
            .await;

        let err = client(&server).find_file_id().await.unwrap_err();
        match err {
            DriveError::Api { status, message } => {
                assert_eq!(status, 503);
                assert_eq!(message, "upstream unavailable");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }
}
