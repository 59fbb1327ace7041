use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// A named, independent snapshot derived from the profile.
///
/// `generated_content` starts as a wholesale clone of the profile document at
/// creation time and never tracks later profile edits. Expected keys mirror
/// the profile sections, plus an optional `summary` added by tailoring.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ResumeRow {
    pub id: Uuid,
    pub title: String,
    pub target_job_description: Option<String>,
    pub generated_content: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Structured output contract for the tailoring call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TailoredContent {
    pub summary: String,
    pub experience: Vec<TailoredExperience>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TailoredExperience {
    pub role: String,
    pub company: String,
    pub points: Vec<String>,
}
