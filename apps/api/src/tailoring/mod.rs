//! Tailoring: profile snapshot + job description in, rewritten content out.
//!
//! The rest of the system treats this as an opaque function behind the
//! `Tailor` trait: it either returns tailored content or fails, and failures
//! are terminal (the user re-triggers manually; no retry at this layer).

pub mod prompts;

use async_trait::async_trait;
use tracing::info;

use crate::errors::AppError;
use crate::llm_client::LlmClient;
use crate::models::profile::UserProfile;
use crate::models::resume::{TailoredContent, TailoredExperience};
use crate::tailoring::prompts::{build_tailoring_prompt, TAILORING_SYSTEM};

/// Carried in `AppState` as `Arc<dyn Tailor>`; swap implementations without
/// touching handlers.
#[async_trait]
pub trait Tailor: Send + Sync {
    async fn tailor(
        &self,
        profile: &UserProfile,
        job_description: &str,
    ) -> Result<TailoredContent, AppError>;
}

/// Production implementation backed by the LLM client.
pub struct LlmTailor {
    llm: LlmClient,
}

impl LlmTailor {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl Tailor for LlmTailor {
    async fn tailor(
        &self,
        profile: &UserProfile,
        job_description: &str,
    ) -> Result<TailoredContent, AppError> {
        let prompt = build_tailoring_prompt(profile, job_description);
        let content: TailoredContent = self
            .llm
            .call_json(&prompt, TAILORING_SYSTEM)
            .await
            .map_err(|e| AppError::Llm(e.to_string()))?;

        info!(
            "Tailored {} experience entries against the job description",
            content.experience.len()
        );
        Ok(content)
    }
}

/// Deterministic stand-in used when no API key is configured, so the rest of
/// the app keeps working in demos and local development.
pub struct MockTailor;

#[async_trait]
impl Tailor for MockTailor {
    async fn tailor(
        &self,
        profile: &UserProfile,
        job_description: &str,
    ) -> Result<TailoredContent, AppError> {
        let role = profile
            .experience
            .first()
            .map(|exp| exp.role.as_str())
            .unwrap_or("Professional");
        let jd_excerpt: String = job_description.chars().take(20).collect();

        Ok(TailoredContent {
            summary: format!("[MOCK] Results-oriented {role} tailored for: {jd_excerpt}..."),
            experience: profile
                .experience
                .iter()
                .map(|exp| TailoredExperience {
                    role: exp.role.clone(),
                    company: exp.company.clone(),
                    points: vec![
                        "[MOCK STAR] Achieved X by doing Y effectively.".to_string(),
                        "[MOCK STAR] Led initiative Z resulting in W improvement.".to_string(),
                        "[MOCK STAR] Collaborated with team to deliver quality code.".to_string(),
                    ],
                })
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    use crate::models::profile::ExperienceItem;

    #[tokio::test]
    async fn test_mock_tailor_mirrors_profile_experience() {
        let mut profile = UserProfile::empty(Utc::now());
        profile.experience.push(ExperienceItem {
            id: "exp-1".to_string(),
            role: "Data Analyst".to_string(),
            company: "Hudson's Bay".to_string(),
            city: "Toronto".to_string(),
            province: "ON".to_string(),
            country: "Canada".to_string(),
            start_date: "2021-02".to_string(),
            end_date: None,
            is_current: true,
            achievements: vec![],
        });

        let content = MockTailor
            .tailor(&profile, "Analytics role in retail")
            .await
            .unwrap();

        assert!(content.summary.contains("Data Analyst"));
        assert_eq!(content.experience.len(), 1);
        assert_eq!(content.experience[0].company, "Hudson's Bay");
        assert_eq!(content.experience[0].points.len(), 3);
    }

    #[tokio::test]
    async fn test_mock_tailor_with_empty_profile() {
        let profile = UserProfile::empty(Utc::now());
        let content = MockTailor.tailor(&profile, "Any job").await.unwrap();
        assert!(content.summary.contains("Professional"));
        assert!(content.experience.is_empty());
    }
}
