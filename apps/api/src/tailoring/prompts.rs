//! Prompt construction for the tailoring call.

use crate::models::profile::UserProfile;

/// System prompt enforcing JSON-only output.
pub const TAILORING_SYSTEM: &str = "You are an expert Canadian resume writer and career coach. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences.";

/// Builds the tailoring prompt from a profile snapshot and a job description.
///
/// Canadian resume standards: Canadian/British spelling, STAR-method bullet
/// points, no photos/age/marital status/street addresses, keywords from the
/// job description integrated naturally.
pub fn build_tailoring_prompt(profile: &UserProfile, job_description: &str) -> String {
    let skills = profile.skills.technical.join(", ");

    let experience = profile
        .experience
        .iter()
        .map(|exp| {
            let achievements = exp
                .achievements
                .iter()
                .map(|a| format!("  * {a}"))
                .collect::<Vec<_>>()
                .join("\n");
            format!(
                "- Role: {} at {} ({} to {})\n- Location: {}, {}\n- Achievements:\n{}",
                exp.role,
                exp.company,
                exp.start_date,
                exp.end_date.as_deref().unwrap_or("Present"),
                exp.city,
                exp.province,
                achievements,
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"Rewrite the candidate's experience to strictly match the provided job description, adhering to Canadian resume standards.

### Rules & Standards:
1. **Spelling**: Use strictly Canadian/British spelling (e.g., colour, centre, programme, analyze).
2. **Format**: Use the STAR method (Situation, Task, Action, Result) for all bullet points.
3. **Tone**: Professional, confident, but modest. Avoid hyperbole.
4. **Exclusions**: Do NOT include photos, age, marital status, or full street addresses (City/Province is sufficient).
5. **Keywords**: Naturally integrate keywords from the job description.

### Inputs:

**Job Description**:
{job_description}

**Candidate Profile**:
- Name: {name}
- Skills: {skills}
- Experience:
{experience}

### Output Format (JSON):
{{
    "summary": "A 2-3 sentence professional summary tailored to the job.",
    "experience": [
        {{
            "role": "Match from profile or adjust slightly for JD match",
            "company": "From profile",
            "points": ["STAR point 1", "STAR point 2", "STAR point 3"]
        }}
    ]
}}"#,
        name = profile.contact.full_name,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    use crate::models::profile::{ContactInfo, ExperienceItem};

    #[test]
    fn test_prompt_includes_profile_and_job_description() {
        let mut profile = UserProfile::empty(Utc::now());
        profile.contact = ContactInfo {
            full_name: "Wayne Gretzky".to_string(),
            ..ContactInfo::default()
        };
        profile.skills.technical = vec!["Rust".to_string(), "SQL".to_string()];
        profile.experience.push(ExperienceItem {
            id: "exp-1".to_string(),
            role: "Team Lead".to_string(),
            company: "Oilers Analytics".to_string(),
            city: "Edmonton".to_string(),
            province: "AB".to_string(),
            country: "Canada".to_string(),
            start_date: "2019-09".to_string(),
            end_date: None,
            is_current: true,
            achievements: vec!["Shipped the tracking platform".to_string()],
        });

        let prompt = build_tailoring_prompt(&profile, "Senior Rust Developer at a bank");

        assert!(prompt.contains("Wayne Gretzky"));
        assert!(prompt.contains("Rust, SQL"));
        assert!(prompt.contains("Oilers Analytics"));
        assert!(prompt.contains("2019-09 to Present"));
        assert!(prompt.contains("Senior Rust Developer at a bank"));
    }
}
