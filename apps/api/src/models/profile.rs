use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Fixed key for the singleton profile row. Exactly one row ever exists.
pub const PROFILE_ID: i64 = 1;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactInfo {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub province: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

/// Partial contact update. `None` fields are left untouched on merge.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactPatch {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub linkedin: Option<String>,
    pub website: Option<String>,
}

impl ContactInfo {
    pub fn apply(&mut self, patch: ContactPatch) {
        if let Some(v) = patch.full_name {
            self.full_name = v;
        }
        if let Some(v) = patch.email {
            self.email = v;
        }
        if let Some(v) = patch.phone {
            self.phone = v;
        }
        if let Some(v) = patch.city {
            self.city = v;
        }
        if let Some(v) = patch.province {
            self.province = v;
        }
        if let Some(v) = patch.linkedin {
            self.linkedin = Some(v);
        }
        if let Some(v) = patch.website {
            self.website = Some(v);
        }
    }
}

fn default_country() -> String {
    "Canada".to_string()
}

/// One work or volunteering entry. `id` is a client-generated opaque string
/// used only for UI identity, never as a database key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperienceItem {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub province: String,
    #[serde(default = "default_country")]
    pub country: String,
    #[serde(default)]
    pub start_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(default)]
    pub is_current: bool,
    #[serde(default)]
    pub achievements: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EducationItem {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub degree: String,
    #[serde(default)]
    pub institution: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
}

/// Skills in the current (schema v2) structured shape.
///
/// Deserialization also accepts the legacy v1 shape (a flat list of strings)
/// and coerces it to `{technical: <list>, soft: []}`. A flat list can still
/// reach readers via a restore from a backup written by an older app version,
/// so the coercion lives here rather than only in the migration step.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Skills {
    pub technical: Vec<String>,
    pub soft: Vec<String>,
}

impl<'de> Deserialize<'de> for Skills {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Shape {
            Structured {
                #[serde(default)]
                technical: Vec<String>,
                #[serde(default)]
                soft: Vec<String>,
            },
            Flat(Vec<String>),
        }

        match Shape::deserialize(deserializer)? {
            Shape::Structured { technical, soft } => Ok(Skills { technical, soft }),
            Shape::Flat(technical) => Ok(Skills {
                technical,
                soft: Vec::new(),
            }),
        }
    }
}

/// Rewrites a v1 flat skills list to the v2 structured shape. Already
/// structured values pass through unchanged, so the transform is idempotent.
pub fn normalize_skills(value: &Value) -> Value {
    match value {
        Value::Array(_) => json!({ "technical": value, "soft": [] }),
        _ => value.clone(),
    }
}

/// The single canonical record of a user's career data.
///
/// The SQLite row key (always `PROFILE_ID`) is deliberately not part of this
/// struct, so a serialized profile is already in the shape the remote backup
/// file expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default)]
    pub contact: ContactInfo,
    #[serde(default)]
    pub experience: Vec<ExperienceItem>,
    #[serde(default)]
    pub education: Vec<EducationItem>,
    #[serde(default)]
    pub volunteering: Vec<ExperienceItem>,
    /// Loosely typed until the shape stabilizes. Expected keys:
    /// `id`, `name`, `issuer`, `date`, optional `expiryDate`.
    #[serde(default)]
    pub certifications: Vec<Value>,
    #[serde(default)]
    pub skills: Skills,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    /// Empty scaffold written on first use, with `skills` already in the
    /// current structured shape.
    pub fn empty(now: DateTime<Utc>) -> Self {
        UserProfile {
            contact: ContactInfo::default(),
            experience: Vec::new(),
            education: Vec::new(),
            volunteering: Vec::new(),
            certifications: Vec::new(),
            skills: Skills::default(),
            updated_at: now,
        }
    }
}

/// A named top-level section of the profile document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Contact,
    Experience,
    Education,
    Volunteering,
    Certifications,
    Skills,
}

impl Section {
    pub fn as_str(&self) -> &'static str {
        match self {
            Section::Contact => "contact",
            Section::Experience => "experience",
            Section::Education => "education",
            Section::Volunteering => "volunteering",
            Section::Certifications => "certifications",
            Section::Skills => "skills",
        }
    }
}

impl std::str::FromStr for Section {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "contact" => Ok(Section::Contact),
            "experience" => Ok(Section::Experience),
            "education" => Ok(Section::Education),
            "volunteering" => Ok(Section::Volunteering),
            "certifications" => Ok(Section::Certifications),
            "skills" => Ok(Section::Skills),
            other => Err(format!("unknown section '{other}'")),
        }
    }
}
