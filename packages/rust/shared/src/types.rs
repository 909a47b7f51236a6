//! Core domain types for leads and import/enrichment reports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Store-assigned lead identifier.
pub type LeadId = i64;

// ---------------------------------------------------------------------------
// Gender
// ---------------------------------------------------------------------------

/// Canonical gender values stored on a lead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Unknown,
}

impl Gender {
    /// Long lower-case form (`male`, `female`, `unknown`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
            Self::Unknown => "unknown",
        }
    }

    /// Map an inference-service answer onto a stored value.
    /// Anything other than exactly `male` or `female` becomes [`Gender::Unknown`].
    pub fn from_inferred(answer: Option<&str>) -> Self {
        match answer {
            Some("male") => Self::Male,
            Some("female") => Self::Female,
            _ => Self::Unknown,
        }
    }
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Gender {
    type Err = String;

    /// Accepts `male`, `female`, `unknown`, `m`, `f`, `u` in any case.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "male" | "m" => Ok(Self::Male),
            "female" | "f" => Ok(Self::Female),
            "unknown" | "u" => Ok(Self::Unknown),
            _ => Err(format!("unrecognized gender: {s}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Lead records
// ---------------------------------------------------------------------------

/// A persisted lead as returned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: LeadId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    /// Last generated outreach message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// `None` until a verification workflow has run for this lead.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_verified: Option<bool>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Lead {
    /// `"first last"`, trimmed, for per-lead error reports.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// A lead ready to be inserted: required fields trimmed and non-empty,
/// optional fields trimmed with blanks collapsed to `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLead {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub job_title: Option<String>,
    pub country_code: Option<String>,
    pub company_name: Option<String>,
    pub gender: Option<String>,
}

impl NewLead {
    /// Build a lead with only the required fields set.
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into().trim().to_string(),
            last_name: last_name.into().trim().to_string(),
            email: email.into().trim().to_string(),
            job_title: None,
            country_code: None,
            company_name: None,
            gender: None,
        }
    }

    /// Duplicate-detection key for this lead.
    pub fn dedup_key(&self) -> String {
        dedup_key(&self.first_name, &self.last_name)
    }
}

/// Partial update applied to an existing lead. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeadUpdate {
    pub first_name: Option<String>,
    pub email: Option<String>,
}

/// A candidate submitted for bulk import. Every field may be missing;
/// structural validity is decided by [`LeadInput::to_new_lead`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
}

impl LeadInput {
    /// Convert to an insertable lead, or `None` if first name, last name,
    /// or email is missing or blank after trimming.
    pub fn to_new_lead(&self) -> Option<NewLead> {
        let first_name = non_blank(&self.first_name)?;
        let last_name = non_blank(&self.last_name)?;
        let email = non_blank(&self.email)?;

        Some(NewLead {
            first_name,
            last_name,
            email,
            job_title: non_blank(&self.job_title),
            country_code: non_blank(&self.country_code),
            company_name: non_blank(&self.company_name),
            gender: non_blank(&self.gender),
        })
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

/// Duplicate-detection key: lower-cased, trimmed `first + "_" + last`.
pub fn dedup_key(first_name: &str, last_name: &str) -> String {
    format!(
        "{}_{}",
        first_name.trim().to_lowercase(),
        last_name.trim().to_lowercase()
    )
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// Summary returned by a bulk import.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResult {
    /// Candidates persisted successfully.
    pub imported_count: usize,
    /// Candidates whose name pair already existed in the store.
    pub duplicates_skipped: usize,
    /// Candidates rejected before duplicate detection.
    pub invalid_leads: usize,
    /// Persistence failures, in input order.
    pub errors: Vec<ImportFailure>,
}

/// A candidate that passed validation and dedup but failed to persist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportFailure {
    pub lead: LeadInput,
    pub error: String,
}

/// A per-lead failure during an enrichment action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadError {
    pub lead_id: LeadId,
    pub lead_name: String,
    pub error: String,
}

impl LeadError {
    pub fn new(lead: &Lead, error: impl std::fmt::Display) -> Self {
        Self {
            lead_id: lead.id,
            lead_name: lead.display_name(),
            error: error.to_string(),
        }
    }
}
