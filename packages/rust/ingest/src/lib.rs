//! CSV ingestion for lead uploads.
//!
//! Raw text flows through four stages:
//! 1. [`parser`] splits it into header→value rows
//! 2. [`mapper`] projects each row onto the lead schema
//! 3. [`validator`] collects every field-level failure
//! 4. [`build_record`] assembles the reviewable [`CsvLead`]
//!
//! Structural problems abort the parse; per-row problems are recorded on
//! the row and never stop the others.

pub mod mapper;
pub mod parser;
pub mod validator;

use leadkit_shared::{LeadInput, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

pub use mapper::{LeadField, MappedRow, map_row, normalize_header};
pub use parser::{RawRow, parse_rows};
pub use validator::{is_valid_email, is_valid_gender, normalize_gender, validate};

/// A parsed CSV row, valid or not, ready for review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvLead {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    /// Canonical long form when valid; the raw value when not.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    /// Always `errors.is_empty()`.
    pub is_valid: bool,
    pub errors: Vec<String>,
    /// Source line of the record, counting the header as line 1.
    pub row_index: u64,
}

/// Parse CSV text into one [`CsvLead`] per non-blank data row.
#[instrument(skip_all, fields(bytes = content.len()))]
pub fn parse_csv(content: &str) -> Result<Vec<CsvLead>> {
    let rows = parse_rows(content)?;

    let leads: Vec<CsvLead> = rows
        .iter()
        .map(|row| {
            let mapped = map_row(row);
            let errors = validate(&mapped);
            build_record(mapped, errors)
        })
        .collect();

    let valid = leads.iter().filter(|l| l.is_valid).count();
    info!(
        rows = leads.len(),
        valid,
        invalid = leads.len() - valid,
        "parsed lead CSV"
    );
    Ok(leads)
}

/// Combine a mapped row with its validation errors.
pub fn build_record(row: MappedRow, errors: Vec<String>) -> CsvLead {
    let gender = row.gender.map(|g| {
        if is_valid_gender(&g) {
            normalize_gender(&g)
        } else {
            g
        }
    });

    CsvLead {
        first_name: row.first_name,
        last_name: row.last_name,
        email: row.email,
        job_title: row.job_title,
        country_code: row.country_code,
        company_name: row.company_name,
        gender,
        is_valid: errors.is_empty(),
        errors,
        row_index: row.row_index,
    }
}

impl From<&CsvLead> for LeadInput {
    fn from(lead: &CsvLead) -> Self {
        Self {
            first_name: Some(lead.first_name.clone()),
            last_name: Some(lead.last_name.clone()),
            email: Some(lead.email.clone()),
            job_title: lead.job_title.clone(),
            country_code: lead.country_code.clone(),
            company_name: lead.company_name.clone(),
            gender: lead.gender.clone(),
        }
    }
}

/// Import candidates for every valid row, in row order.
pub fn valid_inputs(leads: &[CsvLead]) -> Vec<LeadInput> {
    leads
        .iter()
        .filter(|l| l.is_valid)
        .map(LeadInput::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::{
        EMAIL_INVALID, EMAIL_REQUIRED, FIRST_NAME_REQUIRED, GENDER_INVALID, LAST_NAME_REQUIRED,
    };
    use leadkit_shared::LeadkitError;

    #[test]
    fn parse_errors_surface() {
        assert!(matches!(parse_csv(""), Err(LeadkitError::EmptyInput)));
        assert!(matches!(parse_csv("   "), Err(LeadkitError::EmptyInput)));
        assert!(matches!(
            parse_csv("firstName,lastName,email"),
            Err(LeadkitError::NoData)
        ));
        let err = parse_csv("firstName,lastName,email\nJohn,Doe,john@example.com,Extra\n")
            .unwrap_err();
        assert!(err.to_string().starts_with("CSV parsing failed"));
    }

    #[test]
    fn full_valid_row() {
        let csv = "firstName,lastName,email,jobTitle,countryCode,companyName\n\
                   John,Doe,john.doe@example.com,Developer,US,Tech Corp";
        let leads = parse_csv(csv).unwrap();
        assert_eq!(
            leads,
            [CsvLead {
                first_name: "John".into(),
                last_name: "Doe".into(),
                email: "john.doe@example.com".into(),
                job_title: Some("Developer".into()),
                country_code: Some("US".into()),
                company_name: Some("Tech Corp".into()),
                gender: None,
                is_valid: true,
                errors: vec![],
                row_index: 2,
            }]
        );
    }

    #[test]
    fn missing_required_fields_marked_invalid() {
        let csv = "firstName,lastName,email\n,Smith,john@example.com\nJohn,,john@example.com\nJohn,Smith,";
        let leads = parse_csv(csv).unwrap();
        assert_eq!(leads.len(), 3);
        assert_eq!(leads[0].errors, [FIRST_NAME_REQUIRED]);
        assert_eq!(leads[1].errors, [LAST_NAME_REQUIRED]);
        assert_eq!(leads[2].errors, [EMAIL_REQUIRED]);
        assert!(leads.iter().all(|l| !l.is_valid));
    }

    #[test]
    fn whitespace_only_names_accumulate_errors() {
        let leads = parse_csv("firstName,lastName,email\n , ,invalid-email").unwrap();
        assert_eq!(leads.len(), 1);
        assert_eq!(
            leads[0].errors,
            [FIRST_NAME_REQUIRED, LAST_NAME_REQUIRED, EMAIL_INVALID]
        );
    }

    #[test]
    fn row_indices_follow_source_lines() {
        let csv = "firstName,lastName,email\n\
                   John,Doe,john@example.com\n\
                   ,,\n\
                   Jane,Smith,jane@example.com\n\
                   Bob,Johnson,bob@example.com";
        let leads = parse_csv(csv).unwrap();
        let indices: Vec<u64> = leads.iter().map(|l| l.row_index).collect();
        assert_eq!(indices, [2, 4, 5]);
        assert_eq!(leads[1].first_name, "Jane");
    }

    #[test]
    fn case_insensitive_headers() {
        let csv = "FIRSTNAME,Last Name,e_mail,JOB_TITLE\nJohn,Doe,john@example.com,Developer";
        let lead = &parse_csv(csv).unwrap()[0];
        assert_eq!(lead.first_name, "John");
        assert_eq!(lead.last_name, "Doe");
        assert_eq!(lead.email, "john@example.com");
        assert_eq!(lead.job_title.as_deref(), Some("Developer"));
        assert!(lead.is_valid);
    }

    #[test]
    fn blank_optionals_absent_and_valid() {
        let csv = "firstName,lastName,email,jobTitle,countryCode,companyName,gender\n\
                   John,Doe,john@example.com,,,,";
        let lead = &parse_csv(csv).unwrap()[0];
        assert_eq!(lead.job_title, None);
        assert_eq!(lead.country_code, None);
        assert_eq!(lead.company_name, None);
        assert_eq!(lead.gender, None);
        assert!(lead.is_valid);
    }

    #[test]
    fn gender_canonicalized_or_kept_verbatim() {
        let csv = "firstName,lastName,email,gender\n\
                   John,Doe,john@example.com,male\n\
                   Jane,Smith,jane@example.com,f\n\
                   Bob,Jones,bob@example.com,Invalid\n\
                   Alice,Brown,alice@example.com,";
        let leads = parse_csv(csv).unwrap();
        assert_eq!(leads[0].gender.as_deref(), Some("male"));
        assert_eq!(leads[1].gender.as_deref(), Some("female"));
        assert!(leads[1].is_valid);
        assert_eq!(leads[2].gender.as_deref(), Some("Invalid"));
        assert_eq!(leads[2].errors, [GENDER_INVALID]);
        assert_eq!(leads[3].gender, None);
        assert!(leads[3].is_valid);
    }

    #[test]
    fn quoted_values_and_extra_columns() {
        let csv = "firstName,lastName,email,jobTitle,notes\n\
                   \"John\",\"Doe\",\"john.doe@example.com\",\"Software Engineer\",\"met at expo, 2024\"";
        let lead = &parse_csv(csv).unwrap()[0];
        assert_eq!(lead.job_title.as_deref(), Some("Software Engineer"));
        assert!(lead.is_valid);
    }

    #[test]
    fn inch_mark_in_job_title_is_kept() {
        let csv = "firstName,lastName,email,jobTitle\n\
                   John,Doe,john@example.com,5\" monitor buyer\n\
                   Jane,Smith,jane@example.com,CTO";
        let leads = parse_csv(csv).unwrap();
        assert_eq!(leads.len(), 2);
        assert_eq!(leads[0].job_title.as_deref(), Some("5\" monitor buyer"));
        assert!(leads.iter().all(|l| l.is_valid));
        assert_eq!(leads[1].row_index, 3);
    }

    #[test]
    fn valid_inputs_keep_only_valid_rows() {
        let csv = "firstName,lastName,email\n\
                   John,Doe,john@example.com\n\
                   ,Smith,invalid-email\n\
                   Jane,Johnson,jane@example.com";
        let leads = parse_csv(csv).unwrap();
        let inputs = valid_inputs(&leads);
        assert_eq!(inputs.len(), 2);
        assert_eq!(inputs[1].first_name.as_deref(), Some("Jane"));
        assert_eq!(inputs[1].job_title, None);
    }

    #[test]
    fn csv_lead_serializes_camel_case_without_absent_fields() {
        let lead = &parse_csv("firstName,lastName,email\nJohn,Doe,john@example.com").unwrap()[0];
        let json = serde_json::to_value(lead).unwrap();
        assert_eq!(json["firstName"], "John");
        assert_eq!(json["isValid"], true);
        assert_eq!(json["rowIndex"], 2);
        assert!(json.get("jobTitle").is_none());
    }
}
