//! Header-to-field mapping for lead rows.
//!
//! Header names are compared after dropping every non-letter and
//! lower-casing, so `Job Title`, `JOBTITLE` and `job_title` all land on
//! [`LeadField::JobTitle`]. Columns that match no field are ignored.

use crate::parser::RawRow;

/// A column of the fixed lead schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LeadField {
    FirstName,
    LastName,
    Email,
    JobTitle,
    CountryCode,
    CompanyName,
    Gender,
}

impl LeadField {
    pub const ALL: [LeadField; 7] = [
        Self::FirstName,
        Self::LastName,
        Self::Email,
        Self::JobTitle,
        Self::CountryCode,
        Self::CompanyName,
        Self::Gender,
    ];

    /// Normalized header text this field matches.
    pub fn key(&self) -> &'static str {
        match self {
            Self::FirstName => "firstname",
            Self::LastName => "lastname",
            Self::Email => "email",
            Self::JobTitle => "jobtitle",
            Self::CountryCode => "countrycode",
            Self::CompanyName => "companyname",
            Self::Gender => "gender",
        }
    }

    /// Resolve a raw header, or `None` for unrecognized columns.
    pub fn from_header(header: &str) -> Option<Self> {
        let normalized = normalize_header(header);
        Self::ALL.into_iter().find(|f| f.key() == normalized)
    }

    fn slot(self) -> usize {
        self as usize
    }
}

/// Lower-case and keep ASCII letters only.
pub fn normalize_header(header: &str) -> String {
    header
        .to_lowercase()
        .chars()
        .filter(char::is_ascii_lowercase)
        .collect()
}

/// A row projected onto the lead schema, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappedRow {
    pub row_index: u64,
    /// Required fields are never absent; a missing column yields `""`.
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// Optional fields collapse blanks to `None`.
    pub job_title: Option<String>,
    pub country_code: Option<String>,
    pub company_name: Option<String>,
    pub gender: Option<String>,
}

/// Project a parsed row onto the lead schema.
///
/// The complete column lookup is built first; when several columns map to
/// the same field the right-most one wins.
pub fn map_row(row: &RawRow) -> MappedRow {
    let mut values: [Option<&str>; LeadField::ALL.len()] = [None; LeadField::ALL.len()];
    for (header, value) in &row.cells {
        if let Some(field) = LeadField::from_header(header) {
            values[field.slot()] = Some(value.trim());
        }
    }

    let required = |field: LeadField| values[field.slot()].unwrap_or_default().to_string();
    let optional = |field: LeadField| {
        values[field.slot()]
            .filter(|v| !v.is_empty())
            .map(String::from)
    };

    MappedRow {
        row_index: row.line,
        first_name: required(LeadField::FirstName),
        last_name: required(LeadField::LastName),
        email: required(LeadField::Email),
        job_title: optional(LeadField::JobTitle),
        country_code: optional(LeadField::CountryCode),
        company_name: optional(LeadField::CompanyName),
        gender: optional(LeadField::Gender),
    }
}
