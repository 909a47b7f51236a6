//! Field-level validation for mapped lead rows.
//!
//! Every rule runs; each failing rule contributes exactly one message, in
//! the order first name, last name, email, gender.

use std::sync::LazyLock;

use leadkit_shared::Gender;
use regex::Regex;

use crate::mapper::MappedRow;

pub const FIRST_NAME_REQUIRED: &str = "First name is required";
pub const LAST_NAME_REQUIRED: &str = "Last name is required";
pub const EMAIL_REQUIRED: &str = "Email is required";
pub const EMAIL_INVALID: &str = "Invalid email format";
pub const GENDER_INVALID: &str =
    "Invalid gender format. Valid values: male, female, unknown, m, f, u";

/// `local@domain.tld` with no whitespace or extra `@` in either part.
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex"));

/// Syntactic email check. Says nothing about deliverability.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// True for `male`, `female`, `unknown`, `m`, `f`, `u` in any case.
pub fn is_valid_gender(gender: &str) -> bool {
    gender.parse::<Gender>().is_ok()
}

/// Expand `m`/`f`/`u` to their long forms; lower-case everything else.
pub fn normalize_gender(gender: &str) -> String {
    match gender.parse::<Gender>() {
        Ok(g) => g.as_str().to_string(),
        Err(_) => gender.to_lowercase(),
    }
}

/// Collect every validation failure for `row`.
pub fn validate(row: &MappedRow) -> Vec<String> {
    let mut errors = Vec::new();

    if row.first_name.trim().is_empty() {
        errors.push(FIRST_NAME_REQUIRED.to_string());
    }
    if row.last_name.trim().is_empty() {
        errors.push(LAST_NAME_REQUIRED.to_string());
    }

    let email = row.email.trim();
    if email.is_empty() {
        errors.push(EMAIL_REQUIRED.to_string());
    } else if !is_valid_email(email) {
        errors.push(EMAIL_INVALID.to_string());
    }

    if let Some(gender) = &row.gender {
        if !is_valid_gender(gender) {
            errors.push(GENDER_INVALID.to_string());
        }
    }

    errors
}
