//! Outreach message templates.
//!
//! Placeholders are `{{field}}` (inner whitespace allowed) naming a lead
//! field in camelCase: `firstName`, `lastName`, `email`, `jobTitle`,
//! `countryCode`, `companyName`, `gender`. Absent values render as empty.

use std::sync::LazyLock;

use leadkit_shared::{Lead, LeadkitError, Result};
use regex::{Captures, Regex};

static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*(\w+)\s*\}\}").expect("placeholder regex"));

/// Value of placeholder `name` for `lead`, or `None` if the name is not a lead field.
fn placeholder_value<'a>(lead: &'a Lead, name: &str) -> Option<&'a str> {
    let value = match name {
        "firstName" => Some(lead.first_name.as_str()),
        "lastName" => Some(lead.last_name.as_str()),
        "email" => Some(lead.email.as_str()),
        "jobTitle" => lead.job_title.as_deref(),
        "countryCode" => lead.country_code.as_deref(),
        "companyName" => lead.company_name.as_deref(),
        "gender" => lead.gender.as_deref(),
        _ => return None,
    };
    Some(value.unwrap_or(""))
}

/// Render `template` for `lead`.
pub fn render_message(template: &str, lead: &Lead) -> Result<String> {
    let mut unknown: Option<String> = None;

    let rendered = PLACEHOLDER_RE.replace_all(template, |caps: &Captures| {
        match placeholder_value(lead, &caps[1]) {
            Some(value) => value.to_string(),
            None => {
                unknown.get_or_insert_with(|| caps[1].to_string());
                String::new()
            }
        }
    });

    match unknown {
        Some(name) => Err(LeadkitError::template(format!(
            "unknown placeholder `{name}`"
        ))),
        None => Ok(rendered.into_owned()),
    }
}
