//! HTTP clients for the services leads are enriched from.
//!
//! - [`GenderizeClient`]: genderize-compatible name → gender inference
//! - [`WorkflowClient`]: starts the email-verification workflow and waits
//!   for its boolean result

mod genderize;
mod workflow;

use std::time::Duration;

use leadkit_shared::{LeadkitError, Result};
use reqwest::Client;
use url::Url;

pub use genderize::GenderizeClient;
pub use workflow::{WorkflowClient, workflow_id};

/// User-Agent string for outbound requests.
const USER_AGENT: &str = concat!("leadkit/", env!("CARGO_PKG_VERSION"));

/// Build a reqwest client with the shared user agent and a request timeout.
fn build_client(timeout_secs: u64) -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| LeadkitError::Network(format!("failed to build HTTP client: {e}")))
}

/// Parse a configured base URL, dropping any trailing slash so paths can
/// be appended with `format!`.
fn parse_base_url(raw: &str, setting: &str) -> Result<String> {
    let url = Url::parse(raw)
        .map_err(|e| LeadkitError::config(format!("invalid {setting} `{raw}`: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(LeadkitError::config(format!(
            "invalid {setting} `{raw}`: expected an http(s) URL"
        )));
    }
    Ok(url.as_str().trim_end_matches('/').to_string())
}
