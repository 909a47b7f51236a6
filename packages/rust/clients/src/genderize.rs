//! Client for genderize-compatible gender inference APIs.

use leadkit_shared::{GenderLookup, GenderizeConfig, LeadkitError, Result};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};

/// The subset of the genderize response we read.
#[derive(Debug, Deserialize)]
struct GenderizeResponse {
    #[serde(default)]
    gender: Option<String>,
}

/// `GET {base_url}/?name=<first name>` against a genderize-compatible API.
#[derive(Debug, Clone)]
pub struct GenderizeClient {
    client: Client,
    base_url: String,
}

impl GenderizeClient {
    pub fn new(config: &GenderizeConfig) -> Result<Self> {
        Ok(Self {
            client: crate::build_client(config.timeout_secs)?,
            base_url: crate::parse_base_url(&config.base_url, "genderize.base_url")?,
        })
    }
}

impl GenderLookup for GenderizeClient {
    #[instrument(skip(self), fields(base_url = %self.base_url))]
    async fn lookup(&self, first_name: &str) -> Result<Option<String>> {
        let url = format!("{}/", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("name", first_name)])
            .send()
            .await
            .map_err(|e| LeadkitError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LeadkitError::Lookup(format!(
                "API request failed: {}",
                status.as_u16()
            )));
        }

        let body: GenderizeResponse = response
            .json()
            .await
            .map_err(|e| LeadkitError::Lookup(format!("invalid response: {e}")))?;

        debug!(gender = ?body.gender, "genderize answered");
        Ok(body.gender)
    }
}
