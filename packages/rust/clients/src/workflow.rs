//! Client for the workflow engine that runs email verification.
//!
//! Each call starts one workflow execution and blocks until it completes:
//!
//! ```text
//! POST {base_url}/api/v1/namespaces/{namespace}/workflows/{workflow_type}/execute
//! {"workflowId": "verify-email-<lead id>-<uuid>", "taskQueue": "...", "args": ["<email>"]}
//! → {"result": true | false}
//! ```

use leadkit_shared::{EmailVerifier, LeadId, LeadkitError, Result, VerificationConfig};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use uuid::Uuid;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExecuteRequest<'a> {
    workflow_id: String,
    task_queue: &'a str,
    args: [&'a str; 1],
}

#[derive(Debug, Deserialize)]
struct ExecuteResponse {
    result: bool,
}

/// Unique execution id for verifying `lead_id`.
pub fn workflow_id(lead_id: LeadId) -> String {
    format!("verify-email-{lead_id}-{}", Uuid::now_v7())
}

#[derive(Debug, Clone)]
pub struct WorkflowClient {
    client: Client,
    execute_url: String,
    task_queue: String,
}

impl WorkflowClient {
    pub fn new(config: &VerificationConfig) -> Result<Self> {
        let base_url = crate::parse_base_url(&config.base_url, "verification.base_url")?;
        Ok(Self {
            client: crate::build_client(config.timeout_secs)?,
            execute_url: format!(
                "{base_url}/api/v1/namespaces/{}/workflows/{}/execute",
                config.namespace, config.workflow_type
            ),
            task_queue: config.task_queue.clone(),
        })
    }
}

impl EmailVerifier for WorkflowClient {
    #[instrument(skip(self, email))]
    async fn verify(&self, lead_id: LeadId, email: &str) -> Result<bool> {
        let request = ExecuteRequest {
            workflow_id: workflow_id(lead_id),
            task_queue: &self.task_queue,
            args: [email],
        };
        debug!(workflow_id = %request.workflow_id, "starting verification workflow");

        let response = self
            .client
            .post(&self.execute_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| LeadkitError::Network(format!("{}: {e}", self.execute_url)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LeadkitError::Verification(format!(
                "workflow {} failed: HTTP {status} {}",
                request.workflow_id,
                body.trim()
            )));
        }

        let body: ExecuteResponse = response.json().await.map_err(|e| {
            LeadkitError::Verification(format!("invalid workflow result: {e}"))
        })?;
        Ok(body.result)
    }
}
