//! Per-lead enrichment actions: gender inference, email verification,
//! and outreach message generation.
//!
//! Each action loads the requested leads in one query, then processes them
//! sequentially. A failure on one lead is recorded as a [`LeadError`] and
//! the rest still run.

use leadkit_shared::{
    EmailVerifier, Gender, GenderLookup, Lead, LeadError, LeadId, LeadStore, LeadkitError, Result,
};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::message::render_message;

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenderGuessResult {
    pub updated_count: usize,
    pub errors: Vec<LeadError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationOutcome {
    pub lead_id: LeadId,
    pub email_verified: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailVerificationResult {
    /// Leads whose verification workflow completed, whatever the verdict.
    pub verified_count: usize,
    pub results: Vec<VerificationOutcome>,
    pub errors: Vec<LeadError>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageGenerationResult {
    pub generated_count: usize,
    pub errors: Vec<LeadError>,
}

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

/// Load the leads named by `ids`, rejecting an empty request or one that
/// matches nothing.
async fn load_leads<S: LeadStore>(store: &S, ids: &[LeadId]) -> Result<Vec<Lead>> {
    if ids.is_empty() {
        return Err(LeadkitError::validation("leadIds must be a non-empty array"));
    }
    let leads = store.find_by_ids(ids).await?;
    if leads.is_empty() {
        return Err(LeadkitError::NotFound(
            "No leads found with the provided IDs".into(),
        ));
    }
    Ok(leads)
}

/// Infer and store a gender for each lead from its first name.
///
/// Anything the service answers other than `male` or `female` is stored
/// as `unknown`.
#[instrument(skip_all, fields(requested = ids.len()))]
pub async fn guess_genders<S: LeadStore, G: GenderLookup>(
    store: &S,
    lookup: &G,
    ids: &[LeadId],
) -> Result<GenderGuessResult> {
    let leads = load_leads(store, ids).await?;
    let mut result = GenderGuessResult::default();

    for lead in &leads {
        let outcome = async {
            let answer = lookup.lookup(&lead.first_name).await?;
            let gender = Gender::from_inferred(answer.as_deref());
            store.update_gender(lead.id, gender.as_str()).await
        }
        .await;

        match outcome {
            Ok(()) => result.updated_count += 1,
            Err(e) => {
                warn!(lead_id = lead.id, error = %e, "gender guess failed");
                result.errors.push(LeadError::new(lead, e));
            }
        }
    }

    info!(
        updated = result.updated_count,
        failed = result.errors.len(),
        "gender guessing complete"
    );
    Ok(result)
}

/// Run the verification workflow for each lead's email and store the verdict.
#[instrument(skip_all, fields(requested = ids.len()))]
pub async fn verify_emails<S: LeadStore, V: EmailVerifier>(
    store: &S,
    verifier: &V,
    ids: &[LeadId],
) -> Result<EmailVerificationResult> {
    let leads = load_leads(store, ids).await?;
    let mut result = EmailVerificationResult::default();

    for lead in &leads {
        let outcome = async {
            let verified = verifier.verify(lead.id, &lead.email).await?;
            store.update_email_verified(lead.id, verified).await?;
            Ok::<_, LeadkitError>(verified)
        }
        .await;

        match outcome {
            Ok(email_verified) => {
                result.verified_count += 1;
                result.results.push(VerificationOutcome {
                    lead_id: lead.id,
                    email_verified,
                });
            }
            Err(e) => {
                warn!(lead_id = lead.id, error = %e, "email verification failed");
                result.errors.push(LeadError::new(lead, e));
            }
        }
    }

    info!(
        verified = result.verified_count,
        failed = result.errors.len(),
        "email verification complete"
    );
    Ok(result)
}

/// Render `template` for each lead and store it as the lead's message.
#[instrument(skip_all, fields(requested = ids.len()))]
pub async fn generate_messages<S: LeadStore>(
    store: &S,
    template: &str,
    ids: &[LeadId],
) -> Result<MessageGenerationResult> {
    if ids.is_empty() {
        return Err(LeadkitError::validation("leadIds must be a non-empty array"));
    }
    if template.trim().is_empty() {
        return Err(LeadkitError::validation(
            "template must be a non-empty string",
        ));
    }

    let leads = load_leads(store, ids).await?;
    let mut result = MessageGenerationResult::default();

    for lead in &leads {
        let outcome = async {
            let message = render_message(template, lead)?;
            store.update_message(lead.id, &message).await
        }
        .await;

        match outcome {
            Ok(()) => result.generated_count += 1,
            Err(e) => {
                warn!(lead_id = lead.id, error = %e, "message generation failed");
                result.errors.push(LeadError::new(lead, e));
            }
        }
    }

    info!(
        generated = result.generated_count,
        failed = result.errors.len(),
        "message generation complete"
    );
    Ok(result)
}
