//! Bulk import orchestrator.
//!
//! 1. Partition candidates into structurally valid and invalid
//! 2. Look up existing name pairs in the store (one query)
//! 3. Drop candidates whose pair already exists
//! 4. Persist the rest one at a time, capturing per-lead failures
//!
//! Duplicates are detected only against the store, never within the
//! batch. The lookup and the inserts are not atomic: two concurrent imports
//! with overlapping candidates can both insert the same pair.

use std::collections::HashSet;

use leadkit_shared::{
    ImportFailure, ImportResult, LeadInput, LeadStore, LeadkitError, NewLead, Result, dedup_key,
};
use tracing::{debug, info, instrument, warn};

const NO_VALID_LEADS: &str =
    "No valid leads found. firstName, lastName, and email are required.";

/// Progress callback for long-running imports.
pub trait ImportProgress: Send + Sync {
    /// Called once duplicates are filtered, with the number of leads to persist.
    fn started(&self, total: usize);
    /// Called after each persistence attempt, successful or not.
    fn lead_processed(&self, current: usize, total: usize, name: &str);
    /// Called when the import completes.
    fn done(&self, result: &ImportResult);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ImportProgress for SilentProgress {
    fn started(&self, _total: usize) {}
    fn lead_processed(&self, _current: usize, _total: usize, _name: &str) {}
    fn done(&self, _result: &ImportResult) {}
}

/// Import `leads` into `store`, skipping any whose name pair already exists.
///
/// Fails when `leads` is empty, when no candidate has all required fields,
/// or when the duplicate lookup itself fails; per-lead insert failures are
/// reported in [`ImportResult::errors`].
#[instrument(skip_all, fields(candidates = leads.len()))]
pub async fn bulk_import<S: LeadStore>(
    store: &S,
    leads: &[LeadInput],
    progress: &dyn ImportProgress,
) -> Result<ImportResult> {
    if leads.is_empty() {
        return Err(LeadkitError::validation("leads must be a non-empty array"));
    }

    let valid: Vec<(&LeadInput, NewLead)> = leads
        .iter()
        .filter_map(|input| input.to_new_lead().map(|lead| (input, lead)))
        .collect();

    if valid.is_empty() {
        info!(invalid = leads.len(), "no structurally valid leads");
        return Err(LeadkitError::validation(NO_VALID_LEADS));
    }

    let mut result = ImportResult {
        invalid_leads: leads.len() - valid.len(),
        ..Default::default()
    };

    // --- Duplicate detection ---
    let pairs: Vec<(String, String)> = valid
        .iter()
        .map(|(_, lead)| (lead.first_name.clone(), lead.last_name.clone()))
        .collect();
    let existing: HashSet<String> = store
        .find_by_name_pairs(&pairs)
        .await?
        .iter()
        .map(|lead| dedup_key(&lead.first_name, &lead.last_name))
        .collect();

    let fresh: Vec<&(&LeadInput, NewLead)> = valid
        .iter()
        .filter(|(_, lead)| !existing.contains(&lead.dedup_key()))
        .collect();
    result.duplicates_skipped = valid.len() - fresh.len();
    debug!(
        existing = existing.len(),
        duplicates = result.duplicates_skipped,
        "duplicate check complete"
    );

    // --- Persistence ---
    let total = fresh.len();
    progress.started(total);

    for (i, (input, lead)) in fresh.into_iter().enumerate() {
        match store.create(lead).await {
            Ok(created) => {
                debug!(id = created.id, "lead imported");
                result.imported_count += 1;
            }
            Err(e) => {
                warn!(
                    first_name = %lead.first_name,
                    last_name = %lead.last_name,
                    error = %e,
                    "failed to import lead"
                );
                result.errors.push(ImportFailure {
                    lead: (*input).clone(),
                    error: e.to_string(),
                });
            }
        }
        let name = format!("{} {}", lead.first_name, lead.last_name);
        progress.lead_processed(i + 1, total, &name);
    }

    info!(
        imported = result.imported_count,
        duplicates = result.duplicates_skipped,
        invalid = result.invalid_leads,
        failed = result.errors.len(),
        "bulk import complete"
    );
    progress.done(&result);
    Ok(result)
}
