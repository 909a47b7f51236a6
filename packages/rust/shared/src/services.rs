//! Outbound service interfaces used by the enrichment flows.

use std::future::Future;

use crate::error::Result;
use crate::types::LeadId;

/// Infers a gender from a first name.
pub trait GenderLookup: Send + Sync {
    /// The service's raw answer (`Some("male")`, `Some("female")`, or
    /// `None` when it has no opinion).
    fn lookup(&self, first_name: &str) -> impl Future<Output = Result<Option<String>>> + Send;
}

/// Runs an email-verification workflow to completion.
pub trait EmailVerifier: Send + Sync {
    fn verify(&self, lead_id: LeadId, email: &str) -> impl Future<Output = Result<bool>> + Send;
}
