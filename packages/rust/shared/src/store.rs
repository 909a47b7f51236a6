//! Record-store interface consumed by the import and enrichment flows.

use std::future::Future;

use crate::error::Result;
use crate::types::{Lead, LeadId, NewLead};

/// Persistent lead store.
///
/// Implementations must be safe to share across tasks; the flows in
/// `leadkit-core` only ever await one call at a time per invocation.
pub trait LeadStore: Send + Sync {
    /// All existing leads whose (first name, last name) pair matches any of
    /// `pairs`, compared trimmed and case-insensitively. One round trip.
    fn find_by_name_pairs(
        &self,
        pairs: &[(String, String)],
    ) -> impl Future<Output = Result<Vec<Lead>>> + Send;

    /// Insert a lead. Fails with `Storage` on constraint or connectivity errors.
    fn create(&self, lead: &NewLead) -> impl Future<Output = Result<Lead>> + Send;

    /// All leads whose id is in `ids`, ordered by id.
    fn find_by_ids(&self, ids: &[LeadId]) -> impl Future<Output = Result<Vec<Lead>>> + Send;

    fn update_gender(&self, id: LeadId, gender: &str)
    -> impl Future<Output = Result<()>> + Send;

    fn update_message(
        &self,
        id: LeadId,
        message: &str,
    ) -> impl Future<Output = Result<()>> + Send;

    fn update_email_verified(
        &self,
        id: LeadId,
        verified: bool,
    ) -> impl Future<Output = Result<()>> + Send;
}
