//! Lead workflows for leadkit.
//!
//! This crate ties the record store and the outbound services together
//! into end-to-end operations:
//! - [`bulk_import`]: duplicate-aware batch persistence
//! - [`guess_genders`], [`verify_emails`], [`generate_messages`]: per-lead
//!   enrichment with accumulate-and-continue error handling
//!
//! Everything is generic over [`leadkit_shared::LeadStore`] and the service
//! traits, so the CLI wires in libSQL and HTTP while tests use fakes.

pub mod enrichment;
pub mod import;
pub mod message;

pub use enrichment::{
    EmailVerificationResult, GenderGuessResult, MessageGenerationResult, VerificationOutcome,
    generate_messages, guess_genders, verify_emails,
};
pub use import::{ImportProgress, SilentProgress, bulk_import};
pub use message::render_message;

#[cfg(test)]
pub(crate) mod testing;
