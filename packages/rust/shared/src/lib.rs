//! Shared types, error model, and configuration for leadkit.
//!
//! This crate is the foundation depended on by all other leadkit crates.
//! It provides:
//! - [`LeadkitError`], the unified error type
//! - Domain types ([`Lead`], [`NewLead`], [`LeadInput`], [`ImportResult`], [`Gender`])
//! - The [`LeadStore`] trait the import and enrichment flows persist through
//! - Outbound service traits ([`GenderLookup`], [`EmailVerifier`])
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod services;
pub mod store;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, GenderizeConfig, StorageConfig, VerificationConfig, config_dir, config_file_path,
    init_config, load_config, load_config_from,
};
pub use error::{LeadkitError, Result};
pub use services::{EmailVerifier, GenderLookup};
pub use store::LeadStore;
pub use types::{
    Gender, ImportFailure, ImportResult, Lead, LeadError, LeadId, LeadInput, LeadUpdate, NewLead,
    dedup_key,
};
