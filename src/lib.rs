// MHR Ownership - Core Library
// Owner-group tenancy and transfer validation for manufactured home registrations.
// Exposes all modules for use in the CLI, API server, and tests.

pub mod config;
pub mod db;
pub mod engine;
pub mod entities;
pub mod errors;
pub mod fraction;
pub mod group;
pub mod history;
pub mod legacy;
pub mod matcher;
pub mod state;
pub mod text;
pub mod transfer;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use config::{ValidationConfig, CONFIG_ENV_VAR};
pub use db::{setup_database, SqliteHistoryProvider};
pub use engine::ValidationEngine;
pub use entities::{
    Address, DeathDetails, DeleteOwnerGroup, DocumentType, GroupStatus, Home, IndividualName,
    NoteStatus, NoteType, Owner, OwnerGroup, PartyType, Registration, RegistrationStatus,
    RegistrationType, TenancyType, TransferRequest, UnitNote,
};
pub use errors::{
    ErrorCode, ErrorKind, HistoryError, HistoryResult, ValidationError, ValidationReport,
};
pub use fraction::{InterestContribution, InterestReconciliation};
pub use group::{GroupRules, GroupValidator};
pub use history::{CurrentState, HistoryProvider};
pub use legacy::LegacyHistoryProvider;
pub use matcher::GroupChangeResolution;
pub use state::{RegistrationAttempt, StateValidator};
pub use text::{validate_required_text, validate_text};
pub use transfer::TransferValidator;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
