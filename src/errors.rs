// 🚦 Validation Errors - Structured, accumulated findings
//
// Validators never fail fast on business rules: every matching rule appends a
// finding, and the caller decides how to present the whole list.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// ERROR KIND
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Missing required field, wrong cardinality
    Structural,
    /// Interest fractions do not add up
    Arithmetic,
    /// Party type incompatible with tenancy or registration type
    Classification,
    /// Home is frozen for this registration
    State,
    /// Death-transfer group count cannot be resolved
    Matching,
    /// Recorded data is inconsistent; callers may treat as a server error
    Integrity,
}

// ============================================================================
// ERROR CODE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    OwnerGroupsRequired,
    DeleteGroupsMissing,
    DeleteGroupIdMissing,
    DeleteGroupIdDuplicate,
    OwnersMissing,
    OwnerNameMissing,
    OwnerNameInvalid,
    OwnerDescriptionRequired,
    GroupNumeratorMissing,
    GroupDenominatorMissing,
    OwnersJointInvalid,
    OwnersCommonInvalid,
    OwnersSoleInvalid,
    AddSoleOwnerInvalid,
    GroupCommonInvalid,
    GroupInterestInvalid,
    GroupInterestMismatch,
    OwnersCommonSoleInvalid,
    TenancyTypeNaInvalid,
    #[serde(rename = "TENANCY_TYPE_NA_INVALID2")]
    TenancyTypeNaInvalid2,
    TenancyPartyTypeInvalid,
    TransferPartyTypeInvalid,
    TranAdminNewOwner,
    TranExecNewOwner,
    TranDeathNewOwner,
    TranDeathJointType,
    TranDeathCertMissing,
    TranDeathGroupCount,
    TranDeathAddMissing,
    TranDeathDeleteMissing,
    DeleteGroupIdInvalid,
    DeleteGroupTypeInvalid,
    DeleteGroupIdNonexistent,
    ExistingInterestMalformed,
    StateFrozenPayment,
    StateNotAllowed,
    StateFrozenNote,
    StateFrozenPermit,
    ExemptExrsInvalid,
    PermitAlreadyActive,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::OwnerGroupsRequired => "OWNER_GROUPS_REQUIRED",
            ErrorCode::DeleteGroupsMissing => "DELETE_GROUPS_MISSING",
            ErrorCode::DeleteGroupIdMissing => "DELETE_GROUP_ID_MISSING",
            ErrorCode::DeleteGroupIdDuplicate => "DELETE_GROUP_ID_DUPLICATE",
            ErrorCode::OwnersMissing => "OWNERS_MISSING",
            ErrorCode::OwnerNameMissing => "OWNER_NAME_MISSING",
            ErrorCode::OwnerNameInvalid => "OWNER_NAME_INVALID",
            ErrorCode::OwnerDescriptionRequired => "OWNER_DESCRIPTION_REQUIRED",
            ErrorCode::GroupNumeratorMissing => "GROUP_NUMERATOR_MISSING",
            ErrorCode::GroupDenominatorMissing => "GROUP_DENOMINATOR_MISSING",
            ErrorCode::OwnersJointInvalid => "OWNERS_JOINT_INVALID",
            ErrorCode::OwnersCommonInvalid => "OWNERS_COMMON_INVALID",
            ErrorCode::OwnersSoleInvalid => "OWNERS_SOLE_INVALID",
            ErrorCode::AddSoleOwnerInvalid => "ADD_SOLE_OWNER_INVALID",
            ErrorCode::GroupCommonInvalid => "GROUP_COMMON_INVALID",
            ErrorCode::GroupInterestInvalid => "GROUP_INTEREST_INVALID",
            ErrorCode::GroupInterestMismatch => "GROUP_INTEREST_MISMATCH",
            ErrorCode::OwnersCommonSoleInvalid => "OWNERS_COMMON_SOLE_INVALID",
            ErrorCode::TenancyTypeNaInvalid => "TENANCY_TYPE_NA_INVALID",
            ErrorCode::TenancyTypeNaInvalid2 => "TENANCY_TYPE_NA_INVALID2",
            ErrorCode::TenancyPartyTypeInvalid => "TENANCY_PARTY_TYPE_INVALID",
            ErrorCode::TransferPartyTypeInvalid => "TRANSFER_PARTY_TYPE_INVALID",
            ErrorCode::TranAdminNewOwner => "TRAN_ADMIN_NEW_OWNER",
            ErrorCode::TranExecNewOwner => "TRAN_EXEC_NEW_OWNER",
            ErrorCode::TranDeathNewOwner => "TRAN_DEATH_NEW_OWNER",
            ErrorCode::TranDeathJointType => "TRAN_DEATH_JOINT_TYPE",
            ErrorCode::TranDeathCertMissing => "TRAN_DEATH_CERT_MISSING",
            ErrorCode::TranDeathGroupCount => "TRAN_DEATH_GROUP_COUNT",
            ErrorCode::TranDeathAddMissing => "TRAN_DEATH_ADD_MISSING",
            ErrorCode::TranDeathDeleteMissing => "TRAN_DEATH_DELETE_MISSING",
            ErrorCode::DeleteGroupIdInvalid => "DELETE_GROUP_ID_INVALID",
            ErrorCode::DeleteGroupTypeInvalid => "DELETE_GROUP_TYPE_INVALID",
            ErrorCode::DeleteGroupIdNonexistent => "DELETE_GROUP_ID_NONEXISTENT",
            ErrorCode::ExistingInterestMalformed => "EXISTING_INTEREST_MALFORMED",
            ErrorCode::StateFrozenPayment => "STATE_FROZEN_PAYMENT",
            ErrorCode::StateNotAllowed => "STATE_NOT_ALLOWED",
            ErrorCode::StateFrozenNote => "STATE_FROZEN_NOTE",
            ErrorCode::StateFrozenPermit => "STATE_FROZEN_PERMIT",
            ErrorCode::ExemptExrsInvalid => "EXEMPT_EXRS_INVALID",
            ErrorCode::PermitAlreadyActive => "PERMIT_ALREADY_ACTIVE",
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ErrorCode::OwnerGroupsRequired
            | ErrorCode::DeleteGroupsMissing
            | ErrorCode::DeleteGroupIdMissing
            | ErrorCode::DeleteGroupIdDuplicate
            | ErrorCode::OwnersMissing
            | ErrorCode::OwnerNameMissing
            | ErrorCode::OwnerNameInvalid
            | ErrorCode::OwnerDescriptionRequired
            | ErrorCode::GroupNumeratorMissing
            | ErrorCode::GroupDenominatorMissing
            | ErrorCode::OwnersJointInvalid
            | ErrorCode::OwnersCommonInvalid
            | ErrorCode::OwnersSoleInvalid
            | ErrorCode::AddSoleOwnerInvalid
            | ErrorCode::GroupCommonInvalid
            | ErrorCode::TranDeathCertMissing => ErrorKind::Structural,

            ErrorCode::GroupInterestInvalid | ErrorCode::GroupInterestMismatch => {
                ErrorKind::Arithmetic
            }

            ErrorCode::OwnersCommonSoleInvalid
            | ErrorCode::TenancyTypeNaInvalid
            | ErrorCode::TenancyTypeNaInvalid2
            | ErrorCode::TenancyPartyTypeInvalid
            | ErrorCode::TransferPartyTypeInvalid
            | ErrorCode::TranAdminNewOwner
            | ErrorCode::TranExecNewOwner
            | ErrorCode::TranDeathNewOwner
            | ErrorCode::TranDeathJointType
            | ErrorCode::DeleteGroupTypeInvalid => ErrorKind::Classification,

            ErrorCode::DeleteGroupIdInvalid
            | ErrorCode::StateFrozenPayment
            | ErrorCode::StateNotAllowed
            | ErrorCode::StateFrozenNote
            | ErrorCode::StateFrozenPermit
            | ErrorCode::ExemptExrsInvalid
            | ErrorCode::PermitAlreadyActive => ErrorKind::State,

            ErrorCode::TranDeathGroupCount
            | ErrorCode::TranDeathAddMissing
            | ErrorCode::TranDeathDeleteMissing => ErrorKind::Matching,

            ErrorCode::DeleteGroupIdNonexistent | ErrorCode::ExistingInterestMalformed => {
                ErrorKind::Integrity
            }
        }
    }

    /// Default user-facing sentence for the code.
    pub fn message(&self) -> &'static str {
        match self {
            ErrorCode::OwnerGroupsRequired => "At least one owner group is required.",
            ErrorCode::DeleteGroupsMissing => "The deleteOwnerGroups is required for all changes to an existing home.",
            ErrorCode::DeleteGroupIdMissing => "The deleteOwnerGroups groupId is required.",
            ErrorCode::DeleteGroupIdDuplicate => "An owner group can only be deleted once in a registration.",
            ErrorCode::OwnersMissing => "Each owner group must contain at least one owner.",
            ErrorCode::OwnerNameMissing => "Either an owner organization name or individual first and last name is required.",
            ErrorCode::OwnerNameInvalid => "The owner name is invalid.",
            ErrorCode::OwnerDescriptionRequired => "Owner description is required for the owner party type.",
            ErrorCode::GroupNumeratorMissing => "The owner group interest numerator is required and must be an integer greater than 0.",
            ErrorCode::GroupDenominatorMissing => "The owner group interest denominator is required and must be an integer greater than 0.",
            ErrorCode::OwnersJointInvalid => "The joint tenancy owner group must contain at least 2 owners.",
            ErrorCode::OwnersCommonInvalid => "Each tenants in common owner group must contain exactly 1 owner.",
            ErrorCode::OwnersSoleInvalid => "The sole owner group must contain exactly 1 owner.",
            ErrorCode::AddSoleOwnerInvalid => "Only one sole owner group can be added and it cannot be combined with other owner groups.",
            ErrorCode::GroupCommonInvalid => "More than 1 group is required with the tenants in common owner group type.",
            ErrorCode::GroupInterestInvalid => "The owner group interest numerator cannot be greater than the interest denominator.",
            ErrorCode::GroupInterestMismatch => "The owner group interest numerator sum does not equal the interest common denominator.",
            ErrorCode::OwnersCommonSoleInvalid => "The sole owner group type is not allowed when owner group interest is required.",
            ErrorCode::TenancyTypeNaInvalid => "Tenancy type NA is not allowed when there is 1 active owner group with 1 owner.",
            ErrorCode::TenancyTypeNaInvalid2 => "Tenancy type NA is only allowed when all owners are ADMINISTRATOR, EXECUTOR, TRUSTEE, or TRUST party types.",
            ErrorCode::TenancyPartyTypeInvalid => "Owner group tenancy type must be NA for executors, trustees, or administrators.",
            ErrorCode::TransferPartyTypeInvalid => "Owner party type of administrator, executor, or trustee is not allowed for this registration.",
            ErrorCode::TranAdminNewOwner => "The new owner must be an administrator for a transfer to an administrator.",
            ErrorCode::TranExecNewOwner => "The new owner must be an executor for a transfer to an executor.",
            ErrorCode::TranDeathNewOwner => "The new owner cannot be an executor, administrator, or trustee for a transfer to a surviving joint tenant.",
            ErrorCode::TranDeathJointType => "The owner group must be a joint tenancy for a transfer to a surviving joint tenant.",
            ErrorCode::TranDeathCertMissing => "A death certificate number and date of death are required for at least one deleted owner.",
            ErrorCode::TranDeathGroupCount => "Only one owner group can be modified in a transfer due to death registration.",
            ErrorCode::TranDeathAddMissing => "A transfer due to death must add one owner group.",
            ErrorCode::TranDeathDeleteMissing => "A transfer due to death must delete one owner group.",
            ErrorCode::DeleteGroupIdInvalid => "The owner group is not active and cannot be changed.",
            ErrorCode::DeleteGroupTypeInvalid => "The owner group tenancy type does not match the recorded tenancy type.",
            ErrorCode::DeleteGroupIdNonexistent => "No owner group with the requested ID exists.",
            ErrorCode::ExistingInterestMalformed => "A recorded owner group interest has a numerator without a denominator.",
            ErrorCode::StateFrozenPayment => "A pending registration with payment outstanding prevents any change to the home.",
            ErrorCode::StateNotAllowed => "The home registration state does not allow this registration.",
            ErrorCode::StateFrozenNote => "An active unit note on the home prevents this registration.",
            ErrorCode::StateFrozenPermit => "An active transport permit on the home prevents this registration.",
            ErrorCode::ExemptExrsInvalid => "A residential exemption is not allowed when the home is already exempt.",
            ErrorCode::PermitAlreadyActive => "A transport permit is already active: confirm the previous move is complete.",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// VALIDATION ERROR
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub kind: ErrorKind,
    pub code: ErrorCode,
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(code: ErrorCode, field: &str) -> Self {
        ValidationError {
            kind: code.kind(),
            code,
            field: field.to_string(),
            message: code.message().to_string(),
        }
    }

    pub fn with_message(code: ErrorCode, field: &str, message: String) -> Self {
        ValidationError {
            kind: code.kind(),
            code,
            field: field.to_string(),
            message,
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.code, self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

// ============================================================================
// VALIDATION REPORT
// ============================================================================

/// Ordered findings from one validation pass. Empty means valid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub errors: Vec<ValidationError>,
}

impl ValidationReport {
    pub fn new() -> Self {
        ValidationReport { errors: Vec::new() }
    }

    pub fn push(&mut self, code: ErrorCode, field: &str) {
        self.errors.push(ValidationError::new(code, field));
    }

    pub fn push_with(&mut self, code: ErrorCode, field: &str, message: String) {
        self.errors.push(ValidationError::with_message(code, field, message));
    }

    pub fn extend(&mut self, other: ValidationReport) {
        self.errors.extend(other.errors);
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_code(&self, code: ErrorCode) -> bool {
        self.errors.iter().any(|e| e.code == code)
    }

    pub fn codes(&self) -> Vec<ErrorCode> {
        self.errors.iter().map(|e| e.code).collect()
    }

    pub fn has_integrity_errors(&self) -> bool {
        self.errors.iter().any(|e| e.kind == ErrorKind::Integrity)
    }

    /// Presentation form: every message, in order, space separated.
    pub fn message(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

// ============================================================================
// HISTORY LOAD ERRORS
// ============================================================================

/// Failures loading a home's registration history.
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("No manufactured home found for MHR number {mhr_number}")]
    NotFound { mhr_number: String },

    #[error("Home {mhr_number} has no base registration")]
    MissingBaseRegistration { mhr_number: String },

    #[error("Malformed record at line {line}: {reason}")]
    MalformedRecord { line: usize, reason: String },

    #[error("Unknown {field} code '{code}'")]
    UnknownCode { field: &'static str, code: String },

    #[error("Invalid timestamp '{value}'")]
    InvalidTimestamp { value: String },

    #[error("Inconsistent history for {mhr_number}: {reason}")]
    Inconsistent { mhr_number: String, reason: String },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Legacy record error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Stored JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type HistoryResult<T> = Result<T, HistoryError>;

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_accumulates_in_order() {
        let mut report = ValidationReport::new();
        report.push(ErrorCode::OwnersJointInvalid, "addOwnerGroups[0]");
        report.push(ErrorCode::GroupInterestMismatch, "addOwnerGroups");

        assert!(!report.is_valid());
        assert_eq!(
            report.codes(),
            vec![ErrorCode::OwnersJointInvalid, ErrorCode::GroupInterestMismatch]
        );
        assert!(report.message().starts_with("The joint tenancy owner group"));
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(ErrorCode::GroupInterestMismatch.kind(), ErrorKind::Arithmetic);
        assert_eq!(ErrorCode::TranDeathGroupCount.kind(), ErrorKind::Matching);
        assert_eq!(ErrorCode::StateFrozenPayment.kind(), ErrorKind::State);
        assert_eq!(ErrorCode::DeleteGroupIdNonexistent.kind(), ErrorKind::Integrity);
    }

    #[test]
    fn test_integrity_errors_flagged() {
        let mut report = ValidationReport::new();
        report.push(ErrorCode::OwnersMissing, "addOwnerGroups[0].owners");
        assert!(!report.has_integrity_errors());

        report.push(ErrorCode::ExistingInterestMalformed, "ownerGroups[3]");
        assert!(report.has_integrity_errors());
    }

    #[test]
    fn test_code_serializes_to_wire_name() {
        assert_eq!(
            serde_json::to_value(ErrorCode::TenancyTypeNaInvalid2).unwrap(),
            serde_json::json!(ErrorCode::TenancyTypeNaInvalid2.as_str())
        );
        assert_eq!(
            serde_json::to_value(ErrorCode::GroupInterestMismatch).unwrap(),
            serde_json::json!("GROUP_INTEREST_MISMATCH")
        );
    }

    #[test]
    fn test_empty_report_message() {
        let report = ValidationReport::default();
        assert!(report.is_valid());
        assert_eq!(report.message(), "");
    }
}
