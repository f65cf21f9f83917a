// 🧊 Registration State - Is the home open to this registration at all?
//
// Checked before any ownership rule. A home that is pending payment, cancelled,
// exempt or held by a restrictive note or transport permit can be frozen for
// some or all registration types.

use crate::config::ValidationConfig;
use crate::entities::{DocumentType, RegistrationStatus, RegistrationType, TransferRequest};
use crate::errors::{ErrorCode, ValidationReport};
use crate::history::CurrentState;
use serde::{Deserialize, Serialize};

/// The registration being attempted, as far as state gating cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationAttempt {
    pub registration_type: RegistrationType,
    #[serde(default)]
    pub document_type: Option<DocumentType>,
    /// Permit requests: the previous move has completed
    #[serde(default)]
    pub move_completed: bool,
}

impl RegistrationAttempt {
    pub fn new(registration_type: RegistrationType, document_type: Option<DocumentType>) -> Self {
        RegistrationAttempt {
            registration_type,
            document_type,
            move_completed: false,
        }
    }
}

impl From<&TransferRequest> for RegistrationAttempt {
    fn from(request: &TransferRequest) -> Self {
        RegistrationAttempt {
            registration_type: request.registration_type,
            document_type: request.document_type,
            move_completed: request.move_completed,
        }
    }
}

pub struct StateValidator<'a> {
    config: &'a ValidationConfig,
}

impl<'a> StateValidator<'a> {
    pub fn new(config: &'a ValidationConfig) -> Self {
        StateValidator { config }
    }

    pub fn validate(&self, state: &CurrentState, staff: bool, attempt: RegistrationAttempt) -> ValidationReport {
        let mut report = ValidationReport::new();
        let document_type = attempt.document_type;

        match state.status {
            RegistrationStatus::Draft => {
                report.push(ErrorCode::StateFrozenPayment, "status");
            }
            RegistrationStatus::Cancelled => {
                if !allows(&self.config.cancelled_allowed_documents, document_type) {
                    report.push(ErrorCode::StateNotAllowed, "documentType");
                }
            }
            RegistrationStatus::Exempt => {
                if attempt.registration_type == RegistrationType::ExemptionRes {
                    report.push(ErrorCode::ExemptExrsInvalid, "registrationType");
                } else if !allows(&self.config.exempt_allowed_documents, document_type) {
                    report.push(ErrorCode::StateNotAllowed, "documentType");
                }
            }
            RegistrationStatus::Active => {
                self.validate_active(state, staff, attempt, &mut report);
            }
        }

        if attempt.registration_type == RegistrationType::Permit
            && state.active_permit().is_some()
            && !attempt.move_completed
        {
            report.push(ErrorCode::PermitAlreadyActive, "moveCompleted");
        }

        if !report.is_valid() {
            tracing::debug!(
                mhr_number = %state.mhr_number,
                status = state.status.as_str(),
                registration_type = attempt.registration_type.as_str(),
                errors = report.len(),
                "registration state rejected"
            );
        }
        report
    }

    fn validate_active(
        &self,
        state: &CurrentState,
        staff: bool,
        attempt: RegistrationAttempt,
        report: &mut ValidationReport,
    ) {
        if !staff {
            if let Some(note) = state
                .notes
                .iter()
                .find(|n| self.config.is_restricted_note(n.document_type))
            {
                report.push_with(
                    ErrorCode::StateFrozenNote,
                    "status",
                    format!(
                        "{} Note type: {}.",
                        ErrorCode::StateFrozenNote.message(),
                        note.document_type.as_str()
                    ),
                );
            }
        }

        let registration_type = attempt.registration_type;
        let cancels_permit = attempt.document_type == Some(DocumentType::CancelPermit);
        if state.active_permit().is_some()
            && !registration_type.is_permit_related()
            && registration_type != RegistrationType::ExemptionRes
            && !cancels_permit
        {
            report.push(ErrorCode::StateFrozenPermit, "status");
        }
    }
}

fn allows(allowed: &[DocumentType], document_type: Option<DocumentType>) -> bool {
    document_type.map_or(false, |doc| allowed.contains(&doc))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{NoteType, UnitNote};
    use crate::test_support::*;
    use chrono::Duration;

    fn state_with(status: RegistrationStatus, notes: Vec<UnitNote>) -> CurrentState {
        let mut home = create_test_home(vec![sole_group(1, individual_owner(1, "JOHN", "SMITH"))]);
        home.base.status = status;
        home.base.notes = notes;
        CurrentState::project(&home, test_time())
    }

    fn validate(state: &CurrentState, staff: bool, attempt: RegistrationAttempt) -> ValidationReport {
        let config = ValidationConfig::default();
        StateValidator::new(&config).validate(state, staff, attempt)
    }

    fn sale() -> RegistrationAttempt {
        RegistrationAttempt::new(RegistrationType::TransferSale, None)
    }

    fn live_permit() -> UnitNote {
        UnitNote::new(BASE_REGISTRATION_ID, NoteType::TransportPermit)
            .expiring(test_time() + Duration::days(30))
    }

    #[test]
    fn test_active_home_open() {
        let state = state_with(RegistrationStatus::Active, Vec::new());
        assert!(validate(&state, false, sale()).is_valid());
    }

    #[test]
    fn test_draft_always_frozen() {
        let state = state_with(RegistrationStatus::Draft, Vec::new());
        assert_eq!(validate(&state, true, sale()).codes(), vec![ErrorCode::StateFrozenPayment]);
    }

    #[test]
    fn test_cancelled_allows_reregistration_only() {
        let state = state_with(RegistrationStatus::Cancelled, Vec::new());
        let reregister = RegistrationAttempt::new(RegistrationType::MhReg, Some(DocumentType::ReregisterC));

        assert_eq!(validate(&state, false, sale()).codes(), vec![ErrorCode::StateNotAllowed]);
        assert!(validate(&state, false, reregister).is_valid());
    }

    #[test]
    fn test_exempt_home() {
        let state = state_with(RegistrationStatus::Exempt, Vec::new());
        let exemption = RegistrationAttempt::new(RegistrationType::ExemptionRes, Some(DocumentType::Exre));
        let correction = RegistrationAttempt::new(RegistrationType::Correction, Some(DocumentType::RegcStaff));

        assert_eq!(validate(&state, true, exemption).codes(), vec![ErrorCode::ExemptExrsInvalid]);
        assert_eq!(validate(&state, false, sale()).codes(), vec![ErrorCode::StateNotAllowed]);
        assert!(validate(&state, true, correction).is_valid());
    }

    #[test]
    fn test_restricted_note_freezes_non_staff() {
        let state = state_with(
            RegistrationStatus::Active,
            vec![UnitNote::new(BASE_REGISTRATION_ID, NoteType::Taxn)],
        );

        let report = validate(&state, false, sale());
        assert_eq!(report.codes(), vec![ErrorCode::StateFrozenNote]);
        assert!(report.message().contains("TAXN"));
        assert!(validate(&state, true, sale()).is_valid());
    }

    #[test]
    fn test_expired_note_ignored() {
        let expired = UnitNote::new(BASE_REGISTRATION_ID, NoteType::Rest)
            .expiring(test_time() - Duration::days(1));
        let state = state_with(RegistrationStatus::Active, vec![expired]);

        assert!(validate(&state, false, sale()).is_valid());
    }

    #[test]
    fn test_active_permit_freezes_transfers() {
        let state = state_with(RegistrationStatus::Active, vec![live_permit()]);
        let extension = RegistrationAttempt::new(RegistrationType::PermitExtension, None);
        let residential = RegistrationAttempt::new(RegistrationType::ExemptionRes, Some(DocumentType::Exre));
        let cancel = RegistrationAttempt::new(RegistrationType::StaffAdmin, Some(DocumentType::CancelPermit));

        assert_eq!(validate(&state, false, sale()).codes(), vec![ErrorCode::StateFrozenPermit]);
        assert!(validate(&state, false, extension).is_valid());
        assert!(validate(&state, false, residential).is_valid());
        assert!(validate(&state, true, cancel).is_valid());
    }

    #[test]
    fn test_new_permit_needs_completed_move() {
        let state = state_with(RegistrationStatus::Active, vec![live_permit()]);
        let mut permit = RegistrationAttempt::new(RegistrationType::Permit, None);

        assert_eq!(validate(&state, false, permit).codes(), vec![ErrorCode::PermitAlreadyActive]);

        permit.move_completed = true;
        assert!(validate(&state, false, permit).is_valid());
    }

    #[test]
    fn test_attempt_from_request() {
        let mut request = new_registration_request(Vec::new());
        request.document_type = Some(DocumentType::ReregisterC);
        request.move_completed = true;

        let attempt = RegistrationAttempt::from(&request);
        assert_eq!(attempt.registration_type, RegistrationType::MhReg);
        assert_eq!(attempt.document_type, Some(DocumentType::ReregisterC));
        assert!(attempt.move_completed);
    }
}
