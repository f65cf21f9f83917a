// 🏛️ Validation Engine - Entry point for callers
//
// Pure and synchronous: the only I/O is the optional history load in
// `load_and_validate`. Each call works on its own projection, so one engine can
// be shared across requests.

use crate::config::ValidationConfig;
use crate::entities::TransferRequest;
use crate::errors::{HistoryResult, ValidationReport};
use crate::history::{CurrentState, HistoryProvider};
use crate::state::{RegistrationAttempt, StateValidator};
use crate::transfer::TransferValidator;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Default)]
pub struct ValidationEngine {
    config: ValidationConfig,
}

impl ValidationEngine {
    pub fn new(config: ValidationConfig) -> Self {
        ValidationEngine { config }
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Is the home open to this registration at all?
    pub fn validate_registration_state(
        &self,
        state: &CurrentState,
        staff: bool,
        attempt: RegistrationAttempt,
    ) -> ValidationReport {
        StateValidator::new(&self.config).validate(state, staff, attempt)
    }

    /// Ownership rules for an add/delete owner groups request.
    pub fn validate_transfer(&self, request: &TransferRequest, state: &CurrentState, staff: bool) -> ValidationReport {
        TransferValidator::new(&self.config).validate(request, state, staff)
    }

    /// State gate first; a frozen home skips ownership validation entirely.
    pub fn validate_registration(
        &self,
        request: &TransferRequest,
        state: &CurrentState,
        staff: bool,
    ) -> ValidationReport {
        let report = self.validate_registration_state(state, staff, RegistrationAttempt::from(request));
        if !report.is_valid() {
            return report;
        }
        if request.modifies_owner_groups() {
            return self.validate_transfer(request, state, staff);
        }
        report
    }

    /// Load a home's history, project it at `as_of` and validate the request.
    pub fn load_and_validate<P>(
        &self,
        provider: &P,
        mhr_number: &str,
        request: &TransferRequest,
        staff: bool,
        as_of: DateTime<Utc>,
    ) -> HistoryResult<ValidationReport>
    where
        P: HistoryProvider + ?Sized,
    {
        let home = provider.load_home(mhr_number)?;
        let state = CurrentState::project(&home, as_of);
        let report = self.validate_registration(request, &state, staff);

        tracing::info!(
            mhr_number,
            registration_type = request.registration_type.as_str(),
            valid = report.is_valid(),
            errors = report.len(),
            "validated registration"
        );
        Ok(report)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Home, OwnerGroup, RegistrationStatus, RegistrationType, TenancyType};
    use crate::errors::{ErrorCode, HistoryError};
    use crate::test_support::*;
    use std::collections::HashMap;

    struct InMemoryHistory {
        homes: HashMap<String, Home>,
    }

    impl HistoryProvider for InMemoryHistory {
        fn load_home(&self, mhr_number: &str) -> HistoryResult<Home> {
            self.homes
                .get(mhr_number)
                .cloned()
                .ok_or_else(|| HistoryError::NotFound { mhr_number: mhr_number.to_string() })
        }
    }

    fn create_test_provider(home: Home) -> InMemoryHistory {
        let mut homes = HashMap::new();
        homes.insert(home.mhr_number.clone(), home);
        InMemoryHistory { homes }
    }

    fn joint_with_one_owner() -> TransferRequest {
        transfer_request(
            RegistrationType::TransferSale,
            vec![(1, TenancyType::Sole)],
            vec![OwnerGroup::new(0, TenancyType::Joint, vec![new_individual("JANE", "SMITH")])],
        )
    }

    #[test]
    fn test_frozen_state_short_circuits() {
        let mut home = create_test_home(vec![sole_group(1, individual_owner(1, "JOHN", "SMITH"))]);
        home.base.status = RegistrationStatus::Draft;
        let state = CurrentState::project(&home, test_time());

        let report = ValidationEngine::default().validate_registration(&joint_with_one_owner(), &state, false);
        assert_eq!(report.codes(), vec![ErrorCode::StateFrozenPayment]);
    }

    #[test]
    fn test_open_state_runs_ownership_rules() {
        let state = create_test_state(vec![sole_group(1, individual_owner(1, "JOHN", "SMITH"))]);

        let report = ValidationEngine::default().validate_registration(&joint_with_one_owner(), &state, false);
        assert_eq!(report.codes(), vec![ErrorCode::OwnersJointInvalid]);
    }

    #[test]
    fn test_non_ownership_registration_skips_transfer_rules() {
        let state = create_test_state(vec![sole_group(1, individual_owner(1, "JOHN", "SMITH"))]);
        let request = TransferRequest::new(RegistrationType::ExemptionNonRes);

        assert!(ValidationEngine::default().validate_registration(&request, &state, false).is_valid());
    }

    #[test]
    fn test_correction_without_owner_changes_skips_transfer_rules() {
        let state = create_test_state(vec![sole_group(1, individual_owner(1, "JOHN", "SMITH"))]);
        let engine = ValidationEngine::default();

        let correction = TransferRequest::new(RegistrationType::Correction);
        let amendment = TransferRequest::new(RegistrationType::Amendment);
        assert!(engine.validate_registration(&correction, &state, true).is_valid());
        assert!(engine.validate_registration(&amendment, &state, true).is_valid());
    }

    #[test]
    fn test_correction_with_owner_changes_runs_transfer_rules() {
        let state = create_test_state(vec![sole_group(1, individual_owner(1, "JOHN", "SMITH"))]);
        let request = TransferRequest::new(RegistrationType::Correction)
            .adding(vec![OwnerGroup::new(0, TenancyType::Sole, vec![new_individual("JON", "SMITH")])]);

        let report = ValidationEngine::default().validate_registration(&request, &state, true);
        assert_eq!(report.codes(), vec![ErrorCode::DeleteGroupsMissing]);
    }

    #[test]
    fn test_load_and_validate() {
        let provider = create_test_provider(create_test_home(vec![sole_group(
            1,
            individual_owner(1, "JOHN", "SMITH"),
        )]));
        let request = transfer_request(
            RegistrationType::TransferSale,
            vec![(1, TenancyType::Sole)],
            vec![OwnerGroup::new(0, TenancyType::Sole, vec![new_business("ABC HOLDINGS LTD")])],
        );
        let engine = ValidationEngine::default();

        let report = engine
            .load_and_validate(&provider, TEST_MHR_NUMBER, &request, false, test_time())
            .unwrap();
        assert!(report.is_valid());

        let missing = engine.load_and_validate(&provider, "999999", &request, false, test_time());
        assert!(matches!(missing, Err(HistoryError::NotFound { .. })));
    }
}
