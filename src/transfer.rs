// 🔄 Transfer Validator - Orchestrates every ownership rule for one request
//
// Four passes, all accumulating into one report:
// 1. Request structure (add/delete groups present, ids well formed)
// 2. Group composition (tenants-in-common path or simple path)
// 3. Party types (skipping groups that only restate recorded owners)
// 4. Delete group references against recorded history

use crate::config::ValidationConfig;
use crate::entities::{OwnerGroup, PartyType, RegistrationType, TenancyType, TransferRequest};
use crate::errors::{ErrorCode, ValidationReport};
use crate::fraction::{interest_required, validate_group_interest};
use crate::group::{common_tenancy, validate_sole_groups, GroupRules, GroupValidator};
use crate::history::CurrentState;
use crate::matcher::{resolve_group_changes, validate_death_group_count, GroupChangeResolution};
use std::collections::HashSet;

pub struct TransferValidator<'a> {
    config: &'a ValidationConfig,
}

impl<'a> TransferValidator<'a> {
    pub fn new(config: &'a ValidationConfig) -> Self {
        TransferValidator { config }
    }

    /// Validate a request against the projected state. Empty report means valid.
    pub fn validate(&self, request: &TransferRequest, state: &CurrentState, staff: bool) -> ValidationReport {
        let mut report = ValidationReport::new();

        self.validate_structure(request, &mut report);

        let resolution = resolve_group_changes(state, request);
        if request.registration_type.is_death_transfer() {
            validate_death_group_count(request, &resolution, &mut report);
        }

        self.validate_groups(request, state, staff, &mut report);
        self.validate_party_types(request, state, staff, &resolution, &mut report);

        if !request.is_new() {
            self.validate_delete_groups(request, state, &mut report);
        }

        tracing::debug!(
            mhr_number = %state.mhr_number,
            registration_type = request.registration_type.as_str(),
            staff,
            errors = report.len(),
            "validated transfer"
        );
        report
    }

    // ========================================================================
    // PASS 1: REQUEST STRUCTURE
    // ========================================================================

    fn validate_structure(&self, request: &TransferRequest, report: &mut ValidationReport) {
        if request.add_owner_groups.is_empty() && request.modifies_owner_groups() {
            report.push(ErrorCode::OwnerGroupsRequired, "addOwnerGroups");
        }
        if request.is_new() {
            return;
        }

        let deletes = request.delete_groups();
        if deletes.is_empty() {
            report.push(ErrorCode::DeleteGroupsMissing, "deleteOwnerGroups");
            return;
        }

        let mut seen = HashSet::new();
        for (index, delete) in deletes.iter().enumerate() {
            match delete.group_id {
                None => report.push(
                    ErrorCode::DeleteGroupIdMissing,
                    &format!("deleteOwnerGroups[{}].groupId", index),
                ),
                Some(group_id) => {
                    if !seen.insert(group_id) {
                        report.push(
                            ErrorCode::DeleteGroupIdDuplicate,
                            &format!("deleteOwnerGroups[{}].groupId", index),
                        );
                    }
                }
            }
        }
    }

    // ========================================================================
    // PASS 2: GROUP COMPOSITION
    // ========================================================================

    fn validate_groups(
        &self,
        request: &TransferRequest,
        state: &CurrentState,
        staff: bool,
        report: &mut ValidationReport,
    ) {
        let proposed = &request.add_owner_groups;
        let deleted_ids = request.deleted_group_ids();
        let surviving = state.surviving_groups(&deleted_ids);
        let active_count = surviving.len() + proposed.len();

        let rules = GroupRules {
            interest_required: interest_required(proposed, state.current_groups(), &deleted_ids),
            staff,
        };
        let validator = GroupValidator::new(self.config);
        for (index, group) in proposed.iter().enumerate() {
            validator.validate_group(group, index, rules, report);
        }

        validate_sole_groups(proposed, report);

        if common_tenancy(proposed, request.is_new(), active_count) {
            validate_group_interest(proposed, state, &deleted_ids, report);
            return;
        }

        if request.is_new() && proposed.iter().any(|g| g.tenancy_type == TenancyType::Common) {
            report.push(ErrorCode::GroupCommonInvalid, "addOwnerGroups");
        }

        // One resulting group with one owner must say what it is.
        if !staff && active_count == 1 {
            let only_group = proposed.first().or_else(|| surviving.first().copied());
            if let Some(group) = only_group {
                if group.tenancy_type == TenancyType::Na && group.owner_count() == 1 {
                    report.push(ErrorCode::TenancyTypeNaInvalid, "addOwnerGroups");
                }
            }
        }
    }

    // ========================================================================
    // PASS 3: PARTY TYPES
    // ========================================================================

    fn validate_party_types(
        &self,
        request: &TransferRequest,
        state: &CurrentState,
        staff: bool,
        resolution: &GroupChangeResolution,
        report: &mut ValidationReport,
    ) {
        let registration_type = request.registration_type;
        let relaxed = staff && self.config.relaxes_party_types(request.transfer_document_type);
        let validator = GroupValidator::new(self.config);

        for (index, group) in request.add_owner_groups.iter().enumerate() {
            if resolution.is_unchanged(index) {
                continue;
            }

            for (owner_index, owner) in group.owners.iter().enumerate() {
                let owner_field = format!("addOwnerGroups[{}].owners[{}]", index, owner_index);
                validator.validate_description(owner, &owner_field, report);

                if !owner.party_type.is_estate_representative() {
                    continue;
                }
                let field = format!("{}.partyType", owner_field);

                match group.tenancy_type {
                    TenancyType::Joint | TenancyType::Common => {
                        report.push(ErrorCode::TenancyPartyTypeInvalid, &field);
                    }
                    TenancyType::Sole | TenancyType::Na => {}
                }
                if registration_type == RegistrationType::TransferSale && !relaxed {
                    report.push(ErrorCode::TransferPartyTypeInvalid, &field);
                }
                if registration_type == RegistrationType::TransferDeath {
                    report.push(ErrorCode::TranDeathNewOwner, &field);
                }
            }

            let field = format!("addOwnerGroups[{}]", index);
            match registration_type {
                RegistrationType::TransferAdmin => {
                    if !has_party(group, PartyType::Administrator) {
                        report.push(ErrorCode::TranAdminNewOwner, &field);
                    }
                }
                RegistrationType::TransferWill | RegistrationType::TransferAffidavit => {
                    if !has_party(group, PartyType::Executor) {
                        report.push(ErrorCode::TranExecNewOwner, &field);
                    }
                }
                _ => {}
            }
        }

        if registration_type == RegistrationType::TransferDeath {
            self.validate_surviving_joint_tenant(request, state, resolution, report);
        }
    }

    /// The retired group was a joint tenancy and a deceased owner is evidenced.
    fn validate_surviving_joint_tenant(
        &self,
        request: &TransferRequest,
        state: &CurrentState,
        resolution: &GroupChangeResolution,
        report: &mut ValidationReport,
    ) {
        for group_id in resolution.changed_delete.iter().flatten() {
            if let Some(recorded) = state.find_group(*group_id) {
                if recorded.tenancy_type != TenancyType::Joint {
                    report.push(ErrorCode::TranDeathJointType, "deleteOwnerGroups");
                }
            }
        }

        let has_certificate = request
            .delete_groups()
            .iter()
            .flat_map(|d| d.owners.iter())
            .filter_map(|o| o.death.as_ref())
            .any(|death| !death.certificate_number.trim().is_empty());
        if !has_certificate {
            report.push(ErrorCode::TranDeathCertMissing, "deleteOwnerGroups");
        }
    }

    // ========================================================================
    // PASS 4: DELETE GROUP REFERENCES
    // ========================================================================

    fn validate_delete_groups(&self, request: &TransferRequest, state: &CurrentState, report: &mut ValidationReport) {
        for (index, delete) in request.delete_groups().iter().enumerate() {
            let group_id = match delete.group_id {
                Some(id) => id,
                None => continue,
            };
            let field = format!("deleteOwnerGroups[{}]", index);

            let recorded = match state.find_group(group_id) {
                Some(group) => group,
                None => {
                    tracing::warn!(
                        mhr_number = %state.mhr_number,
                        group_id,
                        "delete references a group absent from history"
                    );
                    report.push_with(
                        ErrorCode::DeleteGroupIdNonexistent,
                        &format!("{}.groupId", field),
                        format!("No owner group with ID {} exists for this home.", group_id),
                    );
                    continue;
                }
            };

            if !recorded.is_current() {
                report.push_with(
                    ErrorCode::DeleteGroupIdInvalid,
                    &format!("{}.groupId", field),
                    format!(
                        "Owner group {} has status {} and cannot be changed.",
                        group_id,
                        recorded.status.as_str()
                    ),
                );
            }

            if let Some(declared) = delete.tenancy_type {
                let either_na = declared == TenancyType::Na || recorded.tenancy_type == TenancyType::Na;
                if !either_na && declared != recorded.tenancy_type {
                    report.push(ErrorCode::DeleteGroupTypeInvalid, &format!("{}.type", field));
                }
            }
        }
    }
}

fn has_party(group: &OwnerGroup, party_type: PartyType) -> bool {
    group.owners.iter().any(|o| o.party_type == party_type)
}

// ============================================================================
// TESTS
// ============================================================================
