// 📐 Group Composition - Structural rules for one owner group
//
// Every rule runs; findings accumulate in the report instead of stopping at the
// first violation.

use crate::config::ValidationConfig;
use crate::entities::{Owner, OwnerGroup, TenancyType};
use crate::errors::{ErrorCode, ValidationReport};
use crate::text::{validate_required_text, validate_text};

/// Request-wide facts a single group is judged against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupRules {
    /// More than one group holds an undivided interest after the change
    pub interest_required: bool,
    pub staff: bool,
}

/// Whether the request is evaluated under tenants-in-common rules.
///
/// `active_count` is the number of groups current after the change. A
/// brand-new registration with one group never is, whatever its type.
pub fn common_tenancy(groups: &[OwnerGroup], new: bool, active_count: usize) -> bool {
    if new && groups.len() <= 1 {
        return false;
    }
    active_count > 1 && groups.iter().any(|g| g.tenancy_type != TenancyType::Sole)
}

/// At most one new SOLE group, never alongside another group.
pub fn validate_sole_groups(groups: &[OwnerGroup], report: &mut ValidationReport) {
    let sole_count = groups
        .iter()
        .filter(|g| g.tenancy_type == TenancyType::Sole)
        .count();

    if sole_count > 1 || (sole_count == 1 && groups.len() > 1) {
        report.push(ErrorCode::AddSoleOwnerInvalid, "addOwnerGroups");
    }
}

// ============================================================================
// GROUP VALIDATOR
// ============================================================================

pub struct GroupValidator<'a> {
    config: &'a ValidationConfig,
}

impl<'a> GroupValidator<'a> {
    pub fn new(config: &'a ValidationConfig) -> Self {
        GroupValidator { config }
    }

    /// Validate one proposed group and each of its owners.
    pub fn validate_group(
        &self,
        group: &OwnerGroup,
        index: usize,
        rules: GroupRules,
        report: &mut ValidationReport,
    ) {
        let field = format!("addOwnerGroups[{}]", index);
        let owner_count = group.owner_count();

        if owner_count == 0 {
            report.push(ErrorCode::OwnersMissing, &format!("{}.owners", field));
        }

        if group.tenancy_type == TenancyType::Common || rules.interest_required {
            if group.interest_numerator < 1 {
                report.push(ErrorCode::GroupNumeratorMissing, &format!("{}.interestNumerator", field));
            }
            if group.interest_denominator < 1 {
                report.push(
                    ErrorCode::GroupDenominatorMissing,
                    &format!("{}.interestDenominator", field),
                );
            }
        }
        if group.interest_denominator > 0 && group.interest_numerator > group.interest_denominator {
            report.push(ErrorCode::GroupInterestInvalid, &format!("{}.interestNumerator", field));
        }

        // NA with several owners is reserved for estate representatives.
        if group.tenancy_type == TenancyType::Na
            && owner_count > 1
            && !rules.staff
            && group.owners.iter().any(|o| !o.party_type.allowed_in_na_group())
        {
            report.push(ErrorCode::TenancyTypeNaInvalid2, &field);
        }

        match group.tenancy_type {
            TenancyType::Joint => {
                if owner_count < 2 {
                    report.push(ErrorCode::OwnersJointInvalid, &field);
                }
            }
            TenancyType::Common => {
                if owner_count != 1 {
                    report.push(ErrorCode::OwnersCommonInvalid, &field);
                }
            }
            TenancyType::Sole => {
                if rules.interest_required {
                    report.push(ErrorCode::OwnersCommonSoleInvalid, &field);
                }
                if owner_count > 1 {
                    report.push(ErrorCode::OwnersSoleInvalid, &field);
                }
            }
            TenancyType::Na => {}
        }

        for (owner_index, owner) in group.owners.iter().enumerate() {
            self.validate_owner(owner, &format!("{}.owners[{}]", field, owner_index), report);
        }
    }

    /// Name checks for one owner.
    pub fn validate_owner(&self, owner: &Owner, field: &str, report: &mut ValidationReport) {
        if let Some(org) = &owner.organization_name {
            if let Some(error) =
                validate_required_text(org, "Owner organization name", self.config.organization_max_length)
            {
                report.push_with(ErrorCode::OwnerNameInvalid, &format!("{}.organizationName", field), error);
            }
        } else if let Some(name) = &owner.individual_name {
            let max = self.config.name_max_length;
            let mut errors = Vec::new();
            errors.extend(validate_required_text(&name.first, "Owner first name", max));
            errors.extend(validate_required_text(&name.last, "Owner last name", max));
            if let Some(middle) = &name.middle {
                if middle.chars().count() > max {
                    errors.push(format!("Owner middle name must be {} characters or fewer.", max));
                } else {
                    errors.extend(validate_text(middle, "Owner middle name"));
                }
            }
            for error in errors {
                report.push_with(ErrorCode::OwnerNameInvalid, &format!("{}.individualName", field), error);
            }
        } else {
            report.push(ErrorCode::OwnerNameMissing, field);
        }
    }

    /// Executors, administrators, trustees and trusts must say whose estate
    /// or trust they act for.
    pub fn validate_description(&self, owner: &Owner, field: &str, report: &mut ValidationReport) {
        if !owner.party_type.is_owner() {
            match owner.description.as_deref().map(str::trim) {
                None | Some("") => {
                    report.push(ErrorCode::OwnerDescriptionRequired, &format!("{}.description", field));
                }
                Some(description) => {
                    if let Some(error) = validate_text(description, "Owner description") {
                        report.push_with(ErrorCode::OwnerNameInvalid, &format!("{}.description", field), error);
                    }
                }
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
