// ⚖️ Fraction Reconciler - Group interests must add up to one whole
//
// Following the formula:
//   Σ rescaled(existing surviving) + Σ rescaled(proposed) = common denominator
//
// The common denominator is never invented: it is the largest denominator
// supplied on the proposed groups, and recorded interests are scaled to it.

use crate::entities::{GroupStatus, OwnerGroup, TenancyType};
use crate::errors::{ErrorCode, ValidationReport};
use crate::history::CurrentState;
use serde::{Deserialize, Serialize};

// ============================================================================
// RECONCILIATION RESULT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterestContribution {
    /// None for proposed groups
    pub group_id: Option<u32>,
    pub numerator: u32,
    pub denominator: u32,
    /// Numerator expressed in the common denominator
    pub rescaled: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterestReconciliation {
    pub common_denominator: u32,
    pub numerator_sum: u64,
    /// Proposed groups plus surviving recorded groups with an interest
    pub group_count: usize,
    pub contributions: Vec<InterestContribution>,
}

impl InterestReconciliation {
    /// Fewer than 2 contributing groups are exempt from the sum check.
    pub fn is_balanced(&self) -> bool {
        self.group_count < 2 || self.numerator_sum == u64::from(self.common_denominator)
    }

    pub fn summary(&self) -> String {
        format!(
            "{} groups, interest sum {}/{}",
            self.group_count, self.numerator_sum, self.common_denominator
        )
    }
}

// ============================================================================
// RULES
// ============================================================================

/// Interest tracking is required when more than one group will hold an
/// undivided interest after the change.
pub fn interest_required(proposed: &[OwnerGroup], existing: &[OwnerGroup], deleted_ids: &[u32]) -> bool {
    let proposed_count = proposed
        .iter()
        .filter(|g| g.tenancy_type != TenancyType::Sole)
        .count();

    let existing_count = existing
        .iter()
        .filter(|g| {
            g.status == GroupStatus::Active
                && g.tenancy_type != TenancyType::Sole
                && g.interest_denominator > 0
                && !deleted_ids.contains(&g.group_id)
        })
        .count();

    proposed_count + existing_count > 1
}

/// Largest denominator among the proposed groups (0 when none supplied).
pub fn common_denominator(proposed: &[OwnerGroup]) -> u32 {
    proposed
        .iter()
        .map(|g| g.interest_denominator)
        .max()
        .unwrap_or(0)
}

/// Express `numerator/denominator` in `common` parts.
///
/// Scaling down truncates toward zero.
pub fn rescale_numerator(numerator: u32, denominator: u32, common: u32) -> u64 {
    let (numerator, denominator, common) =
        (u64::from(numerator), u64::from(denominator), u64::from(common));

    if denominator == 0 || common == 0 {
        0
    } else if denominator == common {
        numerator
    } else if denominator < common {
        common / denominator * numerator
    } else {
        common * numerator / denominator
    }
}

/// Sum proposed and surviving recorded interests in one denominator.
pub fn reconcile(proposed: &[OwnerGroup], surviving: &[&OwnerGroup]) -> InterestReconciliation {
    let contributing: Vec<&OwnerGroup> = surviving
        .iter()
        .copied()
        .filter(|g| g.interest_denominator > 0)
        .collect();

    let mut common = common_denominator(proposed);
    if common == 0 {
        common = contributing
            .iter()
            .map(|g| g.interest_denominator)
            .max()
            .unwrap_or(0);
    }

    let mut contributions = Vec::new();
    for group in &contributing {
        contributions.push(InterestContribution {
            group_id: Some(group.group_id),
            numerator: group.interest_numerator,
            denominator: group.interest_denominator,
            rescaled: rescale_numerator(group.interest_numerator, group.interest_denominator, common),
        });
    }
    for group in proposed {
        contributions.push(InterestContribution {
            group_id: None,
            numerator: group.interest_numerator,
            denominator: group.interest_denominator,
            rescaled: rescale_numerator(group.interest_numerator, group.interest_denominator, common),
        });
    }

    InterestReconciliation {
        common_denominator: common,
        numerator_sum: contributions.iter().map(|c| c.rescaled).sum(),
        group_count: proposed.len() + contributing.len(),
        contributions,
    }
}

/// Aggregate interest check for a tenants-in-common request.
pub fn validate_group_interest(
    proposed: &[OwnerGroup],
    state: &CurrentState,
    deleted_ids: &[u32],
    report: &mut ValidationReport,
) -> InterestReconciliation {
    let surviving: Vec<&OwnerGroup> = state
        .surviving_groups(deleted_ids)
        .into_iter()
        .filter(|g| g.status == GroupStatus::Active)
        .collect();

    for group in &surviving {
        if group.interest_numerator > 0 && group.interest_denominator == 0 {
            tracing::warn!(
                mhr_number = %state.mhr_number,
                group_id = group.group_id,
                "recorded interest has a numerator without a denominator"
            );
            report.push_with(
                ErrorCode::ExistingInterestMalformed,
                &format!("ownerGroups[{}]", group.group_id),
                format!(
                    "Recorded owner group {} has interest numerator {} without a denominator.",
                    group.group_id, group.interest_numerator
                ),
            );
        }
    }

    let reconciliation = reconcile(proposed, &surviving);
    tracing::debug!(summary = %reconciliation.summary(), "reconciled group interest");

    if reconciliation.common_denominator > 0 && !reconciliation.is_balanced() {
        report.push_with(
            ErrorCode::GroupInterestMismatch,
            "addOwnerGroups",
            format!(
                "{} The sum is {}/{}.",
                ErrorCode::GroupInterestMismatch.message(),
                reconciliation.numerator_sum,
                reconciliation.common_denominator
            ),
        );
    }

    reconciliation
}

// ============================================================================
// TESTS
// ============================================================================
