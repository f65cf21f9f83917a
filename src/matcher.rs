// 🔍 Edit Matcher - Tell a real ownership change from a restatement
//
// Two ways an added owner can restate a recorded one:
// 1. Exact match: same name and same address
// 2. Declared edit: previousOwnerId points at a recorded owner with the same name
//
// Matching is exact string equality, not fuzzy. When in doubt a group counts
// as changed.

use crate::entities::{Owner, OwnerGroup, TransferRequest};
use crate::errors::{ErrorCode, ValidationReport};
use crate::history::CurrentState;
use serde::{Deserialize, Serialize};

// ============================================================================
// OWNER MATCHING
// ============================================================================

/// Same name (business, or first + middle + last) and same address.
pub fn owners_match(a: &Owner, b: &Owner) -> bool {
    a.same_name(b) && a.address == b.address
}

/// The candidate declares it replaces a recorded owner of the same name.
pub fn is_edit_owner(state: &CurrentState, candidate: &Owner) -> bool {
    candidate
        .previous_owner_id
        .and_then(|id| state.find_owner(id))
        .map_or(false, |existing| existing.same_name(candidate))
}

/// `added` restates `recorded` exactly or as a declared edit of it.
fn restates(state: &CurrentState, added: &Owner, recorded: &Owner) -> bool {
    if owners_match(added, recorded) {
        return true;
    }
    recorded.owner_id.is_some()
        && added.previous_owner_id == recorded.owner_id
        && is_edit_owner(state, added)
}

/// Every owner of `added` restates a distinct owner of `recorded`, and the
/// owner counts are equal.
pub fn group_restates(state: &CurrentState, recorded: &OwnerGroup, added: &OwnerGroup) -> bool {
    if recorded.owners.is_empty() || recorded.owners.len() != added.owners.len() {
        return false;
    }
    let assignment = max_matching(added.owners.len(), recorded.owners.len(), |a, r| {
        restates(state, &added.owners[a], &recorded.owners[r])
    });
    assignment.iter().all(Option::is_some)
}

/// `add_group` restates one of the groups being deleted.
pub fn group_owners_unchanged(state: &CurrentState, delete_groups: &[&OwnerGroup], add_group: &OwnerGroup) -> bool {
    delete_groups
        .iter()
        .any(|recorded| group_restates(state, recorded, add_group))
}

// ============================================================================
// GROUP CHANGE RESOLUTION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupChangeResolution {
    /// (add group index, deleted group id) pairs that are pure restatements
    pub unchanged: Vec<(usize, u32)>,

    /// Add group indexes that change ownership
    pub changed_add: Vec<usize>,

    /// Delete entries that change ownership (None when the entry had no id)
    pub changed_delete: Vec<Option<u32>>,
}

impl GroupChangeResolution {
    pub fn is_unchanged(&self, add_index: usize) -> bool {
        self.unchanged.iter().any(|(index, _)| *index == add_index)
    }
}

/// Pair each add group with at most one delete group it restates.
///
/// Uses a maximum matching, so the number of changed groups does not depend
/// on the order of entries in the request.
pub fn resolve_group_changes(state: &CurrentState, request: &TransferRequest) -> GroupChangeResolution {
    let adds = &request.add_owner_groups;
    let deletes: Vec<(Option<u32>, Option<&OwnerGroup>)> = request
        .delete_groups()
        .iter()
        .map(|d| (d.group_id, d.group_id.and_then(|id| state.find_group(id))))
        .collect();

    let assignment = max_matching(adds.len(), deletes.len(), |a, d| {
        deletes[d]
            .1
            .map_or(false, |recorded| group_owners_unchanged(state, &[recorded], &adds[a]))
    });

    let mut resolution = GroupChangeResolution {
        unchanged: Vec::new(),
        changed_add: Vec::new(),
        changed_delete: Vec::new(),
    };
    let mut matched_deletes = vec![false; deletes.len()];

    for (add_index, matched) in assignment.iter().enumerate() {
        match matched.and_then(|d| deletes[d].0.map(|id| (d, id))) {
            Some((delete_index, group_id)) => {
                matched_deletes[delete_index] = true;
                resolution.unchanged.push((add_index, group_id));
            }
            None => resolution.changed_add.push(add_index),
        }
    }
    for (delete_index, (group_id, _)) in deletes.iter().enumerate() {
        if !matched_deletes[delete_index] {
            resolution.changed_delete.push(*group_id);
        }
    }

    tracing::debug!(
        unchanged = resolution.unchanged.len(),
        changed_add = resolution.changed_add.len(),
        changed_delete = resolution.changed_delete.len(),
        "resolved owner group changes"
    );
    resolution
}

/// A death transfer changes exactly one group on each side.
pub fn validate_death_group_count(
    request: &TransferRequest,
    resolution: &GroupChangeResolution,
    report: &mut ValidationReport,
) {
    if request.delete_groups().is_empty() || resolution.changed_delete.is_empty() {
        report.push(ErrorCode::TranDeathDeleteMissing, "deleteOwnerGroups");
    }
    if request.add_owner_groups.is_empty() || resolution.changed_add.is_empty() {
        report.push(ErrorCode::TranDeathAddMissing, "addOwnerGroups");
    }
    if resolution.changed_delete.len() > 1 || resolution.changed_add.len() > 1 {
        report.push(ErrorCode::TranDeathGroupCount, "addOwnerGroups");
    }
}

// ============================================================================
// BIPARTITE MATCHING
// ============================================================================

/// Maximum bipartite matching (augmenting paths). Returns, for each left
/// index, the right index it is paired with.
fn max_matching<F>(left: usize, right: usize, edge: F) -> Vec<Option<usize>>
where
    F: Fn(usize, usize) -> bool,
{
    let mut right_match: Vec<Option<usize>> = vec![None; right];
    for l in 0..left {
        let mut visited = vec![false; right];
        augment(l, &edge, &mut visited, &mut right_match);
    }

    let mut left_match = vec![None; left];
    for (r, paired) in right_match.iter().enumerate() {
        if let Some(l) = paired {
            left_match[*l] = Some(r);
        }
    }
    left_match
}

fn augment<F>(l: usize, edge: &F, visited: &mut [bool], right_match: &mut [Option<usize>]) -> bool
where
    F: Fn(usize, usize) -> bool,
{
    for r in 0..right_match.len() {
        if visited[r] || !edge(l, r) {
            continue;
        }
        visited[r] = true;
        let free = match right_match[r] {
            None => true,
            Some(other) => augment(other, edge, visited, right_match),
        };
        if free {
            right_match[r] = Some(l);
            return true;
        }
    }
    false
}

// ============================================================================
// TESTS
// ============================================================================
