// ⏰ Ownership History - Read path over a home's registration chain
//
// "What is current" is answered by walking the base registration and every
// change registration. CurrentState projects that walk once per request so the
// validators never re-walk the chain.

use crate::entities::{GroupStatus, Home, Owner, OwnerGroup, RegistrationStatus, UnitNote};
use crate::errors::HistoryResult;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};

// ============================================================================
// HISTORY PROVIDER
// ============================================================================

/// Source of a home's registration history.
///
/// The modern relational store and the legacy flat-record store both produce
/// the same `Home` shape; validators never know which one supplied it.
pub trait HistoryProvider {
    fn load_home(&self, mhr_number: &str) -> HistoryResult<Home>;
}

// ============================================================================
// CHAIN WALK
// ============================================================================

impl Home {
    /// Group ids retired by any registration in the chain.
    fn deleted_group_ids(&self) -> HashSet<u32> {
        self.registrations()
            .flat_map(|r| r.deleted_group_ids.iter().copied())
            .collect()
    }

    /// Currently ACTIVE/EXEMPT owner groups.
    pub fn current_groups(&self) -> Vec<&OwnerGroup> {
        let deleted = self.deleted_group_ids();
        self.registrations()
            .flat_map(|r| r.owner_groups.iter())
            .filter(|g| g.is_current() && !deleted.contains(&g.group_id))
            .collect()
    }

    /// Owner groups that were current immediately after `registration_id`.
    ///
    /// Groups are judged by deletions recorded up to that point, not by their
    /// present-day status.
    pub fn groups_as_of(&self, registration_id: u64) -> Vec<&OwnerGroup> {
        let mut groups: Vec<&OwnerGroup> = Vec::new();
        for registration in self.registrations() {
            groups.retain(|g| !registration.deleted_group_ids.contains(&g.group_id));
            groups.extend(
                registration
                    .owner_groups
                    .iter()
                    .filter(|g| g.status != GroupStatus::Draft),
            );
            if registration.id == registration_id {
                break;
            }
        }
        groups
    }

    /// Any group ever recorded, regardless of status.
    pub fn find_group(&self, group_id: u32) -> Option<&OwnerGroup> {
        self.registrations()
            .flat_map(|r| r.owner_groups.iter())
            .find(|g| g.group_id == group_id)
    }

    /// Any owner ever recorded, regardless of group status.
    pub fn find_owner(&self, owner_id: u64) -> Option<&Owner> {
        self.registrations()
            .flat_map(|r| r.owner_groups.iter())
            .flat_map(|g| g.owners.iter())
            .find(|o| o.owner_id == Some(owner_id))
    }
}

// ============================================================================
// CURRENT STATE PROJECTION
// ============================================================================

/// A home's registration chain materialized at a point in time.
#[derive(Debug, Clone, Serialize)]
pub struct CurrentState {
    pub mhr_number: String,

    pub status: RegistrationStatus,

    /// Evaluation time for note and permit expiry
    pub as_of: DateTime<Utc>,

    pub latest_registration_id: u64,

    /// Current ACTIVE/EXEMPT groups in recorded order
    pub groups: Vec<OwnerGroup>,

    /// Unexpired active notes other than transport permits
    pub notes: Vec<UnitNote>,

    /// Unexpired active transport permits
    pub permits: Vec<UnitNote>,

    /// Every group in history with its status as of projection
    group_index: BTreeMap<u32, OwnerGroup>,

    /// Every recorded owner keyed by owner id
    owner_index: HashMap<u64, Owner>,
}

impl CurrentState {
    /// Walk the chain once and build the read model.
    pub fn project(home: &Home, as_of: DateTime<Utc>) -> Self {
        let mut group_index: BTreeMap<u32, OwnerGroup> = BTreeMap::new();
        let mut owner_index: HashMap<u64, Owner> = HashMap::new();
        let mut order: Vec<u32> = Vec::new();
        let mut notes = Vec::new();
        let mut permits = Vec::new();

        for registration in home.registrations() {
            for deleted_id in &registration.deleted_group_ids {
                // Storage may already have marked the group PREVIOUS.
                if let Some(group) = group_index.get_mut(deleted_id) {
                    if group.status.is_current() {
                        group.status = GroupStatus::Previous;
                        group.change_registration_id = Some(registration.id);
                    }
                }
            }

            for group in &registration.owner_groups {
                for owner in &group.owners {
                    if let Some(owner_id) = owner.owner_id {
                        owner_index.insert(owner_id, owner.clone());
                    }
                }
                if !group_index.contains_key(&group.group_id) {
                    order.push(group.group_id);
                }
                group_index.insert(group.group_id, group.clone());
            }

            for note in registration.notes.iter().filter(|n| n.is_in_effect(as_of)) {
                if note.document_type.is_transport_permit() {
                    permits.push(note.clone());
                } else {
                    notes.push(note.clone());
                }
            }
        }

        let groups: Vec<OwnerGroup> = order
            .iter()
            .filter_map(|id| group_index.get(id))
            .filter(|g| g.is_current())
            .cloned()
            .collect();

        tracing::debug!(
            mhr_number = %home.mhr_number,
            current_groups = groups.len(),
            notes = notes.len(),
            permits = permits.len(),
            "projected current state"
        );

        CurrentState {
            mhr_number: home.mhr_number.clone(),
            status: home.status(),
            as_of,
            latest_registration_id: home.latest_registration_id(),
            groups,
            notes,
            permits,
            group_index,
            owner_index,
        }
    }

    pub fn current_groups(&self) -> &[OwnerGroup] {
        &self.groups
    }

    pub fn find_group(&self, group_id: u32) -> Option<&OwnerGroup> {
        self.group_index.get(&group_id)
    }

    pub fn find_owner(&self, owner_id: u64) -> Option<&Owner> {
        self.owner_index.get(&owner_id)
    }

    pub fn active_group_count(&self) -> usize {
        self.groups.len()
    }

    /// Current groups not referenced by `deleted_ids`.
    pub fn surviving_groups(&self, deleted_ids: &[u32]) -> Vec<&OwnerGroup> {
        self.groups
            .iter()
            .filter(|g| !deleted_ids.contains(&g.group_id))
            .collect()
    }

    pub fn active_permit(&self) -> Option<&UnitNote> {
        self.permits.first()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{NoteStatus, NoteType, Registration, RegistrationType, TenancyType};
    use crate::test_support::*;
    use chrono::TimeZone;

    #[test]
    fn test_new_home_has_base_groups_only() {
        let home = create_test_home(vec![sole_group(1, individual_owner(1, "JOHN", "SMITH"))]);

        assert_eq!(home.current_groups().len(), 1);
        assert_eq!(home.find_group(1).unwrap().tenancy_type, TenancyType::Sole);
        assert_eq!(home.find_owner(1).unwrap().display_name(), "JOHN SMITH");
        assert!(home.find_owner(99).is_none());
    }

    #[test]
    fn test_deleted_group_not_current() {
        let mut home = create_test_home(vec![sole_group(1, individual_owner(1, "JOHN", "SMITH"))]);
        let mut transfer = Registration::new(
            200,
            RegistrationType::TransferSale,
            test_time(),
            RegistrationStatus::Active,
        );
        transfer.deleted_group_ids = vec![1];
        transfer.owner_groups = vec![with_registration(
            sole_group(2, business_owner(2, "ABC HOLDINGS LTD")),
            200,
        )];
        home.changes.push(transfer);

        let current: Vec<u32> = home.current_groups().iter().map(|g| g.group_id).collect();
        assert_eq!(current, vec![2]);

        // Retired owners remain findable through history
        assert!(home.find_owner(1).is_some());
        assert!(home.find_group(1).is_some());
    }

    #[test]
    fn test_groups_as_of_earlier_registration() {
        let mut home = create_test_home(vec![sole_group(1, individual_owner(1, "JOHN", "SMITH"))]);
        let mut transfer = Registration::new(
            200,
            RegistrationType::TransferSale,
            test_time(),
            RegistrationStatus::Active,
        );
        transfer.deleted_group_ids = vec![1];
        transfer.owner_groups = vec![sole_group(2, business_owner(2, "ABC HOLDINGS LTD"))];
        home.changes.push(transfer);

        let at_base: Vec<u32> = home.groups_as_of(100).iter().map(|g| g.group_id).collect();
        let at_transfer: Vec<u32> = home.groups_as_of(200).iter().map(|g| g.group_id).collect();
        assert_eq!(at_base, vec![1]);
        assert_eq!(at_transfer, vec![2]);
    }

    #[test]
    fn test_projection_retires_deleted_groups() {
        let mut home = create_test_home(vec![sole_group(1, individual_owner(1, "JOHN", "SMITH"))]);
        let mut transfer = Registration::new(
            200,
            RegistrationType::TransferSale,
            test_time(),
            RegistrationStatus::Active,
        );
        transfer.deleted_group_ids = vec![1];
        transfer.owner_groups = vec![sole_group(2, business_owner(2, "ABC HOLDINGS LTD"))];
        home.changes.push(transfer);

        let state = CurrentState::project(&home, test_time());
        assert_eq!(state.active_group_count(), 1);
        assert_eq!(state.find_group(1).unwrap().status, GroupStatus::Previous);
        assert_eq!(state.find_group(1).unwrap().change_registration_id, Some(200));
        assert_eq!(state.latest_registration_id, 200);
    }

    #[test]
    fn test_projection_splits_notes_and_permits() {
        let mut home = create_test_home(vec![sole_group(1, individual_owner(1, "JOHN", "SMITH"))]);
        let as_of = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();

        let mut expired = UnitNote::new(100, NoteType::TransportPermit)
            .expiring(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
        expired.status = NoteStatus::Active;
        let live_permit = UnitNote::new(100, NoteType::TransportPermit)
            .expiring(Utc.with_ymd_and_hms(2025, 4, 1, 0, 0, 0).unwrap());
        let mut cancelled = UnitNote::new(100, NoteType::Taxn);
        cancelled.status = NoteStatus::Cancelled;

        home.base.notes = vec![expired, live_permit, cancelled, UnitNote::new(100, NoteType::Caution)];

        let state = CurrentState::project(&home, as_of);
        assert_eq!(state.permits.len(), 1);
        assert_eq!(state.notes.len(), 1);
        assert_eq!(state.notes[0].document_type, NoteType::Caution);
        assert!(state.active_permit().is_some());
    }

    #[test]
    fn test_surviving_groups() {
        let home = create_test_home(vec![
            common_group(1, 1, 2, individual_owner(1, "JOHN", "SMITH")),
            common_group(2, 1, 2, individual_owner(2, "JANE", "SMITH")),
        ]);
        let state = CurrentState::project(&home, test_time());

        let surviving: Vec<u32> = state.surviving_groups(&[1]).iter().map(|g| g.group_id).collect();
        assert_eq!(surviving, vec![2]);
    }
}
