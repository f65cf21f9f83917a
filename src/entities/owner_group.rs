// 👥 Owner Group Entity - A block of co-owners sharing one tenancy arrangement
//
// group_id is sequential and unique across a home's full history.
// Status only moves forward: DRAFT → ACTIVE, ACTIVE → PREVIOUS, ACTIVE → EXEMPT.

use super::owner::Owner;
use serde::{Deserialize, Serialize};

// ============================================================================
// TENANCY TYPE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TenancyType {
    /// One owner holds the whole
    #[serde(rename = "SOLE")]
    Sole,

    /// Undivided interest with right of survivorship
    #[serde(rename = "JOINT")]
    Joint,

    /// Tenants in common: divided fractional shares
    #[serde(rename = "COMMON")]
    Common,

    /// Not applicable: estate representative placeholder
    #[serde(rename = "NA")]
    Na,
}

impl TenancyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TenancyType::Sole => "SOLE",
            TenancyType::Joint => "JOINT",
            TenancyType::Common => "COMMON",
            TenancyType::Na => "NA",
        }
    }

    pub fn parse(code: &str) -> Option<Self> {
        match code {
            "SOLE" => Some(TenancyType::Sole),
            "JOINT" => Some(TenancyType::Joint),
            "COMMON" => Some(TenancyType::Common),
            "NA" => Some(TenancyType::Na),
            _ => None,
        }
    }
}

// ============================================================================
// GROUP STATUS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GroupStatus {
    Draft,
    Active,
    Exempt,
    Previous,
}

impl GroupStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupStatus::Draft => "DRAFT",
            GroupStatus::Active => "ACTIVE",
            GroupStatus::Exempt => "EXEMPT",
            GroupStatus::Previous => "PREVIOUS",
        }
    }

    pub fn parse(code: &str) -> Option<Self> {
        match code {
            "DRAFT" => Some(GroupStatus::Draft),
            "ACTIVE" => Some(GroupStatus::Active),
            "EXEMPT" => Some(GroupStatus::Exempt),
            "PREVIOUS" => Some(GroupStatus::Previous),
            _ => None,
        }
    }

    /// ACTIVE and EXEMPT groups are the home's current owners.
    pub fn is_current(&self) -> bool {
        match self {
            GroupStatus::Active | GroupStatus::Exempt => true,
            GroupStatus::Draft | GroupStatus::Previous => false,
        }
    }

    pub fn can_transition_to(&self, next: GroupStatus) -> bool {
        matches!(
            (self, next),
            (GroupStatus::Draft, GroupStatus::Active)
                | (GroupStatus::Active, GroupStatus::Previous)
                | (GroupStatus::Active, GroupStatus::Exempt)
        )
    }
}

impl Default for GroupStatus {
    fn default() -> Self {
        GroupStatus::Active
    }
}

// ============================================================================
// OWNER GROUP ENTITY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerGroup {
    /// 0 for groups proposed in a request (not yet numbered)
    #[serde(default)]
    pub group_id: u32,

    #[serde(rename = "type")]
    pub tenancy_type: TenancyType,

    #[serde(default)]
    pub status: GroupStatus,

    /// 0 = not specified
    #[serde(default)]
    pub interest_numerator: u32,

    /// 0 = not specified
    #[serde(default)]
    pub interest_denominator: u32,

    #[serde(default)]
    pub owners: Vec<Owner>,

    /// Registration that created the group
    #[serde(default)]
    pub registration_id: u64,

    /// Registration that retired the group, if any
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_registration_id: Option<u64>,
}

impl OwnerGroup {
    pub fn new(group_id: u32, tenancy_type: TenancyType, owners: Vec<Owner>) -> Self {
        OwnerGroup {
            group_id,
            tenancy_type,
            status: GroupStatus::Active,
            interest_numerator: 0,
            interest_denominator: 0,
            owners,
            registration_id: 0,
            change_registration_id: None,
        }
    }

    /// Builder: set fractional interest
    pub fn with_interest(mut self, numerator: u32, denominator: u32) -> Self {
        self.interest_numerator = numerator;
        self.interest_denominator = denominator;
        self
    }

    /// Builder: set status
    pub fn with_status(mut self, status: GroupStatus) -> Self {
        self.status = status;
        self
    }

    pub fn has_interest(&self) -> bool {
        self.interest_denominator > 0
    }

    pub fn owner_count(&self) -> usize {
        self.owners.len()
    }

    pub fn is_current(&self) -> bool {
        self.status.is_current()
    }

    /// Retire this group (ACTIVE → PREVIOUS) through a later registration.
    pub fn retire(&mut self, change_registration_id: u64) -> Result<(), String> {
        if !self.status.can_transition_to(GroupStatus::Previous) {
            return Err(format!(
                "Owner group {} cannot move from {} to PREVIOUS",
                self.group_id,
                self.status.as_str()
            ));
        }
        self.status = GroupStatus::Previous;
        self.change_registration_id = Some(change_registration_id);
        Ok(())
    }
}

/// Reference to an existing group in a request's deleteOwnerGroups.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteOwnerGroup {
    #[serde(default)]
    pub group_id: Option<u32>,

    #[serde(default, rename = "type")]
    pub tenancy_type: Option<TenancyType>,

    /// Restated owners (death details travel here in death transfers)
    #[serde(default)]
    pub owners: Vec<Owner>,
}

impl DeleteOwnerGroup {
    pub fn new(group_id: u32, tenancy_type: TenancyType) -> Self {
        DeleteOwnerGroup {
            group_id: Some(group_id),
            tenancy_type: Some(tenancy_type),
            owners: Vec::new(),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_transitions_forward_only() {
        assert!(GroupStatus::Draft.can_transition_to(GroupStatus::Active));
        assert!(GroupStatus::Active.can_transition_to(GroupStatus::Previous));
        assert!(GroupStatus::Active.can_transition_to(GroupStatus::Exempt));
        assert!(!GroupStatus::Previous.can_transition_to(GroupStatus::Active));
        assert!(!GroupStatus::Exempt.can_transition_to(GroupStatus::Active));
        assert!(!GroupStatus::Draft.can_transition_to(GroupStatus::Previous));
    }

    #[test]
    fn test_retire_group() {
        let mut group = OwnerGroup::new(1, TenancyType::Sole, vec![Owner::business("ABC LTD")]);
        group.retire(200).unwrap();

        assert_eq!(group.status, GroupStatus::Previous);
        assert_eq!(group.change_registration_id, Some(200));
        assert!(group.retire(300).is_err());
    }

    #[test]
    fn test_deserialize_request_group() {
        let group: OwnerGroup = serde_json::from_value(serde_json::json!({
            "type": "COMMON",
            "interestNumerator": 1,
            "interestDenominator": 3,
            "owners": [{ "organizationName": "ABC HOLDINGS LTD", "partyType": "OWNER_BUS" }]
        }))
        .unwrap();

        assert_eq!(group.tenancy_type, TenancyType::Common);
        assert_eq!(group.group_id, 0);
        assert!(group.has_interest());
        assert_eq!(group.owner_count(), 1);
    }

    #[test]
    fn test_delete_group_without_id() {
        let group: DeleteOwnerGroup = serde_json::from_value(serde_json::json!({ "type": "SOLE" })).unwrap();
        assert!(group.group_id.is_none());
        assert_eq!(group.tenancy_type, Some(TenancyType::Sole));
    }
}
