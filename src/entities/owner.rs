// 👤 Owner Entity - A party holding a share inside exactly one owner group
//
// Identity: owner_id (assigned when the owner is recorded)
// Values: name, party type, description, address
// Transient: previous_owner_id (only in a transfer request, "this owner replaces that one")

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// PARTY TYPE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PartyType {
    /// Individual owner
    OwnerInd,

    /// Business owner
    OwnerBus,

    /// Executor of a deceased owner's estate
    Executor,

    /// Court-appointed administrator of an estate
    Administrator,

    /// Trustee (bankruptcy or estate)
    Trustee,

    /// A trust holding the home
    Trust,
}

impl PartyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PartyType::OwnerInd => "OWNER_IND",
            PartyType::OwnerBus => "OWNER_BUS",
            PartyType::Executor => "EXECUTOR",
            PartyType::Administrator => "ADMINISTRATOR",
            PartyType::Trustee => "TRUSTEE",
            PartyType::Trust => "TRUST",
        }
    }

    pub fn parse(code: &str) -> Option<Self> {
        match code {
            "OWNER_IND" => Some(PartyType::OwnerInd),
            "OWNER_BUS" => Some(PartyType::OwnerBus),
            "EXECUTOR" => Some(PartyType::Executor),
            "ADMINISTRATOR" => Some(PartyType::Administrator),
            "TRUSTEE" => Some(PartyType::Trustee),
            "TRUST" => Some(PartyType::Trust),
            _ => None,
        }
    }

    /// Plain owners need no description; every other party type does.
    pub fn is_owner(&self) -> bool {
        match self {
            PartyType::OwnerInd | PartyType::OwnerBus => true,
            PartyType::Executor
            | PartyType::Administrator
            | PartyType::Trustee
            | PartyType::Trust => false,
        }
    }

    /// Parties acting on behalf of an estate rather than owning outright.
    pub fn is_estate_representative(&self) -> bool {
        match self {
            PartyType::Executor | PartyType::Administrator | PartyType::Trustee => true,
            PartyType::OwnerInd | PartyType::OwnerBus | PartyType::Trust => false,
        }
    }

    /// Party types permitted together in a multi-owner NA group.
    pub fn allowed_in_na_group(&self) -> bool {
        match self {
            PartyType::Executor
            | PartyType::Administrator
            | PartyType::Trustee
            | PartyType::Trust => true,
            PartyType::OwnerInd | PartyType::OwnerBus => false,
        }
    }
}

impl Default for PartyType {
    fn default() -> Self {
        PartyType::OwnerInd
    }
}

// ============================================================================
// NAME & ADDRESS VALUES
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndividualName {
    pub first: String,

    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub middle: Option<String>,

    pub last: String,
}

impl IndividualName {
    pub fn new(first: &str, middle: Option<&str>, last: &str) -> Self {
        IndividualName {
            first: first.to_string(),
            middle: middle.map(|m| m.to_string()),
            last: last.to_string(),
        }
    }

    /// Missing and empty middle names compare equal.
    pub fn middle_or_empty(&self) -> &str {
        self.middle.as_deref().unwrap_or("")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(default)]
    pub street: String,

    #[serde(default)]
    pub city: String,

    #[serde(default)]
    pub region: String,

    #[serde(default)]
    pub postal_code: String,

    #[serde(default)]
    pub country: String,
}

/// Recorded on a deleted owner in a death transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeathDetails {
    pub certificate_number: String,
    pub death_date_time: DateTime<Utc>,
}

// ============================================================================
// OWNER ENTITY
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Owner {
    /// Recorded identity; None for owners proposed in a request
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<u64>,

    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_name: Option<String>,

    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub individual_name: Option<IndividualName>,

    #[serde(default)]
    pub party_type: PartyType,

    /// Capacity text, e.g. "EXECUTOR OF THE ESTATE OF JOHN SMITH"
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,

    /// Request-only: the recorded owner this one restates
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_owner_id: Option<u64>,

    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub death: Option<DeathDetails>,
}

impl Owner {
    pub fn individual(first: &str, middle: Option<&str>, last: &str) -> Self {
        Owner {
            individual_name: Some(IndividualName::new(first, middle, last)),
            party_type: PartyType::OwnerInd,
            ..Owner::default()
        }
    }

    pub fn business(name: &str) -> Self {
        Owner {
            organization_name: Some(name.to_string()),
            party_type: PartyType::OwnerBus,
            ..Owner::default()
        }
    }

    /// Builder: set party type and its description
    pub fn with_party_type(mut self, party_type: PartyType, description: Option<&str>) -> Self {
        self.party_type = party_type;
        self.description = description.map(|d| d.to_string());
        self
    }

    /// Builder: set address
    pub fn with_address(mut self, address: Address) -> Self {
        self.address = Some(address);
        self
    }

    /// Builder: set recorded identity
    pub fn with_id(mut self, owner_id: u64) -> Self {
        self.owner_id = Some(owner_id);
        self
    }

    /// Builder: declare the recorded owner this one replaces
    pub fn replacing(mut self, previous_owner_id: u64) -> Self {
        self.previous_owner_id = Some(previous_owner_id);
        self
    }

    pub fn is_business(&self) -> bool {
        self.organization_name.is_some()
    }

    /// Display name: organization name, or "FIRST MIDDLE LAST"
    pub fn display_name(&self) -> String {
        if let Some(org) = &self.organization_name {
            return org.clone();
        }
        match &self.individual_name {
            Some(name) => [name.first.as_str(), name.middle_or_empty(), name.last.as_str()]
                .iter()
                .filter(|part| !part.is_empty())
                .cloned()
                .collect::<Vec<_>>()
                .join(" "),
            None => String::new(),
        }
    }

    /// Exact name equality: business name, or first + middle + last.
    pub fn same_name(&self, other: &Owner) -> bool {
        match (&self.organization_name, &other.organization_name) {
            (Some(a), Some(b)) => return a == b,
            (Some(_), None) | (None, Some(_)) => return false,
            (None, None) => {}
        }
        match (&self.individual_name, &other.individual_name) {
            (Some(a), Some(b)) => {
                a.first == b.first && a.last == b.last && a.middle_or_empty() == b.middle_or_empty()
            }
            _ => false,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
