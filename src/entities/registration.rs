// 🗂️ Registration Entity - Immutable events in a home's history
//
// A home's history is a base registration plus an ordered list of change
// registrations. Registrations are never mutated except for status transitions
// driven by later registrations.

use super::note::UnitNote;
use super::owner_group::{DeleteOwnerGroup, OwnerGroup};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// REGISTRATION TYPE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RegistrationType {
    /// Initial manufactured home registration
    #[serde(rename = "MHREG")]
    MhReg,

    /// Transfer due to sale or gift
    #[serde(rename = "TRANS")]
    TransferSale,

    /// Transfer to surviving joint tenant(s)
    #[serde(rename = "TRAND")]
    TransferDeath,

    /// Transfer to executor, estate under $25,000 affidavit
    #[serde(rename = "TRANS_AFFIDAVIT")]
    TransferAffidavit,

    /// Transfer to administrator (grant of administration)
    #[serde(rename = "TRANS_ADMIN")]
    TransferAdmin,

    /// Transfer to executor (grant of probate with will)
    #[serde(rename = "TRANS_WILL")]
    TransferWill,

    #[serde(rename = "EXEMPTION_RES")]
    ExemptionRes,

    #[serde(rename = "EXEMPTION_NON_RES")]
    ExemptionNonRes,

    #[serde(rename = "PERMIT")]
    Permit,

    #[serde(rename = "PERMIT_EXTENSION")]
    PermitExtension,

    #[serde(rename = "AMEND_PERMIT")]
    AmendPermit,

    #[serde(rename = "CANCEL_PERMIT")]
    CancelPermit,

    /// Staff notes and administrative registrations
    #[serde(rename = "REG_STAFF_ADMIN")]
    StaffAdmin,

    #[serde(rename = "CORRECTION")]
    Correction,

    #[serde(rename = "AMENDMENT")]
    Amendment,
}

impl RegistrationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistrationType::MhReg => "MHREG",
            RegistrationType::TransferSale => "TRANS",
            RegistrationType::TransferDeath => "TRAND",
            RegistrationType::TransferAffidavit => "TRANS_AFFIDAVIT",
            RegistrationType::TransferAdmin => "TRANS_ADMIN",
            RegistrationType::TransferWill => "TRANS_WILL",
            RegistrationType::ExemptionRes => "EXEMPTION_RES",
            RegistrationType::ExemptionNonRes => "EXEMPTION_NON_RES",
            RegistrationType::Permit => "PERMIT",
            RegistrationType::PermitExtension => "PERMIT_EXTENSION",
            RegistrationType::AmendPermit => "AMEND_PERMIT",
            RegistrationType::CancelPermit => "CANCEL_PERMIT",
            RegistrationType::StaffAdmin => "REG_STAFF_ADMIN",
            RegistrationType::Correction => "CORRECTION",
            RegistrationType::Amendment => "AMENDMENT",
        }
    }

    pub fn parse(code: &str) -> Option<Self> {
        match code {
            "MHREG" => Some(RegistrationType::MhReg),
            "TRANS" => Some(RegistrationType::TransferSale),
            "TRAND" => Some(RegistrationType::TransferDeath),
            "TRANS_AFFIDAVIT" => Some(RegistrationType::TransferAffidavit),
            "TRANS_ADMIN" => Some(RegistrationType::TransferAdmin),
            "TRANS_WILL" => Some(RegistrationType::TransferWill),
            "EXEMPTION_RES" => Some(RegistrationType::ExemptionRes),
            "EXEMPTION_NON_RES" => Some(RegistrationType::ExemptionNonRes),
            "PERMIT" => Some(RegistrationType::Permit),
            "PERMIT_EXTENSION" => Some(RegistrationType::PermitExtension),
            "AMEND_PERMIT" => Some(RegistrationType::AmendPermit),
            "CANCEL_PERMIT" => Some(RegistrationType::CancelPermit),
            "REG_STAFF_ADMIN" => Some(RegistrationType::StaffAdmin),
            "CORRECTION" => Some(RegistrationType::Correction),
            "AMENDMENT" => Some(RegistrationType::Amendment),
            _ => None,
        }
    }

    pub fn is_new_registration(&self) -> bool {
        *self == RegistrationType::MhReg
    }

    pub fn is_transfer(&self) -> bool {
        matches!(self, RegistrationType::TransferSale) || self.is_death_transfer()
    }

    pub fn is_death_transfer(&self) -> bool {
        matches!(
            self,
            RegistrationType::TransferDeath
                | RegistrationType::TransferAffidavit
                | RegistrationType::TransferAdmin
                | RegistrationType::TransferWill
        )
    }

    /// Registrations whose payload always carries add/delete owner groups.
    /// Corrections and amendments only do when the request says so.
    pub fn requires_owner_groups(&self) -> bool {
        self.is_new_registration() || self.is_transfer()
    }

    pub fn is_permit_related(&self) -> bool {
        matches!(
            self,
            RegistrationType::Permit
                | RegistrationType::PermitExtension
                | RegistrationType::AmendPermit
                | RegistrationType::CancelPermit
        )
    }
}

// ============================================================================
// DOCUMENT TYPE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentType {
    TransLandTitle,
    TransFamilyAct,
    TransInformalSale,
    TransQuitClaim,
    TransSeverGrant,
    TransReceivership,
    TransWritSeizure,
    RegcStaff,
    RegcClient,
    Puba,
    Exre,
    CancelPermit,
    #[serde(rename = "REREGISTER_C")]
    ReregisterC,
    Ncan,
    Stat,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::TransLandTitle => "TRANS_LAND_TITLE",
            DocumentType::TransFamilyAct => "TRANS_FAMILY_ACT",
            DocumentType::TransInformalSale => "TRANS_INFORMAL_SALE",
            DocumentType::TransQuitClaim => "TRANS_QUIT_CLAIM",
            DocumentType::TransSeverGrant => "TRANS_SEVER_GRANT",
            DocumentType::TransReceivership => "TRANS_RECEIVERSHIP",
            DocumentType::TransWritSeizure => "TRANS_WRIT_SEIZURE",
            DocumentType::RegcStaff => "REGC_STAFF",
            DocumentType::RegcClient => "REGC_CLIENT",
            DocumentType::Puba => "PUBA",
            DocumentType::Exre => "EXRE",
            DocumentType::CancelPermit => "CANCEL_PERMIT",
            DocumentType::ReregisterC => "REREGISTER_C",
            DocumentType::Ncan => "NCAN",
            DocumentType::Stat => "STAT",
        }
    }

    pub fn parse(code: &str) -> Option<Self> {
        match code {
            "TRANS_LAND_TITLE" => Some(DocumentType::TransLandTitle),
            "TRANS_FAMILY_ACT" => Some(DocumentType::TransFamilyAct),
            "TRANS_INFORMAL_SALE" => Some(DocumentType::TransInformalSale),
            "TRANS_QUIT_CLAIM" => Some(DocumentType::TransQuitClaim),
            "TRANS_SEVER_GRANT" => Some(DocumentType::TransSeverGrant),
            "TRANS_RECEIVERSHIP" => Some(DocumentType::TransReceivership),
            "TRANS_WRIT_SEIZURE" => Some(DocumentType::TransWritSeizure),
            "REGC_STAFF" => Some(DocumentType::RegcStaff),
            "REGC_CLIENT" => Some(DocumentType::RegcClient),
            "PUBA" => Some(DocumentType::Puba),
            "EXRE" => Some(DocumentType::Exre),
            "CANCEL_PERMIT" => Some(DocumentType::CancelPermit),
            "REREGISTER_C" => Some(DocumentType::ReregisterC),
            "NCAN" => Some(DocumentType::Ncan),
            "STAT" => Some(DocumentType::Stat),
            _ => None,
        }
    }
}

// ============================================================================
// REGISTRATION STATUS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegistrationStatus {
    /// Payment pending
    Draft,
    Active,
    Exempt,
    Cancelled,
}

impl RegistrationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistrationStatus::Draft => "DRAFT",
            RegistrationStatus::Active => "ACTIVE",
            RegistrationStatus::Exempt => "EXEMPT",
            RegistrationStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(code: &str) -> Option<Self> {
        match code {
            "DRAFT" => Some(RegistrationStatus::Draft),
            "ACTIVE" => Some(RegistrationStatus::Active),
            "EXEMPT" => Some(RegistrationStatus::Exempt),
            "CANCELLED" => Some(RegistrationStatus::Cancelled),
            _ => None,
        }
    }
}

// ============================================================================
// REGISTRATION ENTITY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub id: u64,

    pub registration_type: RegistrationType,

    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_type: Option<DocumentType>,

    pub registration_ts: DateTime<Utc>,

    pub status: RegistrationStatus,

    /// Groups created by this registration
    #[serde(default)]
    pub owner_groups: Vec<OwnerGroup>,

    /// Groups retired by this registration
    #[serde(default)]
    pub deleted_group_ids: Vec<u32>,

    #[serde(default)]
    pub notes: Vec<UnitNote>,
}

impl Registration {
    pub fn new(
        id: u64,
        registration_type: RegistrationType,
        registration_ts: DateTime<Utc>,
        status: RegistrationStatus,
    ) -> Self {
        Registration {
            id,
            registration_type,
            document_type: None,
            registration_ts,
            status,
            owner_groups: Vec::new(),
            deleted_group_ids: Vec::new(),
            notes: Vec::new(),
        }
    }
}

/// A manufactured home: base registration plus ordered change registrations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Home {
    pub mhr_number: String,

    pub base: Registration,

    #[serde(default)]
    pub changes: Vec<Registration>,
}

impl Home {
    pub fn new(mhr_number: &str, base: Registration) -> Self {
        Home {
            mhr_number: mhr_number.to_string(),
            base,
            changes: Vec::new(),
        }
    }

    /// Base first, then change registrations in recorded order.
    pub fn registrations(&self) -> impl Iterator<Item = &Registration> {
        std::iter::once(&self.base).chain(self.changes.iter())
    }

    /// The home's registration state is carried on the base registration.
    pub fn status(&self) -> RegistrationStatus {
        self.base.status
    }

    pub fn latest_registration_id(&self) -> u64 {
        self.changes.last().map_or(self.base.id, |r| r.id)
    }
}

// ============================================================================
// TRANSFER REQUEST
// ============================================================================

/// Incoming registration payload: a view over a registration before it exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub registration_type: RegistrationType,

    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_type: Option<DocumentType>,

    /// Staff-supplied transfer document type
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transfer_document_type: Option<DocumentType>,

    #[serde(default)]
    pub add_owner_groups: Vec<OwnerGroup>,

    /// None when the payload omitted deleteOwnerGroups entirely
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete_owner_groups: Option<Vec<DeleteOwnerGroup>>,

    /// Permit requests: the previous move has completed
    #[serde(default)]
    pub move_completed: bool,
}

impl TransferRequest {
    pub fn new(registration_type: RegistrationType) -> Self {
        TransferRequest {
            registration_type,
            document_type: None,
            transfer_document_type: None,
            add_owner_groups: Vec::new(),
            delete_owner_groups: None,
            move_completed: false,
        }
    }

    /// Builder: groups to add
    pub fn adding(mut self, groups: Vec<OwnerGroup>) -> Self {
        self.add_owner_groups = groups;
        self
    }

    /// Builder: groups to retire
    pub fn deleting(mut self, groups: Vec<DeleteOwnerGroup>) -> Self {
        self.delete_owner_groups = Some(groups);
        self
    }

    pub fn is_new(&self) -> bool {
        self.registration_type.is_new_registration()
    }

    /// The request changes ownership: its type always does, or it names
    /// groups to add or retire.
    pub fn modifies_owner_groups(&self) -> bool {
        self.registration_type.requires_owner_groups()
            || !self.add_owner_groups.is_empty()
            || self.delete_owner_groups.is_some()
    }

    pub fn delete_groups(&self) -> &[DeleteOwnerGroup] {
        self.delete_owner_groups.as_deref().unwrap_or(&[])
    }

    /// Group ids referenced by deleteOwnerGroups, in request order.
    pub fn deleted_group_ids(&self) -> Vec<u32> {
        self.delete_groups().iter().filter_map(|g| g.group_id).collect()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_type_classification() {
        assert!(RegistrationType::MhReg.is_new_registration());
        assert!(RegistrationType::TransferSale.is_transfer());
        assert!(!RegistrationType::TransferSale.is_death_transfer());
        assert!(RegistrationType::TransferWill.is_death_transfer());
        assert!(RegistrationType::TransferAdmin.requires_owner_groups());
        assert!(!RegistrationType::Correction.requires_owner_groups());
        assert!(!RegistrationType::Permit.requires_owner_groups());
        assert!(RegistrationType::CancelPermit.is_permit_related());
    }

    #[test]
    fn test_document_type_codes() {
        assert_eq!(DocumentType::parse("REREGISTER_C"), Some(DocumentType::ReregisterC));
        assert_eq!(
            serde_json::to_value(DocumentType::ReregisterC).unwrap(),
            serde_json::json!("REREGISTER_C")
        );
        assert_eq!(
            serde_json::to_value(DocumentType::TransLandTitle).unwrap(),
            serde_json::json!("TRANS_LAND_TITLE")
        );
        assert_eq!(DocumentType::parse("UNKNOWN"), None);
    }

    #[test]
    fn test_deserialize_transfer_request() {
        let request: TransferRequest = serde_json::from_value(serde_json::json!({
            "registrationType": "TRANS",
            "deleteOwnerGroups": [{ "groupId": 1, "type": "SOLE" }],
            "addOwnerGroups": [{
                "type": "SOLE",
                "owners": [{ "organizationName": "ABC HOLDINGS LTD", "partyType": "OWNER_BUS" }]
            }]
        }))
        .unwrap();

        assert_eq!(request.registration_type, RegistrationType::TransferSale);
        assert_eq!(request.deleted_group_ids(), vec![1]);
        assert_eq!(request.add_owner_groups.len(), 1);
        assert!(!request.move_completed);
    }

    #[test]
    fn test_missing_delete_groups_is_none() {
        let request: TransferRequest =
            serde_json::from_value(serde_json::json!({ "registrationType": "TRANS" })).unwrap();
        assert!(request.delete_owner_groups.is_none());
        assert!(request.delete_groups().is_empty());
    }

    #[test]
    fn test_correction_modifies_owner_groups_only_when_it_names_groups() {
        let bare = TransferRequest::new(RegistrationType::Correction);
        assert!(!bare.modifies_owner_groups());
        assert!(TransferRequest::new(RegistrationType::TransferSale).modifies_owner_groups());
        assert!(bare.deleting(Vec::new()).modifies_owner_groups());
    }
}
