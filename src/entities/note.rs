// 📌 Unit Note Entity - Cautions, restrictions, exemptions and transport permits
// Recorded against a home independently of ownership.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// NOTE TYPE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NoteType {
    /// Notice of tax sale
    #[serde(rename = "TAXN")]
    Taxn,

    /// Confidential note
    #[serde(rename = "NCON")]
    Ncon,

    /// Restraining order
    #[serde(rename = "REST")]
    Rest,

    #[serde(rename = "CAU")]
    Caution,

    #[serde(rename = "CAUC")]
    CautionChange,

    #[serde(rename = "CAUE")]
    CautionExtension,

    #[serde(rename = "NPUB")]
    PublicNote,

    #[serde(rename = "NCAN")]
    NoteCancel,

    #[serde(rename = "NRED")]
    NoteRedemption,

    #[serde(rename = "EXRS")]
    ExemptionRes,

    #[serde(rename = "EXNR")]
    ExemptionNonRes,

    #[serde(rename = "103")]
    TransportPermit,

    #[serde(rename = "103E")]
    PermitExtension,

    #[serde(rename = "AMPR")]
    AmendedPermit,
}

impl NoteType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoteType::Taxn => "TAXN",
            NoteType::Ncon => "NCON",
            NoteType::Rest => "REST",
            NoteType::Caution => "CAU",
            NoteType::CautionChange => "CAUC",
            NoteType::CautionExtension => "CAUE",
            NoteType::PublicNote => "NPUB",
            NoteType::NoteCancel => "NCAN",
            NoteType::NoteRedemption => "NRED",
            NoteType::ExemptionRes => "EXRS",
            NoteType::ExemptionNonRes => "EXNR",
            NoteType::TransportPermit => "103",
            NoteType::PermitExtension => "103E",
            NoteType::AmendedPermit => "AMPR",
        }
    }

    pub fn parse(code: &str) -> Option<Self> {
        match code {
            "TAXN" => Some(NoteType::Taxn),
            "NCON" => Some(NoteType::Ncon),
            "REST" => Some(NoteType::Rest),
            "CAU" => Some(NoteType::Caution),
            "CAUC" => Some(NoteType::CautionChange),
            "CAUE" => Some(NoteType::CautionExtension),
            "NPUB" => Some(NoteType::PublicNote),
            "NCAN" => Some(NoteType::NoteCancel),
            "NRED" => Some(NoteType::NoteRedemption),
            "EXRS" => Some(NoteType::ExemptionRes),
            "EXNR" => Some(NoteType::ExemptionNonRes),
            "103" => Some(NoteType::TransportPermit),
            "103E" => Some(NoteType::PermitExtension),
            "AMPR" => Some(NoteType::AmendedPermit),
            _ => None,
        }
    }

    pub fn is_transport_permit(&self) -> bool {
        matches!(
            self,
            NoteType::TransportPermit | NoteType::PermitExtension | NoteType::AmendedPermit
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NoteStatus {
    Active,
    Cancelled,
    Expired,
}

impl NoteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoteStatus::Active => "ACTIVE",
            NoteStatus::Cancelled => "CANCELLED",
            NoteStatus::Expired => "EXPIRED",
        }
    }

    pub fn parse(code: &str) -> Option<Self> {
        match code {
            "ACTIVE" => Some(NoteStatus::Active),
            "CANCELLED" => Some(NoteStatus::Cancelled),
            "EXPIRED" => Some(NoteStatus::Expired),
            _ => None,
        }
    }
}

// ============================================================================
// UNIT NOTE ENTITY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitNote {
    /// Registration that filed the note
    pub registration_id: u64,

    pub document_type: NoteType,

    pub status: NoteStatus,

    /// None = no expiry
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry_date_time: Option<DateTime<Utc>>,
}

impl UnitNote {
    pub fn new(registration_id: u64, document_type: NoteType) -> Self {
        UnitNote {
            registration_id,
            document_type,
            status: NoteStatus::Active,
            expiry_date_time: None,
        }
    }

    /// Builder: set expiry
    pub fn expiring(mut self, expiry: DateTime<Utc>) -> Self {
        self.expiry_date_time = Some(expiry);
        self
    }

    /// Active and not past its expiry at `as_of`.
    pub fn is_in_effect(&self, as_of: DateTime<Utc>) -> bool {
        self.status == NoteStatus::Active && self.expiry_date_time.map_or(true, |expiry| expiry > as_of)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_note_in_effect_until_expiry() {
        let expiry = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let note = UnitNote::new(10, NoteType::TransportPermit).expiring(expiry);

        assert!(note.is_in_effect(Utc.with_ymd_and_hms(2025, 5, 31, 0, 0, 0).unwrap()));
        assert!(!note.is_in_effect(expiry));
    }

    #[test]
    fn test_cancelled_note_not_in_effect() {
        let mut note = UnitNote::new(10, NoteType::Taxn);
        note.status = NoteStatus::Cancelled;

        assert!(!note.is_in_effect(Utc::now()));
    }

    #[test]
    fn test_permit_codes() {
        assert_eq!(NoteType::parse("103E"), Some(NoteType::PermitExtension));
        assert!(NoteType::AmendedPermit.is_transport_permit());
        assert!(!NoteType::Rest.is_transport_permit());
        assert_eq!(
            serde_json::to_value(NoteType::TransportPermit).unwrap(),
            serde_json::json!("103")
        );
    }
}
