// Shared builders for unit tests

use crate::entities::{
    Address, DeleteOwnerGroup, Home, Owner, OwnerGroup, PartyType, Registration,
    RegistrationStatus, RegistrationType, TenancyType, TransferRequest,
};
use crate::history::CurrentState;
use chrono::{DateTime, TimeZone, Utc};

pub const TEST_MHR_NUMBER: &str = "000900";
pub const BASE_REGISTRATION_ID: u64 = 100;

pub fn test_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 15, 10, 30, 0).unwrap()
}

pub fn test_address() -> Address {
    Address {
        street: "1234 TEST-0001 STREET".to_string(),
        city: "VICTORIA".to_string(),
        region: "BC".to_string(),
        postal_code: "V8R 3A5".to_string(),
        country: "CA".to_string(),
    }
}

pub fn other_address() -> Address {
    Address {
        street: "99 HARBOUR ROAD".to_string(),
        city: "NANAIMO".to_string(),
        region: "BC".to_string(),
        postal_code: "V9R 5K1".to_string(),
        country: "CA".to_string(),
    }
}

/// Recorded individual owner
pub fn individual_owner(owner_id: u64, first: &str, last: &str) -> Owner {
    Owner::individual(first, None, last)
        .with_id(owner_id)
        .with_address(test_address())
}

/// Recorded business owner
pub fn business_owner(owner_id: u64, name: &str) -> Owner {
    Owner::business(name).with_id(owner_id).with_address(test_address())
}

/// Proposed individual owner (no recorded id)
pub fn new_individual(first: &str, last: &str) -> Owner {
    Owner::individual(first, None, last).with_address(test_address())
}

/// Proposed business owner (no recorded id)
pub fn new_business(name: &str) -> Owner {
    Owner::business(name).with_address(test_address())
}

pub fn executor(first: &str, last: &str) -> Owner {
    new_individual(first, last).with_party_type(
        PartyType::Executor,
        Some("EXECUTOR OF THE ESTATE OF JOHN SMITH"),
    )
}

pub fn administrator(first: &str, last: &str) -> Owner {
    new_individual(first, last).with_party_type(
        PartyType::Administrator,
        Some("ADMINISTRATOR OF THE ESTATE OF JOHN SMITH"),
    )
}

pub fn with_registration(mut group: OwnerGroup, registration_id: u64) -> OwnerGroup {
    group.registration_id = registration_id;
    group
}

pub fn sole_group(group_id: u32, owner: Owner) -> OwnerGroup {
    with_registration(
        OwnerGroup::new(group_id, TenancyType::Sole, vec![owner]),
        BASE_REGISTRATION_ID,
    )
}

pub fn joint_group(group_id: u32, owners: Vec<Owner>) -> OwnerGroup {
    with_registration(
        OwnerGroup::new(group_id, TenancyType::Joint, owners),
        BASE_REGISTRATION_ID,
    )
}

pub fn common_group(group_id: u32, numerator: u32, denominator: u32, owner: Owner) -> OwnerGroup {
    with_registration(
        OwnerGroup::new(group_id, TenancyType::Common, vec![owner])
            .with_interest(numerator, denominator),
        BASE_REGISTRATION_ID,
    )
}

pub fn na_group(group_id: u32, owners: Vec<Owner>) -> OwnerGroup {
    with_registration(
        OwnerGroup::new(group_id, TenancyType::Na, owners),
        BASE_REGISTRATION_ID,
    )
}

/// Home with only a base registration carrying `groups`
pub fn create_test_home(groups: Vec<OwnerGroup>) -> Home {
    let mut base = Registration::new(
        BASE_REGISTRATION_ID,
        RegistrationType::MhReg,
        test_time(),
        RegistrationStatus::Active,
    );
    base.owner_groups = groups;
    Home::new(TEST_MHR_NUMBER, base)
}

pub fn create_test_state(groups: Vec<OwnerGroup>) -> CurrentState {
    CurrentState::project(&create_test_home(groups), test_time())
}

/// State for a brand-new registration (nothing recorded yet)
pub fn empty_state() -> CurrentState {
    create_test_state(Vec::new())
}

pub fn transfer_request(
    registration_type: RegistrationType,
    deletes: Vec<(u32, TenancyType)>,
    adds: Vec<OwnerGroup>,
) -> TransferRequest {
    TransferRequest::new(registration_type)
        .deleting(
            deletes
                .into_iter()
                .map(|(id, tenancy)| DeleteOwnerGroup::new(id, tenancy))
                .collect(),
        )
        .adding(adds)
}

pub fn new_registration_request(adds: Vec<OwnerGroup>) -> TransferRequest {
    TransferRequest::new(RegistrationType::MhReg).adding(adds)
}
