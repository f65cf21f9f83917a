// Entity Models - the manufactured home ownership record
//
// Each entity has:
// - Stable identity (registration id, group id, owner id) that NEVER changes
// - Closed enums for every coded value, so a new code is a compile-time change
// - Serde shapes matching the registration request payload

pub mod registration;
pub mod owner_group;
pub mod owner;
pub mod note;

pub use registration::{
    DocumentType, Home, Registration, RegistrationStatus, RegistrationType, TransferRequest,
};
pub use owner_group::{DeleteOwnerGroup, GroupStatus, OwnerGroup, TenancyType};
pub use owner::{Address, DeathDetails, IndividualName, Owner, PartyType};
pub use note::{NoteStatus, NoteType, UnitNote};
