// File: ./src/model/mod.rs
pub mod country;
pub mod item;
pub mod kind;
pub mod patch;

pub use country::CountryTable;
pub use item::{
    BasicPage, ContactLog, Event, MOCK_EVENT_NAME, Person, Resource, ResourceSources, Survey,
    mock_contact, mock_resource,
};
pub use kind::ResourceKind;
pub use patch::ResourcePatch;
