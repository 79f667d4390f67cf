// File: ./src/client/mod.rs
pub mod core;
pub mod memory;
pub mod middleware;

use crate::model::{ContactLog, Resource, ResourceKind};
use std::future::Future;

pub use crate::client::core::RestClient;
pub use crate::client::memory::{CallVerb, MemoryBackend, RecordedCall};

/// The REST collaborator, as seen by the synchronizer.
///
/// Mutations report success only; callers always re-read canonical state
/// with `list` afterwards.
pub trait Backend: Clone + Send + Sync + 'static {
    /// Records of `kind`, newest first.
    fn list(
        &self,
        kind: ResourceKind,
    ) -> impl Future<Output = Result<Vec<Resource>, String>> + Send;

    fn create(&self, resource: &Resource) -> impl Future<Output = Result<(), String>> + Send;

    fn update(&self, resource: &Resource) -> impl Future<Output = Result<(), String>> + Send;

    fn delete(
        &self,
        kind: ResourceKind,
        id: u64,
    ) -> impl Future<Output = Result<(), String>> + Send;

    /// Logs a contact against person `person_id`.
    fn log_contact(
        &self,
        person_id: u64,
        contact: &ContactLog,
    ) -> impl Future<Output = Result<(), String>> + Send;
}
