// File: ./src/client/memory.rs
//! In-process stand-in for the CMS API.
//!
//! Records are kept newest first and ids are assigned sequentially, the way
//! the real listing endpoints return them. Every call is logged with a
//! timestamp so ordering and pacing can be asserted on.
use crate::client::Backend;
use crate::model::{ContactLog, Resource, ResourceKind};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallVerb {
    List,
    Create,
    Update,
    Delete,
    /// Contact logged against a person; recorded with kind `Person`.
    LogContact,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub verb: CallVerb,
    pub kind: ResourceKind,
    pub id: Option<u64>,
    /// Slug of the record sent, for pages and surveys.
    pub slug: Option<String>,
    pub at: Instant,
}

impl RecordedCall {
    pub fn is_mutation(&self) -> bool {
        self.verb != CallVerb::List
    }
}

#[derive(Debug, Default)]
struct Inner {
    next_id: u64,
    records: HashMap<ResourceKind, Vec<Resource>>,
    contacts: HashMap<u64, Vec<ContactLog>>,
    calls: Vec<RecordedCall>,
    failing: HashSet<(CallVerb, ResourceKind)>,
    latency: Duration,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    inner: Arc<Mutex<Inner>>,
}

fn slug_of(resource: &Resource) -> Option<String> {
    match resource {
        Resource::BasicPage(p) => Some(p.slug.clone()),
        Resource::Survey(s) => Some(s.slug.clone()),
        _ => None,
    }
}

/// Overlays `patch` onto `base`, recursing into nested objects.
fn merge_values(base: &mut Value, patch: Value) {
    match (base, patch) {
        (Value::Object(b), Value::Object(p)) => {
            for (k, v) in p {
                match b.get_mut(&k) {
                    Some(existing) if existing.is_object() && v.is_object() => {
                        merge_values(existing, v)
                    }
                    _ => {
                        b.insert(k, v);
                    }
                }
            }
        }
        (b, p) => *b = p,
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Stores a record directly, bypassing the call log. Returns its id.
    pub fn insert(&self, mut resource: Resource) -> u64 {
        let mut inner = self.lock();
        inner.next_id += 1;
        let id = inner.next_id;
        resource.set_id(Some(id));
        inner
            .records
            .entry(resource.kind())
            .or_default()
            .insert(0, resource);
        id
    }

    pub fn records(&self, kind: ResourceKind) -> Vec<Resource> {
        self.lock().records.get(&kind).cloned().unwrap_or_default()
    }

    /// Contacts logged against `person_id`, newest first.
    pub fn contacts(&self, person_id: u64) -> Vec<ContactLog> {
        self.lock()
            .contacts
            .get(&person_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock().calls.clone()
    }

    pub fn mutations(&self) -> Vec<RecordedCall> {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.is_mutation())
            .cloned()
            .collect()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Makes every `verb` call on `kind` fail until `recover` is called.
    pub fn fail(&self, verb: CallVerb, kind: ResourceKind) {
        self.lock().failing.insert((verb, kind));
    }

    pub fn recover(&self, verb: CallVerb, kind: ResourceKind) {
        self.lock().failing.remove(&(verb, kind));
    }

    /// Delay applied before every call completes.
    pub fn set_latency(&self, latency: Duration) {
        self.lock().latency = latency;
    }

    /// Logs the call and returns the configured latency, or the injected failure.
    fn record(
        &self,
        verb: CallVerb,
        kind: ResourceKind,
        id: Option<u64>,
        slug: Option<String>,
    ) -> Result<Duration, String> {
        let mut inner = self.lock();
        inner.calls.push(RecordedCall {
            verb,
            kind,
            id,
            slug,
            at: Instant::now(),
        });
        if inner.failing.contains(&(verb, kind)) {
            log::debug!("Injected {:?} failure for {}", verb, kind);
            return Err(format!("{:?} {} failed (injected)", verb, kind));
        }
        Ok(inner.latency)
    }

    async fn pause(latency: Duration) {
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
    }
}

impl Backend for MemoryBackend {
    async fn list(&self, kind: ResourceKind) -> Result<Vec<Resource>, String> {
        let latency = self.record(CallVerb::List, kind, None, None)?;
        Self::pause(latency).await;
        Ok(self.records(kind))
    }

    async fn create(&self, resource: &Resource) -> Result<(), String> {
        let latency = self.record(CallVerb::Create, resource.kind(), None, slug_of(resource))?;
        Self::pause(latency).await;
        let id = self.insert(resource.clone());
        log::debug!("Created {} #{}", resource.kind(), id);
        Ok(())
    }

    async fn update(&self, resource: &Resource) -> Result<(), String> {
        let kind = resource.kind();
        let id = resource
            .id()
            .ok_or_else(|| format!("Cannot update a {} without an id", kind))?;
        let latency = self.record(CallVerb::Update, kind, Some(id), slug_of(resource))?;
        Self::pause(latency).await;

        let patch = resource.to_value()?;
        let mut inner = self.lock();
        let slot = inner
            .records
            .get_mut(&kind)
            .and_then(|list| list.iter_mut().find(|r| r.id() == Some(id)))
            .ok_or_else(|| format!("No {} with id {}", kind, id))?;
        let mut merged = slot.to_value()?;
        merge_values(&mut merged, patch);
        *slot = Resource::from_value(kind, merged)?;
        Ok(())
    }

    async fn delete(&self, kind: ResourceKind, id: u64) -> Result<(), String> {
        let latency = self.record(CallVerb::Delete, kind, Some(id), None)?;
        Self::pause(latency).await;

        let mut inner = self.lock();
        let list = inner.records.entry(kind).or_default();
        let before = list.len();
        list.retain(|r| r.id() != Some(id));
        if list.len() == before {
            return Err(format!("No {} with id {}", kind, id));
        }
        Ok(())
    }

    async fn log_contact(&self, person_id: u64, contact: &ContactLog) -> Result<(), String> {
        let kind = ResourceKind::Person;
        let latency = self.record(CallVerb::LogContact, kind, Some(person_id), None)?;
        Self::pause(latency).await;

        let mut inner = self.lock();
        let known = inner
            .records
            .get(&kind)
            .is_some_and(|list| list.iter().any(|r| r.id() == Some(person_id)));
        if !known {
            return Err(format!("No {} with id {}", kind, person_id));
        }
        inner
            .contacts
            .entry(person_id)
            .or_default()
            .insert(0, contact.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Person, mock_contact, mock_resource};

    #[tokio::test]
    async fn test_newest_first_with_sequential_ids() {
        let backend = MemoryBackend::new();
        backend.create(&mock_resource(ResourceKind::Person)).await.unwrap();
        backend.create(&mock_resource(ResourceKind::Person)).await.unwrap();
        let ids: Vec<_> = backend
            .list(ResourceKind::Person)
            .await
            .unwrap()
            .iter()
            .map(|r| r.id())
            .collect();
        assert_eq!(ids, vec![Some(2), Some(1)]);
    }

    #[tokio::test]
    async fn test_update_merges_fields() {
        let backend = MemoryBackend::new();
        let mut stored = Person {
            first_name: "Ada".to_string(),
            ..Default::default()
        };
        stored
            .registered_address
            .extra
            .insert("zip".to_string(), serde_json::json!("10001"));
        stored
            .extra
            .insert("tags".to_string(), serde_json::json!(["donor"]));
        let id = backend.insert(Resource::Person(stored));

        let partial = Resource::Person(Person {
            id: Some(id),
            first_name: "Grace".to_string(),
            ..Default::default()
        });
        backend.update(&partial).await.unwrap();

        let Resource::Person(p) = &backend.records(ResourceKind::Person)[0] else {
            panic!("expected person");
        };
        assert_eq!(p.first_name, "Grace");
        assert_eq!(p.extra["tags"], serde_json::json!(["donor"]));
        assert_eq!(p.registered_address.extra["zip"], serde_json::json!("10001"));
    }

    #[tokio::test]
    async fn test_injected_failure_is_logged() {
        let backend = MemoryBackend::new();
        backend.fail(CallVerb::Create, ResourceKind::Event);
        let res = backend.create(&mock_resource(ResourceKind::Event)).await;
        assert!(res.is_err());
        assert!(backend.records(ResourceKind::Event).is_empty());
        assert_eq!(backend.mutations().len(), 1);

        backend.recover(CallVerb::Create, ResourceKind::Event);
        assert!(backend.create(&mock_resource(ResourceKind::Event)).await.is_ok());
    }

    #[tokio::test]
    async fn test_contacts_attach_to_known_people() {
        let backend = MemoryBackend::new();
        let id = backend.insert(mock_resource(ResourceKind::Person));
        backend.log_contact(id, &mock_contact(id)).await.unwrap();
        assert_eq!(backend.contacts(id), vec![mock_contact(id)]);

        assert!(backend.log_contact(id + 1, &mock_contact(id + 1)).await.is_err());
        assert!(backend.contacts(id + 1).is_empty());
        let verbs: Vec<_> = backend.mutations().iter().map(|c| (c.verb, c.id)).collect();
        assert_eq!(
            verbs,
            vec![(CallVerb::LogContact, Some(id)), (CallVerb::LogContact, Some(id + 1))]
        );
    }

    #[tokio::test]
    async fn test_delete_unknown_id_fails() {
        let backend = MemoryBackend::new();
        assert!(backend.delete(ResourceKind::Person, 9).await.is_err());
    }
}
