// File: ./src/sync.rs
//! Mutations against the backend, always followed by a fresh read.
//!
//! A person mutation also rebuilds the derived basic pages. That cascade is
//! strictly sequential: prior derived pages are deleted one at a time, then
//! the new pages are posted last-first with a pause between posts, because
//! the backend orders same-second records by arrival.
use crate::client::Backend;
use crate::derived::{DERIVED_SLUGS, derive_pages, is_derived};
use crate::model::{CountryTable, Person, Resource, ResourceKind, mock_contact};
use std::time::Duration;

pub const DEFAULT_CASCADE_DELAY: Duration = Duration::from_millis(250);

/// Canonical state read back after a mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncReport {
    pub kind: ResourceKind,
    /// Fresh listing of `kind`, newest first.
    pub records: Vec<Resource>,
    /// Fresh basic pages after a cascade, including one that failed partway.
    pub derived: Option<Vec<Resource>>,
    /// Cascade failures. The primary mutation stands regardless.
    pub warnings: Vec<String>,
}

impl SyncReport {
    fn new(kind: ResourceKind, records: Vec<Resource>) -> Self {
        Self {
            kind,
            records,
            derived: None,
            warnings: Vec::new(),
        }
    }

    pub fn first(&self) -> Option<&Resource> {
        self.records.first()
    }
}

#[derive(Debug, Clone)]
pub struct CrudSynchronizer<B> {
    backend: B,
    countries: CountryTable,
    cascade_delay: Duration,
}

impl<B: Backend> CrudSynchronizer<B> {
    pub fn new(backend: B, countries: CountryTable, cascade_delay: Duration) -> Self {
        Self {
            backend,
            countries,
            cascade_delay,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub async fn fetch(&self, kind: ResourceKind) -> Result<Vec<Resource>, String> {
        self.backend.list(kind).await
    }

    /// Re-reads `kind` after a create or update. An empty listing means the
    /// write did not land.
    async fn refetch_written(&self, kind: ResourceKind) -> Result<Vec<Resource>, String> {
        let records = self.fetch(kind).await?;
        if records.is_empty() {
            return Err(format!("No {} returned after write", kind));
        }
        Ok(records)
    }

    pub async fn create(&self, resource: &Resource) -> Result<SyncReport, String> {
        let kind = resource.kind();
        log::info!("Creating {}", kind);
        self.backend.create(resource).await?;
        let records = self.refetch_written(kind).await?;
        Ok(self.finish(SyncReport::new(kind, records)).await)
    }

    pub async fn update(&self, resource: &Resource) -> Result<SyncReport, String> {
        let kind = resource.kind();
        if !kind.supports_update() {
            return Err(format!("{} records cannot be updated", kind));
        }
        log::info!("Updating {} #{:?}", kind, resource.id());
        self.backend.update(resource).await?;
        let records = self.refetch_written(kind).await?;
        Ok(self.finish(SyncReport::new(kind, records)).await)
    }

    pub async fn delete(&self, kind: ResourceKind, id: u64) -> Result<SyncReport, String> {
        if !kind.supports_delete() {
            return Err(format!("{} records cannot be deleted", kind));
        }
        log::info!("Deleting {} #{}", kind, id);
        self.backend.delete(kind, id).await?;
        let records = self.fetch(kind).await?;
        Ok(self.finish(SyncReport::new(kind, records)).await)
    }

    /// Logs the harness contact against a person, then re-reads people.
    /// Contacts never touch the derived pages.
    pub async fn log_contact(&self, person_id: u64) -> Result<SyncReport, String> {
        log::info!("Logging contact for person #{}", person_id);
        self.backend
            .log_contact(person_id, &mock_contact(person_id))
            .await?;
        let records = self.refetch_written(ResourceKind::Person).await?;
        Ok(SyncReport::new(ResourceKind::Person, records))
    }

    /// Rebuilds the derived pages from the people currently on the backend.
    pub async fn regenerate_pages(&self) -> Result<Vec<Resource>, String> {
        let people = people_of(&self.fetch(ResourceKind::Person).await?);
        self.cascade(&people).await
    }

    async fn finish(&self, mut report: SyncReport) -> SyncReport {
        if report.kind != ResourceKind::Person {
            return report;
        }
        let people = people_of(&report.records);
        match self.cascade(&people).await {
            Ok(pages) => report.derived = Some(pages),
            Err(e) => {
                log::warn!("Derived page cascade failed: {}", e);
                report
                    .warnings
                    .push(format!("Derived pages not regenerated: {}", e));
                // Some pages may already be gone
                match self.fetch(ResourceKind::BasicPage).await {
                    Ok(pages) => report.derived = Some(pages),
                    Err(e) => log::warn!("Could not re-read basic pages: {}", e),
                }
            }
        }
        report
    }

    async fn cascade(&self, people: &[Person]) -> Result<Vec<Resource>, String> {
        let existing = self.fetch(ResourceKind::BasicPage).await?;
        for page in &existing {
            if let Resource::BasicPage(p) = page
                && is_derived(&p.slug)
                && let Some(id) = p.id
            {
                log::debug!("Removing derived page {} #{}", p.slug, id);
                self.backend.delete(ResourceKind::BasicPage, id).await?;
            }
        }

        let pages = derive_pages(people, &self.countries);
        for (i, page) in pages.into_iter().rev().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.cascade_delay).await;
            }
            log::debug!("Posting derived page {}", page.slug);
            self.backend.create(&Resource::BasicPage(page)).await?;
        }
        log::info!("Regenerated {} derived pages", DERIVED_SLUGS.len());

        self.fetch(ResourceKind::BasicPage).await
    }
}

fn people_of(records: &[Resource]) -> Vec<Person> {
    records
        .iter()
        .filter_map(|r| match r {
            Resource::Person(p) => Some(p.clone()),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{CallVerb, MemoryBackend};
    use crate::model::mock_resource;

    fn sync(backend: &MemoryBackend) -> CrudSynchronizer<MemoryBackend> {
        CrudSynchronizer::new(backend.clone(), CountryTable::default(), DEFAULT_CASCADE_DELAY)
    }

    #[tokio::test]
    async fn test_create_returns_refetched_record() {
        let backend = MemoryBackend::new();
        let report = sync(&backend)
            .create(&mock_resource(ResourceKind::Event))
            .await
            .unwrap();
        assert_eq!(report.first().and_then(|r| r.id()), Some(1));
        assert!(report.derived.is_none());
    }

    #[tokio::test]
    async fn test_survey_update_rejected_locally() {
        let backend = MemoryBackend::new();
        let res = sync(&backend)
            .update(&mock_resource(ResourceKind::Survey))
            .await;
        assert!(res.is_err());
        assert!(backend.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cascade_failure_keeps_primary() {
        let backend = MemoryBackend::new();
        backend.fail(CallVerb::Create, ResourceKind::BasicPage);
        let report = sync(&backend)
            .create(&mock_resource(ResourceKind::Person))
            .await
            .unwrap();
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.derived, Some(vec![]));
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(backend.records(ResourceKind::Person).len(), 1);
    }

    #[tokio::test]
    async fn test_contact_rereads_people_without_cascade() {
        let backend = MemoryBackend::new();
        let id = backend.insert(mock_resource(ResourceKind::Person));
        let report = sync(&backend).log_contact(id).await.unwrap();
        assert_eq!(report.kind, ResourceKind::Person);
        assert_eq!(report.first().and_then(|r| r.id()), Some(id));
        assert!(report.derived.is_none());
        let verbs: Vec<_> = backend.calls().iter().map(|c| c.verb).collect();
        assert_eq!(verbs, vec![CallVerb::LogContact, CallVerb::List]);
        assert_eq!(backend.contacts(id).len(), 1);
    }

    #[tokio::test]
    async fn test_failed_refetch_is_an_error() {
        let backend = MemoryBackend::new();
        backend.fail(CallVerb::List, ResourceKind::Event);
        let res = sync(&backend)
            .create(&mock_resource(ResourceKind::Event))
            .await;
        assert!(res.is_err());
    }
}
