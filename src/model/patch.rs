// File: ./src/model/patch.rs
//! Partial updates, one type per fieldset.
//!
//! Each patch names exactly the fields its fieldset is authoritative for;
//! applying it to a record leaves every other field as it was.
use crate::model::item::{BasicPage, Event, Person, Resource, Survey};

pub const EVENT_STATUS: [&str; 2] = ["unlisted", "published"];
pub const PAGE_STATUS: [&str; 2] = ["drafted", "published"];
pub const SURVEY_STATUS: [&str; 2] = ["unlisted", "published"];

/// Picks the on/off value of a status checkbox. A checkbox missing from the
/// submitted entries is off.
pub fn status_value(table: &[&'static str; 2], checked: bool) -> &'static str {
    table[usize::from(checked)]
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventInfoPatch {
    pub name: Option<String>,
    pub intro: Option<String>,
    pub venue: Option<String>,
    pub person: Option<String>,
    pub published: bool,
}

/// Start/end as ISO strings already converted to UTC.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchedulePatch {
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersonInfoPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AffiliationPatch {
    pub employer: Option<String>,
    pub party: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AddressPatch {
    pub state: Option<String>,
    pub country_code: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PagePatch {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub published: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SurveyPatch {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub published: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResourcePatch {
    EventInfo(EventInfoPatch),
    Schedule(SchedulePatch),
    PersonInfo(PersonInfoPatch),
    Affiliation(AffiliationPatch),
    Address(AddressPatch),
    Page(PagePatch),
    Survey(SurveyPatch),
}

fn set(target: &mut String, value: Option<String>) {
    if let Some(v) = value {
        *target = v;
    }
}

impl ResourcePatch {
    pub fn apply(self, target: &mut Resource) -> Result<(), String> {
        match (self, target) {
            (ResourcePatch::EventInfo(p), Resource::Event(e)) => apply_event_info(p, e),
            (ResourcePatch::Schedule(p), Resource::Event(e)) => {
                if p.start_time.is_some() {
                    e.start_time = p.start_time;
                }
                if p.end_time.is_some() {
                    e.end_time = p.end_time;
                }
            }
            (ResourcePatch::PersonInfo(p), Resource::Person(person)) => {
                set(&mut person.first_name, p.first_name);
                set(&mut person.last_name, p.last_name);
                set(&mut person.email, p.email);
            }
            (ResourcePatch::Affiliation(p), Resource::Person(person)) => {
                set(&mut person.employer, p.employer);
                set(&mut person.party, p.party);
            }
            (ResourcePatch::Address(p), Resource::Person(person)) => apply_address(p, person),
            (ResourcePatch::Page(p), Resource::BasicPage(page)) => apply_page(p, page),
            (ResourcePatch::Survey(p), Resource::Survey(survey)) => apply_survey(p, survey),
            (patch, target) => {
                return Err(format!(
                    "Patch {:?} does not apply to a {}",
                    patch,
                    target.kind()
                ));
            }
        }
        Ok(())
    }
}

fn apply_event_info(p: EventInfoPatch, e: &mut Event) {
    set(&mut e.name, p.name);
    set(&mut e.intro, p.intro);
    set(&mut e.venue.name, p.venue);
    set(&mut e.contact.name, p.person);
    e.status = status_value(&EVENT_STATUS, p.published).to_string();
}

fn apply_address(p: AddressPatch, person: &mut Person) {
    set(&mut person.registered_address.state, p.state);
    set(&mut person.registered_address.country_code, p.country_code);
}

fn apply_page(p: PagePatch, page: &mut BasicPage) {
    set(&mut page.name, p.name);
    set(&mut page.slug, p.slug);
    set(&mut page.title, p.title);
    set(&mut page.content, p.content);
    page.status = status_value(&PAGE_STATUS, p.published).to_string();
}

fn apply_survey(p: SurveyPatch, survey: &mut Survey) {
    set(&mut survey.name, p.name);
    set(&mut survey.slug, p.slug);
    survey.status = status_value(&SURVEY_STATUS, p.published).to_string();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::item::mock_resource;
    use crate::model::kind::ResourceKind;

    #[test]
    fn test_schedule_patch_keeps_info_fields() {
        let mut res = mock_resource(ResourceKind::Event);
        ResourcePatch::Schedule(SchedulePatch {
            start_time: Some("2024-01-01T15:00:00+00:00".to_string()),
            end_time: None,
        })
        .apply(&mut res)
        .unwrap();

        let Resource::Event(e) = res else {
            panic!("expected event");
        };
        assert_eq!(e.name, "Homepage Design");
        assert_eq!(e.start_time.as_deref(), Some("2024-01-01T15:00:00+00:00"));
        assert_eq!(e.end_time.as_deref(), Some("2013-05-08T19:00:00+00:00"));
    }

    #[test]
    fn test_unchecked_status_is_off() {
        let mut res = mock_resource(ResourceKind::Event);
        ResourcePatch::EventInfo(EventInfoPatch::default())
            .apply(&mut res)
            .unwrap();
        let Resource::Event(e) = res else {
            panic!("expected event");
        };
        assert_eq!(e.status, "unlisted");
        assert_eq!(e.venue.name, "Ralphs Parking Lot");
    }

    #[test]
    fn test_mismatched_patch_is_rejected() {
        let mut res = mock_resource(ResourceKind::Survey);
        let err = ResourcePatch::PersonInfo(PersonInfoPatch::default()).apply(&mut res);
        assert!(err.is_err());
    }
}
