// File: ./src/reader.rs
//! Display-ready projections of (possibly absent) backend records.
//!
//! Every accessor accepts a missing record and returns an empty string or
//! `false`, so views never have to special-case "nothing loaded yet".
use crate::model::patch::{EVENT_STATUS, PAGE_STATUS, SURVEY_STATUS};
use crate::model::{BasicPage, CountryTable, Event, Person, Resource, Survey};
use crate::time::{TimeConverter, parse_instant};

#[derive(Debug, Clone, Copy)]
pub struct EventReader<'a> {
    event: Option<&'a Event>,
    converter: &'a TimeConverter,
}

impl<'a> EventReader<'a> {
    pub fn new(event: Option<&'a Event>, converter: &'a TimeConverter) -> Self {
        Self { event, converter }
    }

    pub fn name(&self) -> String {
        self.event.map(|e| e.name.clone()).unwrap_or_default()
    }

    pub fn intro(&self) -> String {
        self.event.map(|e| e.intro.clone()).unwrap_or_default()
    }

    pub fn venue(&self) -> String {
        self.event.map(|e| e.venue.name.clone()).unwrap_or_default()
    }

    pub fn person(&self) -> String {
        self.event.map(|e| e.contact.name.clone()).unwrap_or_default()
    }

    pub fn published(&self) -> bool {
        self.event
            .is_some_and(|e| e.status == EVENT_STATUS[1])
    }

    /// Start as `HH:MM` on the reference clock.
    pub fn start_time(&self) -> String {
        self.clock(self.event.and_then(|e| e.start_time.as_deref()))
    }

    pub fn end_time(&self) -> String {
        self.clock(self.event.and_then(|e| e.end_time.as_deref()))
    }

    /// Day of the start instant on the reference clock, `YYYY-MM-DD`.
    pub fn date(&self) -> String {
        self.start_date()
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default()
    }

    pub fn start_date(&self) -> Option<chrono::NaiveDate> {
        let raw = self.event.and_then(|e| e.start_time.as_deref())?;
        let instant = parse_instant(raw)?;
        Some(self.converter.to_wall_clock(instant).date())
    }

    fn clock(&self, raw: Option<&str>) -> String {
        raw.and_then(parse_instant)
            .map(|instant| self.converter.to_wall_clock(instant).hhmm())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PersonReader<'a> {
    person: Option<&'a Person>,
    countries: &'a CountryTable,
}

impl<'a> PersonReader<'a> {
    pub fn new(person: Option<&'a Person>, countries: &'a CountryTable) -> Self {
        Self { person, countries }
    }

    pub fn first_name(&self) -> String {
        self.person.map(|p| p.first_name.clone()).unwrap_or_default()
    }

    pub fn last_name(&self) -> String {
        self.person.map(|p| p.last_name.clone()).unwrap_or_default()
    }

    pub fn email(&self) -> String {
        self.person.map(|p| p.email.clone()).unwrap_or_default()
    }

    pub fn employer(&self) -> String {
        self.person.map(|p| p.employer.clone()).unwrap_or_default()
    }

    pub fn party(&self) -> String {
        self.person.map(|p| p.party.clone()).unwrap_or_default()
    }

    pub fn state(&self) -> String {
        self.person
            .map(|p| p.registered_address.state.clone())
            .unwrap_or_default()
    }

    pub fn country_code(&self) -> String {
        self.person
            .map(|p| p.registered_address.country_code.clone())
            .unwrap_or_default()
    }

    pub fn country(&self) -> String {
        let code = self.country_code();
        if code.is_empty() {
            return code;
        }
        self.countries.display(&code)
    }

    /// "Ada L." style name. Missing parts are dropped instead of failing.
    pub fn short_name(&self) -> String {
        let first = self.first_name();
        let initial = self
            .last_name()
            .trim()
            .chars()
            .next()
            .map(|c| format!("{}.", c.to_uppercase()))
            .unwrap_or_default();
        [first.trim(), initial.as_str()]
            .iter()
            .filter(|s| !s.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PageReader<'a> {
    page: Option<&'a BasicPage>,
}

impl<'a> PageReader<'a> {
    pub fn new(page: Option<&'a BasicPage>) -> Self {
        Self { page }
    }

    pub fn name(&self) -> String {
        self.page.map(|p| p.name.clone()).unwrap_or_default()
    }

    pub fn slug(&self) -> String {
        self.page.map(|p| p.slug.clone()).unwrap_or_default()
    }

    pub fn title(&self) -> String {
        self.page.map(|p| p.title.clone()).unwrap_or_default()
    }

    pub fn content(&self) -> String {
        self.page.map(|p| p.content.clone()).unwrap_or_default()
    }

    pub fn published(&self) -> bool {
        self.page.is_some_and(|p| p.status == PAGE_STATUS[1])
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SurveyReader<'a> {
    survey: Option<&'a Survey>,
}

impl<'a> SurveyReader<'a> {
    pub fn new(survey: Option<&'a Survey>) -> Self {
        Self { survey }
    }

    pub fn name(&self) -> String {
        self.survey.map(|s| s.name.clone()).unwrap_or_default()
    }

    pub fn slug(&self) -> String {
        self.survey.map(|s| s.slug.clone()).unwrap_or_default()
    }

    pub fn published(&self) -> bool {
        self.survey.is_some_and(|s| s.status == SURVEY_STATUS[1])
    }
}

/// Field value for a form input named `field`, read from whichever record
/// the section edits. Checkboxes read as `"on"` or an empty string.
pub fn field_value(
    resource: Option<&Resource>,
    field: &str,
    converter: &TimeConverter,
    countries: &CountryTable,
) -> String {
    fn flag(on: bool) -> String {
        if on { "on".to_string() } else { String::new() }
    }

    match resource {
        Some(Resource::Event(e)) => {
            let r = EventReader::new(Some(e), converter);
            match field {
                "name" => r.name(),
                "intro" => r.intro(),
                "venue" => r.venue(),
                "person" => r.person(),
                "status" => flag(r.published()),
                "start_time" => r.start_time(),
                "end_time" => r.end_time(),
                "date" => r.date(),
                _ => String::new(),
            }
        }
        Some(Resource::Person(p)) => {
            let r = PersonReader::new(Some(p), countries);
            match field {
                "first_name" => r.first_name(),
                "last_name" => r.last_name(),
                "email" => r.email(),
                "employer" => r.employer(),
                "party" => r.party(),
                "state" => r.state(),
                "country_code" => r.country_code(),
                _ => String::new(),
            }
        }
        Some(Resource::BasicPage(b)) => {
            let r = PageReader::new(Some(b));
            match field {
                "name" => r.name(),
                "slug" => r.slug(),
                "title" => r.title(),
                "content" => r.content(),
                "status" => flag(r.published()),
                _ => String::new(),
            }
        }
        Some(Resource::Survey(s)) => {
            let r = SurveyReader::new(Some(s));
            match field {
                "name" => r.name(),
                "slug" => r.slug(),
                "status" => flag(r.published()),
                _ => String::new(),
            }
        }
        None => String::new(),
    }
}
