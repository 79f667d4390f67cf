// File: ./src/form.rs
//! Static form layouts per resource kind and conversion of submitted
//! entries back into a backend payload.
use crate::calendar::PickerSelection;
use crate::model::patch::{
    AddressPatch, AffiliationPatch, EventInfoPatch, PagePatch, PersonInfoPatch, SchedulePatch,
    SurveyPatch,
};
use crate::model::{CountryTable, Resource, ResourceKind, ResourcePatch};
use crate::reader::EventReader;
use crate::time::TimeConverter;
use chrono::NaiveDate;

pub const SCHEDULE_FIELDSET: &str = "schedule";
pub const DATE_FIELD: &str = "date";
pub const CHOOSE_DAY_MESSAGE: &str = "Please choose a day";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Checkbox,
    Time,
    Date,
    /// Placeholder where the external date picker is mounted.
    Calendar,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub readonly: bool,
    /// Current input value; `"on"` marks a checked checkbox.
    pub value: String,
}

impl FieldSpec {
    fn new(name: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            label,
            kind,
            readonly: false,
            value: String::new(),
        }
    }

    fn text(name: &'static str, label: &'static str) -> Self {
        Self::new(name, label, FieldKind::Text)
    }

    fn readonly(mut self) -> Self {
        self.readonly = true;
        self
    }

    /// Whether the field contributes an entry when its fieldset is submitted.
    pub fn is_submitted(&self) -> bool {
        match self.kind {
            FieldKind::Calendar => false,
            FieldKind::Checkbox => !self.value.is_empty(),
            _ => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldsetTemplate {
    pub name: &'static str,
    pub legend: &'static str,
    pub fields: Vec<FieldSpec>,
}

/// Name/value pairs as a browser would submit them. Unchecked checkboxes
/// are absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormEntries(Vec<(String, String)>);

impl FormEntries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: &str) -> Self {
        self.push(name, value);
        self
    }

    pub fn push(&mut self, name: &str, value: &str) {
        self.0.push((name.to_string(), value.to_string()));
    }

    /// Last value submitted under `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .rev()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|(k, _)| k == name)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Parses `key=value` tokens; a bare `key` is a checked checkbox.
    pub fn parse_pairs<'a>(tokens: impl IntoIterator<Item = &'a str>) -> Self {
        let mut entries = Self::new();
        for token in tokens {
            match token.split_once('=') {
                Some((k, v)) => entries.push(k.trim(), v.trim()),
                None if !token.trim().is_empty() => entries.push(token.trim(), "on"),
                None => {}
            }
        }
        entries
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FormEntries {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Layout of the forms shown for `kind`. Pure and independent of data.
pub fn template_for(kind: ResourceKind) -> Vec<FieldsetTemplate> {
    match kind {
        ResourceKind::Event => vec![
            FieldsetTemplate {
                name: "info",
                legend: "Event Info",
                fields: vec![
                    FieldSpec::text("name", "Name"),
                    FieldSpec::text("intro", "Intro"),
                    FieldSpec::text("venue", "Location / Venue"),
                    FieldSpec::text("person", "Contact Person"),
                    FieldSpec::new("status", "Published", FieldKind::Checkbox),
                ],
            },
            FieldsetTemplate {
                name: SCHEDULE_FIELDSET,
                legend: "Schedule (US Eastern Time)",
                fields: vec![
                    FieldSpec::new("start_time", "Start time", FieldKind::Time),
                    FieldSpec::new("end_time", "End time", FieldKind::Time),
                    FieldSpec::new(DATE_FIELD, "Day of Event", FieldKind::Date).readonly(),
                    FieldSpec::new("calendar", "", FieldKind::Calendar),
                ],
            },
        ],
        ResourceKind::Person => vec![
            FieldsetTemplate {
                name: "info",
                legend: "Person Info",
                fields: vec![
                    FieldSpec::text("first_name", "First name"),
                    FieldSpec::text("last_name", "Last name"),
                    FieldSpec::text("email", "Email"),
                ],
            },
            FieldsetTemplate {
                name: "affiliation",
                legend: "Affiliation",
                fields: vec![
                    FieldSpec::text("employer", "Employer"),
                    FieldSpec::text("party", "Party"),
                ],
            },
            FieldsetTemplate {
                name: "address",
                legend: "Registered Address",
                fields: vec![
                    FieldSpec::text("state", "State"),
                    FieldSpec::text("country_code", "Country"),
                ],
            },
        ],
        ResourceKind::BasicPage => vec![FieldsetTemplate {
            name: "page",
            legend: "Basic Page",
            fields: vec![
                FieldSpec::text("name", "Name"),
                FieldSpec::text("slug", "Slug"),
                FieldSpec::text("title", "Title"),
                FieldSpec::text("content", "Content"),
                FieldSpec::new("status", "Published", FieldKind::Checkbox),
            ],
        }],
        ResourceKind::Survey => vec![FieldsetTemplate {
            name: "survey",
            legend: "Survey",
            fields: vec![
                FieldSpec::text("name", "Name"),
                FieldSpec::text("slug", "Slug"),
                FieldSpec::new("status", "Published", FieldKind::Checkbox),
            ],
        }],
    }
}

/// Only the schedule fieldset has a precondition: the operator must have
/// picked a day on the calendar widget.
pub fn validate(fieldset: &str, selection: Option<&PickerSelection>) -> Result<(), &'static str> {
    if fieldset != SCHEDULE_FIELDSET {
        return Ok(());
    }
    match selection {
        Some(sel) if sel.is_chosen() => Ok(()),
        _ => Err(CHOOSE_DAY_MESSAGE),
    }
}

/// Merges one fieldset's entries into a copy of `current` (or a fresh
/// record), producing the full payload to send.
pub fn format_submission(
    kind: ResourceKind,
    current: Option<&Resource>,
    fieldset: &str,
    entries: &FormEntries,
    converter: &TimeConverter,
    countries: &CountryTable,
) -> Result<Resource, String> {
    let mut payload = current
        .filter(|r| r.kind() == kind)
        .cloned()
        .unwrap_or_else(|| Resource::fresh(kind));
    let patch = build_patch(kind, &payload, fieldset, entries, converter, countries)?;
    patch.apply(&mut payload)?;
    Ok(payload)
}

fn text(entries: &FormEntries, name: &str) -> Option<String> {
    entries.get(name).map(|v| v.trim().to_string())
}

fn build_patch(
    kind: ResourceKind,
    base: &Resource,
    fieldset: &str,
    entries: &FormEntries,
    converter: &TimeConverter,
    countries: &CountryTable,
) -> Result<ResourcePatch, String> {
    let patch = match (kind, fieldset) {
        (ResourceKind::Event, "info") => ResourcePatch::EventInfo(EventInfoPatch {
            name: text(entries, "name"),
            intro: text(entries, "intro"),
            venue: text(entries, "venue"),
            person: text(entries, "person"),
            published: entries.contains("status"),
        }),
        (ResourceKind::Event, SCHEDULE_FIELDSET) => {
            ResourcePatch::Schedule(build_schedule(base, entries, converter)?)
        }
        (ResourceKind::Person, "info") => ResourcePatch::PersonInfo(PersonInfoPatch {
            first_name: text(entries, "first_name"),
            last_name: text(entries, "last_name"),
            email: text(entries, "email"),
        }),
        (ResourceKind::Person, "affiliation") => ResourcePatch::Affiliation(AffiliationPatch {
            employer: text(entries, "employer"),
            party: text(entries, "party"),
        }),
        (ResourceKind::Person, "address") => ResourcePatch::Address(AddressPatch {
            state: text(entries, "state"),
            country_code: text(entries, "country_code").map(|c| countries.normalize(&c)),
        }),
        (ResourceKind::BasicPage, "page") => ResourcePatch::Page(PagePatch {
            name: text(entries, "name"),
            slug: text(entries, "slug"),
            title: text(entries, "title"),
            content: entries.get("content").map(str::to_string),
            published: entries.contains("status"),
        }),
        (ResourceKind::Survey, "survey") => ResourcePatch::Survey(SurveyPatch {
            name: text(entries, "name"),
            slug: text(entries, "slug"),
            published: entries.contains("status"),
        }),
        (kind, other) => return Err(format!("Unknown fieldset '{}' for {}", other, kind)),
    };
    Ok(patch)
}

fn build_schedule(
    base: &Resource,
    entries: &FormEntries,
    converter: &TimeConverter,
) -> Result<SchedulePatch, String> {
    let day = match entries.get(DATE_FIELD).map(str::trim) {
        Some(raw) if !raw.is_empty() => Some(
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map_err(|e| format!("Invalid date '{}': {}", raw, e))?,
        ),
        _ => match base {
            Resource::Event(e) => EventReader::new(Some(e), converter).start_date(),
            _ => None,
        },
    };

    let mut patch = SchedulePatch::default();
    for (field, slot) in [
        ("start_time", &mut patch.start_time),
        ("end_time", &mut patch.end_time),
    ] {
        let Some(hhmm) = entries.get(field).map(str::trim).filter(|v| !v.is_empty()) else {
            continue;
        };
        let day = day.ok_or_else(|| CHOOSE_DAY_MESSAGE.to_string())?;
        *slot = Some(converter.schedule_string(day, hhmm)?);
    }
    Ok(patch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_templates_are_deterministic() {
        for kind in ResourceKind::iter() {
            assert_eq!(template_for(kind), template_for(kind));
            assert!(!template_for(kind).is_empty());
        }
    }

    #[test]
    fn test_parse_pairs() {
        let entries = FormEntries::parse_pairs(["name=Picnic", "status", "intro = hi"]);
        assert_eq!(entries.get("name"), Some("Picnic"));
        assert_eq!(entries.get("status"), Some("on"));
        assert_eq!(entries.get("intro"), Some("hi"));
        assert!(!entries.contains("venue"));
    }

    #[test]
    fn test_validate_only_guards_schedule() {
        assert!(validate("info", None).is_ok());
        assert_eq!(validate(SCHEDULE_FIELDSET, None), Err(CHOOSE_DAY_MESSAGE));
    }

    #[test]
    fn test_unknown_fieldset_is_an_error() {
        let err = format_submission(
            ResourceKind::Survey,
            None,
            "schedule",
            &FormEntries::new(),
            &TimeConverter::default(),
            &CountryTable::default(),
        );
        assert!(err.is_err());
    }
}
