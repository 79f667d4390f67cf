// Fieldset entries merged into existing records.
use cmsprobe::config::Config;
use cmsprobe::form::{FormEntries, format_submission};
use cmsprobe::model::{CountryTable, Resource, ResourceKind, mock_resource};
use cmsprobe::time::TimeConverter;
use serde_json::json;
use std::collections::BTreeMap;

fn countries() -> CountryTable {
    let mut map = BTreeMap::new();
    map.insert("FR".to_string(), "France".to_string());
    map.insert("UA".to_string(), "Ukraine".to_string());
    CountryTable::from_map(&map)
}

fn submit(current: &Resource, fieldset: &str, entries: FormEntries) -> Resource {
    format_submission(
        current.kind(),
        Some(current),
        fieldset,
        &entries,
        &TimeConverter::default(),
        &countries(),
    )
    .unwrap()
}

#[test]
fn test_info_submission_keeps_untouched_nested_fields() {
    let event = mock_resource(ResourceKind::Event);
    let entries = FormEntries::new()
        .with("name", " Launch Party ")
        .with("venue", "Rooftop")
        .with("status", "on");
    let Resource::Event(e) = submit(&event, "info", entries) else {
        panic!("expected event");
    };

    assert_eq!(e.name, "Launch Party");
    assert_eq!(e.venue.name, "Rooftop");
    assert_eq!(e.status, "published");
    // Not part of the fieldset
    assert_eq!(e.venue.address.city, "Pasadena");
    assert_eq!(e.contact.contact_email, "contact@venue.com");
    assert_eq!(e.extra["capacity"], json!(80));
    assert_eq!(e.start_time.as_deref(), Some("2013-05-08T17:00:00+00:00"));
}

#[test]
fn test_absent_checkbox_unpublishes() {
    let mut event = mock_resource(ResourceKind::Event);
    if let Resource::Event(e) = &mut event {
        e.status = "published".to_string();
    }
    let entries = FormEntries::new().with("name", "Quiet Launch");
    let Resource::Event(e) = submit(&event, "info", entries) else {
        panic!("expected event");
    };
    assert_eq!(e.status, "unlisted");

    let page = mock_resource(ResourceKind::BasicPage);
    let Resource::BasicPage(p) = submit(&page, "page", FormEntries::new().with("status", "on"))
    else {
        panic!("expected page");
    };
    assert_eq!(p.status, "published");
    let Resource::BasicPage(p) = submit(&page, "page", FormEntries::new()) else {
        panic!("expected page");
    };
    assert_eq!(p.status, "drafted");
}

#[test]
fn test_country_names_are_normalized_to_codes() {
    let person = mock_resource(ResourceKind::Person);
    let entries = FormEntries::new()
        .with("state", "")
        .with("country_code", "ukraine");
    let Resource::Person(p) = submit(&person, "address", entries) else {
        panic!("expected person");
    };
    assert_eq!(p.registered_address.country_code, "UA");
    assert_eq!(p.registered_address.state, "");

    let entries = FormEntries::new().with("country_code", "fr");
    let Resource::Person(p) = submit(&person, "address", entries) else {
        panic!("expected person");
    };
    assert_eq!(p.registered_address.country_code, "FR");
    // Other fieldsets are left alone
    assert_eq!(p.first_name, "Ada");
}

#[test]
fn test_schedule_without_date_falls_back_to_event_day() {
    let event = mock_resource(ResourceKind::Event);
    let entries = FormEntries::new().with("start_time", "08:15");
    let Resource::Event(e) = submit(&event, "schedule", entries) else {
        panic!("expected event");
    };
    // 2013-05-08 is in daylight time: UTC-4
    assert_eq!(e.start_time.as_deref(), Some("2013-05-08T12:15:00+00:00"));
    assert_eq!(e.end_time.as_deref(), Some("2013-05-08T19:00:00+00:00"));
}

#[test]
fn test_schedule_with_unparsable_date_fails() {
    let event = mock_resource(ResourceKind::Event);
    let entries = FormEntries::new()
        .with("start_time", "08:15")
        .with("date", "May 8th");
    let res = format_submission(
        ResourceKind::Event,
        Some(&event),
        "schedule",
        &entries,
        &TimeConverter::default(),
        &countries(),
    );
    assert!(res.is_err());
}

#[test]
fn test_submission_without_record_starts_fresh() {
    let entries = FormEntries::new().with("first_name", "Grace");
    let res = format_submission(
        ResourceKind::Person,
        None,
        "info",
        &entries,
        &TimeConverter::default(),
        &Config::default().country_table(),
    )
    .unwrap();
    let Resource::Person(p) = res else {
        panic!("expected person");
    };
    assert_eq!(p.first_name, "Grace");
    assert_eq!(p.id, None);
    assert!(p.last_name.is_empty());
}
