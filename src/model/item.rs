// File: ./src/model/item.rs
use crate::model::kind::ResourceKind;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value, json};

/// Fields the backend sends that this crate does not model. Kept so a
/// read-modify-write cycle never drops them.
pub type Extra = Map<String, Value>;

/// The backend sends `null` for blank fields as often as it omits them.
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// --- EVENT ---

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub contact_phone: String,
    #[serde(default, deserialize_with = "nullable")]
    pub show_phone: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub contact_email: String,
    #[serde(default, deserialize_with = "nullable")]
    pub email: String,
    #[serde(default, deserialize_with = "nullable")]
    pub show_email: bool,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Address {
    #[serde(default, deserialize_with = "nullable")]
    pub address1: String,
    #[serde(default, deserialize_with = "nullable")]
    pub city: String,
    #[serde(default, deserialize_with = "nullable")]
    pub state: String,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Venue {
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub address: Address,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default, deserialize_with = "nullable")]
    pub status: String,
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub intro: String,
    #[serde(default, deserialize_with = "nullable")]
    pub time_zone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub contact: Contact,
    #[serde(default, deserialize_with = "nullable")]
    pub venue: Venue,
    #[serde(flatten)]
    pub extra: Extra,
}

// --- PERSON ---

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegisteredAddress {
    #[serde(default, deserialize_with = "nullable")]
    pub state: String,
    #[serde(default, deserialize_with = "nullable")]
    pub country_code: String,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Person {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default, deserialize_with = "nullable")]
    pub email: String,
    #[serde(default, deserialize_with = "nullable")]
    pub first_name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub last_name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub sex: String,
    #[serde(default, deserialize_with = "nullable")]
    pub signup_type: u32,
    #[serde(default, deserialize_with = "nullable")]
    pub employer: String,
    #[serde(default, deserialize_with = "nullable")]
    pub party: String,
    #[serde(default, deserialize_with = "nullable")]
    pub registered_address: RegisteredAddress,
    #[serde(flatten)]
    pub extra: Extra,
}

// --- PAGES ---

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BasicPage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default, deserialize_with = "nullable")]
    pub slug: String,
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub title: String,
    #[serde(default, deserialize_with = "nullable")]
    pub status: String,
    #[serde(default, deserialize_with = "nullable")]
    pub content: String,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Survey {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default, deserialize_with = "nullable")]
    pub slug: String,
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub status: String,
    #[serde(flatten)]
    pub extra: Extra,
}

// --- CONTACT LOG ---

/// A contact logged against a person. Posted to the person's `contacts`
/// sub-collection; the API never lists them back.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactLog {
    #[serde(default, deserialize_with = "nullable")]
    pub type_id: u32,
    #[serde(default, deserialize_with = "nullable")]
    pub sender_id: u64,
    #[serde(default, deserialize_with = "nullable")]
    pub person_id: u64,
    #[serde(default, deserialize_with = "nullable")]
    pub status: String,
    #[serde(default, deserialize_with = "nullable")]
    pub method: String,
    #[serde(default, deserialize_with = "nullable")]
    pub note: String,
    #[serde(flatten)]
    pub extra: Extra,
}

pub const CONTACT_WIRE_KEY: &str = "contact";

impl ContactLog {
    pub fn to_body(&self) -> Result<Value, String> {
        let value =
            serde_json::to_value(self).map_err(|e| format!("Failed to encode contact: {}", e))?;
        let mut body = Map::new();
        body.insert(CONTACT_WIRE_KEY.to_string(), value);
        Ok(Value::Object(body))
    }
}

// --- TAGGED RESOURCE ---

#[derive(Debug, Clone, PartialEq)]
pub enum Resource {
    Event(Event),
    Person(Person),
    BasicPage(BasicPage),
    Survey(Survey),
}

impl Resource {
    /// An empty record of the given kind, used when a form is submitted with
    /// nothing to merge into.
    pub fn fresh(kind: ResourceKind) -> Self {
        match kind {
            ResourceKind::Event => Resource::Event(Event::default()),
            ResourceKind::Person => Resource::Person(Person::default()),
            ResourceKind::BasicPage => Resource::BasicPage(BasicPage::default()),
            ResourceKind::Survey => Resource::Survey(Survey::default()),
        }
    }

    pub fn kind(&self) -> ResourceKind {
        match self {
            Resource::Event(_) => ResourceKind::Event,
            Resource::Person(_) => ResourceKind::Person,
            Resource::BasicPage(_) => ResourceKind::BasicPage,
            Resource::Survey(_) => ResourceKind::Survey,
        }
    }

    pub fn id(&self) -> Option<u64> {
        match self {
            Resource::Event(e) => e.id,
            Resource::Person(p) => p.id,
            Resource::BasicPage(b) => b.id,
            Resource::Survey(s) => s.id,
        }
    }

    pub fn set_id(&mut self, id: Option<u64>) {
        match self {
            Resource::Event(e) => e.id = id,
            Resource::Person(p) => p.id = id,
            Resource::BasicPage(b) => b.id = id,
            Resource::Survey(s) => s.id = id,
        }
    }

    pub fn to_value(&self) -> Result<Value, String> {
        let value = match self {
            Resource::Event(e) => serde_json::to_value(e),
            Resource::Person(p) => serde_json::to_value(p),
            Resource::BasicPage(b) => serde_json::to_value(b),
            Resource::Survey(s) => serde_json::to_value(s),
        };
        value.map_err(|e| format!("Failed to encode {}: {}", self.kind(), e))
    }

    /// Request body: the record wrapped in its kind's wire key.
    pub fn to_body(&self) -> Result<Value, String> {
        let mut body = Map::new();
        body.insert(self.kind().wire_key().to_string(), self.to_value()?);
        Ok(Value::Object(body))
    }

    pub fn from_value(kind: ResourceKind, value: Value) -> Result<Self, String> {
        let decoded = match kind {
            ResourceKind::Event => serde_json::from_value(value).map(Resource::Event),
            ResourceKind::Person => serde_json::from_value(value).map(Resource::Person),
            ResourceKind::BasicPage => serde_json::from_value(value).map(Resource::BasicPage),
            ResourceKind::Survey => serde_json::from_value(value).map(Resource::Survey),
        };
        decoded.map_err(|e| format!("Failed to decode {}: {}", kind, e))
    }
}

// --- CANONICAL SOURCES ---

/// Last-known canonical backend state, one slot per kind.
///
/// Only replaced with records that came back from a fresh read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceSources {
    pub event: Option<Event>,
    pub people: Vec<Person>,
    pub basic_pages: Vec<BasicPage>,
    pub surveys: Vec<Survey>,
}

impl ResourceSources {
    pub fn has_data(&self, kind: ResourceKind) -> bool {
        match kind {
            ResourceKind::Event => self.event.is_some(),
            ResourceKind::Person => !self.people.is_empty(),
            ResourceKind::BasicPage => !self.basic_pages.is_empty(),
            ResourceKind::Survey => !self.surveys.is_empty(),
        }
    }

    /// The record a section's forms edit: the event, or the first listed record.
    pub fn current(&self, kind: ResourceKind) -> Option<Resource> {
        match kind {
            ResourceKind::Event => self.event.clone().map(Resource::Event),
            ResourceKind::Person => self.people.first().cloned().map(Resource::Person),
            ResourceKind::BasicPage => self.basic_pages.first().cloned().map(Resource::BasicPage),
            ResourceKind::Survey => self.surveys.first().cloned().map(Resource::Survey),
        }
    }

    /// Replaces a kind's slot with freshly fetched records. Records of
    /// another kind are ignored.
    pub fn replace(&mut self, kind: ResourceKind, records: Vec<Resource>) {
        match kind {
            ResourceKind::Event => {
                self.event = records.into_iter().find_map(|r| match r {
                    Resource::Event(e) => Some(e),
                    _ => None,
                });
            }
            ResourceKind::Person => {
                self.people = records
                    .into_iter()
                    .filter_map(|r| match r {
                        Resource::Person(p) => Some(p),
                        _ => None,
                    })
                    .collect();
            }
            ResourceKind::BasicPage => {
                self.basic_pages = records
                    .into_iter()
                    .filter_map(|r| match r {
                        Resource::BasicPage(b) => Some(b),
                        _ => None,
                    })
                    .collect();
            }
            ResourceKind::Survey => {
                self.surveys = records
                    .into_iter()
                    .filter_map(|r| match r {
                        Resource::Survey(s) => Some(s),
                        _ => None,
                    })
                    .collect();
            }
        }
    }
}

// --- MOCK PAYLOADS ---

pub const MOCK_EVENT_NAME: &str = "Homepage Design";

/// Fixed payload sent by the "New ..." / "Reset ..." section buttons.
pub fn mock_resource(kind: ResourceKind) -> Resource {
    match kind {
        ResourceKind::Event => Resource::Event(mock_event()),
        ResourceKind::Person => Resource::Person(mock_person()),
        ResourceKind::BasicPage => Resource::BasicPage(BasicPage {
            slug: "harness_page".to_string(),
            name: "Harness Page".to_string(),
            title: "Harness Page".to_string(),
            status: "drafted".to_string(),
            content: "<p>Created by the API harness.</p>".to_string(),
            ..Default::default()
        }),
        ResourceKind::Survey => {
            let mut extra = Extra::new();
            extra.insert(
                "questions".to_string(),
                json!([{
                    "prompt": "How did you hear about us?",
                    "external_id": null,
                    "slug": "heard_about",
                    "type": "text",
                    "status": "published"
                }]),
            );
            Resource::Survey(Survey {
                slug: "feedback_survey".to_string(),
                name: "Feedback Survey".to_string(),
                status: "unlisted".to_string(),
                extra,
                ..Default::default()
            })
        }
    }
}

/// Fixed payload sent by the "Log Contact" button. The harness logs the
/// contact as sent by the person themselves.
pub fn mock_contact(person_id: u64) -> ContactLog {
    ContactLog {
        type_id: 1,
        sender_id: person_id,
        person_id,
        status: "answered".to_string(),
        method: "phone_call".to_string(),
        note: "Logged by the API harness.".to_string(),
        extra: Extra::new(),
    }
}

fn mock_event() -> Event {
    let mut extra = Extra::new();
    extra.insert(
        "rsvp_form".to_string(),
        json!({
            "phone": "optional",
            "address": "required",
            "allow_guests": true,
            "accept_rsvps": true,
            "gather_volunteers": true
        }),
    );
    extra.insert("show_guests".to_string(), json!(true));
    extra.insert("capacity".to_string(), json!(80));

    Event {
        id: None,
        status: "unlisted".to_string(),
        name: MOCK_EVENT_NAME.to_string(),
        intro: "Review the new homepage layout together.".to_string(),
        time_zone: "Eastern Time (US & Canada)".to_string(),
        start_time: Some("2013-05-08T17:00:00+00:00".to_string()),
        end_time: Some("2013-05-08T19:00:00+00:00".to_string()),
        contact: Contact {
            name: "Byron Anderson".to_string(),
            contact_phone: "1234567890".to_string(),
            show_phone: true,
            contact_email: "contact@venue.com".to_string(),
            email: "contact@venue.com".to_string(),
            show_email: true,
            extra: Extra::new(),
        },
        venue: Venue {
            name: "Ralphs Parking Lot".to_string(),
            address: Address {
                address1: "123 Foo St".to_string(),
                city: "Pasadena".to_string(),
                state: "CA".to_string(),
                extra: Extra::new(),
            },
            extra: Extra::new(),
        },
        extra,
    }
}

fn mock_person() -> Person {
    Person {
        id: None,
        email: "ada@example.com".to_string(),
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        sex: "F".to_string(),
        signup_type: 0,
        employer: "Analytical Engines".to_string(),
        party: "I".to_string(),
        registered_address: RegisteredAddress {
            state: "NY".to_string(),
            country_code: "US".to_string(),
            extra: Extra::new(),
        },
        extra: Extra::new(),
    }
}
