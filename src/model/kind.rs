// File: ./src/model/kind.rs
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use strum::EnumIter;

pub const SECTION_PREFIX: &str = "API Endpoint: ";

/// The backend resource kinds the harness exercises, one test section each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Event,
    Person,
    BasicPage,
    Survey,
}

impl ResourceKind {
    /// Collection path relative to the API root.
    pub fn endpoint(&self) -> &'static str {
        match self {
            ResourceKind::Event => "/pages/events",
            ResourceKind::Person => "/people",
            ResourceKind::BasicPage => "/pages/basic_pages",
            ResourceKind::Survey => "/surveys",
        }
    }

    /// Key wrapping a record in request bodies, e.g. `{"event": {...}}`.
    pub fn wire_key(&self) -> &'static str {
        match self {
            ResourceKind::Event => "event",
            ResourceKind::Person => "person",
            ResourceKind::BasicPage => "basic_page",
            ResourceKind::Survey => "survey",
        }
    }

    /// Singular label used on buttons ("New Event").
    pub fn label(&self) -> &'static str {
        match self {
            ResourceKind::Event => "Event",
            ResourceKind::Person => "Person",
            ResourceKind::BasicPage => "Page",
            ResourceKind::Survey => "Survey",
        }
    }

    /// Section heading, without the endpoint prefix.
    pub fn heading(&self) -> &'static str {
        match self {
            ResourceKind::Event => "Events",
            ResourceKind::Person => "People",
            ResourceKind::BasicPage => "Sites + People",
            ResourceKind::Survey => "Surveys + Contact",
        }
    }

    pub fn title(&self) -> String {
        format!("{}{}", SECTION_PREFIX, self.heading())
    }

    pub fn supports_update(&self) -> bool {
        !matches!(self, ResourceKind::Survey)
    }

    pub fn supports_delete(&self) -> bool {
        !matches!(self, ResourceKind::Survey)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_key())
    }
}

impl FromStr for ResourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "event" | "events" => Ok(ResourceKind::Event),
            "person" | "people" => Ok(ResourceKind::Person),
            "basic_page" | "basic_pages" | "page" | "pages" => Ok(ResourceKind::BasicPage),
            "survey" | "surveys" => Ok(ResourceKind::Survey),
            other => Err(format!("Unknown resource kind: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_kind_round_trips_through_display() {
        for kind in ResourceKind::iter() {
            assert_eq!(kind.to_string().parse::<ResourceKind>(), Ok(kind));
        }
    }

    #[test]
    fn test_titles_carry_prefix() {
        assert_eq!(ResourceKind::BasicPage.title(), "API Endpoint: Sites + People");
    }
}
