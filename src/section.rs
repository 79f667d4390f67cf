// File: ./src/section.rs
//! Per-kind section state: visibility, generated forms and per-fieldset
//! submit feedback.
use crate::form::{FieldSpec, FieldsetTemplate, FormEntries, template_for};
use crate::model::ResourceKind;

pub const PENDING_MESSAGE: &str = "Updating...";
pub const SUCCESS_MESSAGE: &str = "Updated";
pub const FAILURE_MESSAGE: &str = "Unable to update";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldsetState {
    pub name: &'static str,
    pub legend: &'static str,
    pub fields: Vec<FieldSpec>,
    pub message: String,
    pub error: bool,
}

impl From<FieldsetTemplate> for FieldsetState {
    fn from(t: FieldsetTemplate) -> Self {
        Self {
            name: t.name,
            legend: t.legend,
            fields: t.fields,
            message: String::new(),
            error: false,
        }
    }
}

impl FieldsetState {
    pub fn set_feedback(&mut self, message: &str, error: bool) {
        self.message = message.to_string();
        self.error = error;
    }

    pub fn clear_feedback(&mut self) {
        self.message.clear();
        self.error = false;
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Writes a field value. Returns false when the fieldset has no such field.
    pub fn set_value(&mut self, name: &str, value: &str) -> bool {
        match self.fields.iter_mut().find(|f| f.name == name) {
            Some(field) => {
                field.value = value.to_string();
                true
            }
            None => false,
        }
    }

    /// Entries as the browser would submit this fieldset.
    pub fn entries(&self) -> FormEntries {
        self.fields
            .iter()
            .filter(|f| f.is_submitted())
            .map(|f| (f.name, f.value.clone()))
            .collect()
    }
}

/// One form: the fieldsets rendered together.
pub type FieldsetGroup = Vec<FieldsetState>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOp {
    /// Post the kind's mock payload.
    Create,
    /// Put the mock payload back over the current record.
    Reset,
    Delete,
    /// Show the forms for a record that already exists.
    Edit,
    /// Rebuild the derived basic pages from current people.
    Regenerate,
    /// Log a contact against the current person.
    LogContact,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionAction {
    pub label: String,
    pub op: ActionOp,
}

impl SectionAction {
    fn new(op: ActionOp, label: String) -> Self {
        Self { label, op }
    }
}

/// Buttons offered by a section given whether its source holds data.
pub fn actions_for(kind: ResourceKind, has_data: bool) -> Vec<SectionAction> {
    let label = kind.label();
    match (kind, has_data) {
        (ResourceKind::BasicPage, false) => vec![SectionAction::new(
            ActionOp::Regenerate,
            "Regenerate Pages".to_string(),
        )],
        (ResourceKind::BasicPage, true) => vec![
            SectionAction::new(ActionOp::Regenerate, "Regenerate Pages".to_string()),
            SectionAction::new(ActionOp::Edit, format!("Edit {}", label)),
        ],
        (ResourceKind::Survey, _) => vec![
            SectionAction::new(ActionOp::Create, format!("New {}", label)),
            SectionAction::new(ActionOp::LogContact, "Log Contact".to_string()),
        ],
        (_, false) => vec![SectionAction::new(ActionOp::Create, format!("New {}", label))],
        (_, true) => vec![
            SectionAction::new(ActionOp::Reset, format!("Reset {}", label)),
            SectionAction::new(ActionOp::Edit, format!("Edit {}", label)),
            SectionAction::new(ActionOp::Delete, format!("Delete {}", label)),
        ],
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionState {
    pub kind: ResourceKind,
    pub hidden: bool,
    pub forms: Vec<FieldsetGroup>,
    pub buttons: Vec<SectionAction>,
}

impl SectionState {
    pub fn new(kind: ResourceKind) -> Self {
        Self {
            kind,
            hidden: true,
            forms: Vec::new(),
            buttons: actions_for(kind, false),
        }
    }

    fn build_forms(&self) -> Vec<FieldsetGroup> {
        vec![
            template_for(self.kind)
                .into_iter()
                .map(FieldsetState::from)
                .collect(),
        ]
    }

    /// Collapsed <-> expanded. Expanding builds the forms only when there is
    /// no record yet; an existing record waits for an explicit edit.
    pub fn toggle(&mut self, has_data: bool) {
        if self.hidden {
            self.hidden = false;
            self.forms = if has_data {
                Vec::new()
            } else {
                self.build_forms()
            };
        } else {
            self.hidden = true;
            self.forms.clear();
        }
        log::debug!(
            "Section {} toggled (hidden={}, forms={})",
            self.kind,
            self.hidden,
            self.forms.len()
        );
    }

    /// Shows the forms on an expanded section. No-op while collapsed.
    /// Returns true when forms were (re)built.
    pub fn open_forms(&mut self) -> bool {
        if self.hidden || !self.forms.is_empty() {
            return false;
        }
        self.forms = self.build_forms();
        true
    }

    pub fn refresh_buttons(&mut self, has_data: bool) {
        self.buttons = actions_for(self.kind, has_data);
    }

    pub fn toggle_label(&self) -> String {
        let verb = if self.hidden { "Show" } else { "Hide" };
        format!("{} {}", verb, self.kind.heading())
    }

    pub fn fieldsets(&self) -> impl Iterator<Item = &FieldsetState> {
        self.forms.iter().flatten()
    }

    pub fn fieldset(&self, name: &str) -> Option<&FieldsetState> {
        self.fieldsets().find(|f| f.name == name)
    }

    pub fn fieldset_mut(&mut self, name: &str) -> Option<&mut FieldsetState> {
        self.forms.iter_mut().flatten().find(|f| f.name == name)
    }

    /// Sets feedback on one fieldset; siblings are untouched.
    pub fn set_feedback(&mut self, fieldset: &str, message: &str, error: bool) {
        match self.fieldset_mut(fieldset) {
            Some(fs) => fs.set_feedback(message, error),
            None => log::debug!(
                "No '{}' fieldset shown for {}; feedback '{}' dropped",
                fieldset,
                self.kind,
                message
            ),
        }
    }

    pub fn clear_feedback(&mut self, fieldset: &str) {
        if let Some(fs) = self.fieldset_mut(fieldset) {
            fs.clear_feedback();
        }
    }
}

/// The four sections, addressed by kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sections {
    pub event: SectionState,
    pub person: SectionState,
    pub basic_page: SectionState,
    pub survey: SectionState,
}

impl Default for Sections {
    fn default() -> Self {
        Self {
            event: SectionState::new(ResourceKind::Event),
            person: SectionState::new(ResourceKind::Person),
            basic_page: SectionState::new(ResourceKind::BasicPage),
            survey: SectionState::new(ResourceKind::Survey),
        }
    }
}

impl Sections {
    pub fn get(&self, kind: ResourceKind) -> &SectionState {
        match kind {
            ResourceKind::Event => &self.event,
            ResourceKind::Person => &self.person,
            ResourceKind::BasicPage => &self.basic_page,
            ResourceKind::Survey => &self.survey,
        }
    }

    pub fn get_mut(&mut self, kind: ResourceKind) -> &mut SectionState {
        match kind {
            ResourceKind::Event => &mut self.event,
            ResourceKind::Person => &mut self.person,
            ResourceKind::BasicPage => &mut self.basic_page,
            ResourceKind::Survey => &mut self.survey,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &SectionState> {
        [&self.event, &self.person, &self.basic_page, &self.survey].into_iter()
    }
}

/// Element to focus once the next external widget mutation settles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FocusTarget(Option<String>);

impl FocusTarget {
    pub fn set(&mut self, target: &str) {
        self.0 = Some(target.to_string());
    }

    pub fn clear(&mut self) {
        self.0 = None;
    }

    pub fn get(&self) -> Option<&str> {
        self.0.as_deref()
    }

    pub fn take(&mut self) -> Option<String> {
        self.0.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expanding_empty_source_builds_template() {
        let mut s = SectionState::new(ResourceKind::Event);
        s.toggle(false);
        assert!(!s.hidden);
        let names: Vec<_> = s.fieldsets().map(|f| f.name).collect();
        assert_eq!(names, vec!["info", "schedule"]);
    }

    #[test]
    fn test_expanding_with_data_withholds_forms() {
        let mut s = SectionState::new(ResourceKind::Person);
        s.toggle(true);
        assert!(!s.hidden);
        assert!(s.forms.is_empty());
        assert!(s.open_forms());
        assert_eq!(s.fieldsets().count(), 3);
        // Already shown
        assert!(!s.open_forms());
    }

    #[test]
    fn test_collapsed_section_never_holds_forms() {
        let mut s = SectionState::new(ResourceKind::Survey);
        assert!(!s.open_forms());
        assert!(s.forms.is_empty());
        s.toggle(false);
        s.toggle(false);
        assert!(s.hidden);
        assert!(s.forms.is_empty());
    }

    #[test]
    fn test_buttons_follow_source_presence() {
        let labels = |kind, has| {
            actions_for(kind, has)
                .into_iter()
                .map(|a| a.label)
                .collect::<Vec<_>>()
        };
        assert_eq!(labels(ResourceKind::Event, false), vec!["New Event"]);
        assert_eq!(
            labels(ResourceKind::Event, true),
            vec!["Reset Event", "Edit Event", "Delete Event"]
        );
        assert_eq!(
            labels(ResourceKind::Survey, true),
            vec!["New Survey", "Log Contact"]
        );
    }

    #[test]
    fn test_unchecked_checkbox_not_submitted() {
        let mut s = SectionState::new(ResourceKind::Event);
        s.toggle(false);
        let info = s.fieldset_mut("info").unwrap();
        info.set_value("name", "Picnic");
        let entries = info.entries();
        assert_eq!(entries.get("name"), Some("Picnic"));
        assert!(!entries.contains("status"));

        info.set_value("status", "on");
        assert!(info.entries().contains("status"));
    }

    #[test]
    fn test_focus_target_take_clears() {
        let mut focus = FocusTarget::default();
        focus.set("schedule");
        assert_eq!(focus.take().as_deref(), Some("schedule"));
        assert_eq!(focus.get(), None);
    }
}
