// File: src/controller.rs
//! Single owner of the harness state.
//!
//! Every front end drives the harness through `Controller` and learns about
//! changes through `AppEvent`s. State is only mutated here, on one logical
//! thread; network work runs inside `SubmitJob`s that borrow nothing from
//! the controller, so a pending indicator can be written before the first
//! suspension point.
use crate::calendar::{BridgeOutcome, CalendarBridge, DatePicker, PickerNotice};
use crate::client::Backend;
use crate::config::Config;
use crate::form::{DATE_FIELD, FieldKind, SCHEDULE_FIELDSET, format_submission, validate};
use crate::model::{CountryTable, Resource, ResourceKind, ResourceSources, mock_resource};
use crate::reader::field_value;
use crate::section::{
    ActionOp, FAILURE_MESSAGE, FocusTarget, PENDING_MESSAGE, SUCCESS_MESSAGE, Sections,
};
use crate::sync::{CrudSynchronizer, SyncReport};
use crate::time::TimeConverter;
use std::time::Duration;
use strum::IntoEnumIterator;
use tokio::sync::mpsc;

pub const GREETINGS: [&str; 5] = ["Welcome", "欢迎大家", "Bienvenidos", "Вітаємо", "স্বাগতম৷"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    SectionChanged(ResourceKind),
    SourceChanged(ResourceKind),
    Feedback {
        kind: ResourceKind,
        fieldset: String,
        message: String,
        error: bool,
    },
    Focus(String),
    Warning(String),
    Greeting(String),
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub sources: ResourceSources,
    pub sections: Sections,
    pub focus: FocusTarget,
    pub greeting: String,
    /// Number of basic pages, -1 until the first listing.
    pub page_count: i64,
    /// Latest secondary failure (cascade, button actions).
    pub warning: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            sources: ResourceSources::default(),
            sections: Sections::default(),
            focus: FocusTarget::default(),
            greeting: GREETINGS[0].to_string(),
            page_count: -1,
            warning: None,
        }
    }
}

/// Network half of a submit. Owns everything it needs.
#[derive(Debug, Clone)]
pub struct SubmitJob<B> {
    sync: CrudSynchronizer<B>,
    pub kind: ResourceKind,
    pub fieldset: String,
    pub payload: Resource,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubmitOutcome {
    pub kind: ResourceKind,
    pub fieldset: String,
    pub result: Result<SyncReport, String>,
}

impl<B: Backend> SubmitJob<B> {
    pub async fn run(self) -> SubmitOutcome {
        let result = self.sync.update(&self.payload).await;
        SubmitOutcome {
            kind: self.kind,
            fieldset: self.fieldset,
            result,
        }
    }
}

pub struct Controller<B, P> {
    state: AppState,
    sync: CrudSynchronizer<B>,
    bridge: CalendarBridge<P>,
    converter: TimeConverter,
    countries: CountryTable,
    feedback_delay: Duration,
    subscribers: Vec<mpsc::UnboundedSender<AppEvent>>,
}

impl<B: Backend, P: DatePicker> Controller<B, P> {
    pub fn new(backend: B, picker: P, config: &Config) -> Result<Self, String> {
        let countries = config.country_table();
        Ok(Self {
            state: AppState::default(),
            sync: CrudSynchronizer::new(backend, countries.clone(), config.cascade_delay()),
            bridge: CalendarBridge::new(picker),
            converter: config.converter()?,
            countries,
            feedback_delay: config.feedback_delay(),
            subscribers: Vec::new(),
        })
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn converter(&self) -> &TimeConverter {
        &self.converter
    }

    pub fn picker(&self) -> &P {
        self.bridge.picker()
    }

    pub fn picker_mut(&mut self) -> &mut P {
        self.bridge.picker_mut()
    }

    pub fn synchronizer(&self) -> &CrudSynchronizer<B> {
        &self.sync
    }

    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<AppEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    fn emit(&mut self, event: AppEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    fn warn(&mut self, message: String) {
        log::warn!("{}", message);
        self.state.warning = Some(message.clone());
        self.emit(AppEvent::Warning(message));
    }

    // --- SOURCES ---

    /// Lists every kind. Kinds that fail keep their previous source.
    pub async fn refresh(&mut self) -> Result<(), String> {
        let mut failures = Vec::new();
        for kind in ResourceKind::iter() {
            match self.sync.fetch(kind).await {
                Ok(records) => self.apply_records(kind, records),
                Err(e) => failures.push(format!("{}: {}", kind, e)),
            }
        }
        if failures.is_empty() {
            Ok(())
        } else {
            let message = format!("Refresh failed for {}", failures.join("; "));
            self.warn(message.clone());
            Err(message)
        }
    }

    fn apply_records(&mut self, kind: ResourceKind, records: Vec<Resource>) {
        if kind == ResourceKind::BasicPage {
            self.state.page_count = i64::try_from(records.len()).unwrap_or(i64::MAX);
        }
        self.state.sources.replace(kind, records);
        let has_data = self.state.sources.has_data(kind);
        self.state.sections.get_mut(kind).refresh_buttons(has_data);
        self.fill_forms(kind);
        if kind == ResourceKind::Event {
            let outcome = self
                .bridge
                .sync_event(self.state.sources.event.as_ref(), &self.converter);
            self.apply_bridge(outcome);
        }
        self.emit(AppEvent::SourceChanged(kind));
    }

    fn apply_report(&mut self, report: SyncReport) {
        let SyncReport {
            kind,
            records,
            derived,
            warnings,
        } = report;
        self.apply_records(kind, records);
        if let Some(pages) = derived {
            self.apply_records(ResourceKind::BasicPage, pages);
        }
        for w in warnings {
            self.warn(w);
        }
    }

    /// Copies the current source into the shown fields.
    fn fill_forms(&mut self, kind: ResourceKind) {
        let current = self.state.sources.current(kind);
        // A day already picked on the widget wins over the stored one.
        let picked = match kind {
            ResourceKind::Event if self.bridge.is_attached() => self
                .bridge
                .selection()
                .filter(|sel| sel.is_chosen())
                .and_then(|sel| sel.selected)
                .map(|d| d.format("%Y-%m-%d").to_string()),
            _ => None,
        };
        let section = self.state.sections.get_mut(kind);
        for fieldset in section.forms.iter_mut().flatten() {
            let is_schedule = fieldset.name == SCHEDULE_FIELDSET;
            for field in fieldset
                .fields
                .iter_mut()
                .filter(|f| f.kind != FieldKind::Calendar)
            {
                field.value = match &picked {
                    Some(day) if is_schedule && field.name == DATE_FIELD => day.clone(),
                    _ => field_value(current.as_ref(), field.name, &self.converter, &self.countries),
                };
            }
        }
    }

    // --- SECTIONS ---

    pub fn toggle(&mut self, kind: ResourceKind) {
        self.state.focus.clear();
        let has_data = self.state.sources.has_data(kind);
        self.state.sections.get_mut(kind).toggle(has_data);
        self.fill_forms(kind);
        self.emit(AppEvent::SectionChanged(kind));
    }

    /// Runs a section button.
    pub async fn act(&mut self, kind: ResourceKind, op: ActionOp) {
        self.state.focus.clear();
        let result = match op {
            ActionOp::Edit => {
                if self.state.sections.get_mut(kind).open_forms() {
                    self.fill_forms(kind);
                    self.emit(AppEvent::SectionChanged(kind));
                }
                return;
            }
            ActionOp::Create => self.sync.create(&mock_resource(kind)).await,
            ActionOp::Reset => match self.state.sources.current(kind).and_then(|r| r.id()) {
                Some(id) => {
                    let mut mock = mock_resource(kind);
                    mock.set_id(Some(id));
                    self.sync.update(&mock).await
                }
                None => Err(format!("No {} to reset", kind)),
            },
            ActionOp::Delete => match self.state.sources.current(kind).and_then(|r| r.id()) {
                Some(id) => self.sync.delete(kind, id).await,
                None => Err(format!("No {} to delete", kind)),
            },
            ActionOp::LogContact => {
                let person = self.state.sources.current(ResourceKind::Person);
                match person.and_then(|r| r.id()) {
                    Some(id) => self.sync.log_contact(id).await,
                    None => Err("No person to log a contact for".to_string()),
                }
            }
            ActionOp::Regenerate => match self.sync.regenerate_pages().await {
                Ok(pages) => {
                    self.apply_records(ResourceKind::BasicPage, pages);
                    return;
                }
                Err(e) => {
                    if let Ok(pages) = self.sync.fetch(ResourceKind::BasicPage).await {
                        self.apply_records(ResourceKind::BasicPage, pages);
                    }
                    Err(e)
                }
            },
        };
        match result {
            Ok(report) => self.apply_report(report),
            Err(e) => self.warn(format!("{}: {}", FAILURE_MESSAGE, e)),
        }
    }

    /// Operator typed into a field: store the value and clear that
    /// fieldset's feedback.
    pub fn set_field(&mut self, kind: ResourceKind, fieldset: &str, field: &str, value: &str) -> bool {
        let section = self.state.sections.get_mut(kind);
        let Some(fs) = section.fieldset_mut(fieldset) else {
            return false;
        };
        fs.clear_feedback();
        let written = fs.set_value(field, value);
        self.emit(AppEvent::SectionChanged(kind));
        written
    }

    /// Operator focused a field in `fieldset`.
    pub fn input_focus(&mut self, kind: ResourceKind, fieldset: &str) {
        self.state.sections.get_mut(kind).clear_feedback(fieldset);
        self.emit(AppEvent::SectionChanged(kind));
    }

    fn feedback(&mut self, kind: ResourceKind, fieldset: &str, message: &str, error: bool) {
        self.state
            .sections
            .get_mut(kind)
            .set_feedback(fieldset, message, error);
        self.emit(AppEvent::Feedback {
            kind,
            fieldset: fieldset.to_string(),
            message: message.to_string(),
            error,
        });
    }

    fn reject(&mut self, kind: ResourceKind, fieldset: &str, message: &str) {
        self.state.focus.set(fieldset);
        self.feedback(kind, fieldset, message, true);
    }

    // --- SUBMIT ---

    /// Synchronous half of a submit: validation, the absent-record guard and
    /// the pending indicator. `None` means nothing is to be sent.
    pub fn begin_submit(&mut self, kind: ResourceKind, fieldset: &str) -> Option<SubmitJob<B>> {
        self.state.focus.clear();
        let Some(entries) = self
            .state
            .sections
            .get(kind)
            .fieldset(fieldset)
            .map(|fs| fs.entries())
        else {
            log::warn!("Submit ignored: no '{}' fieldset shown for {}", fieldset, kind);
            return None;
        };

        if let Err(message) = validate(fieldset, self.bridge.selection().as_ref()) {
            self.reject(kind, fieldset, message);
            return None;
        }

        let Some(current) = self.state.sources.current(kind) else {
            log::info!("Submit on {} with no record; not sent", kind);
            self.reject(kind, fieldset, FAILURE_MESSAGE);
            return None;
        };

        let payload = match format_submission(
            kind,
            Some(&current),
            fieldset,
            &entries,
            &self.converter,
            &self.countries,
        ) {
            Ok(p) => p,
            Err(e) => {
                log::warn!("Cannot format {} '{}': {}", kind, fieldset, e);
                self.reject(kind, fieldset, FAILURE_MESSAGE);
                return None;
            }
        };

        self.feedback(kind, fieldset, PENDING_MESSAGE, false);
        log::debug!("Submitting {} '{}'", kind, fieldset);
        Some(SubmitJob {
            sync: self.sync.clone(),
            kind,
            fieldset: fieldset.to_string(),
            payload,
        })
    }

    /// Final half of a submit. Failures leave the source untouched.
    pub fn apply_outcome(&mut self, outcome: SubmitOutcome) {
        let SubmitOutcome {
            kind,
            fieldset,
            result,
        } = outcome;
        match result {
            Ok(report) => {
                self.apply_report(report);
                self.feedback(kind, &fieldset, SUCCESS_MESSAGE, false);
            }
            Err(e) => {
                log::warn!("Submit of {} '{}' failed: {}", kind, fieldset, e);
                self.reject(kind, &fieldset, FAILURE_MESSAGE);
            }
        }
    }

    /// Pending -> network -> short pause -> final feedback.
    pub async fn submit(&mut self, kind: ResourceKind, fieldset: &str) {
        let Some(job) = self.begin_submit(kind, fieldset) else {
            return;
        };
        let outcome = job.run().await;
        tokio::time::sleep(self.feedback_delay).await;
        self.apply_outcome(outcome);
    }

    // --- CALENDAR ---

    pub fn handle_picker(&mut self, notice: PickerNotice) {
        let focus = self.state.focus.get().map(str::to_string);
        let outcome = self.bridge.handle(notice, focus);
        self.apply_bridge(outcome);
    }

    fn apply_bridge(&mut self, outcome: BridgeOutcome) {
        if let Some(date) = outcome.date {
            let value = date.format("%Y-%m-%d").to_string();
            if let Some(fs) = self
                .state
                .sections
                .get_mut(ResourceKind::Event)
                .fieldset_mut(SCHEDULE_FIELDSET)
            {
                fs.set_value(DATE_FIELD, &value);
                self.emit(AppEvent::SectionChanged(ResourceKind::Event));
            }
        }
        if let Some(target) = outcome.focus {
            self.state.focus.clear();
            self.emit(AppEvent::Focus(target));
        }
    }

    // --- NAVIGATION ---

    /// Picks another greeting, never the current one.
    pub fn cycle_greeting(&mut self) -> &str {
        let len = GREETINGS.len();
        let mut idx = fastrand::usize(..len);
        if GREETINGS[idx] == self.state.greeting {
            idx = (idx + 1) % len;
        }
        self.state.greeting = GREETINGS[idx].to_string();
        self.emit(AppEvent::Greeting(self.state.greeting.clone()));
        &self.state.greeting
    }

    pub fn nav_label(&self) -> String {
        format!("{}, {} pages!", self.state.greeting, self.state.page_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::HeadlessPicker;
    use crate::client::MemoryBackend;
    use chrono::NaiveDate;

    fn controller() -> Controller<MemoryBackend, HeadlessPicker> {
        let picker = HeadlessPicker::new(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        Controller::new(MemoryBackend::new(), picker, &Config::default()).unwrap()
    }

    #[test]
    fn test_greeting_never_repeats() {
        let mut c = controller();
        for _ in 0..50 {
            let before = c.state().greeting.clone();
            assert_ne!(c.cycle_greeting(), before);
        }
    }

    #[test]
    fn test_nav_label_before_first_load() {
        let c = controller();
        assert_eq!(c.nav_label(), "Welcome, -1 pages!");
    }

    #[test]
    fn test_toggle_twice_restores_state() {
        let mut c = controller();
        let before = c.state().sections.clone();
        c.toggle(ResourceKind::Person);
        assert!(!c.state().sections.person.hidden);
        c.toggle(ResourceKind::Person);
        assert_eq!(c.state().sections, before);
    }

    #[tokio::test]
    async fn test_refresh_counts_pages() {
        let mut c = controller();
        c.synchronizer()
            .backend()
            .insert(mock_resource(ResourceKind::BasicPage));
        c.refresh().await.unwrap();
        assert_eq!(c.nav_label(), "Welcome, 1 pages!");
    }
}
