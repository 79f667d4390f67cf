// File: ./src/calendar.rs
//! Adapter around the external date-picker widget.
//!
//! The widget is a black box that renders asynchronously into its own root
//! and only reports back through notices. The bridge attaches to that root
//! lazily, re-centers the widget whenever the active event changes, and turns
//! selection notices into writes on the schedule form's date field.
use crate::model::Event;
use crate::reader::EventReader;
use crate::time::TimeConverter;
use chrono::NaiveDate;

/// Widget state as reported to form validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PickerSelection {
    pub selected: Option<NaiveDate>,
    /// The day the widget is currently centered/focused on.
    pub central: NaiveDate,
}

impl PickerSelection {
    /// True once the operator actually picked the day being shown.
    pub fn is_chosen(&self) -> bool {
        self.selected == Some(self.central)
    }
}

pub trait DatePicker {
    /// Whether the widget's internal root has been rendered.
    fn is_ready(&self) -> bool;
    fn selection(&self) -> PickerSelection;
    /// Selects, centers and focuses `date`.
    fn set_selection(&mut self, date: NaiveDate);
}

/// Notifications coming out of the widget host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerNotice {
    /// Structural change on the host element (the widget may have rendered).
    HostMutated,
    /// The widget's internal root finished re-rendering.
    RootMutated,
    SelectionChanged(NaiveDate),
}

/// What the owner must apply after a notice.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BridgeOutcome {
    /// New value for the schedule fieldset's date field.
    pub date: Option<NaiveDate>,
    /// Element to focus now that the widget settled.
    pub focus: Option<String>,
}

#[derive(Debug)]
pub struct CalendarBridge<P> {
    picker: P,
    attached: bool,
    pending_center: Option<NaiveDate>,
    synced_start: Option<String>,
}

impl<P: DatePicker> CalendarBridge<P> {
    pub fn new(picker: P) -> Self {
        Self {
            picker,
            attached: false,
            pending_center: None,
            synced_start: None,
        }
    }

    pub fn picker(&self) -> &P {
        &self.picker
    }

    pub fn picker_mut(&mut self) -> &mut P {
        &mut self.picker
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Current widget state, or `None` while the widget has not rendered.
    pub fn selection(&self) -> Option<PickerSelection> {
        self.picker.is_ready().then(|| self.picker.selection())
    }

    /// Called whenever the event source changes. Queues a re-center on the
    /// event's start day and applies it right away if the widget is attached.
    pub fn sync_event(&mut self, event: Option<&Event>, converter: &TimeConverter) -> BridgeOutcome {
        let start = event.and_then(|e| e.start_time.clone());
        if start == self.synced_start {
            return BridgeOutcome::default();
        }
        self.synced_start = start;
        self.pending_center = EventReader::new(event, converter).start_date();
        self.flush_center()
    }

    pub fn handle(&mut self, notice: PickerNotice, focus: Option<String>) -> BridgeOutcome {
        match notice {
            PickerNotice::HostMutated => {
                // The inner root may appear on any host mutation, so check every time.
                if !self.attached && self.picker.is_ready() {
                    self.attached = true;
                    log::debug!("Date picker rendered; attached to its root");
                }
                self.flush_center()
            }
            PickerNotice::RootMutated => {
                if !self.attached {
                    return BridgeOutcome::default();
                }
                BridgeOutcome { date: None, focus }
            }
            PickerNotice::SelectionChanged(date) => {
                log::debug!("Date picker selection changed to {}", date);
                BridgeOutcome {
                    date: Some(date),
                    focus: None,
                }
            }
        }
    }

    fn flush_center(&mut self) -> BridgeOutcome {
        if !self.attached {
            return BridgeOutcome::default();
        }
        let Some(date) = self.pending_center.take() else {
            return BridgeOutcome::default();
        };
        self.picker.set_selection(date);
        log::debug!("Date picker centered on {}", date);
        // Fire the selection notice ourselves so the date field follows.
        self.handle(PickerNotice::SelectionChanged(date), None)
    }
}

/// In-process picker used by the line harness and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadlessPicker {
    rendered: bool,
    selected: Option<NaiveDate>,
    central: NaiveDate,
}

impl HeadlessPicker {
    pub fn new(central: NaiveDate) -> Self {
        Self {
            rendered: false,
            selected: None,
            central,
        }
    }

    /// Renders the widget's root. Returns the notices a host would see.
    pub fn render(&mut self) -> Vec<PickerNotice> {
        let first = !self.rendered;
        self.rendered = true;
        if first {
            vec![PickerNotice::HostMutated, PickerNotice::RootMutated]
        } else {
            vec![PickerNotice::RootMutated]
        }
    }

    /// Moves the visible month/day without picking anything.
    pub fn browse(&mut self, date: NaiveDate) -> Vec<PickerNotice> {
        self.central = date;
        vec![PickerNotice::RootMutated]
    }

    /// Operator clicks a day.
    pub fn pick(&mut self, date: NaiveDate) -> Vec<PickerNotice> {
        self.central = date;
        self.selected = Some(date);
        vec![
            PickerNotice::RootMutated,
            PickerNotice::SelectionChanged(date),
        ]
    }
}

impl DatePicker for HeadlessPicker {
    fn is_ready(&self) -> bool {
        self.rendered
    }

    fn selection(&self) -> PickerSelection {
        PickerSelection {
            selected: self.selected,
            central: self.central,
        }
    }

    fn set_selection(&mut self, date: NaiveDate) {
        self.selected = Some(date);
        self.central = date;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Resource, ResourceKind, mock_resource};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn mock_event() -> Event {
        match mock_resource(ResourceKind::Event) {
            Resource::Event(e) => e,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_browse_without_pick_is_not_chosen() {
        let mut picker = HeadlessPicker::new(day(2024, 3, 1));
        picker.render();
        picker.browse(day(2024, 3, 9));
        assert!(!picker.selection().is_chosen());
        picker.pick(day(2024, 3, 9));
        assert!(picker.selection().is_chosen());
    }

    #[test]
    fn test_center_waits_for_widget_root() {
        let conv = TimeConverter::default();
        let mut bridge = CalendarBridge::new(HeadlessPicker::new(day(2024, 1, 1)));

        // Widget not rendered yet: nothing happens, but the center is queued.
        let out = bridge.sync_event(Some(&mock_event()), &conv);
        assert_eq!(out, BridgeOutcome::default());
        assert!(bridge.selection().is_none());

        // A host mutation before the root exists does not attach.
        assert_eq!(bridge.handle(PickerNotice::HostMutated, None).date, None);
        assert!(!bridge.is_attached());

        let notices = bridge.picker_mut().render();
        let mut date = None;
        for n in notices {
            if let Some(d) = bridge.handle(n, None).date {
                date = Some(d);
            }
        }
        assert!(bridge.is_attached());
        assert_eq!(date, Some(day(2013, 5, 8)));
        assert!(bridge.selection().unwrap().is_chosen());
    }

    #[test]
    fn test_same_event_does_not_recenter() {
        let conv = TimeConverter::default();
        let mut picker = HeadlessPicker::new(day(2024, 1, 1));
        picker.render();
        let mut bridge = CalendarBridge::new(picker);
        bridge.handle(PickerNotice::HostMutated, None);

        let event = mock_event();
        assert!(bridge.sync_event(Some(&event), &conv).date.is_some());
        bridge.picker_mut().browse(day(2020, 2, 2));
        assert!(bridge.sync_event(Some(&event), &conv).date.is_none());
    }

    #[test]
    fn test_root_render_restores_focus() {
        let mut picker = HeadlessPicker::new(day(2024, 1, 1));
        picker.render();
        let mut bridge = CalendarBridge::new(picker);
        bridge.handle(PickerNotice::HostMutated, None);
        let out = bridge.handle(PickerNotice::RootMutated, Some("schedule".to_string()));
        assert_eq!(out.focus.as_deref(), Some("schedule"));
    }
}
