//! Reversible event: captures the previous value before applying, for undo.

use gs_core::{ChangeCode, SharedObject, Time, Unit, MAX_TIME};

use crate::event::{Event, EventInterface, EventKind};

/// An event that can undo its last application.
///
/// Before applying the new value the current field value is read back
/// through the target's `get` and kept in an undo buffer. [`undo`] pushes
/// the captured value back through the normal trigger path and clears the
/// buffer, so a second consecutive undo is a no-op.
///
/// [`undo`]: ReversibleEvent::undo
#[derive(Clone)]
pub struct ReversibleEvent {
    base: Event,
    captured: Option<f64>,
}

impl ReversibleEvent {
    pub fn new(trigger_time: Time) -> Self {
        Self {
            base: Event::new(trigger_time),
            captured: None,
        }
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.base.set_name(name);
    }

    pub fn set_target(&mut self, obj: &SharedObject) {
        self.base.set_target(obj);
    }

    pub fn set_field(&mut self, field: impl Into<String>) {
        self.base.set_field(field);
    }

    pub fn set_value(&mut self, value: f64, unit: Unit) {
        self.base.set_value(value, unit);
    }

    pub fn has_undo_value(&self) -> bool {
        self.captured.is_some()
    }

    /// Re-apply the value captured by the last trigger, clearing the buffer.
    /// No-op without a captured value.
    pub fn undo(&mut self) -> ChangeCode {
        let Some(previous) = self.captured.take() else {
            return ChangeCode::NotTriggered;
        };
        self.base.rearm();
        self.base.apply(previous)
    }
}

impl EventInterface for ReversibleEvent {
    fn name(&self) -> &str {
        self.base.name()
    }

    fn kind(&self) -> EventKind {
        EventKind::Reversible
    }

    fn trigger_at(&mut self, time: Time) -> ChangeCode {
        if time < self.base.trigger_time() {
            return ChangeCode::NotTriggered;
        }
        self.trigger_now()
    }

    fn trigger_now(&mut self) -> ChangeCode {
        if !self.base.is_armed() {
            return ChangeCode::NotTriggered;
        }
        // grab before apply; an unreadable field just leaves no undo value
        self.captured = self.base.read_current();
        self.base.trigger_now()
    }

    fn is_armed(&self) -> bool {
        self.base.is_armed()
    }

    fn next_trigger_time(&self) -> Time {
        if self.base.is_armed() {
            self.base.trigger_time()
        } else {
            MAX_TIME
        }
    }

    fn target_key(&self) -> usize {
        self.base.target_key()
    }

    fn event_string(&self) -> String {
        self.base.event_string()
    }

    fn clone_boxed(&self) -> Box<dyn EventInterface> {
        Box::new(self.clone())
    }
}
