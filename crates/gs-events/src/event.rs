//! The basic scheduled parameter-change event and the capability contract
//! shared by all event variants.
//!
//! Lifecycle: an event starts unbound, becomes bound when given a target,
//! and is armed once it has both a live target and a non-empty field.
//! Triggering an armed event applies `target.set(field, value, unit)` and
//! disarms it; a failed set disarms it too and surfaces as
//! [`ChangeCode::ExecutionFailure`] rather than an error, so one bad
//! setpoint never aborts a simulation step.

use tracing::warn;

use gs_core::{
    lock_object, object_ref, ref_key, ChangeCode, ObjectRef, SharedObject, Time, Unit, NEG_TIME,
};

/// Concrete variant tag, used for duplicate detection in the queue.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventKind {
    Basic,
    Player,
    InterpolatingPlayer,
    Compound,
    Reversible,
}

/// How the queue should schedule an event's execution.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub enum ExecutionMode {
    /// Apply at trigger time in a single pass.
    #[default]
    Normal,
    /// Apply phase A at trigger time, phase B on the next queue pass.
    TwoPart,
    /// Apply phase A at trigger time, phase B after a fixed delay.
    Delayed(Time),
}

/// The polymorphic capability set of every event variant.
pub trait EventInterface: Send {
    /// Event name, settable through the `" as name"` rename clause.
    fn name(&self) -> &str;

    /// Concrete variant tag.
    fn kind(&self) -> EventKind;

    /// Attempt to fire at `time`; returns [`ChangeCode::NotTriggered`] when
    /// `time` is before the next trigger time.
    fn trigger_at(&mut self, time: Time) -> ChangeCode;

    /// Fire unconditionally, ignoring the trigger time.
    fn trigger_now(&mut self) -> ChangeCode;

    /// Second phase of a two-part execution, run one queue pass (or a fixed
    /// delay) after the first. The default observes nothing.
    fn trigger_phase_b(&mut self, _time: Time) -> ChangeCode {
        ChangeCode::NoChange
    }

    fn is_armed(&self) -> bool;

    /// Next time this event wants to fire; [`gs_core::MAX_TIME`] when it
    /// never will.
    fn next_trigger_time(&self) -> Time;

    fn execution_mode(&self) -> ExecutionMode {
        ExecutionMode::Normal
    }

    /// Finish any deferred setup (join background series loads). Called by
    /// the queue before the event is first consulted.
    fn initialize(&mut self) -> crate::error::EventResult<()> {
        Ok(())
    }

    /// Identity key of the target object, 0 when unbound. Combined with
    /// [`EventInterface::kind`] for duplicate detection.
    fn target_key(&self) -> usize;

    /// Render back into the event mini-language.
    fn event_string(&self) -> String;

    fn clone_boxed(&self) -> Box<dyn EventInterface>;
}

impl Clone for Box<dyn EventInterface> {
    fn clone(&self) -> Self {
        self.clone_boxed()
    }
}

/// A single scheduled `set(field, value, unit)` against one target.
#[derive(Clone)]
pub struct Event {
    name: String,
    trigger_time: Time,
    target: Option<ObjectRef>,
    target_name: String,
    field: String,
    value: f64,
    unit: Unit,
    armed: bool,
}

impl Event {
    /// Create an unbound event scheduled for `trigger_time`.
    pub fn new(trigger_time: Time) -> Self {
        Self {
            name: String::new(),
            trigger_time,
            target: None,
            target_name: String::new(),
            field: String::new(),
            value: 0.0,
            unit: Unit::Def,
            armed: false,
        }
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Bind to a target object. Arms the event if a field is also set.
    pub fn set_target(&mut self, obj: &SharedObject) {
        self.target_name = lock_object(obj).name().to_string();
        self.target = Some(object_ref(obj));
        self.update_armed();
    }

    /// Set the target field. An empty field explicitly disarms.
    pub fn set_field(&mut self, field: impl Into<String>) {
        self.field = field.into();
        self.update_armed();
    }

    pub fn set_value(&mut self, value: f64, unit: Unit) {
        self.value = value;
        self.unit = unit;
    }

    pub fn set_trigger_time(&mut self, time: Time) {
        self.trigger_time = time;
    }

    pub fn trigger_time(&self) -> Time {
        self.trigger_time
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn unit(&self) -> Unit {
        self.unit
    }

    pub fn target_name(&self) -> &str {
        &self.target_name
    }

    fn update_armed(&mut self) {
        self.armed = self.target.is_some() && !self.field.is_empty();
    }

    pub(crate) fn disarm(&mut self) {
        self.armed = false;
    }

    pub(crate) fn rearm(&mut self) {
        self.update_armed();
    }

    /// Apply `value` to the bound target, disarming afterwards whatever the
    /// outcome. Shared by every variant that pushes a single field.
    pub(crate) fn apply(&mut self, value: f64) -> ChangeCode {
        if !self.armed {
            return ChangeCode::NotTriggered;
        }
        self.armed = false;
        let Some(target) = self.target.as_ref().and_then(|t| t.upgrade()) else {
            warn!(event = %self.name, target = %self.target_name, "event target is gone");
            return ChangeCode::ExecutionFailure;
        };
        let outcome = lock_object(&target).set(&self.field, value, self.unit);
        match outcome {
            Ok(()) => ChangeCode::ParameterChange,
            Err(err) => {
                warn!(
                    event = %self.name,
                    target = %self.target_name,
                    field = %self.field,
                    %err,
                    "event execution failed"
                );
                ChangeCode::ExecutionFailure
            }
        }
    }

    pub(crate) fn target(&self) -> Option<&ObjectRef> {
        self.target.as_ref()
    }

    /// Read the current value of the bound field (the reversible grabber).
    pub(crate) fn read_current(&self) -> Option<f64> {
        let target = self.target.as_ref()?.upgrade()?;
        let value = lock_object(&target).get(&self.field, self.unit);
        value
    }
}

impl EventInterface for Event {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> EventKind {
        EventKind::Basic
    }

    fn trigger_at(&mut self, time: Time) -> ChangeCode {
        if time < self.trigger_time {
            return ChangeCode::NotTriggered;
        }
        self.trigger_now()
    }

    fn trigger_now(&mut self) -> ChangeCode {
        self.apply(self.value)
    }

    fn is_armed(&self) -> bool {
        self.armed
    }

    fn next_trigger_time(&self) -> Time {
        if self.armed {
            self.trigger_time
        } else {
            gs_core::MAX_TIME
        }
    }

    fn target_key(&self) -> usize {
        self.target.as_ref().map(ref_key).unwrap_or(0)
    }

    fn event_string(&self) -> String {
        let mut out = String::new();
        // an event that never fires on its own has no time clause
        if self.trigger_time > NEG_TIME && self.trigger_time < gs_core::MAX_TIME {
            out.push_str(&format!("@{} | ", self.trigger_time));
        }
        out.push_str(&format!(
            "{}:{}({}) = {}",
            self.target_name, self.field, self.unit, self.value
        ));
        if !self.name.is_empty() {
            out.push_str(&format!(" as {}", self.name));
        }
        out
    }

    fn clone_boxed(&self) -> Box<dyn EventInterface> {
        Box::new(self.clone())
    }
}
