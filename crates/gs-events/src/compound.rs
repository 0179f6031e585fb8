//! Compound event: one trigger time driving several field changes.

use gs_core::{lock_object, object_ref, ref_key, ChangeCode, ObjectRef, SharedObject, Time, Unit};
use gs_core::{MAX_TIME, NEG_TIME};
use tracing::warn;

use crate::event::{EventInterface, EventKind};

#[derive(Clone)]
struct CompoundEntry {
    target: ObjectRef,
    target_name: String,
    field: String,
    value: f64,
    unit: Unit,
}

/// Applies N (target, field, value, unit) tuples at a single trigger time.
///
/// Each field is set independently: a failure on one entry does not roll
/// back entries already applied in the same trigger call. The returned code
/// is the highest severity observed across all entries.
#[derive(Clone)]
pub struct CompoundEvent {
    name: String,
    trigger_time: Time,
    entries: Vec<CompoundEntry>,
    armed: bool,
}

impl CompoundEvent {
    pub fn new(trigger_time: Time) -> Self {
        Self {
            name: String::new(),
            trigger_time,
            entries: Vec::new(),
            armed: false,
        }
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn set_trigger_time(&mut self, time: Time) {
        self.trigger_time = time;
    }

    /// Add one field change; arms the event on the first non-empty entry.
    pub fn add(&mut self, obj: &SharedObject, field: impl Into<String>, value: f64, unit: Unit) {
        let field = field.into();
        if field.is_empty() {
            return;
        }
        self.entries.push(CompoundEntry {
            target: object_ref(obj),
            target_name: lock_object(obj).name().to_string(),
            field,
            value,
            unit,
        });
        self.armed = true;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl EventInterface for CompoundEvent {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> EventKind {
        EventKind::Compound
    }

    fn trigger_at(&mut self, time: Time) -> ChangeCode {
        if time < self.trigger_time {
            return ChangeCode::NotTriggered;
        }
        self.trigger_now()
    }

    fn trigger_now(&mut self) -> ChangeCode {
        if !self.armed {
            return ChangeCode::NotTriggered;
        }
        self.armed = false;
        let mut code = ChangeCode::NotTriggered;
        for entry in &self.entries {
            let result = match entry.target.upgrade() {
                Some(target) => lock_object(&target)
                    .set(&entry.field, entry.value, entry.unit)
                    .map_err(|err| err.to_string()),
                None => Err("target is gone".to_string()),
            };
            code = code.max(match result {
                Ok(()) => ChangeCode::ParameterChange,
                Err(err) => {
                    warn!(
                        event = %self.name,
                        target = %entry.target_name,
                        field = %entry.field,
                        %err,
                        "compound entry failed"
                    );
                    ChangeCode::ExecutionFailure
                }
            });
        }
        code
    }

    fn is_armed(&self) -> bool {
        self.armed
    }

    fn next_trigger_time(&self) -> Time {
        if self.armed {
            self.trigger_time
        } else {
            MAX_TIME
        }
    }

    fn target_key(&self) -> usize {
        self.entries
            .first()
            .map(|e| ref_key(&e.target))
            .unwrap_or(0)
    }

    fn event_string(&self) -> String {
        let mut out = String::new();
        if self.trigger_time > NEG_TIME && self.trigger_time < MAX_TIME {
            out.push_str(&format!("@{} | ", self.trigger_time));
        }
        let parts: Vec<String> = self
            .entries
            .iter()
            .map(|e| format!("{}:{}({}) = {}", e.target_name, e.field, e.unit, e.value))
            .collect();
        out.push_str(&parts.join("; "));
        out
    }

    fn clone_boxed(&self) -> Box<dyn EventInterface> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::setpoint;

    #[test]
    fn all_entries_apply() {
        let a = setpoint("g1", 0.0);
        let b = setpoint("g2", 0.0);
        let mut ev = CompoundEvent::new(1.0);
        ev.add(&a, "p", 10.0, Unit::Mw);
        ev.add(&b, "p", 20.0, Unit::Mw);
        assert_eq!(ev.trigger_at(1.0), ChangeCode::ParameterChange);
        assert_eq!(lock_object(&a).get("p", Unit::Def), Some(10.0));
        assert_eq!(lock_object(&b).get("p", Unit::Def), Some(20.0));
        assert!(!ev.is_armed());
    }

    #[test]
    fn partial_failure_keeps_applied_entries() {
        let a = setpoint("g1", 0.0);
        let b = setpoint("g2", 0.0);
        let mut ev = CompoundEvent::new(0.0);
        ev.add(&a, "p", 10.0, Unit::Mw);
        ev.add(&b, "nosuch", 20.0, Unit::Mw);
        assert_eq!(ev.trigger_at(0.0), ChangeCode::ExecutionFailure);
        // the first entry was applied and is not rolled back
        assert_eq!(lock_object(&a).get("p", Unit::Def), Some(10.0));
    }

    #[test]
    fn empty_field_entries_are_ignored() {
        let a = setpoint("g1", 0.0);
        let mut ev = CompoundEvent::new(0.0);
        ev.add(&a, "", 10.0, Unit::Mw);
        assert!(ev.is_empty());
        assert!(!ev.is_armed());
    }
}
