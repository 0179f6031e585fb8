//! The contract the kernel requires from attached component models.
//!
//! The kernel never owns the physical models; it only needs to push
//! parameter changes into them (`set`) and, for undo-capable events, read a
//! field back (`get`). Targets live in an externally owned structure, so the
//! event layer holds weak handles and tolerates a target being dropped:
//! a dead handle surfaces as an execution failure, never a dangling pointer.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use crate::error::CoreResult;
use crate::units::Unit;

/// A component model the kernel can drive.
///
/// Any model implementing `set` (plus the residual/Jacobian evaluation
/// contract defined in gs-solver) can be targeted by events.
pub trait GridObject: Send {
    /// Object name, used for event display and duplicate detection.
    fn name(&self) -> &str;

    /// Apply a parameter change. Unknown fields must return
    /// [`CoreError::UnknownField`](crate::CoreError::UnknownField); the event
    /// layer converts that into an execution-failure change code.
    fn set(&mut self, field: &str, value: f64, unit: Unit) -> CoreResult<()>;

    /// Read a field back (the "grabber" used by reversible events).
    /// Returns `None` for unknown fields.
    fn get(&self, field: &str, unit: Unit) -> Option<f64>;
}

/// Owning handle to a component model, held by the network layer.
pub type SharedObject = Arc<Mutex<dyn GridObject>>;

/// Non-owning handle held by events; upgrade before each use.
pub type ObjectRef = Weak<Mutex<dyn GridObject>>;

/// Downgrade an owning handle into an event target reference.
pub fn object_ref(obj: &SharedObject) -> ObjectRef {
    Arc::downgrade(obj)
}

/// Stable identity key for a target, usable after the target dies.
pub fn ref_key(target: &ObjectRef) -> usize {
    target.as_ptr() as *const () as usize
}

/// Lock an object, recovering from a poisoned mutex (a panicked writer
/// leaves the value behind; the kernel keeps going with it).
pub fn lock_object(obj: &Arc<Mutex<dyn GridObject>>) -> MutexGuard<'_, dyn GridObject + 'static> {
    obj.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;

    struct Setpoint {
        name: String,
        p: f64,
    }

    impl GridObject for Setpoint {
        fn name(&self) -> &str {
            &self.name
        }
        fn set(&mut self, field: &str, value: f64, _unit: Unit) -> CoreResult<()> {
            match field {
                "p" => {
                    self.p = value;
                    Ok(())
                }
                other => Err(CoreError::UnknownField {
                    field: other.to_string(),
                }),
            }
        }
        fn get(&self, field: &str, _unit: Unit) -> Option<f64> {
            (field == "p").then_some(self.p)
        }
    }

    #[test]
    fn weak_handle_tolerates_drop() {
        let obj: SharedObject = Arc::new(Mutex::new(Setpoint {
            name: "g1".into(),
            p: 0.0,
        }));
        let weak = object_ref(&obj);
        assert!(weak.upgrade().is_some());
        let key = ref_key(&weak);
        drop(obj);
        assert!(weak.upgrade().is_none());
        // identity key survives target death
        assert_eq!(key, ref_key(&weak));
    }

    #[test]
    fn set_and_get() {
        let obj: SharedObject = Arc::new(Mutex::new(Setpoint {
            name: "g1".into(),
            p: 1.0,
        }));
        {
            let mut guard = lock_object(&obj);
            guard.set("p", 2.5, Unit::Mw).unwrap();
            assert!(guard.set("q", 0.0, Unit::Def).is_err());
        }
        assert_eq!(lock_object(&obj).get("p", Unit::Def), Some(2.5));
    }
}
