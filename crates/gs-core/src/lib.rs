//! gs-core: stable foundation for the gridsim kernel.
//!
//! Contains:
//! - time (simulation time alias + sentinels)
//! - change (ordered change codes returned by discrete actions)
//! - units (grid quantity units + conversions)
//! - object (the narrow contract the kernel requires from attached models)
//! - error (shared error types)

pub mod change;
pub mod error;
pub mod object;
pub mod time;
pub mod units;

pub use change::ChangeCode;
pub use error::{CoreError, CoreResult};
pub use object::{lock_object, object_ref, ref_key, GridObject, ObjectRef, SharedObject};
pub use time::*;
pub use units::Unit;
