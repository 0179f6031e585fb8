//! Event scheduling for grid simulations.
//!
//! Events are scheduled parameter changes against externally owned
//! component models. The crate provides:
//! - the basic [`Event`] and its variants ([`Player`],
//!   [`InterpolatingPlayer`], [`CompoundEvent`], [`ReversibleEvent`]),
//!   all behind the [`EventInterface`] capability trait;
//! - the [`EventQueue`], a lock-guarded time-ordered scheduler with
//!   two-part execution and a lock-free next-time read;
//! - the event-string mini-language ([`EventSpec`], [`make_event`]).

pub mod adapter;
pub mod compound;
pub mod error;
pub mod event;
pub mod interp;
pub mod parser;
pub mod player;
pub mod queue;
pub mod reversible;
pub mod series;

pub use adapter::{EventAdapter, EventFn, EventId, EventPayload, NULL_EVENT_ID};
pub use compound::CompoundEvent;
pub use error::{EventError, EventResult};
pub use event::{Event, EventInterface, EventKind, ExecutionMode};
pub use interp::InterpolatingPlayer;
pub use parser::{find_event_type, make_event, EventSpec, ObjectDirectory};
pub use player::Player;
pub use queue::{EventQueue, Inserted};
pub use reversible::ReversibleEvent;
pub use series::TimeSeries;
