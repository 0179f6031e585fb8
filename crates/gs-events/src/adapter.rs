//! Queue entry wrapping an event payload with its scheduling state.
//!
//! The queue never talks to event variants directly; it schedules adapters.
//! An adapter carries the next firing time, an optional re-fire period, the
//! two-part execution bookkeeping, and a removal flag the queue honors at
//! the end of each pass.

use std::sync::{Arc, Mutex, PoisonError};

use tracing::warn;

use gs_core::{ChangeCode, Time, MAX_TIME};

use crate::error::EventResult;
use crate::event::{EventInterface, ExecutionMode};

/// Queue-assigned event identity. Id 0 is reserved for the null event.
pub type EventId = u64;

pub const NULL_EVENT_ID: EventId = 0;

/// Shared callback payload; cloning shares the closure.
pub type EventFn = Arc<Mutex<dyn FnMut(Time) -> ChangeCode + Send>>;

/// What an adapter executes when it fires.
pub enum EventPayload {
    /// Housekeeping placeholder; fires as a no-change and reschedules.
    Null,
    Object(Box<dyn EventInterface>),
    Function(EventFn),
}

impl Clone for EventPayload {
    fn clone(&self) -> Self {
        match self {
            EventPayload::Null => EventPayload::Null,
            EventPayload::Object(ev) => EventPayload::Object(ev.clone_boxed()),
            EventPayload::Function(f) => EventPayload::Function(Arc::clone(f)),
        }
    }
}

/// One scheduled entry in the event queue.
#[derive(Clone)]
pub struct EventAdapter {
    id: EventId,
    next_time: Time,
    period: Time,
    two_part_execute: bool,
    partb_turn: bool,
    partb_only: bool,
    partb_delay: Time,
    remove_pending: bool,
    payload: EventPayload,
}

impl EventAdapter {
    /// The always-present null event; keeps the queue non-empty and gives
    /// the simulation a periodic housekeeping tick when configured.
    pub fn null_event() -> Self {
        Self {
            id: NULL_EVENT_ID,
            next_time: MAX_TIME,
            period: MAX_TIME,
            two_part_execute: false,
            partb_turn: false,
            partb_only: false,
            partb_delay: 0.0,
            remove_pending: false,
            payload: EventPayload::Null,
        }
    }

    pub fn from_event(event: Box<dyn EventInterface>) -> Self {
        let (two_part, delay) = match event.execution_mode() {
            ExecutionMode::Normal => (false, 0.0),
            ExecutionMode::TwoPart => (true, 0.0),
            ExecutionMode::Delayed(d) => (true, d),
        };
        Self {
            id: NULL_EVENT_ID,
            next_time: event.next_trigger_time(),
            period: 0.0,
            two_part_execute: two_part,
            partb_turn: false,
            partb_only: false,
            partb_delay: delay,
            remove_pending: false,
            payload: EventPayload::Object(event),
        }
    }

    /// Periodic callback adapter.
    pub fn from_function(start_time: Time, period: Time, f: EventFn) -> Self {
        Self {
            id: NULL_EVENT_ID,
            next_time: start_time,
            period,
            two_part_execute: false,
            partb_turn: false,
            partb_only: false,
            partb_delay: 0.0,
            remove_pending: false,
            payload: EventPayload::Function(f),
        }
    }

    pub fn id(&self) -> EventId {
        self.id
    }

    pub(crate) fn set_id(&mut self, id: EventId) {
        self.id = id;
    }

    pub fn next_time(&self) -> Time {
        self.next_time
    }

    pub(crate) fn set_next_time(&mut self, time: Time) {
        self.next_time = time;
    }

    pub fn period(&self) -> Time {
        self.period
    }

    pub(crate) fn set_period(&mut self, period: Time) {
        self.period = period;
    }

    pub fn is_two_part(&self) -> bool {
        self.two_part_execute
    }

    pub fn partb_turn(&self) -> bool {
        self.partb_turn
    }

    pub fn partb_only(&self) -> bool {
        self.partb_only
    }

    /// Skip phase A entirely; the payload's phase B runs at the scheduled
    /// time after every due phase A of that pass.
    pub fn set_partb_only(&mut self, flag: bool) {
        self.partb_only = flag;
    }

    pub fn partb_delay(&self) -> Time {
        self.partb_delay
    }

    pub fn remove_pending(&self) -> bool {
        self.remove_pending
    }

    pub fn is_null(&self) -> bool {
        matches!(self.payload, EventPayload::Null)
    }

    pub fn payload(&self) -> &EventPayload {
        &self.payload
    }

    /// Finish deferred payload setup and refresh the firing time.
    pub(crate) fn initialize(&mut self) -> EventResult<()> {
        if let EventPayload::Object(ev) = &mut self.payload {
            ev.initialize()?;
            self.next_time = ev.next_trigger_time();
        }
        Ok(())
    }

    /// Re-read the firing time from the payload (after external mutation).
    pub(crate) fn update_time(&mut self) {
        if let EventPayload::Object(ev) = &self.payload {
            self.next_time = ev.next_trigger_time();
        }
    }

    fn fire(&mut self, time: Time) -> ChangeCode {
        match &mut self.payload {
            EventPayload::Null => ChangeCode::NoChange,
            EventPayload::Object(ev) => ev.trigger_at(time),
            EventPayload::Function(f) => {
                let mut f = f.lock().unwrap_or_else(PoisonError::into_inner);
                f(time)
            }
        }
    }

    fn reschedule(&mut self) {
        match &self.payload {
            EventPayload::Null => {
                self.next_time = if self.period > 0.0 && self.period < MAX_TIME {
                    self.next_time + self.period
                } else {
                    MAX_TIME
                };
            }
            EventPayload::Object(ev) => {
                if ev.is_armed() {
                    self.next_time = ev.next_trigger_time();
                } else {
                    self.remove_pending = true;
                    self.next_time = MAX_TIME;
                }
            }
            EventPayload::Function(_) => {
                if self.period > 0.0 {
                    self.next_time += self.period;
                } else {
                    self.remove_pending = true;
                    self.next_time = MAX_TIME;
                }
            }
        }
    }

    /// Fire repeatedly while due. The payload always fires at its own
    /// scheduled time, not the pass time; an entry due within the tolerance
    /// ahead of the pass must still trigger. A payload that fires without
    /// advancing its own time is broken; after a few stalled firings the
    /// adapter flags itself for removal instead of spinning forever.
    pub(crate) fn execute(&mut self, time: Time, tol: Time) -> ChangeCode {
        if self.two_part_execute && self.partb_turn {
            return self.execute_part_b(time);
        }
        let mut code = ChangeCode::NotTriggered;
        let mut stalls = 0u32;
        while self.next_time <= time + tol && !self.remove_pending {
            let before = self.next_time;
            code = code.max(self.fire(before));
            self.reschedule();
            if self.next_time <= before {
                stalls += 1;
                if stalls > 4 {
                    warn!(id = self.id, time, "event time not advancing, removing");
                    self.remove_pending = true;
                    self.next_time = MAX_TIME;
                }
            } else {
                stalls = 0;
            }
        }
        code
    }

    /// First phase of a two-part execution, fired at the scheduled time;
    /// the queue decides when phase B runs.
    pub(crate) fn execute_part_a(&mut self) -> ChangeCode {
        let code = self.fire(self.next_time);
        self.partb_turn = true;
        code
    }

    /// Second phase; clears the phase flag and reschedules.
    pub(crate) fn execute_part_b(&mut self, time: Time) -> ChangeCode {
        let code = match &mut self.payload {
            EventPayload::Object(ev) => ev.trigger_phase_b(time),
            _ => ChangeCode::NoChange,
        };
        self.partb_turn = false;
        self.reschedule();
        code
    }
}
