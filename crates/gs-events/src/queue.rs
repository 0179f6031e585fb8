//! The time-ordered event queue driving scheduled changes.
//!
//! One mutex guards the queue structure, so an inbound message handler on
//! another thread can insert events while the simulation thread is
//! mid-step. `next_time` is the hot read on the simulation path and is
//! served from an atomic cache of the front entry's time without taking
//! the lock; every structural mutation refreshes the cache before
//! releasing it.
//!
//! Two-part execution runs in three stages per pass: finish phase-B work
//! left over from an earlier pass, execute everything now due (phase A for
//! two-part entries; an undelayed phase B joins the same-pass list, a
//! delayed one is rescheduled to its trigger time plus the delay and runs
//! on the pass that reaches it), then run the same-pass phase-B list. All
//! phase-A executions of a pass complete before any same-pass phase B runs.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use gs_core::{ChangeCode, Time, DEFAULT_TIME_TOLERANCE, MAX_TIME};

use crate::adapter::{EventAdapter, EventFn, EventId, NULL_EVENT_ID};
use crate::error::{EventError, EventResult};
use crate::event::{EventInterface, EventKind};

/// Result of an insertion.
#[derive(Clone, Copy, Debug)]
pub struct Inserted {
    pub id: EventId,
    /// True when the new event became the earliest entry; the owner should
    /// re-plan its next stop time.
    pub moved_front: bool,
}

struct QueueInner {
    /// Adapters sorted by next firing time; always contains the null event.
    events: Vec<EventAdapter>,
    /// Ids awaiting their phase-B execution.
    partb: Vec<EventId>,
    time_tol: Time,
}

impl QueueInner {
    fn front_time(&self) -> Time {
        self.events.first().map(|a| a.next_time()).unwrap_or(MAX_TIME)
    }

    fn sort(&mut self) {
        self.events
            .sort_by(|a, b| a.next_time().total_cmp(&b.next_time()));
    }

    fn find_mut(&mut self, id: EventId) -> Option<&mut EventAdapter> {
        self.events.iter_mut().find(|a| a.id() == id)
    }

    /// Drop adapters flagged for removal and their pending phase-B entries.
    fn purge(&mut self) {
        self.events.retain(|a| a.is_null() || !a.remove_pending());
        let alive: Vec<EventId> = self.events.iter().map(|a| a.id()).collect();
        self.partb.retain(|id| alive.contains(id));
    }
}

/// Thread-safe scheduler for event adapters.
pub struct EventQueue {
    inner: Mutex<QueueInner>,
    /// Front entry's time as f64 bits, readable without the lock.
    next_time_bits: AtomicU64,
    next_id: AtomicU64,
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl EventQueue {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(QueueInner {
                events: vec![EventAdapter::null_event()],
                partb: Vec::new(),
                time_tol: DEFAULT_TIME_TOLERANCE,
            }),
            next_time_bits: AtomicU64::new(MAX_TIME.to_bits()),
            next_id: AtomicU64::new(NULL_EVENT_ID + 1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn store_front(&self, inner: &QueueInner) {
        self.next_time_bits
            .store(inner.front_time().to_bits(), Ordering::Release);
    }

    /// Earliest pending event time. Lock-free; reads the cached front.
    pub fn next_time(&self) -> Time {
        f64::from_bits(self.next_time_bits.load(Ordering::Acquire))
    }

    /// Earliest pending time among events of one concrete kind. Scans, so
    /// it takes the lock.
    pub fn next_time_for_kind(&self, kind: EventKind) -> Time {
        let inner = self.lock();
        inner
            .events
            .iter()
            .filter_map(|a| match a.payload() {
                crate::adapter::EventPayload::Object(ev) if ev.kind() == kind => {
                    Some(a.next_time())
                }
                _ => None,
            })
            .fold(MAX_TIME, Time::min)
    }

    pub fn time_tolerance(&self) -> Time {
        self.lock().time_tol
    }

    /// Number of scheduled events, excluding the null event.
    pub fn event_count(&self) -> usize {
        self.lock().events.iter().filter(|a| !a.is_null()).count()
    }

    /// Schedule an event, finishing its setup first (series loads).
    pub fn insert(&self, event: Box<dyn EventInterface>) -> EventResult<Inserted> {
        let mut adapter = EventAdapter::from_event(event);
        adapter.initialize()?;
        Ok(self.insert_adapter(adapter))
    }

    /// Schedule a periodic callback.
    pub fn insert_function(&self, start_time: Time, period: Time, f: EventFn) -> Inserted {
        self.insert_adapter(EventAdapter::from_function(start_time, period, f))
    }

    /// Schedule a prebuilt adapter (phase-B-only entries and other
    /// hand-configured scheduling).
    pub fn insert_adapter(&self, mut adapter: EventAdapter) -> Inserted {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        adapter.set_id(id);
        let time = adapter.next_time();

        let mut inner = self.lock();
        let moved_front = time < inner.front_time();
        if moved_front {
            inner.events.insert(0, adapter);
            debug!(id, time, "inserted event ahead of previous front");
        } else {
            inner.events.push(adapter);
            inner.sort();
        }
        self.store_front(&inner);
        Inserted { id, moved_front }
    }

    /// Cancel an event by identity. An id pending in the phase-B list is
    /// dropped from there as well. The null event cannot be removed.
    pub fn remove(&self, id: EventId) -> bool {
        if id == NULL_EVENT_ID {
            return false;
        }
        let mut inner = self.lock();
        let before = inner.events.len();
        inner.events.retain(|a| a.id() != id);
        inner.partb.retain(|pending| *pending != id);
        let removed = inner.events.len() != before;
        self.store_front(&inner);
        removed
    }

    /// Run all events due at `time`, returning the highest-severity change
    /// code observed across the three execution stages.
    pub fn execute_events(&self, time: Time) -> ChangeCode {
        let mut guard = self.lock();
        let inner = &mut *guard;
        if inner.front_time() > time + inner.time_tol && inner.partb.is_empty() {
            return ChangeCode::NoChange;
        }
        let tol = inner.time_tol;
        let mut code = ChangeCode::NoChange;

        // stage 1: finish phase-B work left over from earlier passes
        let leftover = std::mem::take(&mut inner.partb);
        for id in leftover {
            if let Some(adapter) = inner.find_mut(id) {
                code = code.max(adapter.execute_part_b(time));
            }
        }

        // stage 2: execute everything now due. A delayed phase B is only
        // rescheduled; it rejoins the due set when its own time arrives.
        {
            let QueueInner { events, partb, .. } = inner;
            for adapter in events.iter_mut() {
                if adapter.remove_pending() || adapter.next_time() > time + tol {
                    continue;
                }
                if adapter.partb_only() {
                    partb.push(adapter.id());
                } else if adapter.is_two_part() && !adapter.partb_turn() {
                    let trigger = adapter.next_time();
                    code = code.max(adapter.execute_part_a());
                    if adapter.partb_delay() > 0.0 {
                        adapter.set_next_time(trigger + adapter.partb_delay());
                    } else {
                        partb.push(adapter.id());
                    }
                } else {
                    code = code.max(adapter.execute(time, tol));
                }
            }
        }

        // stage 3: phase-B work that became due within this pass
        let due_b = std::mem::take(&mut inner.partb);
        for id in due_b {
            if let Some(adapter) = inner.find_mut(id) {
                code = code.max(adapter.execute_part_b(time));
            }
        }

        inner.purge();
        inner.sort();
        self.store_front(inner);
        if code >= ChangeCode::ExecutionFailure {
            warn!(time, "an event failed during this pass");
        }
        code
    }

    /// Remove later-inserted events duplicating an earlier one of the same
    /// concrete kind against the same target. Returns how many were removed.
    pub fn check_duplicates(&self) -> usize {
        let mut inner = self.lock();
        let infos: Vec<(EventId, EventKind, usize)> = inner
            .events
            .iter()
            .filter_map(|a| match a.payload() {
                crate::adapter::EventPayload::Object(ev) => {
                    Some((a.id(), ev.kind(), ev.target_key()))
                }
                _ => None,
            })
            .collect();
        let mut drop_ids: Vec<EventId> = Vec::new();
        for (i, &(id_a, kind_a, key_a)) in infos.iter().enumerate() {
            if key_a == 0 {
                continue;
            }
            for &(id_b, kind_b, key_b) in &infos[i + 1..] {
                if kind_a == kind_b && key_a == key_b {
                    // the later insertion has the larger id
                    let doomed = id_a.max(id_b);
                    if !drop_ids.contains(&doomed) {
                        drop_ids.push(doomed);
                    }
                }
            }
        }
        if !drop_ids.is_empty() {
            debug!(count = drop_ids.len(), "removing duplicate events");
            inner.events.retain(|a| !drop_ids.contains(&a.id()));
            let alive: Vec<EventId> = inner.events.iter().map(|a| a.id()).collect();
            inner.partb.retain(|id| alive.contains(id));
            self.store_front(&inner);
        }
        drop_ids.len()
    }

    /// Force every event to recompute its trigger time and re-sort; used
    /// after a bulk external mutation of event targets or series.
    pub fn recheck(&self) {
        let mut inner = self.lock();
        for adapter in inner.events.iter_mut() {
            adapter.update_time();
        }
        inner.sort();
        self.store_front(&inner);
    }

    /// Deep-copy every event (including the null event) into `target`,
    /// preserving the tolerance setting. Used to snapshot a simulation.
    pub fn clone_to(&self, target: &EventQueue) {
        if std::ptr::eq(self, target) {
            return;
        }
        let (events, partb, time_tol) = {
            let inner = self.lock();
            (inner.events.clone(), inner.partb.clone(), inner.time_tol)
        };
        let next_id = self.next_id.load(Ordering::Relaxed);
        let mut dst = target.lock();
        dst.events = events;
        dst.partb = partb;
        dst.time_tol = time_tol;
        target.next_id.fetch_max(next_id, Ordering::Relaxed);
        target.store_front(&dst);
    }

    /// String-parameter configuration entry point.
    pub fn set(&self, param: &str, value: f64) -> EventResult<()> {
        match param {
            "timetol" => {
                if value > 0.0 {
                    self.lock().time_tol = value;
                    Ok(())
                } else {
                    Err(EventError::InvalidParameterValue {
                        name: param.to_string(),
                        value,
                    })
                }
            }
            "nulleventperiod" => {
                let mut inner = self.lock();
                if let Some(null) = inner.find_mut(NULL_EVENT_ID) {
                    null.set_period(value);
                }
                Ok(())
            }
            "nulleventtime" => {
                let mut inner = self.lock();
                if let Some(null) = inner.find_mut(NULL_EVENT_ID) {
                    null.set_next_time(value);
                }
                inner.sort();
                self.store_front(&inner);
                Ok(())
            }
            _ => Err(EventError::UnrecognizedParameter {
                name: param.to_string(),
            }),
        }
    }

    pub fn get(&self, param: &str) -> Option<f64> {
        match param {
            "timetol" => Some(self.lock().time_tol),
            "nulleventtime" => {
                let mut inner = self.lock();
                inner.find_mut(NULL_EVENT_ID).map(|n| n.next_time())
            }
            "nulleventperiod" => {
                let mut inner = self.lock();
                inner.find_mut(NULL_EVENT_ID).map(|n| n.period())
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{Event, ExecutionMode};
    use crate::test_util::setpoint;
    use gs_core::Unit;
    use std::sync::{Arc, Mutex};

    fn basic(obj: &gs_core::SharedObject, time: Time, value: f64) -> Box<dyn EventInterface> {
        let mut ev = Event::new(time);
        ev.set_target(obj);
        ev.set_field("p");
        ev.set_value(value, Unit::Mw);
        Box::new(ev)
    }

    /// Two-phase test event logging when each phase actually ran.
    #[derive(Clone)]
    struct Breaker {
        log: Arc<Mutex<Vec<(char, Time)>>>,
        time: Time,
        delay: Time,
        armed: bool,
    }

    impl Breaker {
        fn new(log: &Arc<Mutex<Vec<(char, Time)>>>, time: Time, delay: Time) -> Self {
            Self {
                log: Arc::clone(log),
                time,
                delay,
                armed: true,
            }
        }
    }

    impl EventInterface for Breaker {
        fn name(&self) -> &str {
            "breaker"
        }
        fn kind(&self) -> EventKind {
            EventKind::Basic
        }
        fn trigger_at(&mut self, time: Time) -> ChangeCode {
            if time < self.time {
                return ChangeCode::NotTriggered;
            }
            self.log.lock().unwrap().push(('a', time));
            ChangeCode::ObjectChange
        }
        fn trigger_now(&mut self) -> ChangeCode {
            self.trigger_at(self.time)
        }
        fn trigger_phase_b(&mut self, time: Time) -> ChangeCode {
            self.armed = false;
            self.log.lock().unwrap().push(('b', time));
            ChangeCode::ParameterChange
        }
        fn is_armed(&self) -> bool {
            self.armed
        }
        fn next_trigger_time(&self) -> Time {
            if self.armed {
                self.time
            } else {
                MAX_TIME
            }
        }
        fn execution_mode(&self) -> ExecutionMode {
            if self.delay > 0.0 {
                ExecutionMode::Delayed(self.delay)
            } else {
                ExecutionMode::TwoPart
            }
        }
        fn target_key(&self) -> usize {
            0
        }
        fn event_string(&self) -> String {
            String::new()
        }
        fn clone_boxed(&self) -> Box<dyn EventInterface> {
            Box::new(self.clone())
        }
    }

    #[test]
    fn empty_queue_reports_max_time() {
        let q = EventQueue::new();
        assert_eq!(q.next_time(), MAX_TIME);
        assert_eq!(q.event_count(), 0);
        assert_eq!(q.execute_events(100.0), ChangeCode::NoChange);
    }

    #[test]
    fn front_insert_announces_next_time_change() {
        let obj = setpoint("g1", 0.0);
        let q = EventQueue::new();
        let first = q.insert(basic(&obj, 5.0, 1.0)).unwrap();
        assert!(first.moved_front);
        let earlier = q.insert(basic(&obj, 3.0, 2.0)).unwrap();
        assert!(earlier.moved_front);
        let later = q.insert(basic(&obj, 8.0, 3.0)).unwrap();
        assert!(!later.moved_front);
        assert_eq!(q.next_time(), 3.0);
    }

    #[test]
    fn scenario_5_3_8() {
        let obj = setpoint("g1", 0.0);
        let q = EventQueue::new();
        for (t, v) in [(5.0, 50.0), (3.0, 30.0), (8.0, 80.0)] {
            q.insert(basic(&obj, t, v)).unwrap();
        }
        assert_eq!(q.next_time(), 3.0);
        assert_eq!(q.execute_events(3.0), ChangeCode::ParameterChange);
        assert_eq!(gs_core::lock_object(&obj).get("p", Unit::Def), Some(30.0));
        assert_eq!(q.next_time(), 5.0);
        assert_eq!(q.event_count(), 2, "event at 3 is gone");
    }

    #[test]
    fn execute_is_idempotent_once_events_disarm() {
        let obj = setpoint("g1", 0.0);
        let q = EventQueue::new();
        q.insert(basic(&obj, 2.0, 9.0)).unwrap();
        assert_eq!(q.execute_events(2.0), ChangeCode::ParameterChange);
        assert_eq!(q.execute_events(2.0), ChangeCode::NoChange);
    }

    #[test]
    fn event_inside_the_tolerance_fires_and_is_not_dropped() {
        let obj = setpoint("g1", 0.0);
        let q = EventQueue::new();
        q.insert(basic(&obj, 1.0 + 5e-10, 42.0)).unwrap();
        assert_eq!(q.execute_events(1.0), ChangeCode::ParameterChange);
        assert_eq!(gs_core::lock_object(&obj).get("p", Unit::Def), Some(42.0));
        assert_eq!(q.event_count(), 0, "fired and completed");
    }

    #[test]
    fn same_pass_phase_b_runs_after_every_phase_a() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let q = EventQueue::new();
        q.insert(Box::new(Breaker::new(&log, 2.0, 0.0))).unwrap();
        q.insert(Box::new(Breaker::new(&log, 2.0, 0.0))).unwrap();
        assert_eq!(q.execute_events(2.0), ChangeCode::ObjectChange);
        assert_eq!(
            *log.lock().unwrap(),
            vec![('a', 2.0), ('a', 2.0), ('b', 2.0), ('b', 2.0)]
        );
    }

    #[test]
    fn delayed_phase_b_waits_for_its_own_time() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let q = EventQueue::new();
        q.insert(Box::new(Breaker::new(&log, 0.0, 10.0))).unwrap();

        assert_eq!(q.execute_events(0.0), ChangeCode::ObjectChange);
        assert_eq!(*log.lock().unwrap(), vec![('a', 0.0)]);
        assert_eq!(q.next_time(), 10.0, "phase B pending at trigger + delay");

        // an intermediate pass must not run the delayed phase B early
        assert_eq!(q.execute_events(1.0), ChangeCode::NoChange);
        assert_eq!(*log.lock().unwrap(), vec![('a', 0.0)]);

        assert_eq!(q.execute_events(10.0), ChangeCode::ParameterChange);
        assert_eq!(*log.lock().unwrap(), vec![('a', 0.0), ('b', 10.0)]);
        assert_eq!(q.event_count(), 0);
    }

    #[test]
    fn partb_only_adapter_skips_phase_a() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let q = EventQueue::new();
        let mut adapter = EventAdapter::from_event(Box::new(Breaker::new(&log, 3.0, 0.0)));
        adapter.set_partb_only(true);
        q.insert_adapter(adapter);

        assert_eq!(q.execute_events(3.0), ChangeCode::ParameterChange);
        assert_eq!(*log.lock().unwrap(), vec![('b', 3.0)]);
        assert_eq!(q.event_count(), 0);
    }

    #[test]
    fn remove_cancels_an_event() {
        let obj = setpoint("g1", 0.0);
        let q = EventQueue::new();
        let a = q.insert(basic(&obj, 2.0, 9.0)).unwrap();
        assert!(q.remove(a.id));
        assert!(!q.remove(a.id), "already gone");
        assert_eq!(q.execute_events(2.0), ChangeCode::NoChange);
        assert_eq!(gs_core::lock_object(&obj).get("p", Unit::Def), Some(0.0));
    }

    #[test]
    fn null_event_cannot_be_removed() {
        let q = EventQueue::new();
        assert!(!q.remove(NULL_EVENT_ID));
    }

    #[test]
    fn duplicate_events_are_pruned_keeping_the_earlier() {
        let obj = setpoint("g1", 0.0);
        let other = setpoint("g2", 0.0);
        let q = EventQueue::new();
        q.insert(basic(&obj, 2.0, 1.0)).unwrap();
        q.insert(basic(&obj, 4.0, 2.0)).unwrap();
        q.insert(basic(&other, 4.0, 3.0)).unwrap();
        assert_eq!(q.check_duplicates(), 1);
        assert_eq!(q.event_count(), 2);
        // the earlier insert survives
        q.execute_events(10.0);
        assert_eq!(gs_core::lock_object(&obj).get("p", Unit::Def), Some(1.0));
    }

    #[test]
    fn unrecognized_parameter_is_an_error() {
        let q = EventQueue::new();
        assert!(matches!(
            q.set("bogus", 1.0),
            Err(EventError::UnrecognizedParameter { .. })
        ));
        assert!(matches!(
            q.set("timetol", -1.0),
            Err(EventError::InvalidParameterValue { .. })
        ));
        q.set("timetol", 1e-6).unwrap();
        assert_eq!(q.get("timetol"), Some(1e-6));
    }

    #[test]
    fn null_event_period_drives_housekeeping_ticks() {
        let q = EventQueue::new();
        q.set("nulleventtime", 10.0).unwrap();
        q.set("nulleventperiod", 10.0).unwrap();
        assert_eq!(q.next_time(), 10.0);
        assert_eq!(q.execute_events(10.0), ChangeCode::NoChange);
        assert_eq!(q.next_time(), 20.0);
    }

    #[test]
    fn clone_snapshots_events_and_tolerance() {
        let obj = setpoint("g1", 0.0);
        let q = EventQueue::new();
        q.insert(basic(&obj, 2.0, 9.0)).unwrap();
        q.set("timetol", 1e-6).unwrap();

        let snapshot = EventQueue::new();
        q.clone_to(&snapshot);
        assert_eq!(snapshot.event_count(), 1);
        assert_eq!(snapshot.next_time(), 2.0);
        assert_eq!(snapshot.get("timetol"), Some(1e-6));

        // executing the snapshot does not drain the original
        assert_eq!(snapshot.execute_events(2.0), ChangeCode::ParameterChange);
        assert_eq!(q.event_count(), 1);
    }

    #[test]
    fn concurrent_insert_during_execution_is_safe() {
        use std::sync::Arc;
        let obj = setpoint("g1", 0.0);
        let q = Arc::new(EventQueue::new());
        q.insert(basic(&obj, 1.0, 1.0)).unwrap();

        let q2 = Arc::clone(&q);
        let obj2 = Arc::clone(&obj);
        let handle = std::thread::spawn(move || {
            for i in 0..50 {
                q2.insert(basic(&obj2, 100.0 + i as f64, 0.0)).unwrap();
            }
        });
        for t in 1..50 {
            q.execute_events(t as f64);
        }
        handle.join().unwrap();
        assert_eq!(q.event_count(), 50, "only the event at t=1 executed");
    }
}
