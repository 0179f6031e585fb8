//! The time-advance loop interleaving solver steps with queue execution.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info};

use gs_core::{ChangeCode, SharedObject, Time};
use gs_events::{make_event, EventInterface, EventQueue, EventSpec, Inserted};
use gs_solver::{DenseNewton, NetworkModel, NewtonConfig, SolverMode, SolverState};

use crate::error::{SimError, SimResult};

/// Quasi-static simulation driver.
///
/// Advances simulated time in segments bounded by the next scheduled event,
/// executing due events and re-solving the network after each segment. The
/// queue is shared, so events can be inserted from another thread while
/// [`Simulation::run_to`] is executing.
pub struct Simulation<M: NetworkModel> {
    model: M,
    state: SolverState,
    solver: DenseNewton,
    queue: Arc<EventQueue>,
    objects: HashMap<String, SharedObject>,
    time: Time,
}

impl<M: NetworkModel> Simulation<M> {
    pub fn new(model: M, mode: SolverMode) -> Self {
        Self {
            model,
            state: SolverState::new(mode),
            solver: DenseNewton::new(NewtonConfig::default()),
            queue: Arc::new(EventQueue::new()),
            objects: HashMap::new(),
            time: gs_core::TIME_ZERO,
        }
    }

    pub fn time(&self) -> Time {
        self.time
    }

    pub fn queue(&self) -> Arc<EventQueue> {
        Arc::clone(&self.queue)
    }

    pub fn state(&self) -> &SolverState {
        &self.state
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn solver_mut(&mut self) -> &mut DenseNewton {
        &mut self.solver
    }

    /// Register an object so event strings can reference it by name.
    pub fn add_object(&mut self, name: impl Into<String>, obj: SharedObject) {
        self.objects.insert(name.into(), obj);
    }

    /// Schedule an already-built event.
    pub fn schedule(&self, event: Box<dyn EventInterface>) -> SimResult<Inserted> {
        Ok(self.queue.insert(event)?)
    }

    /// Parse and schedule an event-string.
    pub fn schedule_event_string(&self, input: &str) -> SimResult<Inserted> {
        let spec = EventSpec::parse(input)?;
        let event = make_event(&spec, &self.objects)?;
        self.schedule(event)
    }

    /// Allocate state vectors and solve the initial operating point.
    pub fn initialize(&mut self) -> SimResult<()> {
        let n = self.model.state_size(self.state.mode());
        self.state.allocate(n, 0)?;
        self.state
            .set_max_non_zeros(self.model.jac_size(self.state.mode()));
        let mode = *self.state.mode();
        if let Some(state) = self.state.state_data_mut() {
            self.model.guess(self.time, state, None, &mode);
        }
        let report = self.solver.solve(&mut self.model, &mut self.state, self.time)?;
        info!(
            iterations = report.iterations,
            residual = report.residual_norm,
            "initial operating point solved"
        );
        Ok(())
    }

    /// React to the folded change code of an event pass.
    fn apply_change(&mut self, code: ChangeCode) -> SimResult<()> {
        if code >= ChangeCode::StateCountChange {
            debug!(?code, "state count changed, reallocating");
            let n = self.model.state_size(self.state.mode());
            self.state.allocate(n, self.state.root_count())?;
            let mode = *self.state.mode();
            if let Some(state) = self.state.state_data_mut() {
                self.model.guess(self.time, state, None, &mode);
            }
            self.solver.reset_pattern();
        } else if code >= ChangeCode::JacobianChange {
            debug!(?code, "jacobian structure changed, dropping pattern");
            self.solver.reset_pattern();
        }
        Ok(())
    }

    /// Advance to `stop`, executing events and re-solving after each event
    /// time. Returns the highest-severity change code observed.
    pub fn run_to(&mut self, stop: Time) -> SimResult<ChangeCode> {
        if stop < self.time {
            return Err(SimError::Time {
                what: format!("cannot run backwards from {} to {stop}", self.time),
            });
        }
        if !self.state.is_initialized() {
            self.initialize()?;
        }
        let tol = self.queue.time_tolerance();
        let mut overall = ChangeCode::NoChange;
        while self.time < stop {
            let next_event = self.queue.next_time();
            self.time = stop.min(next_event.max(self.time));
            if next_event <= self.time + tol {
                let code = self.queue.execute_events(self.time);
                overall = overall.max(code);
                self.apply_change(code)?;
            }
            self.solver.solve(&mut self.model, &mut self.state, self.time)?;
        }
        Ok(overall)
    }
}
