//! Interpolating player: samples a series at a fixed period, applying
//! linearly interpolated values between knots.

use gs_core::{ChangeCode, SharedObject, Time, Unit, MAX_TIME};

use crate::error::EventResult;
use crate::event::{Event, EventInterface, EventKind, ExecutionMode};
use crate::series::TimeSeries;

/// Player variant that fires every `sample_period` and pushes the value
/// interpolated from the series at the firing time.
///
/// Two-part execution: the interpolated value is applied in phase A; phase B
/// on the following queue pass lets the target observe the settled state
/// before the next sample lands.
#[derive(Clone)]
pub struct InterpolatingPlayer {
    base: Event,
    series: TimeSeries,
    sample_period: Time,
    next_time: Time,
}

impl InterpolatingPlayer {
    pub fn new(series: TimeSeries, sample_period: Time) -> Self {
        let next_time = series.point(0).map(|(t, _)| t).unwrap_or(MAX_TIME);
        Self {
            base: Event::new(next_time),
            series,
            sample_period,
            next_time,
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

    pub fn set_unit(&mut self, unit: Unit) {
        self.base.set_value(0.0, unit);
    }

    pub fn sample_period(&self) -> Time {
        self.sample_period
    }

    fn end_time(&self) -> Time {
        self.series
            .points()
            .last()
            .map(|(t, _)| *t)
            .unwrap_or(MAX_TIME)
    }
}

impl EventInterface for InterpolatingPlayer {
    fn name(&self) -> &str {
        self.base.name()
    }

    fn kind(&self) -> EventKind {
        EventKind::InterpolatingPlayer
    }

    fn trigger_at(&mut self, time: Time) -> ChangeCode {
        if time < self.next_time {
            return ChangeCode::NotTriggered;
        }
        let Some(value) = self.series.interpolate(time) else {
            return ChangeCode::NotTriggered;
        };
        let code = self.base.apply(value);
        if code == ChangeCode::ExecutionFailure {
            self.next_time = MAX_TIME;
            return code;
        }
        if time + self.sample_period <= self.end_time() {
            self.next_time = time + self.sample_period;
            self.base.rearm();
        } else {
            self.next_time = MAX_TIME;
        }
        code
    }

    fn trigger_now(&mut self) -> ChangeCode {
        let time = self.next_time;
        self.trigger_at(time)
    }

    fn is_armed(&self) -> bool {
        self.base.is_armed() && self.next_time < MAX_TIME
    }

    fn next_trigger_time(&self) -> Time {
        if self.base.is_armed() {
            self.next_time
        } else {
            MAX_TIME
        }
    }

    fn execution_mode(&self) -> ExecutionMode {
        ExecutionMode::TwoPart
    }

    fn initialize(&mut self) -> EventResult<()> {
        self.series.ensure_loaded()?;
        if let Some((t, _)) = self.series.point(0) {
            if self.next_time == MAX_TIME {
                self.next_time = t;
            }
        }
        Ok(())
    }

    fn target_key(&self) -> usize {
        self.base.target_key()
    }

    fn event_string(&self) -> String {
        let times: Vec<String> = self
            .series
            .points()
            .iter()
            .map(|(t, _)| t.to_string())
            .collect();
        let values: Vec<String> = self
            .series
            .points()
            .iter()
            .map(|(_, v)| v.to_string())
            .collect();
        format!(
            "@{} | {}:{}({}) = {}",
            times.join(","),
            self.base.target_name(),
            self.base.field(),
            self.base.unit(),
            values.join(",")
        )
    }

    fn clone_boxed(&self) -> Box<dyn EventInterface> {
        Box::new(self.clone())
    }
}
