//! Player: an event that re-arms itself from an ordered time series.

use gs_core::{ChangeCode, SharedObject, Time, Unit, MAX_TIME};

use crate::error::EventResult;
use crate::event::{Event, EventInterface, EventKind};
use crate::series::TimeSeries;

/// Replays a (time, value) series against one target field.
///
/// After each trigger the cursor advances to the next point. With a
/// positive `period` the series wraps around: when the cursor passes the
/// end, all trigger times shift forward by one period and playback restarts
/// from the first point. Without a period the player disarms when the
/// series is exhausted.
#[derive(Clone)]
pub struct Player {
    base: Event,
    series: TimeSeries,
    cursor: usize,
    period: Time,
    /// Accumulated wraparound shift applied to every series time.
    time_offset: Time,
    file: Option<(String, usize)>,
}

impl Player {
    pub fn new(series: TimeSeries) -> Self {
        let mut base = Event::new(0.0);
        if let Some((t, _)) = series.point(0) {
            base.set_trigger_time(t);
        }
        Self {
            base,
            series,
            cursor: 0,
            period: 0.0,
            time_offset: 0.0,
            file: None,
        }
    }

    /// Player that loads its series from `file` in the background. The
    /// queue joins the load via [`EventInterface::initialize`].
    pub fn from_file(file: impl Into<String>, column: usize) -> Self {
        let file = file.into();
        let mut series = TimeSeries::new();
        series.load_file_async(&file, column);
        let mut player = Self::new(series);
        player.file = Some((file, column));
        player
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

    /// Playback loop period; zero disables wraparound.
    pub fn set_period(&mut self, period: Time) {
        self.period = period;
    }

    pub fn period(&self) -> Time {
        self.period
    }

    /// Replace the trigger time of the current series point.
    pub fn set_time(&mut self, time: Time) {
        if let Some((_, v)) = self.series.point(self.cursor) {
            self.set_time_value(time, v);
        }
    }

    /// Replace the current series point outright.
    pub fn set_time_value(&mut self, time: Time, value: f64) {
        if self.cursor < self.series.len() {
            let mut points = self.series.points().to_vec();
            points[self.cursor] = (time, value);
            self.series = TimeSeries::from_points(points);
        } else {
            self.series.push(time, value);
        }
    }

    pub fn series(&self) -> &TimeSeries {
        &self.series
    }

    fn current_point(&self) -> Option<(Time, f64)> {
        self.series
            .point(self.cursor)
            .map(|(t, v)| (t + self.time_offset, v))
    }

    /// Advance past the just-played point, wrapping if periodic.
    fn advance(&mut self) {
        self.cursor += 1;
        if self.cursor >= self.series.len() && self.period > 0.0 {
            self.cursor = 0;
            self.time_offset += self.period;
        }
    }
}

impl EventInterface for Player {
    fn name(&self) -> &str {
        self.base.name()
    }

    fn kind(&self) -> EventKind {
        EventKind::Player
    }

    fn trigger_at(&mut self, time: Time) -> ChangeCode {
        match self.current_point() {
            Some((t, _)) if time >= t => self.trigger_now(),
            _ => ChangeCode::NotTriggered,
        }
    }

    fn trigger_now(&mut self) -> ChangeCode {
        let Some((_, value)) = self.current_point() else {
            return ChangeCode::NotTriggered;
        };
        let code = self.base.apply(value);
        self.advance();
        if self.current_point().is_some() && code != ChangeCode::ExecutionFailure {
            // more points to play
            self.base.rearm();
        }
        code
    }

    fn is_armed(&self) -> bool {
        self.base.is_armed() && self.current_point().is_some()
    }

    fn next_trigger_time(&self) -> Time {
        match self.current_point() {
            Some((t, _)) if self.base.is_armed() => t,
            _ => MAX_TIME,
        }
    }

    fn initialize(&mut self) -> EventResult<()> {
        self.series.ensure_loaded()?;
        if self.cursor == 0 {
            if let Some((t, _)) = self.series.point(0) {
                self.base.set_trigger_time(t);
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
        let mut out = format!("@{}", times.join(","));
        if self.period > 0.0 {
            out = match times.len() {
                1 => format!("@{}+{}", times[0], self.period),
                _ => format!("{out}+{}", self.period),
            };
        }
        out.push_str(&format!(
            " | {}:{}({}) = ",
            self.base.target_name(),
            self.base.field(),
            self.base.unit()
        ));
        match &self.file {
            Some((file, 0)) => out.push_str(&format!("{{{file}}}")),
            Some((file, col)) => out.push_str(&format!("{{{file}:{col}}}")),
            None => out.push_str(&values.join(",")),
        }
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
    use gs_core::lock_object;

    fn three_point_player(obj: &SharedObject) -> Player {
        let mut p = Player::new(TimeSeries::from_points(vec![
            (0.0, 1.0),
            (1.0, 2.0),
            (2.0, 3.0),
        ]));
        p.set_target(obj);
        p.set_field("p");
        p
    }

    #[test]
    fn plays_series_in_order_then_disarms() {
        let obj = setpoint("g1", 0.0);
        let mut p = three_point_player(&obj);
        for (t, expect) in [(0.0, 1.0), (1.0, 2.0), (2.0, 3.0)] {
            assert_eq!(p.trigger_at(t), ChangeCode::ParameterChange);
            assert_eq!(lock_object(&obj).get("p", Unit::Def), Some(expect));
        }
        assert!(!p.is_armed(), "no period, series exhausted");
        assert_eq!(p.next_trigger_time(), MAX_TIME);
    }

    #[test]
    fn periodic_wraparound() {
        let obj = setpoint("g1", 0.0);
        let mut p = three_point_player(&obj);
        p.set_period(3.0);
        let mut applied = Vec::new();
        for t in [0.0, 1.0, 2.0, 3.0] {
            assert_eq!(p.trigger_at(t), ChangeCode::ParameterChange);
            applied.push(lock_object(&obj).get("p", Unit::Def).unwrap());
        }
        assert_eq!(applied, vec![1.0, 2.0, 3.0, 1.0]);
        assert!(p.is_armed(), "periodic players never exhaust");
        assert_eq!(p.next_trigger_time(), 4.0);
    }

    #[test]
    fn early_trigger_does_not_advance() {
        let obj = setpoint("g1", 0.0);
        let mut p = three_point_player(&obj);
        assert_eq!(p.trigger_at(1.5), ChangeCode::ParameterChange);
        assert_eq!(p.trigger_at(1.5), ChangeCode::ParameterChange);
        // third point is at t=2, not due yet
        assert_eq!(p.trigger_at(1.5), ChangeCode::NotTriggered);
        assert_eq!(p.next_trigger_time(), 2.0);
    }

    #[test]
    fn failure_disarms_without_retry() {
        let obj = setpoint("g1", 0.0);
        let mut p = Player::new(TimeSeries::from_points(vec![(0.0, 1.0), (1.0, 2.0)]));
        p.set_target(&obj);
        p.set_field("nosuch");
        assert_eq!(p.trigger_at(0.0), ChangeCode::ExecutionFailure);
        assert!(!p.is_armed());
    }
}
