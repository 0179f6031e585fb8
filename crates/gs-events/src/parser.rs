//! The event specification mini-language.
//!
//! `@t1[,t2,t3|+period] | [root::]obj:field(units) = v1[,v2,...] [ as name]`
//!
//! The `@...` time clause is optional; without it the event never fires
//! automatically. A comma list of times binds 1:1 with a matching list of
//! values. A `+period` suffix establishes periodic re-arming. A
//! `{file[:col]}` token in place of literal values switches the event into
//! file-driven player mode. An ` as <name>` clause renames the event
//! itself, not the target object.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use gs_core::{SharedObject, Time, Unit, MAX_TIME};

use crate::compound::CompoundEvent;
use crate::error::{EventError, EventResult};
use crate::event::{Event, EventInterface, EventKind};
use crate::player::Player;
use crate::series::TimeSeries;

/// Parsed form of one event string.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventSpec {
    pub name: Option<String>,
    pub times: Vec<Time>,
    pub period: Option<Time>,
    pub object: String,
    pub field: String,
    pub unit: Unit,
    pub values: Vec<f64>,
    pub file: Option<String>,
    pub column: usize,
}

impl Default for EventSpec {
    fn default() -> Self {
        Self {
            name: None,
            times: Vec::new(),
            period: None,
            object: String::new(),
            field: String::new(),
            unit: Unit::Def,
            values: Vec::new(),
            file: None,
            column: 0,
        }
    }
}

fn parse_err(what: impl Into<String>) -> EventError {
    EventError::Parse { what: what.into() }
}

fn parse_number(token: &str) -> EventResult<f64> {
    token
        .trim()
        .parse()
        .map_err(|_| parse_err(format!("bad number {:?}", token.trim())))
}

impl EventSpec {
    pub fn parse(input: &str) -> EventResult<Self> {
        let mut spec = EventSpec::default();
        let mut input = input.trim();

        // the rename clause trails the whole string and names the event,
        // not the target
        if let Some((rest, name)) = input.rsplit_once(" as ") {
            spec.name = Some(name.trim().to_string());
            input = rest.trim_end();
        }

        let assignment = if let Some(rest) = input.strip_prefix('@') {
            let (clause, assignment) = rest
                .split_once('|')
                .ok_or_else(|| parse_err("time clause without an assignment"))?;
            spec.parse_time_clause(clause.trim())?;
            assignment
        } else {
            input
        };

        let (lhs, rhs) = assignment
            .split_once('=')
            .ok_or_else(|| parse_err("missing '=' in event string"))?;
        spec.parse_target(lhs.trim())?;
        spec.parse_values(rhs.trim())?;
        Ok(spec)
    }

    fn parse_time_clause(&mut self, clause: &str) -> EventResult<()> {
        if clause.is_empty() {
            return Err(parse_err("empty time clause"));
        }
        if let Some((time, period)) = clause.split_once('+') {
            for token in time.split(',') {
                self.times.push(parse_number(token)?);
            }
            self.period = Some(parse_number(period)?);
        } else {
            for token in clause.split(',') {
                self.times.push(parse_number(token)?);
            }
        }
        Ok(())
    }

    fn parse_target(&mut self, lhs: &str) -> EventResult<()> {
        let lhs = match lhs.strip_suffix(')') {
            Some(prefix) => {
                let (rest, unit) = prefix
                    .rsplit_once('(')
                    .ok_or_else(|| parse_err("unmatched ')' in target"))?;
                self.unit = Unit::parse(unit)
                    .ok_or_else(|| parse_err(format!("unknown unit {unit:?}")))?;
                rest.trim()
            }
            None => lhs,
        };
        // field is the last ':'-separated token; '::' path separators
        // stay inside the object reference
        let mut parts: Vec<&str> = lhs.split(':').collect();
        let field = parts.pop().unwrap_or_default().trim();
        let object = parts.join(":");
        let object = object.trim();
        if object.is_empty() || field.is_empty() {
            return Err(parse_err(format!("expected object:field, got {lhs:?}")));
        }
        self.object = object.to_string();
        self.field = field.to_string();
        Ok(())
    }

    fn parse_values(&mut self, rhs: &str) -> EventResult<()> {
        if let Some(rest) = rhs.strip_prefix('{') {
            let (inside, after) = rest
                .split_once('}')
                .ok_or_else(|| parse_err("unterminated file token"))?;
            // a trailing :N selects the value column
            match inside.rsplit_once(':') {
                Some((file, col)) if col.chars().all(|c| c.is_ascii_digit()) && !col.is_empty() => {
                    self.file = Some(file.trim().to_string());
                    self.column = col.parse().unwrap_or(0);
                }
                _ => self.file = Some(inside.trim().to_string()),
            }
            if let Some(period) = after.trim().strip_prefix('+') {
                self.period = Some(parse_number(period)?);
            }
            return Ok(());
        }
        for token in rhs.split(',') {
            self.values.push(parse_number(token)?);
        }
        Ok(())
    }
}

impl fmt::Display for EventSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.times.is_empty() {
            let times: Vec<String> = self.times.iter().map(|t| t.to_string()).collect();
            write!(f, "@{}", times.join(","))?;
            if let Some(period) = self.period {
                write!(f, "+{period}")?;
            }
            write!(f, " | ")?;
        }
        write!(f, "{}:{}({}) = ", self.object, self.field, self.unit)?;
        match &self.file {
            Some(file) if self.column > 0 => write!(f, "{{{}:{}}}", file, self.column)?,
            Some(file) => write!(f, "{{{file}}}")?,
            None => {
                let values: Vec<String> = self.values.iter().map(|v| v.to_string()).collect();
                write!(f, "{}", values.join(","))?;
            }
        }
        if let Some(name) = &self.name {
            write!(f, " as {name}")?;
        }
        Ok(())
    }
}

/// Lookup from an object reference in an event string to a live object.
pub trait ObjectDirectory {
    fn find_object(&self, name: &str) -> Option<SharedObject>;
}

impl ObjectDirectory for HashMap<String, SharedObject> {
    fn find_object(&self, name: &str) -> Option<SharedObject> {
        self.get(name).cloned()
    }
}

/// Classify which event variant a parsed spec describes.
pub fn find_event_type(spec: &EventSpec) -> EventKind {
    if spec.file.is_some() || spec.times.len() > 1 || spec.period.is_some() {
        EventKind::Player
    } else if spec.values.len() > 1 {
        EventKind::Compound
    } else {
        EventKind::Basic
    }
}

/// Build the event a spec describes, resolving its target through the
/// directory. A `root::`-qualified reference falls back to its final
/// segment when the qualified name is not in the directory.
pub fn make_event(
    spec: &EventSpec,
    directory: &dyn ObjectDirectory,
) -> EventResult<Box<dyn EventInterface>> {
    let target = directory
        .find_object(&spec.object)
        .or_else(|| {
            spec.object
                .rsplit_once("::")
                .and_then(|(_, tail)| directory.find_object(tail))
        })
        .ok_or_else(|| EventError::UnknownObject {
            name: spec.object.clone(),
        })?;

    match find_event_type(spec) {
        EventKind::Player => make_player(spec, &target),
        EventKind::Compound => make_compound(spec, &target),
        _ => make_basic(spec, &target),
    }
}

fn make_basic(spec: &EventSpec, target: &SharedObject) -> EventResult<Box<dyn EventInterface>> {
    // no time clause means the event never fires on its own
    let mut ev = Event::new(spec.times.first().copied().unwrap_or(MAX_TIME));
    ev.set_target(target);
    ev.set_field(&spec.field);
    ev.set_value(spec.values.first().copied().unwrap_or(0.0), spec.unit);
    if let Some(name) = &spec.name {
        ev.set_name(name);
    }
    Ok(Box::new(ev))
}

fn make_player(spec: &EventSpec, target: &SharedObject) -> EventResult<Box<dyn EventInterface>> {
    let mut player = match &spec.file {
        Some(file) => Player::from_file(file, spec.column),
        None => {
            if spec.times.len() != spec.values.len() {
                return Err(parse_err(format!(
                    "{} times but {} values",
                    spec.times.len(),
                    spec.values.len()
                )));
            }
            let points = spec
                .times
                .iter()
                .copied()
                .zip(spec.values.iter().copied())
                .collect();
            Player::new(TimeSeries::from_points(points))
        }
    };
    player.set_target(target);
    player.set_field(&spec.field);
    player.set_unit(spec.unit);
    if let Some(period) = spec.period {
        player.set_period(period);
    }
    if let Some(name) = &spec.name {
        player.set_name(name);
    }
    Ok(Box::new(player))
}

fn make_compound(spec: &EventSpec, target: &SharedObject) -> EventResult<Box<dyn EventInterface>> {
    let mut ev = CompoundEvent::new(spec.times.first().copied().unwrap_or(MAX_TIME));
    for value in &spec.values {
        ev.add(target, &spec.field, *value, spec.unit);
    }
    if let Some(name) = &spec.name {
        ev.set_name(name);
    }
    Ok(Box::new(ev))
}
