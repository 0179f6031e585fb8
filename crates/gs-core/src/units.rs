//! Grid quantity units and conversions.
//!
//! Events and component setters exchange values tagged with a [`Unit`].
//! Per-unit conversions need a power base, so [`convert`] takes the system
//! base power explicitly; conversions that would additionally require a
//! voltage or impedance base return `None` rather than guessing.

use core::fmt;

/// Units understood by the kernel's `set(field, value, unit)` contract.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Unit {
    /// Use whatever default the target object assumes for the field.
    Def,
    /// Per-unit on the system base.
    Pu,
    /// Megawatts (real power).
    Mw,
    /// Megavars (reactive power).
    Mvar,
    /// Megavolt-amperes (apparent power).
    Mva,
    /// Kilovolts.
    Kv,
    /// Volts.
    Volt,
    /// Amperes.
    Amp,
    /// Ohms.
    Ohm,
    /// Hertz.
    Hz,
    /// Radians.
    Rad,
    /// Degrees.
    Deg,
    /// Seconds.
    Sec,
    /// Minutes.
    Min,
}

/// Broad family a unit belongs to; conversions only happen within a family.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Family {
    Default,
    PerUnit,
    Power,
    Voltage,
    Current,
    Impedance,
    Frequency,
    Angle,
    Time,
}

impl Unit {
    /// Parse a unit token as it appears in event strings (case-insensitive
    /// for plain units, case-sensitive distinction is not needed here).
    pub fn parse(s: &str) -> Option<Unit> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "def" | "default" => Some(Unit::Def),
            "pu" | "p.u." | "perunit" => Some(Unit::Pu),
            "mw" => Some(Unit::Mw),
            "mvar" => Some(Unit::Mvar),
            "mva" => Some(Unit::Mva),
            "kv" => Some(Unit::Kv),
            "v" | "volt" => Some(Unit::Volt),
            "a" | "amp" => Some(Unit::Amp),
            "ohm" => Some(Unit::Ohm),
            "hz" => Some(Unit::Hz),
            "rad" => Some(Unit::Rad),
            "deg" => Some(Unit::Deg),
            "s" | "sec" => Some(Unit::Sec),
            "min" => Some(Unit::Min),
            _ => None,
        }
    }

    fn family(self) -> Family {
        match self {
            Unit::Def => Family::Default,
            Unit::Pu => Family::PerUnit,
            Unit::Mw | Unit::Mvar | Unit::Mva => Family::Power,
            Unit::Kv | Unit::Volt => Family::Voltage,
            Unit::Amp => Family::Current,
            Unit::Ohm => Family::Impedance,
            Unit::Hz => Family::Frequency,
            Unit::Rad | Unit::Deg => Family::Angle,
            Unit::Sec | Unit::Min => Family::Time,
        }
    }

    /// Scale factor to the family's reference unit (MW, V, rad, s, ...).
    fn to_base(self) -> f64 {
        match self {
            Unit::Kv => 1e3,
            Unit::Deg => core::f64::consts::PI / 180.0,
            Unit::Min => 60.0,
            _ => 1.0,
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Unit::Def => "def",
            Unit::Pu => "pu",
            Unit::Mw => "MW",
            Unit::Mvar => "MVar",
            Unit::Mva => "MVA",
            Unit::Kv => "kV",
            Unit::Volt => "V",
            Unit::Amp => "A",
            Unit::Ohm => "Ohm",
            Unit::Hz => "Hz",
            Unit::Rad => "rad",
            Unit::Deg => "deg",
            Unit::Sec => "s",
            Unit::Min => "min",
        };
        f.write_str(s)
    }
}

/// Convert `value` from one unit to another.
///
/// `base_power` is the system power base in MW, used for per-unit <-> power
/// conversions. Returns `None` when no conversion exists (different families
/// without a usable base). Converting to or from [`Unit::Def`] passes the
/// value through unchanged.
pub fn convert(value: f64, from: Unit, to: Unit, base_power: f64) -> Option<f64> {
    if from == to || from == Unit::Def || to == Unit::Def {
        return Some(value);
    }
    let (ff, tf) = (from.family(), to.family());
    if ff == tf {
        return Some(value * from.to_base() / to.to_base());
    }
    // per-unit bridges through the power base only
    match (ff, tf) {
        (Family::PerUnit, Family::Power) if base_power > 0.0 => Some(value * base_power),
        (Family::Power, Family::PerUnit) if base_power > 0.0 => Some(value / base_power),
        _ => None,
    }
}
