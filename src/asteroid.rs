//! Asteroid descriptors arrive in several shapes: hand-written payloads, raw
//! NASA NEO objects, or the output of `/asteroid/get_by_id`. Each logical
//! input is resolved from a fixed, ordered list of field paths; the first
//! path holding a usable number wins. These lists are part of the public
//! request contract.
//!
//! Paths are dot-separated; numeric segments index into arrays. Values may be
//! JSON numbers or numeric strings (NASA encodes most figures as strings).

use serde_json::Value;

use crate::error::ApiError;

/// Explicit diameter in metres.
pub const DIAMETER_ALIASES: &[&str] = &[
    "diameter",
    "diameter_m",
    "diameter_meters",
    "estimated_diameter_m",
];

/// Min/max diameter pairs in metres, averaged when no explicit diameter is
/// given. NASA NEO layout first, then the `get_by_id` layout.
pub const DIAMETER_RANGE_ALIASES: &[(&str, &str)] = &[
    (
        "estimated_diameter.meters.estimated_diameter_min",
        "estimated_diameter.meters.estimated_diameter_max",
    ),
    ("estimated_diameter.meters.min", "estimated_diameter.meters.max"),
];

/// Entry or relative velocity in km/s.
pub const VELOCITY_ALIASES: &[&str] = &[
    "relative_velocity_km_s",
    "velocity_km_s",
    "entry_velocity_km_s",
    "velocity",
    "relative_velocity.kilometers_per_second",
    "close_approach_data.0.relative_velocity.kilometers_per_second",
];

/// Mass in kilograms. Only feeds the lethality estimate.
pub const MASS_ALIASES: &[&str] = &["mass_kg", "mass"];

/// Impact energy in tons of TNT.
pub const ENERGY_ALIASES: &[&str] = &["impact_energy_tnt"];

/// Aphelion distance in astronomical units.
pub const APHELION_ALIASES: &[&str] = &[
    "orbital_data.aphelion_distance",
    "aphelion_distance",
    "aphelion_au",
];

/// The typed view of an asteroid payload. Every field is independently
/// optional.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Asteroid {
    pub diameter_m: Option<f64>,
    pub mass_kg: Option<f64>,
    pub velocity_km_s: Option<f64>,
    pub aphelion_au: Option<f64>,
    pub impact_energy_tnt: Option<f64>,
}

impl Asteroid {
    pub fn from_value(value: &Value) -> Result<Self, ApiError> {
        if !value.is_object() {
            return Err(ApiError::validation("asteroid must be a JSON object"));
        }
        Ok(Self {
            diameter_m: first_number(value, DIAMETER_ALIASES).or_else(|| {
                DIAMETER_RANGE_ALIASES.iter().find_map(|(min, max)| {
                    let min = number_at(value, min)?;
                    let max = number_at(value, max)?;
                    Some((min + max) / 2.0)
                })
            }),
            mass_kg: first_number(value, MASS_ALIASES),
            velocity_km_s: first_number(value, VELOCITY_ALIASES),
            aphelion_au: first_number(value, APHELION_ALIASES),
            impact_energy_tnt: first_number(value, ENERGY_ALIASES),
        })
    }
}

/// Interprets a JSON value as a finite number, accepting numeric strings.
pub fn as_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    number.is_finite().then_some(number)
}

pub fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(value, |current, segment| match current {
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        Value::Object(map) => map.get(segment),
        _ => None,
    })
}

pub fn number_at(value: &Value, path: &str) -> Option<f64> {
    lookup(value, path).and_then(as_number)
}

fn first_number(value: &Value, aliases: &[&str]) -> Option<f64> {
    aliases.iter().find_map(|path| number_at(value, path))
}
