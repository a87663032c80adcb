//! Impact physics: velocity, energy, crater and effect radii.
//!
//! The scaling laws below are empirical and reproduced coefficient for
//! coefficient; do not fold or simplify them.

use std::f64::consts::PI;

use crate::{asteroid::Asteroid, error::ApiError};

/// Gravitational constant (m³/(kg·s²)).
pub const G: f64 = 6.67430e-11;

/// Solar mass (kg).
pub const SUN_MASS_KG: f64 = 1.9885e30;

/// Astronomical unit (m).
pub const AU_M: f64 = 149_597_870_700.0;

/// Assumed bulk density of the impactor (kg/m³).
pub const IMPACTOR_DENSITY: f64 = 2500.0;

/// Joules per megaton of TNT.
pub const JOULES_PER_MEGATON: f64 = 4.184e15;

/// Used when neither an explicit nor a derived velocity is usable.
pub const DEFAULT_VELOCITY_KM_S: f64 = 20.0;

/// Accepted impactor diameters (m). Outside this range the energy figures
/// underflow to zero or overflow to infinity.
pub const MIN_DIAMETER_M: f64 = 1e-3;
pub const MAX_DIAMETER_M: f64 = 1e6;

/// Accepted explicit impact velocities (km/s).
pub const MIN_VELOCITY_KM_S: f64 = 1e-3;
pub const MAX_VELOCITY_KM_S: f64 = 1000.0;

/// Inputs the engine needs, validated up front so a bad asteroid is rejected
/// before any outbound call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicsInputs {
    pub diameter_m: f64,
    pub aphelion_au: f64,
    pub velocity_km_s: Option<f64>,
}

impl PhysicsInputs {
    pub fn resolve(asteroid: Option<&Asteroid>) -> Result<Self, ApiError> {
        let asteroid = asteroid.ok_or_else(|| {
            ApiError::validation(
                "asteroid is required: impact physics needs orbital_data.aphelion_distance and a diameter",
            )
        })?;
        let aphelion_au = asteroid
            .aphelion_au
            .filter(|au| *au > 0.0)
            .ok_or_else(|| {
                ApiError::validation(
                    "asteroid.orbital_data.aphelion_distance must be a positive number (AU)",
                )
            })?;
        let diameter_m = asteroid
            .diameter_m
            .filter(|d| *d > 0.0)
            .ok_or_else(|| {
                ApiError::validation(
                    "asteroid diameter could not be resolved from diameter fields or estimated_diameter",
                )
            })?;
        if !(MIN_DIAMETER_M..=MAX_DIAMETER_M).contains(&diameter_m) {
            return Err(ApiError::validation(format!(
                "asteroid diameter must be between {MIN_DIAMETER_M} and {MAX_DIAMETER_M} m, got {diameter_m}"
            )));
        }
        let velocity_km_s = asteroid.velocity_km_s.filter(|v| *v > 0.0);
        if let Some(v) = velocity_km_s {
            if !(MIN_VELOCITY_KM_S..=MAX_VELOCITY_KM_S).contains(&v) {
                return Err(ApiError::validation(format!(
                    "asteroid velocity must be between {MIN_VELOCITY_KM_S} and {MAX_VELOCITY_KM_S} km/s, got {v}"
                )));
            }
        }
        Ok(Self {
            diameter_m,
            aphelion_au,
            velocity_km_s,
        })
    }
}

/// Derived figures for one impact. Immutable once computed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImpactPhysics {
    pub max_impact_velocity_m_s: f64,
    pub impact_velocity_m_s: f64,
    pub impact_velocity_km_s: f64,
    pub mass_kg: f64,
    pub energy_joules: f64,
    pub energy_megatons: f64,
    pub crater_diameter_km: f64,
    pub crater_depth_km: f64,
    pub fireball_radius_km: f64,
    pub shock_wave_radius_km: f64,
    pub overpressure: f64,
    pub wind_speed_kmh: f64,
    pub seismic_energy_joules: f64,
    pub seismic_magnitude: f64,
}

impl ImpactPhysics {
    /// Fails when the inputs drive any reported figure to NaN or infinity.
    pub fn compute(inputs: &PhysicsInputs) -> Result<Self, ApiError> {
        let max_impact_velocity_m_s = max_impact_velocity(inputs.aphelion_au);
        let velocity_km_s = inputs
            .velocity_km_s
            .or_else(|| {
                let derived = max_impact_velocity_m_s / 1000.0;
                (derived.is_finite() && derived > 0.0).then_some(derived)
            })
            .unwrap_or(DEFAULT_VELOCITY_KM_S);
        let impact_velocity_m_s = velocity_km_s * 1000.0;

        let radius_m = inputs.diameter_m / 2.0;
        let volume_m3 = 4.0 / 3.0 * PI * radius_m.powi(3);
        let mass_kg = IMPACTOR_DENSITY * volume_m3;

        let energy_joules = 0.5 * mass_kg * impact_velocity_m_s.powi(2);
        let energy_megatons = energy_joules / JOULES_PER_MEGATON;
        let cube_root = energy_megatons.powf(1.0 / 3.0);

        let crater_diameter_km = 0.765 * energy_megatons.powf(1.0 / 3.4) * 10.0;
        let crater_depth_km = 0.4 * crater_diameter_km.powf(0.3);
        let fireball_radius_km = 60.0 * cube_root;
        let shock_wave_radius_km = 3.0 * cube_root;

        // measured 20 crater radii out
        let crater_radius_km = crater_diameter_km / 2.0;
        let overpressure = 15.0 * cube_root / (20.0 * crater_radius_km);
        let wind_speed_kmh = 1055.0 * overpressure / (103.0 + 7.0 * overpressure).sqrt();

        let seismic_energy_joules = 0.0001 * energy_joules;
        let seismic_magnitude = 1.5 * (seismic_energy_joules.log10() - 4.8);

        let physics = Self {
            max_impact_velocity_m_s,
            impact_velocity_m_s,
            impact_velocity_km_s: velocity_km_s,
            mass_kg,
            energy_joules,
            energy_megatons,
            crater_diameter_km,
            crater_depth_km,
            fireball_radius_km,
            shock_wave_radius_km,
            overpressure,
            wind_speed_kmh,
            seismic_energy_joules,
            seismic_magnitude,
        };
        if physics.reported_figures().iter().all(|f| f.is_finite()) {
            Ok(physics)
        } else {
            Err(ApiError::validation(
                "asteroid parameters produce non-finite impact figures",
            ))
        }
    }

    /// The nine figures that end up in the simulate-impact response.
    pub fn reported_figures(&self) -> [f64; 9] {
        [
            self.crater_radius_km(),
            self.crater_depth_km,
            self.impact_velocity_km_s,
            self.energy_megatons,
            self.fireball_radius_km,
            self.shock_wave_radius_km,
            self.overpressure,
            self.wind_speed_kmh,
            self.seismic_magnitude,
        ]
    }

    pub fn crater_radius_km(&self) -> f64 {
        self.crater_diameter_km / 2.0
    }
}

/// Escape-velocity style upper bound on impact speed for a body whose orbit
/// reaches `aphelion_au` (m/s). A theoretical bound, not a measurement.
pub fn max_impact_velocity(aphelion_au: f64) -> f64 {
    let aphelion_m = aphelion_au * AU_M;
    (2.0 * G * SUN_MASS_KG / aphelion_m).sqrt()
}
