use crate::asteroid::Asteroid;

/// Joules per ton of TNT. The lethality table is keyed in tons, unlike the
/// megaton figures reported by the physics engine.
pub const JOULES_PER_TON: f64 = 4.184e9;

/// `(minimum energy in tons TNT, lethality)`, checked top to bottom.
pub const LETHALITY_THRESHOLDS: &[(f64, f64)] = &[
    (1e6, 0.99),
    (1e4, 0.9),
    (1e2, 0.75),
    (1.0, 0.5),
];

pub const BASELINE_LETHALITY: f64 = 0.25;

/// Radius at or above which the radius heuristic treats the area as
/// heavily affected.
pub const RADIUS_HEURISTIC_KM: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LethalityBasis {
    Energy { tons_tnt: f64 },
    Radius { radius_km: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lethality {
    pub fraction: f64,
    pub basis: LethalityBasis,
}

impl Lethality {
    /// Picks the energy basis when the descriptor allows it, otherwise the
    /// radius heuristic.
    pub fn estimate(asteroid: Option<&Asteroid>, radius_km: f64) -> Self {
        match asteroid.and_then(energy_tons_tnt) {
            Some(tons_tnt) => Self {
                fraction: lethality_for_energy(tons_tnt),
                basis: LethalityBasis::Energy { tons_tnt },
            },
            None => Self {
                fraction: lethality_for_radius(radius_km),
                basis: LethalityBasis::Radius { radius_km },
            },
        }
    }

    pub fn estimated_kills(&self, population: u64) -> u64 {
        (population as f64 * self.fraction).round() as u64
    }
}

/// Explicit `impact_energy_tnt`, else kinetic energy from the caller's mass
/// and velocity.
pub fn energy_tons_tnt(asteroid: &Asteroid) -> Option<f64> {
    asteroid.impact_energy_tnt.or_else(|| {
        let mass = asteroid.mass_kg?;
        let velocity_m_s = asteroid.velocity_km_s? * 1000.0;
        Some(0.5 * mass * velocity_m_s.powi(2) / JOULES_PER_TON)
    })
}

pub fn lethality_for_energy(tons_tnt: f64) -> f64 {
    LETHALITY_THRESHOLDS
        .iter()
        .find(|(minimum, _)| tons_tnt >= *minimum)
        .map(|(_, fraction)| *fraction)
        .unwrap_or(BASELINE_LETHALITY)
}

pub fn lethality_for_radius(radius_km: f64) -> f64 {
    if radius_km >= RADIUS_HEURISTIC_KM {
        0.9
    } else {
        0.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_table_maps_decades() {
        let cases = [
            (1e-1, 0.25),
            (1.0, 0.5),
            (1e2, 0.75),
            (1e4, 0.9),
            (1e6, 0.99),
        ];
        for (energy, expected) in cases {
            assert_eq!(lethality_for_energy(energy), expected, "energy {energy}");
        }
    }

    #[test]
    fn lethality_is_monotonic_in_energy() {
        let mut previous = 0.0;
        for exponent in -3..10 {
            let fraction = lethality_for_energy(10f64.powi(exponent));
            assert!(fraction >= previous);
            previous = fraction;
        }
    }

    #[test]
    fn explicit_energy_wins_over_mass_and_velocity() {
        let asteroid = Asteroid {
            impact_energy_tnt: Some(50.0),
            mass_kg: Some(1e12),
            velocity_km_s: Some(20.0),
            ..Asteroid::default()
        };
        let lethality = Lethality::estimate(Some(&asteroid), 1.0);
        assert_eq!(lethality.fraction, 0.5);
        assert_eq!(lethality.basis, LethalityBasis::Energy { tons_tnt: 50.0 });
    }

    #[test]
    fn energy_from_mass_uses_ton_divisor() {
        let asteroid = Asteroid {
            mass_kg: Some(1000.0),
            velocity_km_s: Some(2.0),
            ..Asteroid::default()
        };
        // 0.5 * 1000 * 2000^2 = 2e9 J, just under half a ton
        let tons = energy_tons_tnt(&asteroid).unwrap();
        assert!((tons - 2e9 / 4.184e9).abs() < 1e-12);
        assert_eq!(Lethality::estimate(Some(&asteroid), 10.0).fraction, 0.25);
    }

    #[test]
    fn radius_heuristic_without_energy() {
        let diameter_only = Asteroid {
            diameter_m: Some(100.0),
            ..Asteroid::default()
        };
        assert_eq!(Lethality::estimate(Some(&diameter_only), 5.0).fraction, 0.9);
        assert_eq!(Lethality::estimate(Some(&diameter_only), 4.9).fraction, 0.5);
        assert_eq!(Lethality::estimate(None, 5.0).fraction, 0.9);
        assert_eq!(
            Lethality::estimate(None, 2.0).basis,
            LethalityBasis::Radius { radius_km: 2.0 }
        );
    }

    #[test]
    fn kills_are_rounded() {
        let lethality = Lethality {
            fraction: 0.75,
            basis: LethalityBasis::Radius { radius_km: 1.0 },
        };
        assert_eq!(lethality.estimated_kills(500_000), 375_000);
        assert_eq!(lethality.estimated_kills(3), 2);
        assert_eq!(lethality.estimated_kills(0), 0);
    }
}
