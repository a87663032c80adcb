//! The simulate-impact pipeline: request parsing, the population and place
//! branches, physics, lethality and the assembled response.

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

use crate::{
    asteroid::{as_number, Asteroid},
    error::ApiError,
    geometry::{Polygon, DEFAULT_RADIUS_KM},
    lethality::Lethality,
    physics::{ImpactPhysics, PhysicsInputs},
    upstream::{PlaceResolver, PopulationResolver},
};

/// A validated simulate-impact request.
#[derive(Debug, Clone, PartialEq)]
pub struct ImpactRequest {
    pub polygon: Polygon,
    /// Radius of the requested circle, or the default when the caller sent
    /// an explicit polygon. Feeds the lethality radius heuristic.
    pub radius_km: f64,
    pub asteroid: Option<Asteroid>,
}

impl ImpactRequest {
    /// Accepts `{geojson?, location?, asteroid?}`. `geojson` takes precedence
    /// when both area forms are present.
    pub fn from_body(body: &Value) -> Result<Self, ApiError> {
        if !body.is_object() {
            return Err(ApiError::validation("request body must be a JSON object"));
        }
        let asteroid = present(body, "asteroid")
            .map(Asteroid::from_value)
            .transpose()?;

        if let Some(geojson) = present(body, "geojson") {
            return Ok(Self {
                polygon: Polygon::from_geojson(geojson)?,
                radius_km: DEFAULT_RADIUS_KM,
                asteroid,
            });
        }

        let location = present(body, "location").ok_or_else(|| {
            ApiError::validation("either geojson or location {lat, lon, radius_km} is required")
        })?;
        let lat = coordinate(location, "lat", 90.0)?;
        let lon = coordinate(location, "lon", 180.0)?;
        let radius_km = match present(location, "radius_km") {
            None => DEFAULT_RADIUS_KM,
            Some(value) => as_number(value).filter(|r| *r > 0.0).ok_or_else(|| {
                ApiError::validation("location.radius_km must be a positive number")
            })?,
        };

        Ok(Self {
            polygon: Polygon::circle(lat, lon, radius_km),
            radius_km,
            asteroid,
        })
    }
}

fn present<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    value.get(key).filter(|v| !v.is_null())
}

fn coordinate(location: &Value, key: &str, limit: f64) -> Result<f64, ApiError> {
    let value = present(location, key)
        .and_then(as_number)
        .ok_or_else(|| ApiError::validation(format!("location.{key} must be a number")))?;
    if value.abs() > limit {
        return Err(ApiError::validation(format!(
            "location.{key} must lie within ±{limit}"
        )));
    }
    Ok(value)
}

/// The simulate-impact response.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SimulationResult {
    pub place: Option<String>,
    pub population: u64,
    pub estimated_kills: u64,
    pub lethality_used: f64,
    pub crater_radius: f64,
    pub crater_depth_km: f64,
    pub impact_velocity_km_s: f64,
    pub impact_energy_mt: f64,
    pub fireball_radius_km: f64,
    pub shock_wave_km: f64,
    pub overpressure: f64,
    pub wind_speed_kmh: f64,
    pub sismic_magnitude: f64,
}

impl SimulationResult {
    pub fn assemble(
        place: Option<String>,
        population: u64,
        lethality: &Lethality,
        physics: &ImpactPhysics,
    ) -> Self {
        Self {
            place,
            population,
            estimated_kills: lethality.estimated_kills(population),
            lethality_used: lethality.fraction,
            crater_radius: physics.crater_radius_km(),
            crater_depth_km: physics.crater_depth_km,
            impact_velocity_km_s: physics.impact_velocity_km_s,
            impact_energy_mt: physics.energy_megatons,
            fireball_radius_km: physics.fireball_radius_km,
            shock_wave_km: physics.shock_wave_radius_km,
            overpressure: physics.overpressure,
            wind_speed_kmh: physics.wind_speed_kmh,
            sismic_magnitude: physics.seismic_magnitude,
        }
    }

    pub fn physics_fields(&self) -> [f64; 9] {
        [
            self.crater_radius,
            self.crater_depth_km,
            self.impact_velocity_km_s,
            self.impact_energy_mt,
            self.fireball_radius_km,
            self.shock_wave_km,
            self.overpressure,
            self.wind_speed_kmh,
            self.sismic_magnitude,
        ]
    }
}

#[derive(Clone)]
pub struct ImpactSimulator {
    population: PopulationResolver,
    places: PlaceResolver,
    request_timeout: Duration,
}

impl ImpactSimulator {
    pub fn new(
        population: PopulationResolver,
        places: PlaceResolver,
        request_timeout: Duration,
    ) -> Self {
        Self {
            population,
            places,
            request_timeout,
        }
    }

    /// Runs the whole pipeline under the request-level time limit.
    pub async fn simulate(&self, request: ImpactRequest) -> Result<SimulationResult, ApiError> {
        match tokio::time::timeout(self.request_timeout, self.run(request)).await {
            Ok(result) => result,
            Err(_) => Err(ApiError::RequestTimeout {
                limit_secs: self.request_timeout.as_secs(),
            }),
        }
    }

    async fn run(&self, request: ImpactRequest) -> Result<SimulationResult, ApiError> {
        // physics only depends on the request, so reject bad asteroids before
        // spending any outbound calls
        let inputs = PhysicsInputs::resolve(request.asteroid.as_ref())?;
        let physics = ImpactPhysics::compute(&inputs)?;

        let (population, place) = tokio::join!(
            self.population.total_population(&request.polygon),
            self.places.place_name(&request.polygon),
        );
        let population = population?;

        let lethality = Lethality::estimate(request.asteroid.as_ref(), request.radius_km);
        tracing::info!(
            population,
            lethality = lethality.fraction,
            basis = ?lethality.basis,
            energy_mt = physics.energy_megatons,
            place = place.as_deref().unwrap_or("-"),
            "impact simulated"
        );
        Ok(SimulationResult::assemble(
            place, population, &lethality, &physics,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lethality::LethalityBasis;
    use serde_json::json;

    #[test]
    fn location_builds_circle() {
        let request = ImpactRequest::from_body(&json!({
            "location": {"lat": 0, "lon": 0, "radius_km": 5},
            "asteroid": {"diameter": 1000}
        }))
        .unwrap();
        assert_eq!(request.polygon.ring().len(), 65);
        assert_eq!(request.radius_km, 5.0);
        assert_eq!(request.asteroid.unwrap().diameter_m, Some(1000.0));
    }

    #[test]
    fn radius_defaults_to_five_km() {
        let request =
            ImpactRequest::from_body(&json!({"location": {"lat": "12.5", "lon": -3}})).unwrap();
        assert_eq!(request.radius_km, DEFAULT_RADIUS_KM);
        assert!(request.asteroid.is_none());
    }

    #[test]
    fn geojson_wins_over_location() {
        let polygon = Polygon::from_ring(vec![[1.0, 1.0], [2.0, 1.0], [2.0, 2.0]]).unwrap();
        let request = ImpactRequest::from_body(&json!({
            "geojson": polygon.to_feature_collection(),
            "location": {"lat": 50, "lon": 50}
        }))
        .unwrap();
        assert_eq!(request.polygon.ring().len(), 4);
    }

    #[test]
    fn missing_area_is_rejected() {
        for body in [
            json!({}),
            json!({"asteroid": {"diameter": 10}}),
            json!({"geojson": null, "location": null}),
        ] {
            assert!(matches!(
                ImpactRequest::from_body(&body),
                Err(ApiError::Validation(_))
            ));
        }
    }

    #[test]
    fn bad_location_values_are_rejected() {
        for location in [
            json!({"lat": "north", "lon": 0}),
            json!({"lon": 0}),
            json!({"lat": 91, "lon": 0}),
            json!({"lat": 0, "lon": 0, "radius_km": -1}),
            json!({"lat": 0, "lon": 0, "radius_km": "wide"}),
        ] {
            assert!(
                ImpactRequest::from_body(&json!({ "location": location })).is_err(),
                "{location}"
            );
        }
        assert!(ImpactRequest::from_body(&json!([1, 2])).is_err());
    }

    #[test]
    fn assembled_result_has_finite_physics() {
        let physics = ImpactPhysics::compute(&PhysicsInputs {
            diameter_m: 1000.0,
            aphelion_au: 1.5,
            velocity_km_s: Some(20.0),
        })
        .unwrap();
        let lethality = Lethality {
            fraction: 0.9,
            basis: LethalityBasis::Radius { radius_km: 5.0 },
        };
        let result = SimulationResult::assemble(None, 500_000, &lethality, &physics);
        assert!(result.physics_fields().iter().all(|f| f.is_finite()));
        assert_eq!(result.estimated_kills, 450_000);
        assert!(result.crater_radius > 0.0);

        let json = serde_json::to_value(&result).unwrap();
        assert!(json["place"].is_null());
        for key in [
            "crater_radius",
            "impact_velocity_km_s",
            "impact_energy_mt",
            "fireball_radius_km",
            "shock_wave_km",
            "wind_speed_kmh",
            "sismic_magnitude",
        ] {
            assert!(json[key].is_f64(), "{key}");
        }
    }
}
