//! Spherical geometry helpers: circle polygons, centroids, GeoJSON envelopes.

use serde_json::{json, Value};

use crate::error::ApiError;

/// Mean Earth radius in kilometres (IUGG).
pub const EARTH_RADIUS_KM: f64 = 6371.0088;

/// Bearing steps used when approximating a circle; the ring gets one extra
/// closing vertex.
pub const CIRCLE_STEPS: usize = 64;

pub const DEFAULT_RADIUS_KM: f64 = 5.0;

/// A `(longitude, latitude)` pair in degrees, GeoJSON axis order.
pub type Position = [f64; 2];

/// A single closed ring. First and last positions are identical.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    ring: Vec<Position>,
}

impl Polygon {
    /// Builds a polygon from an explicit ring, closing it if the caller left
    /// it open.
    pub fn from_ring(mut ring: Vec<Position>) -> Result<Self, ApiError> {
        if ring
            .iter()
            .any(|[lon, lat]| !lon.is_finite() || !lat.is_finite())
        {
            return Err(ApiError::validation(
                "polygon coordinates must be finite numbers",
            ));
        }
        if ring.first() != ring.last() {
            if let Some(first) = ring.first().copied() {
                ring.push(first);
            }
        }
        // three distinct vertices plus the closing one
        if ring.len() < 4 {
            return Err(ApiError::validation(
                "polygon ring needs at least three distinct positions",
            ));
        }
        Ok(Self { ring })
    }

    /// Approximates a circle of `radius_km` around `(lat, lon)` by walking the
    /// great-circle destination formula through evenly spaced bearings.
    pub fn circle(lat: f64, lon: f64, radius_km: f64) -> Self {
        let mut ring = Vec::with_capacity(CIRCLE_STEPS + 1);
        for i in 0..CIRCLE_STEPS {
            let bearing = i as f64 * 360.0 / CIRCLE_STEPS as f64;
            ring.push(destination_point(lat, lon, bearing, radius_km));
        }
        // bearing 360 lands on bearing 0 only up to rounding; reuse it verbatim
        ring.push(ring[0]);
        Self { ring }
    }

    pub fn ring(&self) -> &[Position] {
        &self.ring
    }

    /// Arithmetic mean of the ring vertices as `(lat, lon)`. Not area-weighted.
    pub fn centroid(&self) -> (f64, f64) {
        let n = self.ring.len() as f64;
        let (lon_sum, lat_sum) = self
            .ring
            .iter()
            .fold((0.0_f64, 0.0_f64), |(lon_acc, lat_acc), [lon, lat]| {
                (lon_acc + lon, lat_acc + lat)
            });
        (lat_sum / n, lon_sum / n)
    }

    pub fn to_geometry(&self) -> Value {
        json!({
            "type": "Polygon",
            "coordinates": [self.ring],
        })
    }

    /// Wraps the polygon as a single-feature FeatureCollection.
    pub fn to_feature_collection(&self) -> Value {
        json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": {},
                "geometry": self.to_geometry(),
            }],
        })
    }

    /// Reads the outer ring of the first polygon in a GeoJSON document.
    /// Accepts a FeatureCollection, a Feature or a bare Polygon geometry.
    pub fn from_geojson(value: &Value) -> Result<Self, ApiError> {
        let geometry = match value.get("type").and_then(Value::as_str) {
            Some("FeatureCollection") => value
                .get("features")
                .and_then(Value::as_array)
                .and_then(|features| features.first())
                .and_then(|feature| feature.get("geometry"))
                .ok_or_else(|| {
                    ApiError::validation("geojson FeatureCollection has no feature geometry")
                })?,
            Some("Feature") => value
                .get("geometry")
                .ok_or_else(|| ApiError::validation("geojson Feature has no geometry"))?,
            Some("Polygon") => value,
            _ => {
                return Err(ApiError::validation(
                    "geojson must be a FeatureCollection of Polygon features",
                ))
            }
        };

        if geometry.get("type").and_then(Value::as_str) != Some("Polygon") {
            return Err(ApiError::validation("geojson geometry must be a Polygon"));
        }

        let outer = geometry
            .get("coordinates")
            .and_then(Value::as_array)
            .and_then(|rings| rings.first())
            .and_then(Value::as_array)
            .ok_or_else(|| ApiError::validation("geojson Polygon has no coordinates"))?;

        let ring = outer
            .iter()
            .map(|position| {
                let pair = position.as_array().filter(|p| p.len() >= 2);
                match pair.map(|p| (p[0].as_f64(), p[1].as_f64())) {
                    Some((Some(lon), Some(lat))) => Ok([lon, lat]),
                    _ => Err(ApiError::validation(
                        "geojson positions must be [longitude, latitude] numbers",
                    )),
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::from_ring(ring)
    }
}

/// Direct geodesic on the sphere: the point `distance_km` away from
/// `(lat, lon)` along `bearing_deg`. Returns `[lon, lat]` in degrees.
pub fn destination_point(lat: f64, lon: f64, bearing_deg: f64, distance_km: f64) -> Position {
    let lat1 = lat.to_radians();
    let lon1 = lon.to_radians();
    let bearing = bearing_deg.to_radians();
    let d = distance_km / EARTH_RADIUS_KM;

    let lat2 = (lat1.sin() * d.cos() + lat1.cos() * d.sin() * bearing.cos()).asin();
    let lon2 = lon1
        + (bearing.sin() * d.sin() * lat1.cos()).atan2(d.cos() - lat1.sin() * lat2.sin());

    [lon2.to_degrees(), lat2.to_degrees()]
}

/// Great-circle distance in kilometres between two `(lat, lon)` points.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().atan2((1.0 - a).sqrt())
}
