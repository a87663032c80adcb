use std::collections::BTreeMap;

use chrono::NaiveDate;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::{asteroid::as_number, config::NasaConfig, error::ApiError, physics};

use super::{decode_json, fetch_json, send};

const SERVICE: &str = "NASA NEO";

/// NASA encodes most figures as strings; accept either form.
fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(as_number))
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedResponse {
    #[serde(default)]
    pub near_earth_objects: BTreeMap<String, Vec<NearEarthObject>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NearEarthObject {
    pub id: String,
    pub name: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub absolute_magnitude_h: Option<f64>,
    #[serde(default)]
    pub is_potentially_hazardous_asteroid: bool,
    #[serde(default)]
    pub estimated_diameter: Option<EstimatedDiameter>,
    #[serde(default)]
    pub close_approach_data: Vec<CloseApproach>,
    #[serde(default)]
    pub orbital_data: Option<OrbitalData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EstimatedDiameter {
    pub meters: Option<DiameterRange>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiameterRange {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub estimated_diameter_min: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub estimated_diameter_max: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CloseApproach {
    #[serde(default)]
    pub close_approach_date: Option<String>,
    #[serde(default)]
    pub relative_velocity: Option<RelativeVelocity>,
    #[serde(default)]
    pub miss_distance: Option<MissDistance>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RelativeVelocity {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub kilometers_per_second: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MissDistance {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub kilometers: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct OrbitalData {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub aphelion_distance: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub perihelion_distance: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub semi_major_axis: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub eccentricity: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub inclination: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub orbital_period: Option<f64>,
}

/// One row of the `/asteroid/feed` listing.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FeedEntry {
    pub id: String,
    pub name: String,
    /// Miss distance of the first listed close approach, in km.
    pub distance: Option<f64>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MetersRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DiameterSummary {
    pub meters: MetersRange,
}

/// The `/asteroid/get_by_id` payload. Its field names line up with the
/// asteroid aliases accepted by simulate-impact, so it can be posted back
/// unchanged.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NeoSummary {
    pub id: String,
    pub name: String,
    pub absolute_magnitude_h: Option<f64>,
    pub is_potentially_hazardous: bool,
    pub diameter: Option<f64>,
    pub estimated_diameter: DiameterSummary,
    pub relative_velocity_km_s: Option<f64>,
    pub miss_distance_km: Option<f64>,
    pub close_approach_date: Option<String>,
    pub orbital_data: OrbitalData,
    pub max_impact_velocity_km_s: Option<f64>,
}

impl NearEarthObject {
    fn first_approach(&self) -> Option<&CloseApproach> {
        self.close_approach_data.first()
    }

    pub fn miss_distance_km(&self) -> Option<f64> {
        self.first_approach()
            .and_then(|approach| approach.miss_distance.as_ref())
            .and_then(|miss| miss.kilometers)
    }

    pub fn feed_entry(&self) -> FeedEntry {
        FeedEntry {
            id: self.id.clone(),
            name: self.name.clone(),
            distance: self.miss_distance_km(),
        }
    }

    pub fn summary(&self) -> NeoSummary {
        let range = self
            .estimated_diameter
            .as_ref()
            .and_then(|diameter| diameter.meters.as_ref());
        let min = range.and_then(|r| r.estimated_diameter_min);
        let max = range.and_then(|r| r.estimated_diameter_max);
        let diameter = match (min, max) {
            (Some(min), Some(max)) => Some((min + max) / 2.0),
            (single, None) | (None, single) => single,
        };
        let approach = self.first_approach();
        let orbital_data = self.orbital_data.clone().unwrap_or_default();
        let max_impact_velocity_km_s = orbital_data
            .aphelion_distance
            .filter(|au| *au > 0.0)
            .map(|au| physics::max_impact_velocity(au) / 1000.0);

        NeoSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            absolute_magnitude_h: self.absolute_magnitude_h,
            is_potentially_hazardous: self.is_potentially_hazardous_asteroid,
            diameter,
            estimated_diameter: DiameterSummary {
                meters: MetersRange { min, max },
            },
            relative_velocity_km_s: approach
                .and_then(|a| a.relative_velocity.as_ref())
                .and_then(|v| v.kilometers_per_second),
            miss_distance_km: self.miss_distance_km(),
            close_approach_date: approach.and_then(|a| a.close_approach_date.clone()),
            orbital_data,
            max_impact_velocity_km_s,
        }
    }
}

impl FeedResponse {
    /// Flattens the per-date buckets in date order.
    pub fn entries(&self) -> Vec<FeedEntry> {
        self.near_earth_objects
            .values()
            .flatten()
            .map(NearEarthObject::feed_entry)
            .collect()
    }
}

fn parse_body<T: for<'de> Deserialize<'de>>(body: Value) -> Result<T, ApiError> {
    serde_json::from_value(body).map_err(|err| ApiError::DataExtraction {
        service: SERVICE,
        details: err.to_string(),
    })
}

#[derive(Clone)]
pub struct NasaClient {
    http: Client,
    config: NasaConfig,
}

impl NasaClient {
    pub fn new(http: Client, config: NasaConfig) -> Self {
        Self { http, config }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    pub async fn feed(&self, start: NaiveDate, end: NaiveDate) -> Result<FeedResponse, ApiError> {
        let request = self
            .http
            .get(self.url("feed"))
            .query(&[
                ("start_date", start.format("%Y-%m-%d").to_string()),
                ("end_date", end.format("%Y-%m-%d").to_string()),
                ("api_key", self.config.api_key().to_string()),
            ])
            .timeout(self.config.timeout());
        let body = fetch_json(SERVICE, request).await?;
        parse_body(body)
    }

    pub async fn lookup(&self, id: &str) -> Result<NearEarthObject, ApiError> {
        let request = self
            .http
            .get(self.url(&format!("neo/{id}")))
            .query(&[("api_key", self.config.api_key())])
            .timeout(self.config.timeout());
        let response = send(SERVICE, request).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound(format!("no near-earth object with id {id}")));
        }
        let body = decode_json(SERVICE, response).await?;
        parse_body(body)
    }
}
