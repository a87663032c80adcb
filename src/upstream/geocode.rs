use reqwest::{header::USER_AGENT, Client};
use serde_json::Value;

use crate::{config::GeocodingConfig, error::ApiError, geometry::Polygon};

use super::fetch_json;

const SERVICE: &str = "reverse geocoder";

/// Best-effort place naming for an impact area. Never fails the request.
#[derive(Clone)]
pub struct PlaceResolver {
    http: Client,
    config: GeocodingConfig,
}

impl PlaceResolver {
    pub fn new(http: Client, config: GeocodingConfig) -> Self {
        Self { http, config }
    }

    /// Names the place at the polygon's vertex-mean centroid. Every failure
    /// is logged and collapses to `None`.
    pub async fn place_name(&self, polygon: &Polygon) -> Option<String> {
        let (lat, lon) = polygon.centroid();
        match self.reverse(lat, lon).await {
            Ok(place) => place,
            Err(err) => {
                tracing::warn!(lat, lon, error = %err, details = ?err.details(), "place lookup failed");
                None
            }
        }
    }

    async fn reverse(&self, lat: f64, lon: f64) -> Result<Option<String>, ApiError> {
        let request = self
            .http
            .get(format!(
                "{}/reverse",
                self.config.base_url.trim_end_matches('/')
            ))
            .query(&[
                ("format", "jsonv2".to_string()),
                ("lat", lat.to_string()),
                ("lon", lon.to_string()),
            ])
            .header(USER_AGENT, &self.config.user_agent)
            .timeout(self.config.timeout());
        let body = fetch_json(SERVICE, request).await?;
        Ok(display_name(&body))
    }
}

pub fn display_name(body: &Value) -> Option<String> {
    body.get("display_name")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}
