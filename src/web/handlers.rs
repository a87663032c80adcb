use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{
    error::ApiError,
    simulation::{ImpactRequest, SimulationResult},
    upstream::{FeedEntry, NeoSummary},
};

use super::AppState;

/// The NASA feed refuses wider ranges.
pub const MAX_FEED_SPAN_DAYS: i64 = 7;

pub async fn health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

pub async fn simulate_impact(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<SimulationResult>, ApiError> {
    let Json(body) =
        payload.map_err(|rejection| ApiError::validation(rejection.body_text()))?;
    let request = ImpactRequest::from_body(&body)?;
    let result = state.simulator.simulate(request).await?;
    Ok(Json(result))
}

#[derive(Debug, Default, Deserialize)]
pub struct FeedQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FeedResponseBody {
    pub asteroids: Vec<FeedEntry>,
}

pub async fn feed(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FeedQuery>,
) -> Result<Json<FeedResponseBody>, ApiError> {
    let today = Utc::now().date_naive();
    let (start, end) = resolve_feed_range(&query, today)?;
    let feed = state.nasa.feed(start, end).await?;
    let asteroids = feed.entries();
    tracing::debug!(%start, %end, count = asteroids.len(), "NEO feed proxied");
    Ok(Json(FeedResponseBody { asteroids }))
}

pub async fn get_by_id(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<NeoSummary>, ApiError> {
    if id.is_empty() || !id.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ApiError::validation("asteroid id must be alphanumeric"));
    }
    let neo = state.nasa.lookup(&id).await?;
    Ok(Json(neo.summary()))
}

/// Validates the feed window. Missing `start_date` means today; missing
/// `end_date` means `start_date`.
pub fn resolve_feed_range(
    query: &FeedQuery,
    today: NaiveDate,
) -> Result<(NaiveDate, NaiveDate), ApiError> {
    let start = match non_empty(&query.start_date) {
        Some(raw) => parse_date(raw)?,
        None => today,
    };
    let end = match non_empty(&query.end_date) {
        Some(raw) => parse_date(raw)?,
        None => start,
    };

    if start > today || end > today {
        return Err(ApiError::validation(format!(
            "Dates cannot be in the future. Max allowed: {}",
            today.format("%Y-%m-%d")
        )));
    }
    if end < start {
        return Err(ApiError::validation("end_date cannot be before start_date."));
    }
    if (end - start).num_days() > MAX_FEED_SPAN_DAYS {
        return Err(ApiError::validation(format!(
            "Date range cannot exceed {MAX_FEED_SPAN_DAYS} days."
        )));
    }
    Ok((start, end))
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn parse_date(raw: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| ApiError::validation("Invalid date format. Use YYYY-MM-DD."))
}
