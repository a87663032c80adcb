use reqwest::Client;
use serde_json::Value;

use crate::{asteroid::as_number, config::PopulationConfig, error::ApiError, geometry::Polygon};

use super::fetch_json;

const SERVICE: &str = "population statistics";

/// What a stats or task-status response tells us.
#[derive(Debug, Clone, PartialEq)]
pub enum StatsReply {
    Ready(u64),
    Pending { task_id: String },
}

/// Total population inside a polygon, via the statistics service. Handles
/// both the synchronous answer and the task-then-poll mode.
#[derive(Clone)]
pub struct PopulationResolver {
    http: Client,
    config: PopulationConfig,
}

impl PopulationResolver {
    pub fn new(http: Client, config: PopulationConfig) -> Self {
        Self { http, config }
    }

    pub async fn total_population(&self, polygon: &Polygon) -> Result<u64, ApiError> {
        let geojson = polygon.to_feature_collection().to_string();
        let year = self.config.year.to_string();
        let mut query: Vec<(&str, &str)> = vec![
            ("dataset", self.config.dataset.as_str()),
            ("year", year.as_str()),
            ("geojson", geojson.as_str()),
            ("runasync", "false"),
        ];
        if let Some(key) = self.config.api_key.as_deref() {
            query.push(("key", key));
        }

        let request = self
            .http
            .get(format!("{}/services/stats", base(&self.config.base_url)))
            .query(&query)
            .timeout(self.config.timeout());
        let body = fetch_json(SERVICE, request).await?;

        match interpret_stats(&body)? {
            StatsReply::Ready(population) => {
                tracing::debug!(population, "population resolved synchronously");
                Ok(population)
            }
            StatsReply::Pending { task_id } => {
                tracing::debug!(%task_id, "population task created, polling");
                self.poll_task(&task_id).await
            }
        }
    }

    /// Polls the task endpoint at a fixed interval. Dropping the returned
    /// future cancels both the sleep and any in-flight request.
    async fn poll_task(&self, task_id: &str) -> Result<u64, ApiError> {
        let url = format!("{}/tasks/{}", base(&self.config.base_url), task_id);
        for attempt in 1..=self.config.max_poll_attempts {
            tokio::time::sleep(self.config.poll_interval()).await;
            let request = self.http.get(&url).timeout(self.config.poll_timeout());
            let body = fetch_json(SERVICE, request).await?;
            if let Some(population) = interpret_task(&body)? {
                tracing::debug!(attempt, population, "population task finished");
                return Ok(population);
            }
            tracing::trace!(attempt, status = ?body.get("status"), "population task pending");
        }
        Err(ApiError::UpstreamTimeout {
            service: SERVICE,
            details: format!(
                "task {task_id} not finished after {} polls",
                self.config.max_poll_attempts
            ),
        })
    }
}

fn base(url: &str) -> &str {
    url.trim_end_matches('/')
}

/// Reads the reply to the initial stats call.
pub fn interpret_stats(body: &Value) -> Result<StatsReply, ApiError> {
    check_error_flag(body)?;
    if let Some(population) = body.pointer("/data/total_population") {
        return population_value(population).map(StatsReply::Ready);
    }
    let status = body.get("status").and_then(Value::as_str);
    let task_id = body.get("taskid").and_then(|id| match id {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    });
    match (status, task_id) {
        (Some("finished"), _) => Err(missing_population()),
        (_, Some(task_id)) => Ok(StatsReply::Pending { task_id }),
        _ => Err(ApiError::DataExtraction {
            service: SERVICE,
            details: "response has neither total_population nor a task id".into(),
        }),
    }
}

/// Reads a task-status reply: `Some` once finished, `None` while pending.
pub fn interpret_task(body: &Value) -> Result<Option<u64>, ApiError> {
    check_error_flag(body)?;
    if body.get("status").and_then(Value::as_str) != Some("finished") {
        return Ok(None);
    }
    body.pointer("/data/total_population")
        .ok_or_else(missing_population)
        .and_then(population_value)
        .map(Some)
}

fn check_error_flag(body: &Value) -> Result<(), ApiError> {
    if body.get("error").and_then(Value::as_bool) == Some(true) {
        let message = body
            .get("error_message")
            .and_then(Value::as_str)
            .unwrap_or("service reported an error");
        return Err(ApiError::Upstream {
            service: SERVICE,
            details: message.to_string(),
        });
    }
    Ok(())
}

fn population_value(value: &Value) -> Result<u64, ApiError> {
    as_number(value)
        .filter(|population| *population >= 0.0)
        .map(|population| population.round() as u64)
        .ok_or_else(|| ApiError::DataExtraction {
            service: SERVICE,
            details: format!("total_population is not a usable number: {value}"),
        })
}

fn missing_population() -> ApiError {
    ApiError::DataExtraction {
        service: SERVICE,
        details: "finished response has no data.total_population".into(),
    }
}
