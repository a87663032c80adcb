//! Outbound HTTP collaborators. All of them share one pooled
//! [`reqwest::Client`]; timeouts are set per call.

mod geocode;
mod nasa;
mod population;

pub use geocode::PlaceResolver;
pub use nasa::{FeedEntry, FeedResponse, NasaClient, NearEarthObject, NeoSummary, OrbitalData};
pub use population::{PopulationResolver, StatsReply};

use std::time::Duration;

use reqwest::{RequestBuilder, Response};
use serde_json::Value;

use crate::error::ApiError;

pub fn build_http_client() -> anyhow::Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(5))
        .pool_idle_timeout(Duration::from_secs(90))
        .build()?;
    Ok(client)
}

pub(crate) fn transport_error(service: &'static str, err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        ApiError::UpstreamTimeout {
            service,
            details: err.to_string(),
        }
    } else {
        ApiError::Upstream {
            service,
            details: err.to_string(),
        }
    }
}

pub(crate) async fn send(
    service: &'static str,
    request: RequestBuilder,
) -> Result<Response, ApiError> {
    request
        .send()
        .await
        .map_err(|err| transport_error(service, err))
}

/// Non-2xx statuses and invalid JSON both count as upstream failures.
pub(crate) async fn decode_json(
    service: &'static str,
    response: Response,
) -> Result<Value, ApiError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ApiError::Upstream {
            service,
            details: format!("HTTP {}: {}", status.as_u16(), truncate(&body, 200)),
        });
    }
    response.json::<Value>().await.map_err(|err| {
        if err.is_timeout() {
            transport_error(service, err)
        } else {
            ApiError::Upstream {
                service,
                details: format!("invalid JSON: {err}"),
            }
        }
    })
}

pub(crate) async fn fetch_json(
    service: &'static str,
    request: RequestBuilder,
) -> Result<Value, ApiError> {
    let response = send(service, request).await?;
    decode_json(service, response).await
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::truncate;

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("abcdef", 3), "abc");
        assert_eq!(truncate("ab", 3), "ab");
        assert_eq!(truncate("ééé", 2), "éé");
    }
}
