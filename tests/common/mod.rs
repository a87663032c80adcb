#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use neo_impact::{web, ServiceConfig};
use serde_json::{json, Value};
use tokio::net::TcpListener;

/// How the fake statistics service answers.
#[derive(Clone, Copy, Debug)]
pub enum StatsMode {
    Sync(u64),
    FinishesAfter { polls: usize, population: u64 },
    NeverFinishes,
    Fails,
    Slow(Duration),
}

#[derive(Clone, Copy, Debug)]
pub enum GeocodeMode {
    Named(&'static str),
    Fails,
}

/// Call counters and captured queries, shared with the fake handlers.
#[derive(Default)]
pub struct Recorder {
    pub stats_calls: AtomicUsize,
    pub poll_calls: AtomicUsize,
    pub geocode_calls: AtomicUsize,
    pub nasa_calls: AtomicUsize,
    pub last_stats_query: Mutex<HashMap<String, String>>,
    pub last_geocode_query: Mutex<HashMap<String, String>>,
    pub last_nasa_query: Mutex<HashMap<String, String>>,
    pub last_user_agent: Mutex<Option<String>>,
}

impl Recorder {
    pub fn stats_calls(&self) -> usize {
        self.stats_calls.load(Ordering::SeqCst)
    }

    pub fn poll_calls(&self) -> usize {
        self.poll_calls.load(Ordering::SeqCst)
    }

    pub fn geocode_calls(&self) -> usize {
        self.geocode_calls.load(Ordering::SeqCst)
    }
}

#[derive(Clone)]
struct FakeState {
    stats: StatsMode,
    geocode: GeocodeMode,
    recorder: Arc<Recorder>,
}

/// A single fake host serving the statistics, geocoding and NASA routes.
pub struct FakeUpstream {
    pub base_url: String,
    pub recorder: Arc<Recorder>,
}

impl FakeUpstream {
    pub async fn start(stats: StatsMode, geocode: GeocodeMode) -> Self {
        let recorder = Arc::new(Recorder::default());
        let state = FakeState {
            stats,
            geocode,
            recorder: recorder.clone(),
        };
        let router = Router::new()
            .route("/services/stats", get(stats_handler))
            .route("/tasks/:task_id", get(task_handler))
            .route("/reverse", get(reverse_handler))
            .route("/feed", get(feed_handler))
            .route("/neo/:id", get(neo_handler))
            .with_state(state);
        let base_url = serve(router).await;
        Self { base_url, recorder }
    }

    /// Service config pointing every collaborator at this fake, with fast
    /// polling.
    pub fn config(&self) -> ServiceConfig {
        let mut config = ServiceConfig::default();
        config.population.base_url = self.base_url.clone();
        config.population.poll_interval_ms = 5;
        config.geocoding.base_url = self.base_url.clone();
        config.nasa.base_url = self.base_url.clone();
        config.nasa.api_key = Some("test-key".into());
        config
    }
}

pub async fn serve(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

/// Starts the real service on an ephemeral port and returns its base URL.
pub async fn spawn_service(config: ServiceConfig) -> String {
    let state = web::AppState::from_config(&config).unwrap();
    serve(web::router(state)).await
}

async fn stats_handler(
    State(state): State<FakeState>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    state.recorder.stats_calls.fetch_add(1, Ordering::SeqCst);
    *state.recorder.last_stats_query.lock().unwrap() = query;
    match state.stats {
        StatsMode::Sync(population) => Json(json!({
            "status": "finished",
            "error": false,
            "data": {"total_population": population}
        }))
        .into_response(),
        StatsMode::FinishesAfter { .. } | StatsMode::NeverFinishes => Json(json!({
            "status": "created",
            "error": false,
            "taskid": "task-42"
        }))
        .into_response(),
        StatsMode::Fails => (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response(),
        StatsMode::Slow(delay) => {
            tokio::time::sleep(delay).await;
            Json(json!({"status": "finished", "data": {"total_population": 1}})).into_response()
        }
    }
}

async fn task_handler(State(state): State<FakeState>, Path(task_id): Path<String>) -> Json<Value> {
    let polls = state.recorder.poll_calls.fetch_add(1, Ordering::SeqCst) + 1;
    assert_eq!(task_id, "task-42");
    match state.stats {
        StatsMode::FinishesAfter { polls: needed, population } if polls >= needed => {
            Json(json!({
                "status": "finished",
                "error": false,
                "data": {"total_population": population}
            }))
        }
        _ => Json(json!({"status": "started", "error": false})),
    }
}

async fn reverse_handler(
    State(state): State<FakeState>,
    headers: axum::http::HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    state.recorder.geocode_calls.fetch_add(1, Ordering::SeqCst);
    *state.recorder.last_geocode_query.lock().unwrap() = query;
    *state.recorder.last_user_agent.lock().unwrap() = headers
        .get(axum::http::header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(String::from);
    match state.geocode {
        GeocodeMode::Named(name) => Json(json!({"display_name": name})).into_response(),
        GeocodeMode::Fails => (StatusCode::SERVICE_UNAVAILABLE, "down").into_response(),
    }
}

async fn feed_handler(
    State(state): State<FakeState>,
    Query(query): Query<HashMap<String, String>>,
) -> Json<Value> {
    state.recorder.nasa_calls.fetch_add(1, Ordering::SeqCst);
    let start = query.get("start_date").cloned().unwrap_or_default();
    *state.recorder.last_nasa_query.lock().unwrap() = query;
    Json(json!({
        "element_count": 2,
        "near_earth_objects": {
            start: [
                {
                    "id": "3542519",
                    "name": "(2010 PK9)",
                    "close_approach_data": [{"miss_distance": {"kilometers": "41325498.2"}}]
                },
                {
                    "id": "3726710",
                    "name": "(2015 RC)",
                    "close_approach_data": [{"miss_distance": {"kilometers": "36583305.6"}}]
                }
            ]
        }
    }))
}

async fn neo_handler(
    State(state): State<FakeState>,
    Path(id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    state.recorder.nasa_calls.fetch_add(1, Ordering::SeqCst);
    *state.recorder.last_nasa_query.lock().unwrap() = query;
    if id != "2099942" {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"code": 404, "error_message": "not found"})),
        )
            .into_response();
    }
    Json(json!({
        "id": "2099942",
        "name": "99942 Apophis (2004 MN4)",
        "absolute_magnitude_h": 19.09,
        "is_potentially_hazardous_asteroid": true,
        "estimated_diameter": {
            "meters": {"estimated_diameter_min": 300.0, "estimated_diameter_max": 400.0}
        },
        "close_approach_data": [{
            "close_approach_date": "2029-04-13",
            "relative_velocity": {"kilometers_per_second": "7.4224"},
            "miss_distance": {"kilometers": "38012.0"}
        }],
        "orbital_data": {
            "aphelion_distance": "1.0985",
            "perihelion_distance": ".7461",
            "eccentricity": ".1915"
        }
    }))
    .into_response()
}
