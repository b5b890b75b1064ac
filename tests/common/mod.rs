//! In-process stand-in for the registration service.
//!
//! One axum server exposes both channels: `/cmd/api/<entity>` accepts writes and
//! `/qry/api/<entity>` serves reads from a projection. With `lagging` on, the
//! projection only catches up when a test calls `sync()`.
#![allow(dead_code)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use parking_lot::Mutex;
use reqwest::Url;
use serde_json::{json, Value};

use trail_client::config::ClientConfig;

#[derive(Default)]
struct Collection {
    command: Vec<Value>,
    view: Vec<Value>,
}

#[derive(Default)]
struct Inner {
    collections: HashMap<String, Collection>,
    lagging: bool,
    failing: bool,
    auth_headers: Vec<Option<String>>,
}

impl Inner {
    fn coll(&mut self, entity: &str) -> Option<&mut Collection> {
        match entity {
            "races" | "applications" => Some(self.collections.entry(entity.to_string()).or_default()),
            _ => None,
        }
    }

    fn settle(&mut self) {
        if self.lagging { return; }
        for c in self.collections.values_mut() { c.view = c.command.clone(); }
    }
}

#[derive(Clone, Default)]
struct FixtureState(Arc<Mutex<Inner>>);

impl FixtureState {
    // Records the credential and answers the failing switch.
    fn observe(&self, headers: &HeaderMap) -> Option<Response> {
        let mut g = self.0.lock();
        let auth = headers.get("authorization").and_then(|v| v.to_str().ok()).map(str::to_string);
        g.auth_headers.push(auth);
        if g.failing {
            return Some((StatusCode::SERVICE_UNAVAILABLE, Json(json!({"status":"error"}))).into_response());
        }
        None
    }
}

fn id_of(v: &Value) -> Option<&str> { v.get("id").and_then(|x| x.as_str()) }

async fn create(State(st): State<FixtureState>, Path(entity): Path<String>, headers: HeaderMap, Json(mut body): Json<Value>) -> Response {
    if let Some(r) = st.observe(&headers) { return r; }
    let mut g = st.0.lock();
    let Some(coll) = g.coll(&entity) else { return StatusCode::NOT_FOUND.into_response() };
    let Some(obj) = body.as_object_mut() else { return StatusCode::BAD_REQUEST.into_response() };
    obj.insert("id".to_string(), Value::String(uuid::Uuid::new_v4().to_string()));
    coll.command.push(body.clone());
    g.settle();
    trail_client::tprintln!("fixture: created {} {}", entity, body);
    (StatusCode::CREATED, Json(body)).into_response()
}

async fn update(State(st): State<FixtureState>, Path((entity, id)): Path<(String, String)>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if let Some(r) = st.observe(&headers) { return r; }
    let mut g = st.0.lock();
    let Some(coll) = g.coll(&entity) else { return StatusCode::NOT_FOUND.into_response() };
    let Some(slot) = coll.command.iter_mut().find(|v| id_of(v) == Some(id.as_str())) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    *slot = body.clone();
    g.settle();
    (StatusCode::OK, Json(body)).into_response()
}

async fn delete(State(st): State<FixtureState>, Path((entity, id)): Path<(String, String)>, headers: HeaderMap) -> Response {
    if let Some(r) = st.observe(&headers) { return r; }
    let mut g = st.0.lock();
    let Some(coll) = g.coll(&entity) else { return StatusCode::NOT_FOUND.into_response() };
    let before = coll.command.len();
    coll.command.retain(|v| id_of(v) != Some(id.as_str()));
    if coll.command.len() == before { return StatusCode::NOT_FOUND.into_response(); }
    g.settle();
    StatusCode::NO_CONTENT.into_response()
}

async fn list(State(st): State<FixtureState>, Path(entity): Path<String>, headers: HeaderMap) -> Response {
    if let Some(r) = st.observe(&headers) { return r; }
    let mut g = st.0.lock();
    let Some(coll) = g.coll(&entity) else { return StatusCode::NOT_FOUND.into_response() };
    Json(Value::Array(coll.view.clone())).into_response()
}

async fn get_one(State(st): State<FixtureState>, Path((entity, id)): Path<(String, String)>, headers: HeaderMap) -> Response {
    if let Some(r) = st.observe(&headers) { return r; }
    let mut g = st.0.lock();
    let Some(coll) = g.coll(&entity) else { return StatusCode::NOT_FOUND.into_response() };
    match coll.view.iter().find(|v| id_of(v) == Some(id.as_str())) {
        Some(v) => Json(v.clone()).into_response(),
        None => (StatusCode::NOT_FOUND, Json(json!({"status":"not_found"}))).into_response(),
    }
}

async fn by_race(State(st): State<FixtureState>, Path(race_id): Path<String>, headers: HeaderMap) -> Response {
    if let Some(r) = st.observe(&headers) { return r; }
    let mut g = st.0.lock();
    let Some(coll) = g.coll("applications") else { return StatusCode::NOT_FOUND.into_response() };
    let hits: Vec<Value> = coll
        .view
        .iter()
        .filter(|v| v.get("raceId").and_then(|x| x.as_str()) == Some(race_id.as_str()))
        .cloned()
        .collect();
    Json(Value::Array(hits)).into_response()
}

pub struct Fixture {
    pub addr: std::net::SocketAddr,
    state: FixtureState,
}

impl Fixture {
    pub async fn start() -> Fixture {
        let state = FixtureState::default();
        let app = Router::new()
            .route("/cmd/api/{entity}", axum::routing::post(create))
            .route("/cmd/api/{entity}/{id}", axum::routing::patch(update).delete(delete))
            .route("/qry/api/{entity}", get(list))
            .route("/qry/api/{entity}/{id}", get(get_one))
            .route("/qry/api/applications/race/{race_id}", get(by_race))
            .with_state(state.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind fixture");
        let addr = listener.local_addr().expect("fixture addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        Fixture { addr, state }
    }

    pub fn config(&self) -> ClientConfig {
        ClientConfig {
            command_base: Url::parse(&format!("http://{}/cmd/api", self.addr)).unwrap(),
            query_base: Url::parse(&format!("http://{}/qry/api", self.addr)).unwrap(),
            state_dir: PathBuf::from(".trail-fixture"),
        }
    }

    /// Keep the query projection frozen until `sync` is called.
    pub fn set_lagging(&self, lagging: bool) { self.state.0.lock().lagging = lagging; }

    /// Answer every request with 503.
    pub fn set_failing(&self, failing: bool) { self.state.0.lock().failing = failing; }

    /// Bring every query projection up to date with the command side.
    pub fn sync(&self) {
        let mut g = self.state.0.lock();
        for c in g.collections.values_mut() { c.view = c.command.clone(); }
    }

    pub fn auth_headers(&self) -> Vec<Option<String>> { self.state.0.lock().auth_headers.clone() }

    /// Insert a record on both sides directly, bypassing the client.
    pub fn seed(&self, entity: &str, record: Value) {
        let mut g = self.state.0.lock();
        let coll = g.collections.entry(entity.to_string()).or_default();
        coll.command.push(record.clone());
        coll.view.push(record);
    }
}

/// A URL nothing listens on.
pub fn dead_config() -> ClientConfig {
    ClientConfig {
        command_base: Url::parse("http://127.0.0.1:1/api").unwrap(),
        query_base: Url::parse("http://127.0.0.1:1/api").unwrap(),
        state_dir: PathBuf::from(".trail-dead"),
    }
}

pub fn future_exp() -> i64 { chrono::Utc::now().timestamp() + 3600 }

pub fn past_exp() -> i64 { chrono::Utc::now().timestamp() - 60 }
