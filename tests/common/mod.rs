//! Mock gateway admin API for integration tests
//!
//! Behaves like the real gateway: credentials travel as query parameters on
//! every call, `list` answers `[]` to non-admins and `getConfig` answers an
//! error object for bad credentials.

#![allow(dead_code)]

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use parking_lot::Mutex;
use serde_json::json;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

pub const ADMIN: &str = "admin";
pub const PASSWORD: &str = "secret";

pub struct MockState {
    pub flavor: &'static str,
    pub cpu: f64,
    pub memory: f64,
    pub users: Vec<String>,
    pub reject_mutations: bool,
    pub fail_list: bool,
    pub calls: Vec<String>,
}

#[derive(Clone)]
pub struct MockGateway {
    pub state: Arc<Mutex<MockState>>,
    pub addr: SocketAddr,
}

impl MockGateway {
    /// Start a gateway on an ephemeral port
    pub async fn start(flavor: &'static str, users: &[&str]) -> Self {
        let state = Arc::new(Mutex::new(MockState {
            flavor,
            cpu: 42.0,
            memory: 17.0,
            users: users.iter().map(|u| u.to_string()).collect(),
            reject_mutations: false,
            fail_list: false,
            calls: Vec::new(),
        }));

        let router = Router::new()
            .route("/type", get(vpn_type))
            .route("/login", get(login))
            .route("/list", get(list))
            .route("/create/{name}", get(create))
            .route("/remove/{name}", get(remove))
            .route("/getConfig/{name}", get(get_config))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self { state, addr }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}/", self.addr)
    }

    pub fn users(&self) -> Vec<String> {
        self.state.lock().users.clone()
    }

    pub fn calls(&self, endpoint: &str) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|c| c.as_str() == endpoint)
            .count()
    }
}

type Shared = Arc<Mutex<MockState>>;
type Params = Query<HashMap<String, String>>;

fn is_admin(params: &HashMap<String, String>) -> bool {
    params.get("username").map(String::as_str) == Some(ADMIN)
        && params.get("password").map(String::as_str) == Some(PASSWORD)
}

fn record(state: &Shared, endpoint: &str) {
    state.lock().calls.push(endpoint.to_string());
}

async fn vpn_type(State(state): State<Shared>) -> Json<serde_json::Value> {
    record(&state, "type");
    let flavor = state.lock().flavor;
    Json(json!({ "type": flavor }))
}

async fn login(State(state): State<Shared>, Query(params): Params) -> Json<serde_json::Value> {
    record(&state, "login");
    if !is_admin(&params) {
        return Json(json!({ "success": false }));
    }
    let state = state.lock();
    Json(json!({ "success": true, "cpu": state.cpu, "memory": state.memory }))
}

async fn list(State(state): State<Shared>, Query(params): Params) -> Response {
    record(&state, "list");
    let state = state.lock();
    if state.fail_list {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    if !is_admin(&params) {
        return Json(json!([])).into_response();
    }
    Json(json!(state.users)).into_response()
}

async fn create(
    State(state): State<Shared>,
    Path(name): Path<String>,
    Query(params): Params,
) -> Json<serde_json::Value> {
    record(&state, "create");
    let mut state = state.lock();
    if !is_admin(&params) || state.reject_mutations {
        return Json(json!({ "success": false }));
    }
    state.users.push(name);
    Json(json!({ "success": true }))
}

async fn remove(
    State(state): State<Shared>,
    Path(name): Path<String>,
    Query(params): Params,
) -> Json<serde_json::Value> {
    record(&state, "remove");
    let mut state = state.lock();
    if !is_admin(&params) || state.reject_mutations {
        return Json(json!({ "success": false }));
    }
    state.users.retain(|u| *u != name);
    Json(json!({ "success": true }))
}

async fn get_config(
    State(state): State<Shared>,
    Path(name): Path<String>,
    Query(params): Params,
) -> Response {
    record(&state, "getConfig");
    if !is_admin(&params) {
        return Json(json!({ "error": "Incorrect admin credentials!" })).into_response();
    }
    if !state.lock().users.contains(&name) {
        return "".into_response();
    }
    format!("client\nremote vpn.example.com 1194\n# {}\n", name).into_response()
}
