//! In-process stand-in for the InventIQ backend.
//!
//! Every request is recorded (method, path, query, Authorization header and
//! JSON body) so tests can assert on exactly what the client sent.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use inventiq_core::auth::{KeyValueStore, MemoryStorage};
use inventiq_core::{ApiClient, SessionStore};
use parking_lot::Mutex;
use serde_json::{json, Value};

pub const TOKEN: &str = "abc";
pub const EMAIL: &str = "b@x.com";
pub const PASSWORD: &str = "pw";

/// Logs in successfully, but only after this delay
pub const SLOW_EMAIL: &str = "slow@x.com";
pub const SLOW_TOKEN: &str = "late";
pub const SLOW_DELAY: Duration = Duration::from_millis(200);

/// Rejected with a 401 that has no JSON body
pub const SILENT_EMAIL: &str = "silent@x.com";

/// Rejected with a 401 whose body is far longer than an error display shows
pub const VERBOSE_EMAIL: &str = "verbose@x.com";

/// Insights query answered only after `SLOW_DELAY`
pub const SLOW_QUERY: &str = "take your time";

#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub body: Value,
}

#[derive(Clone, Default)]
struct MockState {
    seen: Arc<Mutex<Vec<SeenRequest>>>,
}

pub struct MockBackend {
    pub base_url: String,
    seen: Arc<Mutex<Vec<SeenRequest>>>,
}

impl MockBackend {
    pub async fn start() -> Self {
        let state = MockState::default();
        let seen = state.seen.clone();
        let app = Router::new().fallback(handle).with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock backend");
        let addr = listener.local_addr().expect("mock backend address");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("mock backend serves");
        });

        Self {
            base_url: format!("http://{}/api", addr),
            seen,
        }
    }

    pub fn requests(&self) -> Vec<SeenRequest> {
        self.seen.lock().clone()
    }

    pub fn last_request(&self) -> SeenRequest {
        self.seen.lock().last().cloned().expect("at least one request")
    }

    pub fn request_count(&self) -> usize {
        self.seen.lock().len()
    }

    pub fn client(&self, storage: Arc<dyn KeyValueStore>) -> ApiClient {
        ApiClient::new(&self.base_url, storage).expect("client builds")
    }

    pub fn session(&self, storage: Arc<dyn KeyValueStore>) -> SessionStore {
        let api = self.client(storage.clone());
        SessionStore::restore(storage, api)
    }
}

pub fn bob() -> Value {
    json!({"id": 1, "username": "bob", "email": EMAIL, "role": "staff"})
}

pub fn widget(id: &str) -> Value {
    json!({
        "id": id,
        "name": "Widget",
        "category": "Tools",
        "supplier": "Acme",
        "current_stock": 4,
        "reorder_level": 10,
        "purchase_price": 2.5,
        "selling_price": 4.0,
        "lead_time": 5,
        "historical_sales": {"2024-01-01": 3}
    })
}

/// Put a valid token/user pair in storage, as a previous login would have.
pub fn seed_session(storage: &MemoryStorage, token: &str) {
    storage
        .set_many(&[("token", token), ("user", &bob().to_string())])
        .expect("seed storage");
}

fn reply(status: StatusCode, body: Value) -> Response {
    (status, Json(body)).into_response()
}

async fn handle(
    State(state): State<MockState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri.path().trim_start_matches("/api").to_string();
    let authorization = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);

    state.seen.lock().push(SeenRequest {
        method: method.clone(),
        path: path.clone(),
        query: uri.query().map(str::to_string),
        authorization: authorization.clone(),
        body: body.clone(),
    });

    let authorized = authorization.is_some();
    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();

    match (method.as_str(), segments.as_slice()) {
        ("POST", ["auth", "login"]) => {
            let username = body["username"].as_str().unwrap_or_default();
            let password = body["password"].as_str().unwrap_or_default();
            match (username, password) {
                (EMAIL, PASSWORD) => reply(StatusCode::OK, json!({"token": TOKEN, "user": bob()})),
                (SLOW_EMAIL, PASSWORD) => {
                    tokio::time::sleep(SLOW_DELAY).await;
                    reply(StatusCode::OK, json!({"token": SLOW_TOKEN, "user": bob()}))
                }
                (SILENT_EMAIL, _) => StatusCode::UNAUTHORIZED.into_response(),
                (VERBOSE_EMAIL, _) => reply(
                    StatusCode::UNAUTHORIZED,
                    json!({"message": "Invalid credentials!", "detail": "x".repeat(600)}),
                ),
                _ => reply(StatusCode::UNAUTHORIZED, json!({"message": "Invalid credentials!"})),
            }
        }
        ("POST", ["auth", "register"]) => {
            if body["username"] == "taken" {
                reply(StatusCode::CONFLICT, json!({"message": "Username already exists!"}))
            } else {
                reply(StatusCode::CREATED, json!({"message": "User registered successfully!"}))
            }
        }
        _ if !authorized => reply(StatusCode::UNAUTHORIZED, json!({"message": "Token is missing!"})),
        ("GET", ["inventory"]) => reply(StatusCode::OK, json!([widget("1"), widget("2")])),
        ("GET", ["inventory", "garbage"]) => (StatusCode::OK, "not json").into_response(),
        ("GET", ["inventory", "404"]) => reply(StatusCode::NOT_FOUND, json!({"message": "Product not found"})),
        ("GET", ["inventory", id]) => reply(StatusCode::OK, widget(id)),
        ("POST", ["inventory", "transaction"]) => {
            reply(StatusCode::CREATED, json!({"message": "Transaction recorded"}))
        }
        ("POST", ["inventory"]) => {
            let mut created = body.clone();
            created["id"] = json!(3);
            reply(StatusCode::CREATED, created)
        }
        ("PUT", ["inventory", id]) => {
            let mut updated = widget(id);
            if let (Some(target), Some(changes)) = (updated.as_object_mut(), body.as_object()) {
                for (key, value) in changes {
                    target.insert(key.clone(), value.clone());
                }
            }
            reply(StatusCode::OK, updated)
        }
        ("DELETE", ["inventory", _]) => reply(StatusCode::OK, json!({"message": "Product deleted"})),
        ("GET", ["predictions", "forecast", _]) => {
            let days: usize = uri
                .query()
                .and_then(|q| q.strip_prefix("days="))
                .and_then(|d| d.parse().ok())
                .unwrap_or(30);
            reply(
                StatusCode::OK,
                json!({"lstm": vec![2; days], "prophet": vec![4; days], "ensemble": vec![3; days]}),
            )
        }
        ("GET", ["predictions", "restock", _]) => {
            let trending = uri.query() == Some("trending=true");
            let safety = if trending { 6 } else { 4 };
            reply(
                StatusCode::OK,
                json!({"predicted_demand": 20, "safety_stock": safety, "recommended_restock": 20 + safety - 4}),
            )
        }
        ("POST", ["predictions", "insights"]) => {
            let query = body["query"].as_str().unwrap_or_default();
            if query == "explode" {
                reply(StatusCode::INTERNAL_SERVER_ERROR, json!({"message": "model offline"}))
            } else if query == SLOW_QUERY {
                tokio::time::sleep(SLOW_DELAY).await;
                reply(StatusCode::OK, json!({"insights": "Worth the wait"}))
            } else {
                reply(StatusCode::OK, json!({"insights": format!("You asked: {}", query)}))
            }
        }
        _ => reply(StatusCode::NOT_FOUND, json!({"message": "No such route"})),
    }
}
