//! In-memory stand-in for the RoadTrack backend.
//!
//! Serves the endpoints the core client talks to (`/orders`, `/users/me`,
//! `/auth/profile`) plus diagnostic routes used by integration tests:
//! `/status/{code}` answers with any status, `/slow/{ms}` delays its reply,
//! `/flaky/{failures}` fails with 503 a fixed number of times, and
//! `/echo/headers` reflects the credentials it received.

use std::sync::{
    atomic::{AtomicU32, Ordering},
    Arc,
};
use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};
use uuid::Uuid;

/// Order record in the backend's wire shape.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub title: String,
    pub status: String,
    pub total_price: f64,
    pub currency: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OrdersList {
    pub items: Vec<Order>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListOrders {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthProfile {
    pub id: String,
    pub email: String,
    pub role: String,
    pub created_at: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct StatusFormat {
    pub format: Option<String>,
}

pub const DEFAULT_PAGE_LIMIT: u32 = 20;

/// Token accepted by the authenticated routes. Any other bearer value is
/// rejected with 401.
pub const VALID_TOKEN: &str = "valid-token";
pub const ADMIN_TOKEN: &str = "admin-token";

#[derive(Clone)]
pub struct AppState {
    orders: Arc<RwLock<Vec<Order>>>,
    flaky_hits: Arc<AtomicU32>,
}

impl AppState {
    pub fn new(orders: Vec<Order>) -> Self {
        Self {
            orders: Arc::new(RwLock::new(orders)),
            flaky_hits: Arc::new(AtomicU32::new(0)),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(seed_orders())
    }
}

/// Fixed catalogue served by a fresh `app()`.
pub fn seed_orders() -> Vec<Order> {
    let order = |n: u128, title: &str, status: &str, total_price: f64| Order {
        id: Uuid::from_u128(n),
        title: title.to_string(),
        status: status.to_string(),
        total_price,
        currency: "USD".to_string(),
        created_at: format!("2024-01-{n:02}T09:00:00Z"),
        updated_at: format!("2024-02-{n:02}T17:30:00Z"),
    };
    vec![
        order(1, "Pallets to Rotterdam", "pending", 1250.0),
        order(2, "Cold chain: Lyon", "in_progress", 980.5),
        order(3, "Return crates", "completed", 120.0),
        order(4, "Express documents", "cancelled", 45.25),
        order(5, "Steel coils", "in_progress", 4300.0),
    ]
}

pub fn app() -> Router {
    app_with_state(AppState::default())
}

pub fn app_with_state(state: AppState) -> Router {
    Router::new()
        .route("/orders", get(list_orders))
        .route("/orders/{id}", get(get_order))
        .route("/users/me", get(get_me))
        .route("/auth/profile", post(sync_profile))
        .route("/status/{code}", get(status).post(status))
        .route("/slow/{ms}", get(slow))
        .route("/flaky/{failures}", get(flaky))
        .route("/echo/headers", get(echo_headers))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<ListOrders>,
) -> Json<OrdersList> {
    let orders = state.orders.read().await;
    let matching: Vec<&Order> = orders
        .iter()
        .filter(|o| query.status.as_deref().map_or(true, |s| o.status == s))
        .collect();

    let page = query.page.filter(|p| *p > 0).unwrap_or(1);
    let limit = query.limit.filter(|l| *l > 0).unwrap_or(DEFAULT_PAGE_LIMIT);
    let offset = (page as usize - 1).saturating_mul(limit as usize);
    let items = matching
        .iter()
        .skip(offset)
        .take(limit as usize)
        .map(|o| (*o).clone())
        .collect();

    debug!(page, limit, total = matching.len(), "listing orders");
    Json(OrdersList {
        items,
        total: matching.len() as u64,
        page,
        limit,
    })
}

async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, Response> {
    let orders = state.orders.read().await;
    orders
        .iter()
        .find(|o| o.id == id)
        .cloned()
        .map(Json)
        .ok_or_else(|| error(StatusCode::NOT_FOUND, "order not found"))
}

async fn get_me(headers: HeaderMap) -> Response {
    match bearer_token(&headers) {
        Some(VALID_TOKEN) | Some(ADMIN_TOKEN) => Json(UserProfile {
            id: "user-1".to_string(),
            email: "dispatch@roadtrack.test".to_string(),
            full_name: Some("Dana Dispatch".to_string()),
            avatar_url: None,
            created_at: "2024-01-01T00:00:00Z".to_string(),
            updated_at: "2024-03-05".to_string(),
        })
        .into_response(),
        _ => error(StatusCode::UNAUTHORIZED, "missing or invalid bearer token"),
    }
}

async fn sync_profile(headers: HeaderMap) -> Response {
    let role = match bearer_token(&headers) {
        Some(VALID_TOKEN) => "user",
        Some(ADMIN_TOKEN) => "admin",
        _ => return error(StatusCode::UNAUTHORIZED, "missing or invalid bearer token"),
    };
    info!(role, "profile synced");
    Json(AuthProfile {
        id: "user-1".to_string(),
        email: "dispatch@roadtrack.test".to_string(),
        role: role.to_string(),
        created_at: "2024-01-01T00:00:00Z".to_string(),
    })
    .into_response()
}

/// Reply with `code`. Bodyless statuses get no body; `?format=text` sends a
/// plain-text body instead of JSON.
async fn status(Path(code): Path<u16>, Query(format): Query<StatusFormat>) -> Response {
    let status = match StatusCode::from_u16(code) {
        Ok(status) if (200..=599).contains(&code) => status,
        _ => return error(StatusCode::BAD_REQUEST, "status must be within 200..=599"),
    };
    if code == 204 || code == 304 {
        return status.into_response();
    }
    match format.format.as_deref() {
        Some("text") => (status, format!("plain status {code}")).into_response(),
        _ => {
            let body = json!({ "status": code, "message": format!("status {code}") });
            (status, Json(body)).into_response()
        }
    }
}

async fn slow(Path(ms): Path<u64>) -> Json<serde_json::Value> {
    tokio::time::sleep(Duration::from_millis(ms)).await;
    Json(json!({ "waited_ms": ms }))
}

/// Fail with 503 until `failures` calls have been seen, then succeed.
async fn flaky(State(state): State<AppState>, Path(failures): Path<u32>) -> Response {
    let attempt = state.flaky_hits.fetch_add(1, Ordering::SeqCst) + 1;
    if attempt <= failures {
        return error(StatusCode::SERVICE_UNAVAILABLE, "try again");
    }
    Json(json!({ "attempts": attempt })).into_response()
}

async fn echo_headers(headers: HeaderMap) -> Json<serde_json::Value> {
    let get = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    Json(json!({
        "authorization": get(header::AUTHORIZATION),
        "cookie": get(header::COOKIE),
        "content_type": get(header::CONTENT_TYPE),
        "cache_control": get(header::CACHE_CONTROL),
    }))
}
