use crate::state::AppState;
use crate::store::RedeemOutcome;
use axum::{
    extract::{Path, Query, State},
    http::{header, Method, StatusCode},
    response::{
        sse::{Event, Sse},
        Json,
    },
    routing::{get, post},
    Router,
};
use rush_core::EventEnvelope;
use serde::Deserialize;
use std::convert::Infallible;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tokio::sync::broadcast;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[cfg(test)]
pub fn make_router(state: AppState) -> Router {
    make_router_with_cors(state, "http://localhost:5173")
}

pub fn make_router_with_cors(state: AppState, cors_origin: &str) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(cors_origin.parse::<axum::http::HeaderValue>().unwrap())
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .route("/api/v1/meta", get(meta_handler))
        .route("/api/v1/snapshot", get(snapshot_handler))
        .route("/api/v1/stream", get(stream_handler))
        .route("/api/v1/pause", post(pause_handler))
        .route("/api/v1/resume", post(resume_handler))
        .route("/api/v1/users", post(users_handler))
        .route("/api/v1/scores", post(submit_score_handler))
        .route("/api/v1/scores/top", get(top_scores_handler))
        .route("/api/v1/scores/user/:user_id", get(user_scores_handler))
        .route("/api/v1/rank", get(rank_handler))
        .route("/api/v1/coupons/redeem", post(redeem_handler))
        .route("/api/v1/purchases", post(purchases_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Sim demo routes
// ---------------------------------------------------------------------------

pub async fn meta_handler(State(app_state): State<AppState>) -> Json<serde_json::Value> {
    let sim = app_state.sim.lock();
    let paused = app_state.paused.load(Ordering::Relaxed);
    Json(serde_json::json!({
        "tick": sim.run.meta.tick,
        "seed": sim.run.meta.seed,
        "shift": sim.run.shift,
        "content_version": sim.run.meta.content_version,
        "frame_ms": app_state.frame_ms,
        "paused": paused,
    }))
}

pub async fn snapshot_handler(
    State(app_state): State<AppState>,
) -> (StatusCode, [(header::HeaderName, &'static str); 1], String) {
    let sim = app_state.sim.lock();
    match serde_json::to_string(&sim.run) {
        Ok(json) => {
            drop(sim);
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "application/json")],
                json,
            )
        }
        Err(err) => {
            tracing::error!("snapshot serialization failed: {err}");
            drop(sim);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(header::CONTENT_TYPE, "application/json")],
                r#"{"error":"serialization failed"}"#.to_string(),
            )
        }
    }
}

pub async fn pause_handler(State(app_state): State<AppState>) -> Json<serde_json::Value> {
    app_state.paused.store(true, Ordering::Relaxed);
    Json(serde_json::json!({"paused": true}))
}

pub async fn resume_handler(State(app_state): State<AppState>) -> Json<serde_json::Value> {
    app_state.paused.store(false, Ordering::Relaxed);
    Json(serde_json::json!({"paused": false}))
}

pub async fn stream_handler(
    State(app_state): State<AppState>,
) -> Sse<impl futures_core::Stream<Item = Result<Event, Infallible>>> {
    let mut rx = app_state.event_tx.subscribe();
    let sim = app_state.sim.clone();

    let stream = async_stream::stream! {
        let mut heartbeat = tokio::time::interval(Duration::from_millis(200));
        heartbeat.tick().await; // discard the immediate first tick
        let mut flush = tokio::time::interval(Duration::from_millis(50));
        flush.tick().await; // discard the immediate first tick
        let mut pending: Vec<EventEnvelope> = Vec::new();
        loop {
            tokio::select! {
                result = rx.recv() => {
                    match result {
                        Ok(events) => pending.extend(events),
                        Err(broadcast::error::RecvError::Lagged(_)) => {}
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
                _ = flush.tick() => {
                    if !pending.is_empty() {
                        let data = serde_json::to_string(&pending).unwrap_or_default();
                        pending.clear();
                        yield Ok(Event::default().data(data));
                    }
                }
                _ = heartbeat.tick() => {
                    let tick = sim.lock().run.meta.tick;
                    let hb = serde_json::json!({"heartbeat": true, "tick": tick});
                    yield Ok(Event::default().data(hb.to_string()));
                }
            }
        }
    };

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(30))
            .text("ping"),
    )
}

// ---------------------------------------------------------------------------
// Backend API routes
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct UserRequest {
    device_id: String,
    name: String,
}

pub async fn users_handler(
    State(app_state): State<AppState>,
    Json(req): Json<UserRequest>,
) -> Json<serde_json::Value> {
    let mut store = app_state.store.lock();
    let user = store.get_or_create_user(&req.device_id, &req.name);
    Json(serde_json::json!({
        "id": user.id,
        "device_id": user.device_id,
        "name": user.name,
    }))
}

#[derive(Deserialize)]
pub struct ScoreRequest {
    name: String,
    score: u64,
    shift_reached: usize,
    grade: String,
    user_id: Option<String>,
}

pub async fn submit_score_handler(
    State(app_state): State<AppState>,
    Json(req): Json<ScoreRequest>,
) -> (StatusCode, Json<serde_json::Value>) {
    let mut store = app_state.store.lock();
    let id = store.submit_score(
        &req.name,
        req.score,
        req.shift_reached,
        &req.grade,
        req.user_id,
    );
    (StatusCode::CREATED, Json(serde_json::json!({"id": id})))
}

#[derive(Deserialize)]
pub struct LimitQuery {
    limit: Option<usize>,
}

const DEFAULT_SCORE_LIMIT: usize = 10;

pub async fn top_scores_handler(
    State(app_state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Json<Vec<crate::store::ScoreRecord>> {
    let store = app_state.store.lock();
    Json(store.top_scores(query.limit.unwrap_or(DEFAULT_SCORE_LIMIT)))
}

pub async fn user_scores_handler(
    State(app_state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<LimitQuery>,
) -> Json<Vec<crate::store::ScoreRecord>> {
    let store = app_state.store.lock();
    Json(store.user_scores(&user_id, query.limit.unwrap_or(DEFAULT_SCORE_LIMIT)))
}

#[derive(Deserialize)]
pub struct RankQuery {
    score: u64,
}

pub async fn rank_handler(
    State(app_state): State<AppState>,
    Query(query): Query<RankQuery>,
) -> Json<serde_json::Value> {
    let store = app_state.store.lock();
    Json(serde_json::json!({"rank": store.rank(query.score)}))
}

#[derive(Deserialize)]
pub struct RedeemRequest {
    code: String,
}

pub async fn redeem_handler(
    State(app_state): State<AppState>,
    Json(req): Json<RedeemRequest>,
) -> Json<serde_json::Value> {
    let mut store = app_state.store.lock();
    match store.redeem(&req.code) {
        RedeemOutcome::Valid { reward_coins } => Json(serde_json::json!({
            "valid": true,
            "reward_coins": reward_coins,
        })),
        RedeemOutcome::Invalid { reason } => Json(serde_json::json!({
            "valid": false,
            "reason": reason,
        })),
    }
}

#[derive(Deserialize)]
pub struct PurchaseRequest {
    transaction_id: String,
    item_id: String,
    user_id: Option<String>,
}

pub async fn purchases_handler(
    State(app_state): State<AppState>,
    Json(req): Json<PurchaseRequest>,
) -> (StatusCode, Json<crate::store::PurchaseRecord>) {
    let mut store = app_state.store.lock();
    let (record, created) = store.record_purchase(&req.transaction_id, &req.item_id, req.user_id);
    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    (status, Json(record))
}
