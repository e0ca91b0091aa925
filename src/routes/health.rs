use std::time::Instant;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::state::AppState;
use crate::store::migrate;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(health_check))
        .route("/live", get(liveness))
        .route("/ready", get(readiness))
}

pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let start = Instant::now();
    let profiles = state.store().count_profiles();
    let latency_us = start.elapsed().as_micros() as u64;
    let live_sessions = state.engine().live_sessions().await;

    Json(serde_json::json!({
        "status": "ok",
        "uptimeSecs": state.uptime_secs(),
        "store": {
            "healthy": true,
            "profiles": profiles,
            "latencyUs": latency_us,
        },
        "catalog": {
            "items": state.engine().catalog().len(),
        },
        "liveSessions": live_sessions,
    }))
}

pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// 题库为空或数据库读不出版本号时不接流量
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    if state.engine().catalog().is_empty() {
        tracing::warn!("Readiness check failed: item catalog is empty");
        return StatusCode::SERVICE_UNAVAILABLE;
    }
    match migrate::get_current_version(state.store()) {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed: store unreadable");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
