//! Ingress - HTTP 受け口（axum）
//!
//! - `POST /api-endpoint`: secret を確認してキューに積み、すぐに ack を返す
//! - `POST /evaluation`: callback 受信のモック。ログに出して round を返すだけ
//! - `GET /healthz`: キューの件数
//!
//! リクエスト処理中にファイル I/O や外部通信はしない（enqueue だけ）。
//! タスクのボディ上限は `Config::max_body_bytes`。超えたら 413。

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use tracing::{info, warn};

use super::config::Config;
use crate::domain::{IngressError, TaskRequest};
use crate::ports::{NonceGenerator, TaskQueue};

pub mod paths {
    pub const TASKS: &str = "/api-endpoint";
    pub const EVALUATION: &str = "/evaluation";
    pub const HEALTH: &str = "/healthz";
}

#[derive(Clone)]
pub struct IngressState {
    pub config: Arc<Config>,
    pub queue: Arc<dyn TaskQueue>,
    pub nonces: Arc<dyn NonceGenerator>,
}

pub fn router(state: IngressState) -> Router {
    let body_limit = DefaultBodyLimit::max(state.config.max_body_bytes);
    Router::new()
        .route(paths::TASKS, post(accept_task).layer(body_limit))
        .route(paths::EVALUATION, post(mock_evaluation))
        .route(paths::HEALTH, get(health))
        .with_state(state)
}

impl IntoResponse for IngressError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            IngressError::Unauthorized => (StatusCode::FORBIDDEN, "Invalid secret".to_string()),
            IngressError::Malformed(detail) => (StatusCode::INTERNAL_SERVER_ERROR, detail.clone()),
            IngressError::QueueFull | IngressError::QueueClosed => {
                (StatusCode::SERVICE_UNAVAILABLE, self.to_string())
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

async fn accept_task(
    State(state): State<IngressState>,
    body: Bytes,
) -> Result<Json<Value>, IngressError> {
    let value: Value =
        serde_json::from_slice(&body).map_err(|e| IngressError::Malformed(e.to_string()))?;

    // 形式チェックより先に secret を見る
    let secret = value
        .get("secret")
        .and_then(Value::as_str)
        .unwrap_or_default();
    if !state.config.secret_matches(secret) {
        warn!(task = ?value.get("task"), "request rejected: invalid secret");
        return Err(IngressError::Unauthorized);
    }

    let request: TaskRequest =
        serde_json::from_value(value).map_err(|e| IngressError::Malformed(e.to_string()))?;
    let task = request.into_accepted(|| state.nonces.generate())?;

    let ack = json!({
        "status": "ok",
        "task": task.task,
        "round": task.round.get(),
        "nonce": task.nonce.as_str(),
    });
    let (name, nonce, round) = (task.name.clone(), task.nonce.clone(), task.round);
    state.queue.enqueue(task).await?;
    info!(task = %name, %nonce, %round, "task accepted");

    Ok(Json(ack))
}

async fn mock_evaluation(body: Bytes) -> Json<Value> {
    let mut payload: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    let round = payload.get("round").cloned().unwrap_or(Value::Null);
    if let Some(secret) = payload.get_mut("secret") {
        *secret = Value::String("***".to_string());
    }
    info!(%payload, "evaluation callback received");
    Json(json!({ "status": "received", "round": round }))
}

async fn health(State(state): State<IngressState>) -> Json<Value> {
    let counts = state.queue.counts().await;
    Json(json!({ "status": "ok", "queue": counts }))
}
