use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    Json,
};
use http::StatusCode;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tracing::error;

use crate::{
    alert::{Alert, AlertCounts},
    engine::{AlertEngine, PassReport},
    metrics::gather_metrics,
    Error,
};

type Engine = State<Arc<AlertEngine>>;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertsResponse {
    pub alerts: Vec<Alert>,
    pub counts: AlertCounts,
    pub refreshing: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub refreshing: bool,
    pub stopped: bool,
    pub last_pass: Option<PassReport>,
}

pub struct ApiError(Error);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            Error::Stopped => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

fn alerts_response(engine: &AlertEngine) -> AlertsResponse {
    let alerts = engine.get_alerts();
    AlertsResponse {
        counts: AlertCounts::from_alerts(&alerts),
        alerts,
        refreshing: engine.is_refreshing(),
    }
}

pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "healthy" }))
}

pub async fn list_alerts(State(engine): Engine) -> Json<AlertsResponse> {
    Json(alerts_response(&engine))
}

pub async fn counts(State(engine): Engine) -> Json<AlertCounts> {
    Json(engine.get_counts())
}

pub async fn refresh(State(engine): Engine) -> Result<Json<AlertsResponse>, ApiError> {
    if let Err(e) = engine.refresh_now().await {
        error!("Manual refresh failed: {}", e);
        return Err(ApiError(e));
    }
    Ok(Json(alerts_response(&engine)))
}

pub async fn acknowledge(State(engine): Engine, Path(id): Path<String>) -> Json<serde_json::Value> {
    let acknowledged = engine.acknowledge(&id);
    Json(json!({ "id": id, "acknowledged": acknowledged }))
}

pub async fn acknowledged(State(engine): Engine) -> Json<Vec<String>> {
    Json(engine.acknowledged())
}

pub async fn status(State(engine): Engine) -> Json<StatusResponse> {
    Json(StatusResponse {
        refreshing: engine.is_refreshing(),
        stopped: engine.is_stopped(),
        last_pass: engine.last_report(),
    })
}

pub async fn metrics() -> String {
    gather_metrics()
}
