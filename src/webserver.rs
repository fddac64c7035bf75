use crate::model::{RawConfig, Webhook};
use crate::registry::DriverRegistry;
use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Clone)]
pub struct AppState {
    registry: Arc<DriverRegistry>,
    webhooks: Arc<HashMap<String, Webhook>>,
}

impl AppState {
    pub fn new(registry: DriverRegistry, webhooks: HashMap<String, Webhook>) -> Self {
        Self {
            registry: Arc::new(registry),
            webhooks: Arc::new(webhooks),
        }
    }
}

pub async fn readiness_probe() -> impl IntoResponse {
    StatusCode::NO_CONTENT
}

pub async fn liveness_probe() -> impl IntoResponse {
    StatusCode::NO_CONTENT
}

async fn execute_webhook(
    State(state): State<AppState>,
    Path(name): Path<String>,
    body: Bytes,
) -> impl IntoResponse {
    let Some(webhook) = state.webhooks.get(&name) else {
        return outcome(StatusCode::NOT_FOUND, Some(format!("webhook {} not found", name)));
    };
    let Some(driver) = state.registry.get(&webhook.driver) else {
        return outcome(
            StatusCode::INTERNAL_SERVER_ERROR,
            Some(format!("driver {} not registered", webhook.driver)),
        );
    };

    // Bodies that aren't JSON are handed over as a string so the driver reports the bad shape.
    let payload = serde_json::from_slice(&body)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&body).into_owned()));
    let config = RawConfig::DeploymentUpdate(webhook.deployment_update_config.clone());

    let result = match driver.validate_payload(&config) {
        Ok(_) => driver.execute(&config, &payload).await,
        Err(err) => Err(err),
    };
    match result {
        Ok(status) => {
            info!("Executed webhook {} with status {}", name, status);
            outcome(status, None)
        }
        Err(err) => {
            let status = err.status_code();
            warn!("Webhook {} failed with status {}: {}", name, status, err);
            outcome(status, Some(err.to_string()))
        }
    }
}

async fn driver_schema(
    State(state): State<AppState>,
    Path(driver_name): Path<String>,
) -> impl IntoResponse {
    match state.registry.get(&driver_name) {
        Some(driver) => {
            let schema = driver.customize_schema(driver.driver_config_resource().schema());
            (StatusCode::OK, Json(json!(schema)))
        }
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": format!("driver {} not found", driver_name)})),
        ),
    }
}

fn outcome(status: StatusCode, error: Option<String>) -> (StatusCode, Json<Value>) {
    (
        status,
        Json(json!({"status": status.as_u16(), "error": error})),
    )
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/health/live", get(liveness_probe))
        .route("/health/ready", get(readiness_probe))
        .route("/v1-webhooks/execute/{name}", post(execute_webhook))
        .route("/v1-webhooks/schemas/{driver}", get(driver_schema))
        .with_state(state)
}
