//! Orchestrator health checks. Liveness never touches the store; readiness and
//! startup bound their store checks with the configured timeouts.

use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde_json::{json, Map, Value};
use tokio::time::timeout;
use tracing::error;

use crate::AppState;

type HealthResponse = (StatusCode, Json<Value>);

pub async fn liveness() -> HealthResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "UP",
            "timestamp": Utc::now(),
            "message": "Application is running",
        })),
    )
}

pub async fn readiness(State(state): State<AppState>) -> HealthResponse {
    let mut checks = Map::new();
    let mut ready = true;

    match timeout(state.health.readiness, state.products.check_store()).await {
        Ok(Ok(())) => {
            checks.insert("database".into(), "UP".into());
        }
        Ok(Err(e)) => {
            error!(error = %e, "Database readiness check failed");
            checks.insert("database".into(), "DOWN".into());
            checks.insert("databaseError".into(), e.to_string().into());
            ready = false;
        }
        Err(_) => {
            error!(timeout = ?state.health.readiness, "Database readiness check timed out");
            checks.insert("database".into(), "DOWN".into());
            checks.insert(
                "databaseError".into(),
                format!("no response within {:?}", state.health.readiness).into(),
            );
            ready = false;
        }
    }

    match timeout(state.health.readiness, state.products.total_active_count()).await {
        Ok(Ok(_)) => {
            checks.insert("productService".into(), "UP".into());
        }
        Ok(Err(e)) => {
            error!(error = %e, "Product service readiness check failed");
            checks.insert("productService".into(), "DOWN".into());
            checks.insert("serviceError".into(), e.to_string().into());
            ready = false;
        }
        Err(_) => {
            error!(timeout = ?state.health.readiness, "Product service readiness check timed out");
            checks.insert("productService".into(), "DOWN".into());
            checks.insert(
                "serviceError".into(),
                format!("no response within {:?}", state.health.readiness).into(),
            );
            ready = false;
        }
    }

    let (status, label) = if ready {
        (StatusCode::OK, "UP")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "DOWN")
    };

    (
        status,
        Json(json!({
            "status": label,
            "timestamp": Utc::now(),
            "checks": checks,
        })),
    )
}

pub async fn startup(State(state): State<AppState>) -> HealthResponse {
    let failure = match timeout(state.health.startup, state.products.check_store()).await {
        Ok(Ok(())) => {
            return (
                StatusCode::OK,
                Json(json!({
                    "status": "UP",
                    "timestamp": Utc::now(),
                    "message": "Application started successfully",
                })),
            );
        }
        Ok(Err(e)) => e.to_string(),
        Err(_) => format!("no response within {:?}", state.health.startup),
    };

    error!(error = %failure, "Startup check failed");
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(json!({
            "status": "DOWN",
            "timestamp": Utc::now(),
            "message": "Database connection failed",
            "error": failure,
        })),
    )
}
