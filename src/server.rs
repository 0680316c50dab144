// Copyright 2025 coScene
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

// HTTP surface of the gateway

use crate::error::Error;
use crate::service::IngestionService;
use anyhow::Context;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use bytes::Bytes;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

type AppState = Arc<IngestionService>;

/// Build the application router
pub fn create_router(service: AppState) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/echo", post(echo_handler))
        .route("/log", post(log_handler))
        .route("/report", get(report_handler))
        .route("/records", get(records_handler))
        .route("/purge", get(purge_handler).post(purge_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

/// Bind `addr` and serve until Ctrl-C
pub async fn serve(addr: &str, service: AppState) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    run(listener, service).await
}

/// Serve on an already bound listener until Ctrl-C
pub async fn run(listener: TcpListener, service: AppState) -> anyhow::Result<()> {
    let local = listener.local_addr().context("Listener has no local address")?;
    info!(
        "Sensor gateway listening on http://{} (backend: {})",
        local,
        service.backend_type()
    );

    axum::serve(listener, create_router(service))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Sensor gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl-C, shutting down..."),
        Err(e) => {
            warn!("Unable to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

/// Error response: `{"error": msg}` with a status derived from the error kind
pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            err if err.is_client_error() => StatusCode::BAD_REQUEST,
            Error::Connection(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self.0);
        } else {
            warn!("Request rejected: {}", self.0);
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

async fn root_handler() -> Json<Value> {
    Json(json!({ "message": "Sensor Gateway API Server is running!" }))
}

async fn health_handler(State(service): State<AppState>) -> (StatusCode, Json<Value>) {
    let (backend, healthy) = service.health().await;
    let (status, label) = if healthy {
        (StatusCode::OK, "healthy")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "unhealthy")
    };
    (status, Json(json!({ "status": label, "backend": backend })))
}

async fn echo_handler(
    State(service): State<AppState>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    Ok(Json(service.echo(&body)?))
}

async fn log_handler(
    State(service): State<AppState>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    service.log(&body).await?;
    Ok(Json(json!({ "message": "Data logged successfully" })))
}

async fn report_handler(State(service): State<AppState>) -> Result<Response, ApiError> {
    let csv = service.report().await?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"report.csv\""),
        ],
        csv,
    )
        .into_response())
}

async fn records_handler(
    State(service): State<AppState>,
) -> Result<Json<Vec<crate::record::Record>>, ApiError> {
    Ok(Json(service.records().await?))
}

async fn purge_handler(State(service): State<AppState>) -> Result<Json<Value>, ApiError> {
    service.purge().await?;
    Ok(Json(json!({ "message": "Purge executed successfully" })))
}
