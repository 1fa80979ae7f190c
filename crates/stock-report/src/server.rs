//! HTTP surface
//!
//! - `GET /report/:ticker?recreate=&type=` streams progress as SSE
//!   (`MESSAGE`, then one `COMPLETED` carrying the report JSON or `ERROR`)
//! - `DELETE /report/:ticker` purges the entity
//! - `GET /health` liveness

use crate::error::{ReportError, Result};
use crate::service::{PurgeSummary, ReportService};
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
    routing::get,
};
use futures::stream::{Stream, StreamExt};
use report_core::{ProgressEvent, ReportKind};
use serde::Deserialize;
use serde_json::json;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    #[serde(default)]
    pub recreate: bool,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// Error body returned before any stream is opened
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<ReportError> for ApiError {
    fn from(err: ReportError) -> Self {
        let status = match err {
            ReportError::InvalidEntity(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

pub fn router(service: ReportService) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/report/:ticker", get(stream_report).delete(purge_report))
        .with_state(service)
        .layer(TraceLayer::new_for_http())
}

/// Bind `addr` and serve until Ctrl-C
pub async fn serve(service: ReportService, addr: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, router(service.clone()))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    service.shutdown();
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn stream_report(
    State(service): State<ReportService>,
    Path(ticker): Path<String>,
    Query(query): Query<ReportQuery>,
) -> std::result::Result<Sse<impl Stream<Item = std::result::Result<Event, Infallible>>>, ApiError>
{
    let kind = match query.kind.as_deref() {
        Some(raw) => raw
            .parse::<ReportKind>()
            .map_err(|e| ApiError::bad_request(e.to_string()))?,
        None => ReportKind::default(),
    };
    info!(%ticker, %kind, recreate = query.recreate, "Report requested");

    let progress = service.get_or_generate(&ticker, kind, query.recreate)?;
    let events = progress.map(|event| Ok(to_sse(&event)));

    Ok(Sse::new(events).keep_alive(
        KeepAlive::new()
            .interval(KEEP_ALIVE_INTERVAL)
            .text("keep-alive"),
    ))
}

async fn purge_report(
    State(service): State<ReportService>,
    Path(ticker): Path<String>,
) -> std::result::Result<Json<PurgeSummary>, ApiError> {
    Ok(Json(service.purge(&ticker).await?))
}

fn to_sse(event: &ProgressEvent) -> Event {
    let sse = Event::default().event(event.event_name());
    match event {
        // SSE cannot carry carriage returns
        ProgressEvent::Message(text) | ProgressEvent::Error(text) => {
            sse.data(text.replace('\r', ""))
        }
        ProgressEvent::Completed(report) => match serde_json::to_string(report) {
            Ok(body) => sse.data(body),
            Err(e) => {
                warn!("Failed to serialize report: {e}");
                Event::default()
                    .event("ERROR")
                    .data(format!("failed to serialize report: {e}"))
            }
        },
    }
}
