//! HTTP server for the dietboard API.
//!
//! Provides REST endpoints for sheet upload and aggregation. Rendering
//! (tables, PDF export) is handled entirely by the browser client.
//!
//! # API Endpoints
//!
//! | Method | Path              | Description                            |
//! |--------|-------------------|----------------------------------------|
//! | GET    | `/health`         | Health check                           |
//! | POST   | `/api/upload`     | Upload sheet, get all aggregated views |
//! | GET    | `/api/logs`       | SSE stream for real-time logs          |
//!
//! The upload accepts multipart form data: a required `file` part, an
//! optional `filters` part (a `FilterState` JSON document) and an optional
//! `duration` part (target days: 1, 7, 15 or 30).

use axum::{
    extract::Multipart,
    http::{header, Method, StatusCode},
    response::{sse::Event, Json, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::{convert::Infallible, net::SocketAddr, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;

use super::logs::LOG_BROADCASTER;
use super::types::{error_response, UploadResponse};
use crate::models::FilterState;
use crate::report::{build_report_from_bytes, ReportOptions};

/// Start the HTTP server
pub async fn start_server(port: u16) -> Result<(), Box<dyn std::error::Error>> {
    // Permissive CORS: the dashboard runs from its own origin in development
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE]);

    let app = Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/upload", post(upload_sheet))
        .route("/api/logs", get(sse_logs))
        .layer(cors);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    println!("Dietboard server running on http://localhost:{}", port);
    println!("   POST /api/upload - Upload diet-plan sheet");
    println!("   GET  /api/logs   - SSE log stream");
    println!("   GET  /health     - Health check");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "dietboard",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "upload": "POST /api/upload",
            "logs": "GET /api/logs (SSE)"
        }
    }))
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(entry) => {
            let json = serde_json::to_string(&entry).ok()?;
            Some(Ok(Event::default().data(json)))
        }
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Upload endpoint: sheet bytes plus optional filters and target duration
async fn upload_sheet(
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, (StatusCode, Json<Value>)> {
    let mut file_data: Option<Vec<u8>> = None;
    let mut file_name: Option<String> = None;
    let mut filters = FilterState::default();
    let mut target_days: Option<u32> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        bad_request(format!("Multipart error: {}", e))
    })? {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "file" => {
                file_name = field.file_name().map(|s| s.to_string());
                file_data = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|e| bad_request(format!("Read error: {}", e)))?
                        .to_vec(),
                );
            }
            "filters" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| bad_request(format!("Read error: {}", e)))?;
                filters = serde_json::from_str(&text)
                    .map_err(|e| bad_request(format!("Invalid filters: {}", e)))?;
            }
            "duration" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| bad_request(format!("Read error: {}", e)))?;
                let days = text
                    .trim()
                    .parse::<u32>()
                    .map_err(|_| bad_request(format!("Invalid duration: '{}'", text)))?;
                target_days = Some(days);
            }
            _ => {}
        }
    }

    let bytes = file_data.ok_or_else(|| bad_request("No file provided".to_string()))?;

    println!(
        "New upload: {} ({} bytes)",
        file_name.as_deref().unwrap_or("unknown"),
        bytes.len()
    );

    let options = ReportOptions {
        filters,
        target_days,
    };

    let report = build_report_from_bytes(&bytes, options).map_err(|e| {
        eprintln!("Report error: {}", e);
        (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(error_response(&e.to_string())),
        )
    })?;

    Ok(Json(UploadResponse::from(report)))
}

fn bad_request(message: String) -> (StatusCode, Json<Value>) {
    (StatusCode::BAD_REQUEST, Json(error_response(&message)))
}
