//! Anti-pattern analyzer service.
//!
//! Wraps the third-party static analyzer binary behind a single
//! `POST /analyze` endpoint and extracts the recommendation section of its
//! raw output.

mod error;
mod extraction;

use axum::{extract::State, routing::post, Json, Router};
use error::{ApiError, ApiResult};
use extraction::extract_recommendations;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::process::Command;
use tracing_subscriber::EnvFilter;

const ANALYZE_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct AnalyzeRequest {
    query: String,
}

#[derive(Debug, Serialize)]
struct AnalyzeResponse {
    status: &'static str,
    recommendations: String,
}

#[derive(Clone)]
struct AppState {
    jar_path: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let jar_path = std::env::var("ANALYZER_JAR_PATH")
        .unwrap_or_else(|_| "bigquery-antipattern-recognition.jar".to_string());
    let port: u16 =
        std::env::var("PORT").ok().and_then(|port| port.parse().ok()).unwrap_or(8080);

    let app = Router::new()
        .route("/analyze", post(analyze_query))
        .with_state(AppState { jar_path });

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    tracing::info!("antipattern-api listening on port {}", port);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn analyze_query(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> ApiResult<Json<AnalyzeResponse>> {
    // Long queries must not flood the log: keep the first 100 characters
    let short_query: String = request.query.chars().take(100).collect();
    let ellipsis = if request.query.chars().count() > 100 { "..." } else { "" };
    tracing::info!("Received analysis request. Query: {}{}", short_query, ellipsis);

    if !std::path::Path::new(&state.jar_path).exists() {
        tracing::error!("Analyzer JAR not found at {}", state.jar_path);
        return Err(ApiError::internal("Analyzer JAR file not found."));
    }

    tracing::info!("Executing analyzer...");
    let run = Command::new("java")
        .arg("-jar")
        .arg(&state.jar_path)
        .arg("--query")
        .arg(&request.query)
        .kill_on_drop(true)
        .output();

    let output = match tokio::time::timeout(ANALYZE_TIMEOUT, run).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => {
            tracing::error!("Failed to run analyzer: {}", e);
            return Err(ApiError::internal(format!("Failed to run analyzer: {}", e)));
        },
        Err(_) => {
            tracing::error!("Analysis timed out after {} seconds.", ANALYZE_TIMEOUT.as_secs());
            return Err(ApiError::Timeout);
        },
    };

    if !output.status.success() {
        tracing::warn!("Analyzer returned non-zero exit code: {:?}", output.status.code());
        tracing::debug!("Analyzer stderr: {}", String::from_utf8_lossy(&output.stderr));
    }

    let raw_output = String::from_utf8_lossy(&output.stdout);
    let recommendations = extract_recommendations(&raw_output);
    if recommendations == extraction::NO_FINDINGS_SENTINEL {
        tracing::info!("No anti-patterns found in the query.");
    } else {
        tracing::info!("Anti-patterns found and extracted successfully.");
    }

    Ok(Json(AnalyzeResponse { status: "success", recommendations }))
}
