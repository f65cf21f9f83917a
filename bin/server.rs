// ============================================================================
// MHR Ownership - Web Server
// REST API over the validation engine with Axum

use anyhow::{Context, Result};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tower_http::cors::CorsLayer;
use tracing_subscriber::EnvFilter;

use mhr_ownership::{
    CurrentState, HistoryError, HistoryProvider, OwnerGroup, SqliteHistoryProvider,
    TransferRequest, ValidationConfig, ValidationEngine, ValidationReport,
};

const DEFAULT_DB_PATH: &str = "mhr.db";
const DEFAULT_ADDR: &str = "0.0.0.0:3000";

/// Shared application state
#[derive(Clone)]
struct AppState {
    provider: Arc<Mutex<SqliteHistoryProvider>>,
    engine: Arc<ValidationEngine>,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn failed(data: Option<T>, error: String) -> Self {
        Self {
            success: false,
            data,
            error: Some(error),
        }
    }
}

/// POST body for /api/homes/:mhr/validate
#[derive(Deserialize)]
struct ValidateBody {
    #[serde(default)]
    staff: bool,
    request: TransferRequest,
}

fn history_failure<T: Serialize>(mhr_number: &str, err: HistoryError) -> Response {
    let status = match err {
        HistoryError::NotFound { .. } => StatusCode::NOT_FOUND,
        _ => {
            tracing::error!(mhr_number, error = %err, "history load failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Json(ApiResponse::<T>::failed(None, err.to_string()))).into_response()
}

fn load_state(state: &AppState, mhr_number: &str) -> Result<CurrentState, HistoryError> {
    let provider = state
        .provider
        .lock()
        .map_err(|_| HistoryError::Inconsistent {
            mhr_number: mhr_number.to_string(),
            reason: "history store lock poisoned".to_string(),
        })?;
    let home = provider.load_home(mhr_number)?;
    Ok(CurrentState::project(&home, Utc::now()))
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/homes/:mhr/groups - Current owner groups
async fn get_groups(State(state): State<AppState>, Path(mhr_number): Path<String>) -> Response {
    match load_state(&state, &mhr_number) {
        Ok(current) => {
            let groups: Vec<OwnerGroup> = current.current_groups().to_vec();
            (StatusCode::OK, Json(ApiResponse::ok(groups))).into_response()
        }
        Err(err) => history_failure::<Vec<OwnerGroup>>(&mhr_number, err),
    }
}

/// POST /api/homes/:mhr/validate - Validate a registration request
async fn validate_registration(
    State(state): State<AppState>,
    Path(mhr_number): Path<String>,
    Json(body): Json<ValidateBody>,
) -> Response {
    let current = match load_state(&state, &mhr_number) {
        Ok(current) => current,
        Err(err) => return history_failure::<ValidationReport>(&mhr_number, err),
    };

    let report = state.engine.validate_registration(&body.request, &current, body.staff);

    if report.has_integrity_errors() {
        tracing::error!(mhr_number = %mhr_number, "stored ownership history is inconsistent");
        let message = report.message();
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::failed(Some(report), message)),
        )
            .into_response();
    }

    (StatusCode::OK, Json(ApiResponse::ok(report))).into_response()
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("🌐 MHR Ownership - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let db_path = std::env::var("MHR_DB_PATH").unwrap_or_else(|_| DEFAULT_DB_PATH.to_string());
    if !std::path::Path::new(&db_path).exists() {
        eprintln!("❌ Database not found at {}", db_path);
        eprintln!("   Run: mhr-validate import-legacy <legacy.csv> {}", db_path);
        eprintln!("   to import ownership history first.");
        std::process::exit(1);
    }

    let provider = SqliteHistoryProvider::open(&db_path)
        .with_context(|| format!("Failed to open database {}", db_path))?;
    println!("✓ Database opened: {}", db_path);

    let config = ValidationConfig::from_env()?;

    // Create shared state
    let state = AppState {
        provider: Arc::new(Mutex::new(provider)),
        engine: Arc::new(ValidationEngine::new(config)),
    };

    // Build API routes
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/homes/:mhr/groups", get(get_groups))
        .route("/homes/:mhr/validate", post(validate_registration))
        .with_state(state);

    let app = Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive());

    // Start server
    let addr = std::env::var("MHR_SERVER_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    println!("\n🚀 Server running on http://{}", addr);
    println!("   API: http://{}/api/health", addr);
    println!("\n   Press Ctrl+C to stop\n");
    tracing::info!(addr = %addr, "server started");

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
