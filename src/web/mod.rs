//! HTTP surface: the query page and its JSON API.
//!
//! Callers never see failure details. Rejected input gets the form
//! message; every other failure gets one generic message and the cause
//! goes to the log.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info};

use crate::service::ServiceLayer;

const PAGE: &str = include_str!("page.html");

pub const INVALID_QUERY_MESSAGE: &str = "Please enter a query of at least 2 characters.";
pub const GENERIC_ERROR_MESSAGE: &str =
    "An error occurred while processing your query. Please try again.";

struct AppState {
    service: ServiceLayer,
    started_at: Instant,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
}

#[derive(Debug, Serialize)]
struct StatusBody {
    name: &'static str,
    version: &'static str,
    llm: String,
    uptime_secs: u64,
}

/// Builds the router serving `/`, `/api/query` and `/api/status`.
pub fn router(service: ServiceLayer) -> Router {
    let state = Arc::new(AppState {
        service,
        started_at: Instant::now(),
    });
    Router::new()
        .route("/", get(index))
        .route("/api/query", post(query))
        .route("/api/status", get(status))
        .with_state(state)
}

async fn index() -> Html<&'static str> {
    Html(PAGE)
}

async fn query(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response {
    let Json(candidate) = match body {
        Ok(json) => json,
        Err(rejection) => {
            info!("Rejected request body: {rejection}");
            return failure(StatusCode::UNPROCESSABLE_ENTITY, INVALID_QUERY_MESSAGE);
        }
    };

    match state.service.process_value(&candidate).await {
        Ok(output) => (StatusCode::OK, Json(output)).into_response(),
        Err(e) if e.is_input_rejection() => {
            info!("Rejected query: {e}");
            failure(StatusCode::UNPROCESSABLE_ENTITY, INVALID_QUERY_MESSAGE)
        }
        Err(e) => {
            error!("Error processing query: {e}");
            failure(StatusCode::BAD_GATEWAY, GENERIC_ERROR_MESSAGE)
        }
    }
}

async fn status(State(state): State<Arc<AppState>>) -> Json<StatusBody> {
    Json(StatusBody {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        llm: state.service.llm_description(),
        uptime_secs: state.started_at.elapsed().as_secs(),
    })
}

fn failure(status: StatusCode, message: &'static str) -> Response {
    (status, Json(ErrorBody { error: message })).into_response()
}
