use actix_web::{http::StatusCode, web, HttpResponse, Responder};
use validator::Validate;
use crate::core::{EngineState, MatchingEngine};
use crate::error::MatchError;
use crate::models::{ErrorResponse, FindMatchesRequest, FindMatchesResponse, HealthResponse};
use std::sync::Arc;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<MatchingEngine>,
    pub default_limit: usize,
    pub max_limit: usize,
}

/// Configure all match-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/matches/find", web::post().to(find_matches));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let engine_state = state.engine.state();
    let status = if engine_state == EngineState::Ready { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
        engine_state,
        metrics: state.engine.metrics(),
    })
}

/// Find matches endpoint
///
/// POST /api/v1/matches/find
///
/// Request body:
/// ```json
/// {
///   "criteria": { "blockchain": "ethereum", "projectDescription": "...", ... },
///   "candidates": [{ "id": "string", "description": "...", ... }],
///   "limit": 10
/// }
/// ```
async fn find_matches(
    state: web::Data<AppState>,
    req: web::Json<FindMatchesRequest>,
) -> impl Responder {
    // Validate request
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for find_matches request: {}", errors);
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    let limit = req
        .limit
        .unwrap_or(state.default_limit)
        .min(state.max_limit);

    tracing::info!(
        "Finding matches for {} project on {} among {} candidates, limit: {}",
        req.criteria.project_type,
        req.criteria.blockchain,
        req.candidates.len(),
        limit
    );

    let mut matches = match state.engine.find_matches(&req.criteria, &req.candidates).await {
        Ok(matches) => matches,
        Err(e) => return error_response(&e),
    };
    matches.truncate(limit);

    let response = FindMatchesResponse {
        matches,
        total_candidates: req.candidates.len(),
    };

    tracing::info!(
        "Returning {} matches (from {} candidates)",
        response.matches.len(),
        response.total_candidates
    );

    HttpResponse::Ok().json(response)
}

/// Map an engine error onto an HTTP status and error body
pub fn status_for(err: &MatchError) -> StatusCode {
    match err {
        MatchError::NotInitialized | MatchError::Disposed => StatusCode::SERVICE_UNAVAILABLE,
        MatchError::FatalBatch(_) => StatusCode::UNPROCESSABLE_ENTITY,
        MatchError::Cancelled(_) => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(err: &MatchError) -> HttpResponse {
    let status = status_for(err);
    if status.is_server_error() {
        tracing::error!("find_matches failed: {}", err);
    }

    HttpResponse::build(status).json(ErrorResponse {
        error: err.kind().to_string(),
        message: err.to_string(),
        status_code: status.as_u16(),
    })
}
