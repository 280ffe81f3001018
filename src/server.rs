//! Axum HTTP server: read-only policy lookups.
//!
//! All endpoints query a [`FundingSolver`] whose table is already computed.
//! The solver is shared as `Arc<FundingSolver>` across async handlers.
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/health` | Health check |
//! | GET | `/action` | Optimal action and value for `funding` + `fortnights_left` |
//! | GET | `/summary` | Problem dimensions and budgets |

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};

use crate::error::SolverError;
use crate::solver::FundingSolver;

pub type AppState = Arc<FundingSolver>;

type ApiResult = Result<Json<serde_json::Value>, (StatusCode, Json<serde_json::Value>)>;

pub fn create_router(solver: Arc<FundingSolver>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health_check))
        .route("/action", get(handle_get_action))
        .route("/summary", get(handle_get_summary))
        .layer(cors)
        .with_state(solver)
}

#[derive(Deserialize)]
struct ActionQuery {
    /// Comma-separated funding levels, e.g. `1,0,2`.
    funding: String,
    fortnights_left: u32,
}

fn error_response(status: StatusCode, msg: &str) -> (StatusCode, Json<serde_json::Value>) {
    (status, Json(serde_json::json!({ "error": msg })))
}

fn parse_funding(raw: &str) -> Option<Vec<u32>> {
    raw.split(',')
        .map(|part| part.trim().parse::<u32>().ok())
        .collect()
}

async fn handle_health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "OK" }))
}

async fn handle_get_action(
    State(solver): State<AppState>,
    Query(params): Query<ActionQuery>,
) -> ApiResult {
    let funding = parse_funding(&params.funding).ok_or_else(|| {
        error_response(
            StatusCode::BAD_REQUEST,
            "funding must be comma-separated non-negative integers",
        )
    })?;
    if funding.len() != solver.problem().venture_count() {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            &format!(
                "funding has {} levels, expected {}",
                funding.len(),
                solver.problem().venture_count()
            ),
        ));
    }

    match solver.query_entry(&funding, params.fortnights_left) {
        Ok(entry) => Ok(Json(serde_json::json!({
            "funding": funding,
            "fortnights_left": params.fortnights_left,
            "action": entry.action,
            "value": entry.value,
        }))),
        Err(e @ SolverError::NotFound { .. }) => {
            Err(error_response(StatusCode::NOT_FOUND, &e.to_string()))
        }
        Err(e) => Err(error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            &e.to_string(),
        )),
    }
}

async fn handle_get_summary(State(solver): State<AppState>) -> Json<serde_json::Value> {
    let problem = solver.problem();
    Json(serde_json::json!({
        "ventures": problem.venture_count(),
        "sale_prices": problem.sale_prices(),
        "fortnights": problem.fortnights,
        "max_manufacturing_funds": problem.max_manufacturing_funds,
        "max_additional_funding": problem.max_additional_funding,
        "states": solver.state_space().len(),
        "actions": solver.action_space().len(),
        "computed": solver.is_computed(),
    }))
}
