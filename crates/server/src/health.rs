use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use valvey_core::TableSizes;
use valvey_data::LoadIssue;

use crate::state::AppState;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DataCheck {
    pub status: &'static str,
    pub sizes: TableSizes,
    pub issues: Vec<LoadIssue>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub data: DataCheck,
    pub narrative: HealthCheck,
    pub checked_at: String,
}

pub fn router(state: AppState) -> Router {
    Router::new().route("/api/health", get(health)).with_state(state)
}

/// Ready when the price list and order history both loaded rows; narratives
/// being offline never degrades health.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let sizes = state.context.sizes();
    let ready = sizes.price_list > 0 && sizes.orders > 0;

    let narrative = if state.narrative.is_enabled() {
        HealthCheck { status: "ready", detail: "narrative client configured".to_string() }
    } else {
        HealthCheck { status: "disabled", detail: "local summaries only".to_string() }
    };

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: "valvey-server runtime initialized".to_string(),
        },
        data: DataCheck {
            status: if ready { "ready" } else { "degraded" },
            sizes,
            issues: state.load_issues.as_ref().clone(),
        },
        narrative,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}
