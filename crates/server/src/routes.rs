//! Screen and data endpoints.

use std::collections::BTreeMap;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info, warn};
use uuid::Uuid;

use valvey_agent::{Narrative, NarrativeSource};
use valvey_core::engines::format_amount;
use valvey_core::{
    AnalysisEngine, ApplicationError, AssessmentReport, Degradation, InterfaceError,
    MarketLagReport, MatchTier, QuoteAssessmentEngine, RecommendationEngine, RecommendationReport,
};
use valvey_data::Dataset;

use crate::state::AppState;

/// Price-list rows returned by the data endpoint.
const PRICE_TABLE_PREVIEW_ROWS: usize = 100;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/screen1/analyze", post(recommend))
        .route("/api/screen2/analyze", post(assess))
        .route("/api/screen3/analyze", post(market_lag))
        .route("/api/data/{dataset}", get(dataset))
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct ScreenResponse<T: Serialize> {
    success: bool,
    correlation_id: String,
    logs: Vec<String>,
    #[serde(flatten)]
    report: T,
    narrative: Narrative,
}

#[derive(Debug, Serialize)]
struct AssessmentPayload {
    #[serde(flatten)]
    report: AssessmentReport,
    inadequate_rate: f64,
    needs_improvement: bool,
}

#[derive(Debug, Serialize)]
struct DataResponse {
    success: bool,
    dataset: String,
    total: usize,
    rows: Value,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    error: &'static str,
    detail: String,
    correlation_id: String,
}

/// Axum response wrapper for interface errors.
#[derive(Debug)]
pub struct ApiError(pub InterfaceError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            InterfaceError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = ErrorBody {
            success: false,
            error: self.0.user_message(),
            detail: self.0.to_string(),
            correlation_id: self.0.correlation_id().to_string(),
        };
        (status, Json(body)).into_response()
    }
}

fn correlation_id() -> String {
    Uuid::new_v4().to_string()
}

/// One line per distinct degradation with the number of rows it affected.
fn degradation_logs<'a>(degradations: impl IntoIterator<Item = &'a Degradation>) -> Vec<String> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for degradation in degradations {
        *counts.entry(degradation.describe()).or_default() += 1;
    }
    counts.into_iter().map(|(description, rows)| format!("{description} ({rows})")).collect()
}

fn narrative_log(narrative: &Narrative) -> String {
    match narrative.source {
        NarrativeSource::Generated => "narrative: generated".to_string(),
        NarrativeSource::Local => "narrative: local summary".to_string(),
    }
}

async fn recommend(State(state): State<AppState>) -> Json<ScreenResponse<RecommendationReport>> {
    let correlation_id = correlation_id();
    let context = state.context.as_ref();
    let report = RecommendationEngine.run(context);
    let summary = report.summary;

    info!(
        event_name = "screen.recommendation.completed",
        correlation_id = %correlation_id,
        total = summary.total,
        mapped = summary.mapped,
        unmapped = summary.unmapped,
        "recommendation analysis completed"
    );

    let mut logs = vec![
        format!("price list: {} valve types indexed", context.prices().len()),
        format!("order history: {} valve types", context.history().len()),
        format!(
            "analyzed {} valve types: {} mapped, {} unmapped",
            summary.total, summary.mapped, summary.unmapped
        ),
        format!("{} valve types have historical orders", summary.with_history),
    ];
    for tier in [MatchTier::TypeAndDescription, MatchTier::TypeOnly] {
        let matched = report
            .results
            .iter()
            .filter(|result| result.recent_order.as_ref().is_some_and(|order| order.tier == tier))
            .count();
        logs.push(format!("history match {}: {matched}", tier.label()));
    }
    logs.extend(degradation_logs(report.results.iter().flat_map(|result| &result.degradations)));

    let narrative = state
        .narrative
        .narrate(&correlation_id, &report.narrative_prompt(), || report.local_summary())
        .await;
    logs.push(narrative_log(&narrative));

    Json(ScreenResponse { success: true, correlation_id, logs, report, narrative })
}

async fn assess(State(state): State<AppState>) -> Json<ScreenResponse<AssessmentPayload>> {
    let correlation_id = correlation_id();
    let context = state.context.as_ref();
    let report = QuoteAssessmentEngine.run(context);
    let counts = report.counts;
    let inadequate_rate = report.inadequate_rate();

    info!(
        event_name = "screen.assessment.completed",
        correlation_id = %correlation_id,
        total = report.total,
        excellent = counts.excellent,
        acceptable = counts.acceptable,
        inadequate = counts.inadequate,
        "quote assessment completed"
    );

    let mut logs = vec![
        format!(
            "quotes: {} rows, {} resolved to a valve type",
            context.tables().quotes.len(),
            report.total
        ),
        format!(
            "excellent {} / acceptable {} ({} without baseline) / inadequate {}",
            counts.excellent, counts.acceptable, counts.no_baseline, counts.inadequate
        ),
        format!("inadequate rate: {:.1}%", inadequate_rate * 100.0),
    ];
    for result in report.inadequate().take(5) {
        logs.push(format!(
            "inadequate #{} {}: quoted {} vs historical {}",
            result.no,
            result.valve_type,
            format_amount(Some(result.quoted_price)),
            format_amount(result.historical_price)
        ));
    }
    logs.extend(degradation_logs(report.results.iter().flat_map(|result| &result.degradations)));

    let narrative = state
        .narrative
        .narrate(&correlation_id, &report.narrative_prompt(), || report.local_summary())
        .await;
    logs.push(narrative_log(&narrative));

    let needs_improvement = report.needs_improvement();
    let payload = AssessmentPayload { report, inadequate_rate, needs_improvement };
    Json(ScreenResponse { success: true, correlation_id, logs, report: payload, narrative })
}

async fn market_lag(State(state): State<AppState>) -> Json<ScreenResponse<MarketLagReport>> {
    let correlation_id = correlation_id();
    let report = state.market_lag.run(state.context.as_ref());
    let summary = &report.summary;

    info!(
        event_name = "screen.market_lag.completed",
        correlation_id = %correlation_id,
        family = %summary.family_prefix,
        total_orders = summary.total_orders,
        bad_months = report.outcome_counts.bad,
        "market lag analysis completed"
    );

    let mut logs = vec![
        format!("{} family: {} qualifying orders", summary.family_prefix, summary.total_orders),
        format!("vendors: {}", summary.vendors.join(", ")),
        format!("primary vendor: {}", summary.primary_vendor.as_deref().unwrap_or("-")),
        format!("commodity months: {}", report.commodities.len()),
        format!(
            "good {} / normal {} / bad {}",
            report.outcome_counts.good, report.outcome_counts.normal, report.outcome_counts.bad
        ),
    ];
    logs.extend(degradation_logs(
        report.trend_points.iter().flat_map(|point| &point.degradations),
    ));

    let narrative = state
        .narrative
        .narrate(&correlation_id, &report.narrative_prompt(), || report.local_summary())
        .await;
    logs.push(narrative_log(&narrative));

    Json(ScreenResponse { success: true, correlation_id, logs, report, narrative })
}

async fn dataset(
    Path(name): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<DataResponse>, ApiError> {
    let correlation_id = correlation_id();
    let tables = state.context.tables();

    let source = match name.as_str() {
        "price-table" => Some((Dataset::PriceTable, tables.price_list.is_empty())),
        "quotes" => Some((Dataset::Quotes, tables.quotes.is_empty())),
        "commodity" => Some((Dataset::Commodities, tables.commodities.is_empty())),
        _ => None,
    };
    if let Some((dataset, true)) = source {
        if let Some(issue) = state.load_issues.iter().find(|issue| issue.dataset == dataset) {
            warn!(
                event_name = "data.request.table_unavailable",
                correlation_id = %correlation_id,
                dataset = dataset.as_str(),
                issue = %issue.message,
                "requested table failed to load"
            );
            return Err(ApiError(
                ApplicationError::DataLoad(format!("{dataset}: {}", issue.message))
                    .into_interface(correlation_id),
            ));
        }
    }

    let encoded = match name.as_str() {
        "price-table" => {
            let preview: Vec<_> = tables.price_list.iter().take(PRICE_TABLE_PREVIEW_ROWS).collect();
            serde_json::to_value(preview).map(|rows| (tables.price_list.len(), rows))
        }
        "quotes" => serde_json::to_value(&tables.quotes).map(|rows| (tables.quotes.len(), rows)),
        "commodity" => {
            serde_json::to_value(&tables.commodities).map(|rows| (tables.commodities.len(), rows))
        }
        _ => {
            info!(
                event_name = "data.request.unknown_dataset",
                correlation_id = %correlation_id,
                dataset = %name,
                "unknown dataset requested"
            );
            return Err(ApiError(
                ApplicationError::UnknownDataset(name.clone()).into_interface(correlation_id),
            ));
        }
    };

    let (total, rows) = encoded.map_err(|source| {
        error!(
            event_name = "data.request.encode_failed",
            correlation_id = %correlation_id,
            error = %source,
            "dataset could not be encoded"
        );
        ApiError(InterfaceError::Internal {
            message: source.to_string(),
            correlation_id: correlation_id.clone(),
        })
    })?;

    Ok(Json(DataResponse { success: true, dataset: name, total, rows }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use serde_json::Value;
    use tempfile::TempDir;
    use tower::ServiceExt;
    use valvey_agent::{LlmClient, LlmError, NarrativeService};
    use valvey_core::{MarketLagEngine, PricingContext};
    use valvey_data::{load_tables, write_demo_dataset};

    use super::router;
    use crate::state::AppState;

    struct CannedClient;

    #[async_trait]
    impl LlmClient for CannedClient {
        async fn complete(&self, _prompt: &str) -> Result<String, LlmError> {
            Ok("vendor pricing tracks the market".to_string())
        }
    }

    fn demo_router(narrative: NarrativeService) -> (TempDir, Router) {
        let dir = TempDir::new().expect("tempdir");
        write_demo_dataset(dir.path()).expect("demo dataset");
        let report = load_tables(dir.path());
        let state = AppState::new(
            PricingContext::new(report.tables),
            MarketLagEngine::default(),
            narrative,
            report.issues,
        );
        (dir, router(state))
    }

    async fn call(router: Router, method: &str, uri: &str) -> (StatusCode, Value) {
        let request =
            Request::builder().method(method).uri(uri).body(Body::empty()).expect("request");
        let response = router.oneshot(request).await.expect("oneshot");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        (status, serde_json::from_slice(&bytes).expect("json body"))
    }

    #[tokio::test]
    async fn screen1_returns_results_logs_and_local_narrative() {
        let (_dir, router) = demo_router(NarrativeService::disabled());
        let (status, body) = call(router, "POST", "/api/screen1/analyze").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["summary"]["total"], 5);
        assert_eq!(body["results"].as_array().map(Vec::len), Some(5));
        assert_eq!(body["narrative"]["source"], "local");
        assert!(body["logs"].as_array().is_some_and(|logs| !logs.is_empty()));
        assert!(body["correlation_id"].as_str().is_some_and(|id| id.len() == 36));
    }

    #[tokio::test]
    async fn screen2_reports_counts_and_generated_narrative() {
        let service = NarrativeService::new(Some(Arc::new(CannedClient)));
        let (_dir, router) = demo_router(service);
        let (status, body) = call(router, "POST", "/api/screen2/analyze").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 3);
        assert!(body["counts"]["excellent"].is_u64());
        assert!(body["inadequate_rate"].is_f64());
        assert_eq!(body["narrative"]["source"], "generated");
        assert_eq!(body["narrative"]["text"], "vendor pricing tracks the market");
    }

    #[tokio::test]
    async fn screen3_returns_trend_points_for_each_month() {
        let (_dir, router) = demo_router(NarrativeService::disabled());
        let (status, body) = call(router, "POST", "/api/screen3/analyze").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["trend_points"].as_array().map(Vec::len), Some(12));
        assert_eq!(body["summary"]["primary_vendor"], "Hanil Valve");
        assert!(body["trend_points"][0]["gap_pct"].is_null());
    }

    #[tokio::test]
    async fn data_endpoint_serves_known_datasets() {
        let (_dir, router) = demo_router(NarrativeService::disabled());
        let (status, body) = call(router.clone(), "GET", "/api/data/price-table").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 4);

        let (status, body) = call(router, "GET", "/api/data/commodity").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["rows"].as_array().map(Vec::len), Some(12));
    }

    #[tokio::test]
    async fn screen1_logs_match_tiers_and_degradations() {
        let (_dir, router) = demo_router(NarrativeService::disabled());
        let (_, body) = call(router, "POST", "/api/screen1/analyze").await;

        let logs: Vec<&str> = body["logs"]
            .as_array()
            .map(|logs| logs.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();
        let has_line = |prefix: &str| logs.iter().any(|line| line.starts_with(prefix));
        assert!(has_line("history match tier 1 (type+description): "));
        assert!(has_line("history match tier 2 (type only): "));
        assert!(logs.contains(&"valve type is not in the price list (1)"));
    }

    #[tokio::test]
    async fn table_that_failed_to_load_is_unavailable() {
        let dir = TempDir::new().expect("tempdir");
        let report = load_tables(dir.path());
        let state = AppState::new(
            PricingContext::new(report.tables),
            MarketLagEngine::default(),
            NarrativeService::disabled(),
            report.issues,
        );
        let (status, body) = call(router(state), "GET", "/api/data/commodity").await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["success"], false);
        assert!(body["detail"].as_str().is_some_and(|detail| detail.contains("commodities")));
    }

    #[tokio::test]
    async fn unknown_dataset_is_a_bad_request() {
        let (_dir, router) = demo_router(NarrativeService::disabled());
        let (status, body) = call(router, "GET", "/api/data/invoices").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert!(body["detail"].as_str().is_some_and(|detail| detail.contains("invoices")));
    }
}
