//! Screen 1: recommended contract price per procurement request.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{baseline_90, format_amount, AnalysisEngine};
use crate::context::PricingContext;
use crate::errors::Degradation;
use crate::history::{newest_first, MatchedOrder};
use crate::pricing::{ContractPricing, OptionInput};

/// Rows included in the narrative prompt.
const PROMPT_ROWS: usize = 20;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationResult {
    pub no: usize,
    pub valve_type: String,
    pub description: String,
    pub quantity: Decimal,
    pub uom: String,
    pub valve_no: Option<String>,
    pub total_weight_tn: Option<Decimal>,
    pub unit_weight_kg: Option<Decimal>,
    pub weight_unit: Option<String>,
    #[serde(flatten)]
    pub pricing: ContractPricing,
    pub recent_order: Option<MatchedOrder>,
    pub historical_price: Option<Decimal>,
    pub baseline_90: Option<Decimal>,
    pub degradations: Vec<Degradation>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationSummary {
    pub total: usize,
    pub mapped: usize,
    pub unmapped: usize,
    pub with_history: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationReport {
    pub results: Vec<RecommendationResult>,
    pub summary: RecommendationSummary,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct RecommendationEngine;

impl AnalysisEngine for RecommendationEngine {
    type Report = RecommendationReport;

    fn run(&self, context: &PricingContext) -> RecommendationReport {
        let mut requests: Vec<_> = context.history().representatives().collect();
        requests.sort_by(|(left_code, left), (right_code, right)| {
            newest_first(left.order_date, right.order_date).then_with(|| left_code.cmp(right_code))
        });

        let mut report = RecommendationReport::default();
        for (position, (code, request)) in requests.into_iter().enumerate() {
            let pricing = context
                .prices()
                .contract_pricing(code, &OptionInput::description(&request.description));
            let history = context.history().best_match(code, Some(request.description.as_str()));
            let historical_price = history.historical_price();

            let mut degradations = Vec::new();
            if !pricing.mapped {
                degradations.push(Degradation::Unmapped);
            }
            if history.best.is_none() {
                degradations.push(Degradation::NoHistory);
            }

            let weight_unit = if request.total_weight_tn.is_some() {
                Some("TN".to_string())
            } else {
                request.unit_weight_kg.map(|_| "kg".to_string())
            };

            report.summary.total += 1;
            if pricing.mapped {
                report.summary.mapped += 1;
            } else {
                report.summary.unmapped += 1;
            }
            if historical_price.is_some() {
                report.summary.with_history += 1;
            }

            report.results.push(RecommendationResult {
                no: position + 1,
                valve_type: code.to_string(),
                description: request.description.clone(),
                quantity: request.quantity.unwrap_or(Decimal::ONE),
                uom: request.uom.clone().unwrap_or_else(|| "EA".to_string()),
                valve_no: request.valve_no.clone(),
                total_weight_tn: request.total_weight_tn,
                unit_weight_kg: request.unit_weight_kg,
                weight_unit,
                pricing,
                recent_order: history.best,
                historical_price,
                baseline_90: historical_price.map(baseline_90),
                degradations,
            });
        }

        report
    }
}

impl RecommendationReport {
    /// Summary written from the numbers alone.
    pub fn local_summary(&self) -> String {
        let summary = &self.summary;
        let mut lines = vec![format!(
            "[coverage] {} requests: {} mapped to the price list, {} unmapped, {} with order history",
            summary.total, summary.mapped, summary.unmapped, summary.with_history
        )];

        let below_history = self
            .results
            .iter()
            .filter(|result| match (result.pricing.contract_price, result.historical_price) {
                (Some(contract), Some(historical)) => contract < historical,
                _ => false,
            })
            .count();
        lines.push(format!(
            "[contract vs history] contract price is below the last order price for {below_history} requests"
        ));
        lines.push(
            "[recommendation] negotiate from the 90% baseline where history exists".to_string(),
        );
        lines.join("\n")
    }

    pub fn narrative_prompt(&self) -> String {
        let rows = self
            .results
            .iter()
            .take(PROMPT_ROWS)
            .map(|result| {
                format!(
                    "{}: contract={}, recent order={}, 90% baseline={}",
                    result.valve_type,
                    format_amount(result.pricing.contract_price),
                    format_amount(result.historical_price),
                    format_amount(result.baseline_90),
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "Per-request price analysis for valve purchasing. Summarise the recommended unit price \
             and its basis in one line per request.\n\n{rows}"
        )
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use super::RecommendationEngine;
    use crate::context::{PricingContext, Tables};
    use crate::domain::{OptionSurcharges, OrderRow, PriceListRow};
    use crate::engines::AnalysisEngine;
    use crate::errors::Degradation;
    use crate::history::MatchTier;

    fn order(code: &str, day: u32, description: &str, amount: i64) -> OrderRow {
        OrderRow {
            material_no: format!("H101{code}"),
            valve_type: Some(code.to_string()),
            description: description.to_string(),
            vendor: "Vendor A".to_string(),
            order_date: NaiveDate::from_ymd_opt(2024, 5, day),
            quantity: Some(Decimal::from(2)),
            amount: Some(Decimal::from(amount)),
            uom: None,
            valve_no: Some("V-1".to_string()),
            total_weight_tn: None,
            unit_weight_kg: Some(Decimal::from(12)),
        }
    }

    fn context() -> PricingContext {
        PricingContext::new(Tables {
            price_list: vec![PriceListRow {
                valve_type: "VGA".to_string(),
                base_price: Some(Decimal::from(2_000)),
                reference_quantity: Some(Decimal::from(2)),
                surcharges: OptionSurcharges {
                    lock: Some(Decimal::from(150)),
                    ..OptionSurcharges::default()
                },
            }],
            orders: vec![
                order("VGA1", 1, "GATE LOCK", 1_500),
                order("VGA1", 20, "GATE LOCK", 1_400),
                order("VGZ1", 10, "CHECK", 800),
            ],
            ..Tables::default()
        })
    }

    #[test]
    fn one_row_per_code_most_recent_first() {
        let report = RecommendationEngine.run(&context());

        assert_eq!(report.results.len(), 2);
        assert_eq!(report.results[0].valve_type, "VGA1");
        assert_eq!(report.results[0].no, 1);
        assert_eq!(report.results[1].valve_type, "VGZ1");
    }

    #[test]
    fn mapped_request_carries_contract_and_baseline() {
        let report = RecommendationEngine.run(&context());
        let mapped = &report.results[0];

        assert_eq!(mapped.pricing.contract_price, Some(Decimal::from(1_150)));
        assert_eq!(mapped.historical_price, Some(Decimal::from(1_400)));
        assert_eq!(mapped.baseline_90, Some(Decimal::from(1_260)));
        assert_eq!(
            mapped.recent_order.as_ref().map(|order| order.tier),
            Some(MatchTier::TypeAndDescription)
        );
        assert_eq!(mapped.uom, "EA");
        assert_eq!(mapped.weight_unit.as_deref(), Some("kg"));
    }

    #[test]
    fn unmapped_request_is_kept_with_null_prices() {
        let report = RecommendationEngine.run(&context());
        let unmapped = &report.results[1];

        assert!(!unmapped.pricing.mapped);
        assert_eq!(unmapped.pricing.contract_price, None);
        assert_eq!(unmapped.degradations, vec![Degradation::Unmapped]);
        assert_eq!(report.summary.mapped, 1);
        assert_eq!(report.summary.unmapped, 1);
    }

    #[test]
    fn rerun_is_byte_identical() {
        let context = context();
        let first = serde_json::to_string(&RecommendationEngine.run(&context)).expect("json");
        let second = serde_json::to_string(&RecommendationEngine.run(&context)).expect("json");
        assert_eq!(first, second);
    }
}
