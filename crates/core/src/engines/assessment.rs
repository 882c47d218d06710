//! Screen 2: adequacy verdict for each vendor quote.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{baseline_90, format_amount, percent_change, AnalysisEngine};
use crate::context::PricingContext;
use crate::errors::Degradation;
use crate::pricing::{ContractPricing, OptionInput};

/// Inadequate items spelled out in summaries.
const LISTED_INADEQUATE: usize = 5;
/// Inadequate share at or above which the batch needs improvement.
const INADEQUATE_RATE_LIMIT: f64 = 0.2;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Excellent,
    Acceptable,
    Inadequate,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Acceptable => "Acceptable",
            Self::Inadequate => "Inadequate",
        }
    }
}

/// Prices a quote is judged against.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VerdictInputs {
    pub quoted: Decimal,
    pub historical: Option<Decimal>,
    pub baseline_90: Option<Decimal>,
    pub contract: Option<Decimal>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub verdict: Verdict,
    /// Acceptable only because no baseline existed to compare against.
    pub no_baseline: bool,
}

impl Classification {
    pub fn label(&self) -> String {
        if self.no_baseline {
            format!("{} (no baseline)", self.verdict.as_str())
        } else {
            self.verdict.as_str().to_string()
        }
    }
}

/// First matching rule wins: Excellent, Acceptable, Inadequate, then the no-baseline fallback.
pub fn classify(inputs: VerdictInputs) -> Classification {
    let covers = |price: Option<Decimal>| price.is_some_and(|price| price >= inputs.quoted);

    let (verdict, no_baseline) = if covers(inputs.baseline_90) {
        (Verdict::Excellent, false)
    } else if covers(inputs.historical) || covers(inputs.contract) {
        (Verdict::Acceptable, false)
    } else if inputs.historical.is_some() || inputs.contract.is_some() {
        (Verdict::Inadequate, false)
    } else {
        (Verdict::Acceptable, true)
    };

    Classification { verdict, no_baseline }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AssessmentResult {
    pub no: u32,
    pub material_no: String,
    pub valve_type: String,
    pub description: String,
    pub quoted_price: Decimal,
    #[serde(flatten)]
    pub pricing: ContractPricing,
    pub historical_price: Option<Decimal>,
    pub baseline_90: Option<Decimal>,
    pub vendor: Option<String>,
    pub verdict: Verdict,
    pub no_baseline: bool,
    pub label: String,
    /// `(quote - historical) / historical * 100`.
    pub deviation_pct: Option<f64>,
    pub review_comment: Option<String>,
    pub degradations: Vec<Degradation>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerdictCounts {
    pub excellent: usize,
    pub acceptable: usize,
    pub inadequate: usize,
    /// Subset of `acceptable` decided by the no-baseline fallback.
    pub no_baseline: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AssessmentReport {
    pub results: Vec<AssessmentResult>,
    pub counts: VerdictCounts,
    pub total: usize,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct QuoteAssessmentEngine;

impl AnalysisEngine for QuoteAssessmentEngine {
    type Report = AssessmentReport;

    fn run(&self, context: &PricingContext) -> AssessmentReport {
        let mut report = AssessmentReport::default();

        for quote in &context.tables().quotes {
            let Some(code) = context.quote_valve_type(quote) else {
                continue;
            };

            let pricing = context.prices().contract_pricing(
                code,
                &OptionInput {
                    description: &quote.description,
                    internal_coating: quote.internal_coating.as_deref(),
                    external_coating: quote.external_coating.as_deref(),
                    spec: quote.spec.as_deref(),
                },
            );
            let history = context.history().best_match(code, Some(quote.description.as_str()));
            let historical_price = history.historical_price();
            let baseline = historical_price.map(baseline_90);

            let classification = classify(VerdictInputs {
                quoted: quote.quoted_price,
                historical: historical_price,
                baseline_90: baseline,
                contract: pricing.contract_price,
            });

            match classification.verdict {
                Verdict::Excellent => report.counts.excellent += 1,
                Verdict::Acceptable => report.counts.acceptable += 1,
                Verdict::Inadequate => report.counts.inadequate += 1,
            }
            if classification.no_baseline {
                report.counts.no_baseline += 1;
            }

            let mut degradations = Vec::new();
            if !pricing.mapped {
                degradations.push(Degradation::Unmapped);
            }
            if history.best.is_none() {
                degradations.push(Degradation::NoHistory);
            }

            report.results.push(AssessmentResult {
                no: quote.no,
                material_no: quote.material_no.clone(),
                valve_type: code.to_string(),
                description: quote.description.clone(),
                quoted_price: quote.quoted_price,
                pricing,
                historical_price,
                baseline_90: baseline,
                vendor: history.best.map(|order| order.vendor),
                verdict: classification.verdict,
                no_baseline: classification.no_baseline,
                label: classification.label(),
                deviation_pct: historical_price
                    .and_then(|historical| percent_change(quote.quoted_price, historical)),
                review_comment: quote.review_comment.clone(),
                degradations,
            });
        }

        report.total = report.results.len();
        report
    }
}

impl AssessmentReport {
    pub fn inadequate(&self) -> impl Iterator<Item = &AssessmentResult> {
        self.results.iter().filter(|result| result.verdict == Verdict::Inadequate)
    }

    pub fn inadequate_rate(&self) -> f64 {
        self.counts.inadequate as f64 / self.total.max(1) as f64
    }

    pub fn needs_improvement(&self) -> bool {
        self.inadequate_rate() >= INADEQUATE_RATE_LIMIT
    }

    /// Summary written from the numbers alone.
    pub fn local_summary(&self) -> String {
        let mut lines = Vec::new();
        if self.counts.inadequate > 0 {
            lines.push(format!("[inadequate {}]", self.counts.inadequate));
            for result in self.inadequate().take(LISTED_INADEQUATE) {
                lines.push(match result.deviation_pct {
                    Some(deviation) => format!(
                        "  - {}: quote {} vs order {} ({deviation:+.1}% over)",
                        result.material_no,
                        format_amount(Some(result.quoted_price)),
                        format_amount(result.historical_price),
                    ),
                    None => format!("  - {}: insufficient comparison basis", result.material_no),
                });
            }
        }
        lines.push(format!(
            "[overall] {} quotes, {} inadequate ({:.0}%) -> {}",
            self.total,
            self.counts.inadequate,
            self.inadequate_rate() * 100.0,
            if self.needs_improvement() { "needs improvement" } else { "acceptable" },
        ));
        lines.join("\n")
    }

    pub fn narrative_prompt(&self) -> String {
        let listed = self
            .inadequate()
            .map(|result| {
                let deviation = result
                    .deviation_pct
                    .map(|deviation| format!("{deviation:.1}%"))
                    .unwrap_or_else(|| "-".to_string());
                format!(
                    "{}: quote={}, recent order={}, deviation={deviation}",
                    result.material_no,
                    format_amount(Some(result.quoted_price)),
                    format_amount(result.historical_price),
                )
            })
            .collect::<Vec<_>>();
        let listed = if listed.is_empty() { "none".to_string() } else { listed.join("\n") };

        format!(
            "Vendor quote adequacy results.\nDistribution: excellent {}, acceptable {}, \
             inadequate {}\n\nInadequate items:\n{listed}\n\nExplain the likely causes and \
             propose a negotiation strategy.",
            self.counts.excellent, self.counts.acceptable, self.counts.inadequate
        )
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{classify, QuoteAssessmentEngine, Verdict, VerdictInputs};
    use crate::context::{PricingContext, Tables};
    use crate::domain::{OptionSurcharges, OrderRow, PriceListRow, QuoteRow};
    use crate::engines::AnalysisEngine;

    fn price(value: i64) -> Option<Decimal> {
        Some(Decimal::from(value))
    }

    fn inputs(
        historical: Option<Decimal>,
        baseline: Option<Decimal>,
        contract: Option<Decimal>,
    ) -> VerdictInputs {
        VerdictInputs { quoted: Decimal::from(100), historical, baseline_90: baseline, contract }
    }

    #[test]
    fn baseline_at_or_above_quote_is_excellent_regardless_of_other_prices() {
        let result = classify(VerdictInputs {
            quoted: Decimal::from(95),
            historical: price(10),
            baseline_90: price(95),
            contract: price(1),
        });
        assert_eq!(result.verdict, Verdict::Excellent);
    }

    #[test]
    fn historical_equal_to_quote_is_acceptable() {
        let result = classify(inputs(price(100), None, None));
        assert_eq!(result.verdict, Verdict::Acceptable);
        assert!(!result.no_baseline);
    }

    #[test]
    fn contract_alone_can_make_a_quote_acceptable() {
        let result = classify(inputs(price(80), price(72), price(120)));
        assert_eq!(result.verdict, Verdict::Acceptable);
    }

    #[test]
    fn exceeding_every_baseline_is_inadequate() {
        let result = classify(inputs(price(80), price(72), price(80)));
        assert_eq!(result.verdict, Verdict::Inadequate);
    }

    #[test]
    fn missing_baselines_fall_back_to_acceptable_no_baseline() {
        let result = classify(inputs(None, None, None));
        assert_eq!(result.verdict, Verdict::Acceptable);
        assert!(result.no_baseline);
        assert_eq!(result.label(), "Acceptable (no baseline)");
    }

    fn order(material_no: &str, code: &str, description: &str, amount: i64) -> OrderRow {
        OrderRow {
            material_no: material_no.to_string(),
            valve_type: Some(code.to_string()),
            description: description.to_string(),
            vendor: "Vendor A".to_string(),
            order_date: chrono::NaiveDate::from_ymd_opt(2024, 4, 1),
            quantity: Some(Decimal::ONE),
            amount: price(amount),
            uom: None,
            valve_no: None,
            total_weight_tn: None,
            unit_weight_kg: None,
        }
    }

    fn quote(no: u32, material_no: &str, quoted: i64) -> QuoteRow {
        QuoteRow {
            no,
            material_no: material_no.to_string(),
            description: "GATE O-T".to_string(),
            quoted_price: Decimal::from(quoted),
            quantity: None,
            internal_coating: Some("EPOXY".to_string()),
            external_coating: Some("NO".to_string()),
            spec: None,
            review_comment: None,
        }
    }

    fn context() -> PricingContext {
        context_with_quotes(vec![
            quote(1, "Q999MAT-1", 850),
            quote(2, "Q999MAT-1", 1_500),
            quote(3, "Q999MAT-404", 10),
        ])
    }

    /// Contract price 1,000, last order 1,000, 90% baseline 900 for `MAT-1`.
    fn context_with_quotes(quotes: Vec<QuoteRow>) -> PricingContext {
        PricingContext::new(Tables {
            price_list: vec![PriceListRow {
                valve_type: "VGA".to_string(),
                base_price: price(900),
                reference_quantity: price(1),
                surcharges: OptionSurcharges {
                    internal_coating: price(40),
                    external_coating: price(60),
                    ..OptionSurcharges::default()
                },
            }],
            orders: vec![order("H101MAT-1", "VGA1", "GATE O-T", 1_000)],
            quotes,
            ..Tables::default()
        })
    }

    #[test]
    fn engine_skips_quotes_without_valve_type_and_counts_verdicts() {
        let report = QuoteAssessmentEngine.run(&context());

        assert_eq!(report.total, 2);
        assert_eq!(report.counts.excellent, 1);
        assert_eq!(report.counts.inadequate, 1);
        assert_eq!(report.results[0].pricing.contract_price, price(1_000));
        assert_eq!(report.results[1].deviation_pct, Some(50.0));
    }

    #[test]
    fn local_summary_lists_inadequate_items_and_judgement() {
        let summary = QuoteAssessmentEngine.run(&context()).local_summary();

        assert!(summary.contains("[inadequate 1]"));
        assert!(summary.contains("Q999MAT-1: quote 1,500 vs order 1,000 (+50.0% over)"));
        assert!(summary.ends_with("-> needs improvement"));
    }

    #[test]
    fn local_summary_lists_at_most_five_inadequate_items() {
        let mut quotes: Vec<QuoteRow> = (1..=6).map(|no| quote(no, "Q999MAT-1", 1_500)).collect();
        quotes.push(quote(7, "Q999MAT-1", 850));
        let report = QuoteAssessmentEngine.run(&context_with_quotes(quotes));

        assert_eq!(report.counts.inadequate, 6);
        let summary = report.local_summary();
        assert!(summary.contains("[inadequate 6]"));
        assert_eq!(summary.lines().filter(|line| line.starts_with("  - ")).count(), 5);
    }

    #[test]
    fn inadequate_rate_of_exactly_twenty_percent_needs_improvement() {
        let mut quotes: Vec<QuoteRow> = (1..=4).map(|no| quote(no, "Q999MAT-1", 850)).collect();
        quotes.push(quote(5, "Q999MAT-1", 1_500));
        let report = QuoteAssessmentEngine.run(&context_with_quotes(quotes));

        assert_eq!(report.total, 5);
        assert_eq!(report.counts.inadequate, 1);
        assert!(report.needs_improvement());
        let summary = report.local_summary();
        assert!(summary.ends_with("5 quotes, 1 inadequate (20%) -> needs improvement"));
    }
}
