pub mod assessment;
pub mod market_lag;
pub mod recommendation;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::context::PricingContext;

pub use assessment::{AssessmentReport, AssessmentResult, QuoteAssessmentEngine, Verdict};
pub use market_lag::{MarketLagEngine, MarketLagReport, MarketLagSettings, TrendOutcome, TrendPoint};
pub use recommendation::{RecommendationEngine, RecommendationReport, RecommendationResult};

/// One screen of analysis. Pure over the context; running twice yields identical output.
pub trait AnalysisEngine: Send + Sync {
    type Report;

    fn run(&self, context: &PricingContext) -> Self::Report;
}

/// Share of the historical price used as the aggressive target.
pub fn baseline_90(historical: Decimal) -> Decimal {
    historical * Decimal::new(9, 1)
}

/// `(value - reference) / reference * 100`; `None` for a zero reference or on overflow.
pub fn percent_change(value: Decimal, reference: Decimal) -> Option<f64> {
    if reference.is_zero() {
        return None;
    }
    value
        .checked_sub(reference)?
        .checked_div(reference)?
        .checked_mul(Decimal::ONE_HUNDRED)?
        .to_f64()
}

/// Whole-unit amount with thousands separators, `-` when absent.
pub fn format_amount(amount: Option<Decimal>) -> String {
    let Some(amount) = amount else {
        return "-".to_string();
    };
    let rounded = amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    let digits = rounded.abs().trunc().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (position, ch) in digits.chars().enumerate() {
        if position > 0 && (digits.len() - position) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if rounded.is_sign_negative() && !rounded.is_zero() {
        grouped.insert(0, '-');
    }
    grouped
}
