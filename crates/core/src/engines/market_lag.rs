//! Screen 3: commodity market movement against vendor order prices.
//!
//! Vendor unit prices for one product family are averaged per month and
//! compared with a bronze-weighted copper/tin index taken `LAG_MONTHS`
//! earlier. Two views are produced:
//!
//! - a per-month gap between the primary vendor's cumulative price change and
//!   the change the market alone would explain (80% pass-through), and
//! - a month-over-month classification of price trend against market trend.
//!
//! Any value that needs a missing commodity month is `None`, never estimated.

use std::collections::BTreeMap;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{format_amount, percent_change, AnalysisEngine};
use crate::context::PricingContext;
use crate::domain::CommodityMonth;
use crate::errors::Degradation;

/// Months between a commodity price move and its effect on vendor prices.
pub const LAG_MONTHS: u32 = 4;
/// Share of a commodity move expected to reach vendor prices.
pub const PASS_THROUGH: f64 = 0.8;
/// Absolute percent change treated as no movement.
pub const FLAT_THRESHOLD_PCT: f64 = 2.0;

const LISTED_BAD_MONTHS: usize = 3;

/// Product family analysed against the market.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketLagSettings {
    pub family_prefix: String,
    pub family_suffix: String,
    pub excluded_keyword: String,
}

impl Default for MarketLagSettings {
    fn default() -> Self {
        Self {
            family_prefix: "VGBARR240A".to_string(),
            family_suffix: "TR".to_string(),
            excluded_keyword: "LOCK".to_string(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Flat,
    Rising,
    Falling,
}

/// Flat within ±2.0% inclusive, otherwise by sign.
pub fn classify_change(change_pct: f64) -> Trend {
    if change_pct.abs() <= FLAT_THRESHOLD_PCT {
        Trend::Flat
    } else if change_pct > 0.0 {
        Trend::Rising
    } else {
        Trend::Falling
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendOutcome {
    Good,
    Normal,
    Bad,
    /// No table entry for the pairing.
    NotApplicable,
}

/// (price trend, market trend) → outcome.
const TREND_TABLE: &[((Trend, Trend), TrendOutcome)] = &[
    ((Trend::Flat, Trend::Flat), TrendOutcome::Normal),
    ((Trend::Flat, Trend::Falling), TrendOutcome::Bad),
    ((Trend::Flat, Trend::Rising), TrendOutcome::Good),
    ((Trend::Rising, Trend::Flat), TrendOutcome::Bad),
    ((Trend::Rising, Trend::Falling), TrendOutcome::Bad),
    ((Trend::Rising, Trend::Rising), TrendOutcome::Normal),
    ((Trend::Falling, Trend::Flat), TrendOutcome::Good),
    ((Trend::Falling, Trend::Falling), TrendOutcome::Normal),
    ((Trend::Falling, Trend::Rising), TrendOutcome::Good),
];

pub fn trend_outcome(price: Trend, market: Trend) -> TrendOutcome {
    TREND_TABLE
        .iter()
        .find(|(pair, _)| *pair == (price, market))
        .map(|(_, outcome)| *outcome)
        .unwrap_or(TrendOutcome::NotApplicable)
}

/// Analysis month → commodity month it is compared with.
pub fn lag_month(month: u32) -> Option<u32> {
    month.checked_sub(LAG_MONTHS).filter(|lag| *lag >= 1)
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorMonth {
    pub vendor: String,
    pub month: u32,
    pub average_price: Decimal,
    pub count: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub month: u32,
    pub copper: f64,
    pub tin: f64,
    pub weighted_index: f64,
    pub vendor_prices: BTreeMap<String, Option<Decimal>>,
    pub primary_price: Option<Decimal>,
    pub lag_month: Option<u32>,
    pub lag_index: Option<f64>,
    /// Price change minus expected market-driven change, in percentage points.
    pub gap_pct: Option<f64>,
    /// Month-1 = 100 views of the same series.
    pub copper_rel: Option<f64>,
    pub tin_rel: Option<f64>,
    pub weighted_rel: Option<f64>,
    pub primary_rel: Option<f64>,
    pub degradations: Vec<Degradation>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MonthAssessment {
    pub month: u32,
    pub lag_month: u32,
    pub price_change_pct: f64,
    pub market_change_pct: f64,
    pub price_trend: Trend,
    pub market_trend: Trend,
    pub outcome: TrendOutcome,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeCounts {
    pub good: usize,
    pub normal: usize,
    pub bad: usize,
    pub not_applicable: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketLagSummary {
    pub family_prefix: String,
    pub total_orders: usize,
    pub vendors: Vec<String>,
    pub primary_vendor: Option<String>,
    pub copper_year_change_pct: Option<f64>,
    pub tin_year_change_pct: Option<f64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketLagReport {
    pub trend_points: Vec<TrendPoint>,
    pub assessments: Vec<MonthAssessment>,
    pub outcome_counts: OutcomeCounts,
    pub vendor_months: Vec<VendorMonth>,
    pub commodities: Vec<CommodityMonth>,
    pub summary: MarketLagSummary,
}

#[derive(Clone, Debug, Default)]
pub struct MarketLagEngine {
    settings: MarketLagSettings,
}

impl MarketLagEngine {
    pub fn new(settings: MarketLagSettings) -> Self {
        Self { settings }
    }

    fn qualifies(&self, valve_type: &str, description: &str) -> bool {
        let description = description.trim();
        valve_type.starts_with(&self.settings.family_prefix)
            && !description.contains(&self.settings.excluded_keyword)
            && description.ends_with(&self.settings.family_suffix)
    }
}

#[derive(Default)]
struct Accumulator {
    sum: Decimal,
    count: usize,
}

impl AnalysisEngine for MarketLagEngine {
    type Report = MarketLagReport;

    fn run(&self, context: &PricingContext) -> MarketLagReport {
        let index = |month: u32| context.commodity(month).map(CommodityMonth::weighted_index);

        // vendor -> month -> running sum
        let mut totals: BTreeMap<String, BTreeMap<u32, Accumulator>> = BTreeMap::new();
        let mut total_orders = 0;
        for order in &context.tables().orders {
            let Some(code) = order.known_valve_type() else {
                continue;
            };
            if !self.qualifies(code, &order.description) {
                continue;
            }
            total_orders += 1;
            let (Some(month), Some(unit_price)) = (order.order_month(), order.unit_price()) else {
                continue;
            };
            let slot = totals.entry(order.vendor.clone()).or_default().entry(month).or_default();
            let Some(sum) = slot.sum.checked_add(unit_price) else {
                tracing::warn!(
                    event_name = "core.market_lag.price_overflow",
                    vendor = %order.vendor,
                    month,
                    "unit price left out of the monthly average"
                );
                continue;
            };
            slot.sum = sum;
            slot.count += 1;
        }

        let averages: BTreeMap<String, BTreeMap<u32, VendorMonth>> = totals
            .into_iter()
            .filter_map(|(vendor, months)| {
                let months: BTreeMap<u32, VendorMonth> = months
                    .into_iter()
                    .filter_map(|(month, slot)| {
                        let average_price =
                            slot.sum.checked_div(Decimal::from(slot.count as u64))?;
                        let row = VendorMonth {
                            vendor: vendor.clone(),
                            month,
                            average_price,
                            count: slot.count,
                        };
                        Some((month, row))
                    })
                    .collect();
                (!months.is_empty()).then_some((vendor, months))
            })
            .collect();

        let primary_vendor = primary_vendor(&averages);
        let primary_months = primary_vendor.as_ref().and_then(|vendor| averages.get(vendor));
        let primary_price = |month: u32| {
            primary_months.and_then(|months| months.get(&month)).map(|row| row.average_price)
        };
        let base_price = primary_months
            .and_then(|months| months.get(&1).or_else(|| months.values().next()))
            .map(|row| row.average_price)
            .filter(|price| !price.is_zero());
        let base_index = index(1).filter(|value| *value != 0.0);
        let first_month = context.commodity(1).copied();

        let mut trend_points = Vec::new();
        for commodity in context.commodity_months() {
            let month = commodity.month;
            let weighted_index = commodity.weighted_index();
            let lag = lag_month(month);
            let lag_index = lag.and_then(index);
            let price = primary_price(month);

            let mut degradations = Vec::new();
            if let Some(lag) = lag.filter(|_| lag_index.is_none()) {
                degradations.push(Degradation::MissingMarketData { month: lag });
            }
            if base_index.is_none() {
                degradations.push(Degradation::MissingMarketData { month: 1 });
            }

            let gap_pct = match (price, base_price, lag_index, base_index) {
                (Some(price), Some(base_price), Some(lag_index), Some(base_index)) => {
                    let market_change = (lag_index / base_index - 1.0) * 100.0;
                    ratio(price, base_price).map(|ratio| {
                        let price_change = (ratio - 1.0) * 100.0;
                        price_change - market_change * PASS_THROUGH
                    })
                }
                _ => None,
            };

            let vendor_prices = averages
                .iter()
                .map(|(vendor, months)| {
                    (vendor.clone(), months.get(&month).map(|row| row.average_price))
                })
                .collect();

            trend_points.push(TrendPoint {
                month,
                copper: commodity.copper,
                tin: commodity.tin,
                weighted_index,
                vendor_prices,
                primary_price: price,
                lag_month: lag,
                lag_index,
                gap_pct,
                copper_rel: first_month.and_then(|first| relative(commodity.copper, first.copper)),
                tin_rel: first_month.and_then(|first| relative(commodity.tin, first.tin)),
                weighted_rel: base_index.and_then(|base| relative(weighted_index, base)),
                primary_rel: price
                    .zip(base_price)
                    .and_then(|(price, base)| ratio(price, base))
                    .map(|ratio| ratio * 100.0),
                degradations,
            });
        }

        let mut assessments = Vec::new();
        let mut previous: Option<(Decimal, Option<f64>)> = None;
        for (&month, row) in primary_months.into_iter().flatten() {
            let lag = lag_month(month);
            let lag_index = lag.and_then(index);

            if let (Some(lag), Some(current_index), Some((previous_price, Some(previous_index)))) =
                (lag, lag_index, previous)
            {
                let price_change = percent_change(row.average_price, previous_price);
                let market_change = (previous_index != 0.0)
                    .then(|| (current_index - previous_index) / previous_index * 100.0);
                if let (Some(price_change), Some(market_change)) = (price_change, market_change) {
                    let price_trend = classify_change(price_change);
                    let market_trend = classify_change(market_change);
                    assessments.push(MonthAssessment {
                        month,
                        lag_month: lag,
                        price_change_pct: price_change,
                        market_change_pct: market_change,
                        price_trend,
                        market_trend,
                        outcome: trend_outcome(price_trend, market_trend),
                    });
                }
            }

            previous = Some((row.average_price, lag_index));
        }

        let mut outcome_counts = OutcomeCounts::default();
        for assessment in &assessments {
            match assessment.outcome {
                TrendOutcome::Good => outcome_counts.good += 1,
                TrendOutcome::Normal => outcome_counts.normal += 1,
                TrendOutcome::Bad => outcome_counts.bad += 1,
                TrendOutcome::NotApplicable => outcome_counts.not_applicable += 1,
            }
        }

        let year_change = |pick: fn(&CommodityMonth) -> f64| {
            let first = context.commodity(1).map(pick)?;
            let last = context.commodity(12).map(pick)?;
            relative(last, first).map(|relative| relative - 100.0)
        };

        MarketLagReport {
            trend_points,
            assessments,
            outcome_counts,
            vendor_months: averages.values().flat_map(|months| months.values().cloned()).collect(),
            commodities: context.commodity_months().copied().collect(),
            summary: MarketLagSummary {
                family_prefix: self.settings.family_prefix.clone(),
                total_orders,
                vendors: averages.keys().cloned().collect(),
                primary_vendor,
                copper_year_change_pct: year_change(|month| month.copper),
                tin_year_change_pct: year_change(|month| month.tin),
            },
        }
    }
}

/// Vendor with the most orders; ties go to the first vendor in name order.
fn primary_vendor(averages: &BTreeMap<String, BTreeMap<u32, VendorMonth>>) -> Option<String> {
    let mut best: Option<(&String, usize)> = None;
    for (vendor, months) in averages {
        let count = months.values().map(|row| row.count).sum::<usize>();
        if best.map_or(true, |(_, best_count)| count > best_count) {
            best = Some((vendor, count));
        }
    }
    best.map(|(vendor, _)| vendor.clone())
}

fn ratio(value: Decimal, reference: Decimal) -> Option<f64> {
    if reference.is_zero() {
        return None;
    }
    value.checked_div(reference)?.to_f64()
}

fn relative(value: f64, reference: f64) -> Option<f64> {
    (reference != 0.0).then(|| value / reference * 100.0)
}

impl MarketLagReport {
    pub fn bad_months(&self) -> impl Iterator<Item = &MonthAssessment> {
        self.assessments.iter().filter(|assessment| assessment.outcome == TrendOutcome::Bad)
    }

    /// Summary written from the numbers alone.
    pub fn local_summary(&self) -> String {
        let counts = &self.outcome_counts;
        let mut lines = vec![format!(
            "[basis] commodity prices assumed to reach vendor prices after {LAG_MONTHS} months"
        )];

        match &self.summary.primary_vendor {
            Some(vendor) => lines.push(format!(
                "[scope] {} qualifying {} orders, primary vendor {vendor}",
                self.summary.total_orders, self.summary.family_prefix
            )),
            None => lines.push(format!(
                "[scope] no qualifying {} orders with a usable unit price",
                self.summary.family_prefix
            )),
        }

        lines.push(format!(
            "[consistency] {} months assessed: Good {}, Normal {}, Bad {} -> purchasing is {} against the market",
            self.assessments.len(),
            counts.good,
            counts.normal,
            counts.bad,
            if counts.good >= counts.bad { "favourable" } else { "unfavourable" },
        ));

        if counts.bad > 0 {
            lines.push("[bad months]".to_string());
            for assessment in self.bad_months().take(LISTED_BAD_MONTHS) {
                lines.push(format!(
                    "  - month {}: month {} market {:+.1}% -> price {:+.1}%",
                    assessment.month,
                    assessment.lag_month,
                    assessment.market_change_pct,
                    assessment.price_change_pct,
                ));
            }
        }

        lines.push(format!(
            "[strategy] short term: seek retroactive reductions for Bad months; mid term: \
             commodity-linked price clause with a {LAG_MONTHS}-month lag; long term: qualify \
             additional vendors"
        ));
        lines.join("\n")
    }

    pub fn narrative_prompt(&self) -> String {
        let points = self
            .trend_points
            .iter()
            .map(|point| {
                let gap = point
                    .gap_pct
                    .map(|gap| format!("{gap:+.1}%"))
                    .unwrap_or_else(|| "-".to_string());
                format!(
                    "month {}: Cu+Sn index {:.0}, primary vendor price {}, gap {gap}",
                    point.month,
                    point.weighted_index,
                    format_amount(point.primary_price),
                )
            })
            .collect::<Vec<_>>()
            .join("\n");
        let bad = self
            .bad_months()
            .map(|assessment| {
                format!(
                    "month {}: market {:+.1}% (month {}), price {:+.1}%",
                    assessment.month,
                    assessment.market_change_pct,
                    assessment.lag_month,
                    assessment.price_change_pct,
                )
            })
            .collect::<Vec<_>>();
        let bad = if bad.is_empty() { "none".to_string() } else { bad.join("\n") };

        format!(
            "Commodity market versus vendor order prices, with a {LAG_MONTHS}-month lag and \
             {:.0}% expected pass-through.\n\n{points}\n\nBad months:\n{bad}\n\nAssess the \
             vendor's pricing behaviour and recommend purchasing actions.",
            PASS_THROUGH * 100.0
        )
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::prelude::ToPrimitive;
    use rust_decimal::Decimal;

    use super::{
        classify_change, lag_month, trend_outcome, MarketLagEngine, Trend, TrendOutcome,
    };
    use crate::context::{PricingContext, Tables};
    use crate::domain::{CommodityMonth, OrderRow};
    use crate::engines::AnalysisEngine;
    use crate::errors::Degradation;

    fn order(vendor: &str, month: u32, description: &str, amount: i64, quantity: i64) -> OrderRow {
        OrderRow {
            material_no: "H101BC-0001".to_string(),
            valve_type: Some("VGBARR240AB".to_string()),
            description: description.to_string(),
            vendor: vendor.to_string(),
            order_date: NaiveDate::from_ymd_opt(2024, month, 15),
            quantity: Some(Decimal::from(quantity)),
            amount: Some(Decimal::from(amount)),
            uom: None,
            valve_no: None,
            total_weight_tn: None,
            unit_weight_kg: None,
        }
    }

    fn commodity(month: u32, copper: f64) -> CommodityMonth {
        CommodityMonth { month, copper, tin: 0.0 }
    }

    /// Copper rises 10% per month from 1000; primary vendor prices at months 1, 5, 6.
    fn context() -> PricingContext {
        PricingContext::new(Tables {
            orders: vec![
                order("Alpha", 1, "BC VALVE TR", 1_000, 1),
                order("Alpha", 1, "BC VALVE TR", 3_000, 3),
                order("Alpha", 5, "BC VALVE TR", 2_200, 2),
                order("Alpha", 6, " BC VALVE TR ", 1_100, 1),
                order("Beta", 5, "BC VALVE TR", 900, 1),
                order("Alpha", 5, "BC VALVE LOCK TR", 99_999, 1),
                order("Alpha", 5, "BC VALVE TX", 99_999, 1),
                order("Alpha", 7, "BC VALVE TR", 500, 0),
            ],
            commodities: (1..=6)
                .map(|month| commodity(month, 1_000.0 + 100.0 * f64::from(month - 1)))
                .collect(),
            ..Tables::default()
        })
    }

    #[test]
    fn lag_is_four_months_and_undefined_early() {
        assert_eq!(lag_month(5), Some(1));
        assert_eq!(lag_month(12), Some(8));
        for month in 1..=4 {
            assert_eq!(lag_month(month), None);
        }
    }

    #[test]
    fn flat_threshold_is_inclusive_and_symmetric() {
        assert_eq!(classify_change(2.0), Trend::Flat);
        assert_eq!(classify_change(-2.0), Trend::Flat);
        assert_eq!(classify_change(2.01), Trend::Rising);
        assert_eq!(classify_change(-2.01), Trend::Falling);
    }

    #[test]
    fn trend_table_matches_documented_pairs() {
        assert_eq!(trend_outcome(Trend::Falling, Trend::Flat), TrendOutcome::Good);
        assert_eq!(trend_outcome(Trend::Rising, Trend::Flat), TrendOutcome::Bad);
        assert_eq!(trend_outcome(Trend::Rising, Trend::Rising), TrendOutcome::Normal);
        assert_eq!(trend_outcome(Trend::Flat, Trend::Flat), TrendOutcome::Normal);
    }

    #[test]
    fn filters_family_and_picks_primary_vendor() {
        let report = MarketLagEngine::default().run(&context());

        assert_eq!(report.summary.total_orders, 6);
        assert_eq!(report.summary.vendors, vec!["Alpha".to_string(), "Beta".to_string()]);
        assert_eq!(report.summary.primary_vendor.as_deref(), Some("Alpha"));
        let alpha_january = report
            .vendor_months
            .iter()
            .find(|row| row.vendor == "Alpha" && row.month == 1)
            .expect("alpha january");
        assert_eq!(alpha_january.average_price, Decimal::from(1_000));
        assert_eq!(alpha_january.count, 2);
    }

    #[test]
    fn overflowing_unit_prices_are_left_out_of_the_average() {
        let mut huge = order("Gamma", 5, "BC VALVE TR", 1, 1);
        huge.amount = Some(Decimal::MAX);
        let mut tables = context().tables().clone();
        tables.orders.push(huge.clone());
        tables.orders.push(huge);

        let report = MarketLagEngine::default().run(&PricingContext::new(tables));

        let gamma = report
            .vendor_months
            .iter()
            .find(|row| row.vendor == "Gamma")
            .expect("gamma month");
        assert_eq!(gamma.count, 1);
        assert_eq!(gamma.average_price, Decimal::MAX);
        assert_eq!(report.summary.total_orders, 8);
        assert_eq!(report.summary.primary_vendor.as_deref(), Some("Alpha"));
    }

    #[test]
    fn gap_uses_lagged_index_and_is_null_before_lag() {
        let report = MarketLagEngine::default().run(&context());

        let early = &report.trend_points[0];
        assert_eq!(early.month, 1);
        assert_eq!(early.lag_month, None);
        assert_eq!(early.gap_pct, None);

        // month 5: price +10%, lag month 1 market +0% -> gap +10
        let may = report.trend_points.iter().find(|point| point.month == 5).expect("may");
        assert_eq!(may.lag_month, Some(1));
        let gap = may.gap_pct.expect("gap");
        assert!((gap - 10.0).abs() < 1e-9, "gap was {gap}");

        // month 6: price +10%, lag month 2 market +10% -> gap 10 - 8 = 2
        let june = report.trend_points.iter().find(|point| point.month == 6).expect("june");
        let gap = june.gap_pct.expect("gap");
        assert!((gap - 2.0).abs() < 1e-9, "gap was {gap}");
        assert_eq!(june.primary_rel.map(|rel| rel.round()), Some(110.0));
    }

    #[test]
    fn month_over_month_needs_both_lagged_indices() {
        let report = MarketLagEngine::default().run(&context());

        // month 5 has no previous lagged index (month 1's lag is undefined)
        assert_eq!(report.assessments.len(), 1);
        let june = &report.assessments[0];
        assert_eq!(june.month, 6);
        assert_eq!(june.lag_month, 2);
        assert_eq!(june.price_trend, Trend::Flat);
        assert_eq!(june.market_trend, Trend::Rising);
        assert_eq!(june.outcome, TrendOutcome::Good);
        assert_eq!(report.outcome_counts.good, 1);
    }

    #[test]
    fn missing_commodity_months_null_dependent_values() {
        let mut tables = context().tables().clone();
        tables.commodities.retain(|month| month.month != 1);
        tables.commodities.push(commodity(11, 2_000.0));
        let report = MarketLagEngine::default().run(&PricingContext::new(tables));

        assert!(report.trend_points.iter().all(|point| point.gap_pct.is_none()));
        let november = report.trend_points.iter().find(|point| point.month == 11).expect("nov");
        assert_eq!(november.lag_index, None);
        assert!(november.degradations.contains(&Degradation::MissingMarketData { month: 7 }));
        assert!(november.degradations.contains(&Degradation::MissingMarketData { month: 1 }));
        assert_eq!(report.summary.copper_year_change_pct, None);
    }

    #[test]
    fn weighted_index_blends_copper_and_tin() {
        let month = CommodityMonth { month: 1, copper: 10_000.0, tin: 30_000.0 };
        assert!((month.weighted_index() - 12_400.0).abs() < 1e-9);
        assert_eq!(Decimal::from(5).to_f64(), Some(5.0));
    }
}
