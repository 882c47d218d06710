use chrono::NaiveDate;
use rust_decimal::Decimal;

use valvey_core::domain::{CommodityMonth, OptionSurcharges, OrderRow, PriceListRow, QuoteRow};
use valvey_core::{
    AnalysisEngine, Degradation, MarketLagEngine, PricingContext, QuoteAssessmentEngine,
    RecommendationEngine, Tables, Verdict,
};

fn order(material_no: &str, code: &str, description: &str, month: u32, amount: i64) -> OrderRow {
    OrderRow {
        material_no: material_no.to_string(),
        valve_type: Some(code.to_string()),
        description: description.to_string(),
        vendor: "Hanil Valve".to_string(),
        order_date: NaiveDate::from_ymd_opt(2024, month, 10),
        quantity: Some(Decimal::ONE),
        amount: Some(Decimal::new(amount, 0)),
        uom: Some("EA".to_string()),
        valve_no: None,
        total_weight_tn: None,
        unit_weight_kg: None,
    }
}

fn quote(no: u32, material_no: &str, description: &str, price: i64) -> QuoteRow {
    QuoteRow {
        no,
        material_no: material_no.to_string(),
        description: description.to_string(),
        quoted_price: Decimal::new(price, 0),
        quantity: Some(Decimal::ONE),
        internal_coating: None,
        external_coating: Some("N0".to_string()),
        spec: None,
        review_comment: None,
    }
}

fn context() -> PricingContext {
    let price_list = vec![PriceListRow {
        valve_type: "VGBARR240AT".to_string(),
        base_price: Some(Decimal::new(1_000, 0)),
        reference_quantity: Some(Decimal::ONE),
        surcharges: OptionSurcharges { lock: Some(Decimal::new(50, 0)), ..Default::default() },
    }];

    let mut orders: Vec<OrderRow> = (1..=12)
        .map(|month| {
            let amount = 1_000 + i64::from(month) * 10;
            order("1000BAR01", "VGBARR240AT1", "BALL VALVE TR", month, amount)
        })
        .collect();
    orders.push(order("1000UNK01", "VGUNKN000XX1", "UNLISTED", 3, 700));

    let commodities = (1..=12)
        .map(|month| CommodityMonth {
            month,
            copper: 8_000.0 + f64::from(month) * 100.0,
            tin: 25_000.0,
        })
        .collect();

    let quotes = vec![
        quote(1, "2000BAR01", "BALL VALVE TR", 1_000),
        quote(2, "2000BAR01", "BALL VALVE TR", 1_500),
        quote(3, "2000UNK01", "UNLISTED", 650),
    ];

    PricingContext::new(Tables { price_list, quotes, orders, commodities })
}

#[test]
fn every_engine_is_byte_identical_across_runs() {
    let context = context();
    let market_lag = MarketLagEngine::default();

    let first = (
        serde_json::to_string(&RecommendationEngine.run(&context)).expect("json"),
        serde_json::to_string(&QuoteAssessmentEngine.run(&context)).expect("json"),
        serde_json::to_string(&market_lag.run(&context)).expect("json"),
    );
    let second = (
        serde_json::to_string(&RecommendationEngine.run(&context)).expect("json"),
        serde_json::to_string(&QuoteAssessmentEngine.run(&context)).expect("json"),
        serde_json::to_string(&market_lag.run(&context)).expect("json"),
    );

    assert_eq!(first, second);
}

#[test]
fn unmapped_codes_never_report_a_zero_contract_price() {
    let report = RecommendationEngine.run(&context());
    let unmapped = report
        .results
        .iter()
        .find(|result| result.valve_type == "VGUNKN000XX1")
        .expect("unmapped row present");

    assert!(!unmapped.pricing.mapped);
    assert_eq!(unmapped.pricing.contract_price, None);
    assert!(unmapped.degradations.contains(&Degradation::Unmapped));
}

#[test]
fn quotes_resolve_through_material_codes_and_are_classified() {
    let report = QuoteAssessmentEngine.run(&context());
    assert_eq!(report.total, 3);

    let by_no = |no: u32| report.results.iter().find(|result| result.no == no).expect("quote");
    // Latest historical unit price is 1120; the 90% baseline is 1008.
    assert_eq!(by_no(1).verdict, Verdict::Excellent);
    assert_eq!(by_no(2).verdict, Verdict::Inadequate);
    // No price-list row, but history at 700 covers 650.
    assert_eq!(by_no(3).verdict, Verdict::Acceptable);
    assert!(!by_no(3).no_baseline);
}

#[test]
fn market_lag_leaves_the_first_four_months_without_a_gap() {
    let report = MarketLagEngine::default().run(&context());

    assert_eq!(report.trend_points.len(), 12);
    for point in &report.trend_points {
        assert_eq!(point.gap_pct.is_some(), point.month >= 5, "month {}", point.month);
    }
}
