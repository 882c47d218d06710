//! Order history index with tiered best-match lookup.

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::OrderRow;

/// How strongly a historical order matched the query.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    /// Same valve type and identical description.
    TypeAndDescription,
    /// Same valve type only; most recent order.
    TypeOnly,
}

impl MatchTier {
    pub fn label(&self) -> &'static str {
        match self {
            Self::TypeAndDescription => "tier 1 (type+description)",
            Self::TypeOnly => "tier 2 (type only)",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchedOrder {
    pub tier: MatchTier,
    pub vendor: String,
    pub order_date: Option<NaiveDate>,
    pub amount: Option<Decimal>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryMatch {
    /// Tier 1 when found, otherwise tier 2.
    pub best: Option<MatchedOrder>,
    pub exact: Option<MatchedOrder>,
}

impl HistoryMatch {
    pub fn historical_price(&self) -> Option<Decimal> {
        self.best.as_ref().and_then(|order| order.amount)
    }
}

#[derive(Clone, Debug, Default)]
pub struct OrderHistoryIndex {
    groups: HashMap<String, Vec<OrderRow>>,
}

impl OrderHistoryIndex {
    pub fn build(rows: &[OrderRow]) -> Self {
        let mut groups: HashMap<String, Vec<OrderRow>> = HashMap::new();
        for row in rows {
            if let Some(code) = row.known_valve_type() {
                groups.entry(code.to_string()).or_default().push(row.clone());
            }
        }
        for rows in groups.values_mut() {
            rows.sort_by(|left, right| newest_first(left.order_date, right.order_date));
        }
        Self { groups }
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Orders for a full valve-type code, most recent first.
    pub fn orders(&self, full_code: &str) -> &[OrderRow] {
        self.groups.get(full_code.trim()).map(Vec::as_slice).unwrap_or_default()
    }

    /// Most recent order of every code.
    pub fn representatives(&self) -> impl Iterator<Item = (&str, &OrderRow)> {
        self.groups
            .iter()
            .filter_map(|(code, rows)| rows.first().map(|row| (code.as_str(), row)))
    }

    pub fn best_match(&self, full_code: &str, description: Option<&str>) -> HistoryMatch {
        let rows = self.orders(full_code);
        let Some(latest) = rows.first() else {
            return HistoryMatch::default();
        };

        let wanted = description.map(str::trim).filter(|wanted| !wanted.is_empty());
        let exact = wanted.and_then(|wanted| {
            rows.iter()
                .find(|row| row.description.trim() == wanted)
                .map(|row| matched(row, MatchTier::TypeAndDescription))
        });
        let best = exact.clone().unwrap_or_else(|| matched(latest, MatchTier::TypeOnly));

        HistoryMatch { best: Some(best), exact }
    }
}

/// Descending by date with undated rows last.
pub(crate) fn newest_first(left: Option<NaiveDate>, right: Option<NaiveDate>) -> Ordering {
    match (left, right) {
        (Some(left), Some(right)) => right.cmp(&left),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn matched(row: &OrderRow, tier: MatchTier) -> MatchedOrder {
    MatchedOrder {
        tier,
        vendor: row.vendor.clone(),
        order_date: row.order_date,
        amount: row.amount,
    }
}
