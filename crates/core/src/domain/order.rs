use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Historical purchase order line. Loaded once and never mutated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRow {
    pub material_no: String,
    /// Full valve-type code; `None` when the order was never classified.
    pub valve_type: Option<String>,
    pub description: String,
    pub vendor: String,
    pub order_date: Option<NaiveDate>,
    pub quantity: Option<Decimal>,
    pub amount: Option<Decimal>,
    pub uom: Option<String>,
    pub valve_no: Option<String>,
    pub total_weight_tn: Option<Decimal>,
    pub unit_weight_kg: Option<Decimal>,
}

impl OrderRow {
    /// Valve type with surrounding whitespace removed, if any remains.
    pub fn known_valve_type(&self) -> Option<&str> {
        self.valve_type.as_deref().map(str::trim).filter(|code| !code.is_empty())
    }

    pub fn order_month(&self) -> Option<u32> {
        self.order_date.map(|date| date.month())
    }

    /// `amount / quantity`; undefined for a missing or zero quantity.
    pub fn unit_price(&self) -> Option<Decimal> {
        let quantity = self.quantity.filter(|quantity| !quantity.is_zero())?;
        self.amount?.checked_div(quantity)
    }
}
