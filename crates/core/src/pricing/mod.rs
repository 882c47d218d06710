//! Valve-type keyed price list and contract price composition.

pub mod options;

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::PriceListRow;

pub use options::{OptionInput, OptionQuote, SurchargeItem};

/// Price-list key for a full valve-type code: the code without its final character.
pub fn valve_type_key(full_code: &str) -> &str {
    let trimmed = full_code.trim();
    match trimmed.char_indices().next_back() {
        Some((last, _)) => &trimmed[..last],
        None => trimmed,
    }
}

/// Contract price build-up for one request or quote line.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractPricing {
    pub valve_type_key: String,
    pub mapped: bool,
    pub reference_quantity: Option<Decimal>,
    pub base_price: Option<Decimal>,
    pub option_total: Decimal,
    pub option_items: Vec<SurchargeItem>,
    /// `base_price + option_total`; `None` while the key is unmapped.
    pub contract_price: Option<Decimal>,
}

#[derive(Clone, Debug, Default)]
pub struct PriceIndex {
    rows: HashMap<String, Vec<PriceListRow>>,
}

impl PriceIndex {
    pub fn build(rows: &[PriceListRow]) -> Self {
        let mut index: HashMap<String, Vec<PriceListRow>> = HashMap::new();
        for row in rows {
            index.entry(row.valve_type.trim().to_string()).or_default().push(row.clone());
        }
        Self { rows: index }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Authoritative row for a key. Later duplicates are ignored.
    pub fn lookup(&self, key: &str) -> Option<&PriceListRow> {
        self.rows.get(key).and_then(|rows| rows.first())
    }

    /// Base price normalised to a single unit.
    pub fn base_price(&self, key: &str) -> Option<Decimal> {
        self.lookup(key).and_then(unit_base_price)
    }

    pub fn option_surcharge(&self, key: &str, input: &OptionInput<'_>) -> OptionQuote {
        match self.lookup(key) {
            Some(row) => options::evaluate(&row.surcharges, input),
            None => OptionQuote::default(),
        }
    }

    /// Base price plus options for a full valve-type code.
    pub fn contract_pricing(&self, full_code: &str, input: &OptionInput<'_>) -> ContractPricing {
        let key = valve_type_key(full_code);
        let row = self.lookup(key);
        let base_price = row.and_then(unit_base_price);
        let options = self.option_surcharge(key, input);
        let contract_price = base_price.and_then(|base| base.checked_add(options.total));

        ContractPricing {
            valve_type_key: key.to_string(),
            mapped: base_price.is_some(),
            reference_quantity: row.and_then(|row| row.reference_quantity),
            base_price,
            option_total: options.total,
            option_items: options.items,
            contract_price,
        }
    }
}

fn unit_base_price(row: &PriceListRow) -> Option<Decimal> {
    let base = row.base_price?;
    match row.reference_quantity {
        Some(quantity) if quantity > Decimal::ZERO => base.checked_div(quantity),
        _ => Some(base),
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{valve_type_key, OptionInput, PriceIndex};
    use crate::domain::{OptionSurcharges, PriceListRow};

    fn row(valve_type: &str, base: i64, quantity: i64) -> PriceListRow {
        PriceListRow {
            valve_type: valve_type.to_string(),
            base_price: Some(Decimal::from(base)),
            reference_quantity: Some(Decimal::from(quantity)),
            surcharges: OptionSurcharges {
                lock: Some(Decimal::from(500)),
                ..OptionSurcharges::default()
            },
        }
    }

    #[test]
    fn key_drops_trailing_character() {
        assert_eq!(valve_type_key("VGBARR240AB"), "VGBARR240A");
        assert_eq!(valve_type_key(" VGX1 "), "VGX");
        assert_eq!(valve_type_key("A"), "");
        assert_eq!(valve_type_key(""), "");
    }

    #[test]
    fn base_price_is_normalised_by_reference_quantity() {
        let index = PriceIndex::build(&[row("VGA", 10_000, 4)]);
        assert_eq!(index.base_price("VGA"), Some(Decimal::from(2_500)));
    }

    #[test]
    fn non_positive_reference_quantity_keeps_raw_base() {
        let index = PriceIndex::build(&[row("VGA", 10_000, 0), row("VGB", 7_000, -2)]);
        assert_eq!(index.base_price("VGA"), Some(Decimal::from(10_000)));
        assert_eq!(index.base_price("VGB"), Some(Decimal::from(7_000)));
    }

    #[test]
    fn first_row_wins_for_duplicate_keys() {
        let index = PriceIndex::build(&[row("VGA", 1_000, 1), row("VGA", 9_999, 1)]);
        assert_eq!(index.len(), 1);
        assert_eq!(index.base_price("VGA"), Some(Decimal::from(1_000)));
    }

    #[test]
    fn unmapped_code_has_no_contract_price() {
        let index = PriceIndex::build(&[row("VGA", 1_000, 1)]);
        let pricing = index.contract_pricing("VGZZ", &OptionInput::description("LOCK"));

        assert!(!pricing.mapped);
        assert_eq!(pricing.contract_price, None);
        assert_eq!(pricing.base_price, None);
        assert!(pricing.option_items.is_empty());
    }

    #[test]
    fn contract_price_adds_options_to_unit_base() {
        let index = PriceIndex::build(&[row("VGA", 4_000, 2)]);
        let pricing = index.contract_pricing("VGA1", &OptionInput::description("BALL LOCK"));

        assert!(pricing.mapped);
        assert_eq!(pricing.valve_type_key, "VGA");
        assert_eq!(pricing.contract_price, Some(Decimal::from(2_500)));
    }

    #[test]
    fn overflowing_contract_price_is_left_empty() {
        let mut huge = row("VGA", 1, 1);
        huge.base_price = Some(Decimal::MAX);
        let index = PriceIndex::build(&[huge]);
        let pricing = index.contract_pricing("VGA1", &OptionInput::description("BALL LOCK"));

        assert!(pricing.mapped);
        assert_eq!(pricing.base_price, Some(Decimal::MAX));
        assert_eq!(pricing.contract_price, None);
    }
}
