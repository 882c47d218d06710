//! Immutable analysis context built once from the loaded tables.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::domain::{CommodityMonth, OrderRow, PriceListRow, QuoteRow};
use crate::history::OrderHistoryIndex;
use crate::pricing::PriceIndex;

/// Number of leading plant-prefix characters dropped from a material number.
const MATERIAL_PREFIX_LEN: usize = 4;

/// Raw tables as handed over by the loader.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Tables {
    pub price_list: Vec<PriceListRow>,
    pub quotes: Vec<QuoteRow>,
    pub orders: Vec<OrderRow>,
    pub commodities: Vec<CommodityMonth>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSizes {
    pub price_list: usize,
    pub quotes: usize,
    pub orders: usize,
    pub commodity_months: usize,
    pub mapped_materials: usize,
}

/// Everything an engine reads. Built once, shared read-only between requests.
#[derive(Clone, Debug, Default)]
pub struct PricingContext {
    tables: Tables,
    prices: PriceIndex,
    history: OrderHistoryIndex,
    material_types: HashMap<String, String>,
    commodities: BTreeMap<u32, CommodityMonth>,
}

impl PricingContext {
    pub fn new(tables: Tables) -> Self {
        let prices = PriceIndex::build(&tables.price_list);
        let history = OrderHistoryIndex::build(&tables.orders);
        let material_types = material_type_map(&tables.orders);

        let mut commodities = BTreeMap::new();
        for month in tables.commodities.iter().filter(|month| (1..=12).contains(&month.month)) {
            commodities.entry(month.month).or_insert(*month);
        }

        tracing::debug!(
            event_name = "core.context.built",
            price_rows = tables.price_list.len(),
            order_rows = tables.orders.len(),
            mapped_materials = material_types.len(),
            commodity_months = commodities.len(),
            "pricing context indexed"
        );

        Self { tables, prices, history, material_types, commodities }
    }

    pub fn tables(&self) -> &Tables {
        &self.tables
    }

    pub fn prices(&self) -> &PriceIndex {
        &self.prices
    }

    pub fn history(&self) -> &OrderHistoryIndex {
        &self.history
    }

    pub fn commodity(&self, month: u32) -> Option<&CommodityMonth> {
        self.commodities.get(&month)
    }

    /// Commodity snapshot in month order, one entry per month.
    pub fn commodity_months(&self) -> impl Iterator<Item = &CommodityMonth> {
        self.commodities.values()
    }

    /// Valve type for a quote, resolved through the material-number dictionary.
    pub fn quote_valve_type(&self, quote: &QuoteRow) -> Option<&str> {
        let core = material_core(&quote.material_no)?;
        self.material_types.get(core).map(String::as_str)
    }

    pub fn sizes(&self) -> TableSizes {
        TableSizes {
            price_list: self.tables.price_list.len(),
            quotes: self.tables.quotes.len(),
            orders: self.tables.orders.len(),
            commodity_months: self.commodities.len(),
            mapped_materials: self.material_types.len(),
        }
    }
}

/// Material number without its plant prefix.
pub fn material_core(material_no: &str) -> Option<&str> {
    let trimmed = material_no.trim();
    let (start, _) = trimmed.char_indices().nth(MATERIAL_PREFIX_LEN)?;
    Some(&trimmed[start..])
}

fn material_type_map(orders: &[OrderRow]) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for order in orders {
        let (Some(code), Some(core)) = (order.known_valve_type(), material_core(&order.material_no))
        else {
            continue;
        };
        map.entry(core.to_string()).or_insert_with(|| code.to_string());
    }
    map
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{material_core, PricingContext, Tables};
    use crate::domain::{CommodityMonth, OrderRow, QuoteRow};

    fn order(material_no: &str, valve_type: &str) -> OrderRow {
        OrderRow {
            material_no: material_no.to_string(),
            valve_type: Some(valve_type.to_string()),
            description: "GATE".to_string(),
            vendor: "Vendor".to_string(),
            order_date: None,
            quantity: None,
            amount: None,
            uom: None,
            valve_no: None,
            total_weight_tn: None,
            unit_weight_kg: None,
        }
    }

    fn quote(material_no: &str) -> QuoteRow {
        QuoteRow {
            no: 1,
            material_no: material_no.to_string(),
            description: "GATE".to_string(),
            quoted_price: Decimal::from(10),
            quantity: None,
            internal_coating: None,
            external_coating: None,
            spec: None,
            review_comment: None,
        }
    }

    #[test]
    fn material_core_drops_four_character_prefix() {
        assert_eq!(material_core("H101VAL-0042"), Some("VAL-0042"));
        assert_eq!(material_core("H101"), None);
    }

    #[test]
    fn quotes_resolve_valve_type_from_any_plant_prefix() {
        let context = PricingContext::new(Tables {
            orders: vec![order("H101VAL-0042", "VGBA1"), order("K202VAL-0042", "VGZZ9")],
            ..Tables::default()
        });

        assert_eq!(context.quote_valve_type(&quote("P777VAL-0042")), Some("VGBA1"));
        assert_eq!(context.quote_valve_type(&quote("P777VAL-9999")), None);
    }

    #[test]
    fn commodity_months_keep_first_entry_and_valid_months() {
        let context = PricingContext::new(Tables {
            commodities: vec![
                CommodityMonth { month: 2, copper: 9_000.0, tin: 30_000.0 },
                CommodityMonth { month: 2, copper: 1.0, tin: 1.0 },
                CommodityMonth { month: 13, copper: 1.0, tin: 1.0 },
            ],
            ..Tables::default()
        });

        assert_eq!(context.sizes().commodity_months, 1);
        assert_eq!(context.commodity(2).map(|month| month.copper), Some(9_000.0));
    }
}
