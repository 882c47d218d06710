use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Option columns carried by a price-list row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurchargeColumn {
    InternalCoating,
    ExternalCoating,
    Lock,
    Indicator,
    LimitSwitch,
    Extension,
    DiscScs13,
    DiscScs16,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionSurcharges {
    pub internal_coating: Option<Decimal>,
    pub external_coating: Option<Decimal>,
    pub lock: Option<Decimal>,
    pub indicator: Option<Decimal>,
    pub limit_switch: Option<Decimal>,
    pub extension: Option<Decimal>,
    pub disc_scs13: Option<Decimal>,
    pub disc_scs16: Option<Decimal>,
}

impl OptionSurcharges {
    /// Amount for a column, only when it is strictly positive.
    pub fn chargeable(&self, column: SurchargeColumn) -> Option<Decimal> {
        let raw = match column {
            SurchargeColumn::InternalCoating => self.internal_coating,
            SurchargeColumn::ExternalCoating => self.external_coating,
            SurchargeColumn::Lock => self.lock,
            SurchargeColumn::Indicator => self.indicator,
            SurchargeColumn::LimitSwitch => self.limit_switch,
            SurchargeColumn::Extension => self.extension,
            SurchargeColumn::DiscScs13 => self.disc_scs13,
            SurchargeColumn::DiscScs16 => self.disc_scs16,
        };
        raw.filter(|amount| *amount > Decimal::ZERO)
    }
}

/// One row of the contract price list, keyed by valve type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceListRow {
    pub valve_type: String,
    /// Body price quoted for `reference_quantity` units.
    pub base_price: Option<Decimal>,
    pub reference_quantity: Option<Decimal>,
    pub surcharges: OptionSurcharges,
}
