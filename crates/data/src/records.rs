//! Wire shapes of the JSON tables and their conversion into domain rows.

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use valvey_core::domain::{
    CommodityMonth, OptionSurcharges, OrderRow, PriceListRow, QuoteRow,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PriceRecord {
    #[serde(default, deserialize_with = "text")]
    valve_type: Option<String>,
    #[serde(default, deserialize_with = "amount")]
    body_price: Option<Decimal>,
    #[serde(default, deserialize_with = "amount")]
    quantity: Option<Decimal>,
    #[serde(default, rename = "optionIP", deserialize_with = "amount")]
    option_ip: Option<Decimal>,
    #[serde(default, rename = "optionOP", deserialize_with = "amount")]
    option_op: Option<Decimal>,
    #[serde(default, deserialize_with = "amount")]
    option_lock: Option<Decimal>,
    #[serde(default, deserialize_with = "amount")]
    option_ind: Option<Decimal>,
    #[serde(default, rename = "optionLSW", deserialize_with = "amount")]
    option_lsw: Option<Decimal>,
    #[serde(default, deserialize_with = "amount")]
    option_ext: Option<Decimal>,
    #[serde(default, rename = "optionDiscSCS13", deserialize_with = "amount")]
    option_disc_scs13: Option<Decimal>,
    #[serde(default, rename = "optionDiscSCS16", deserialize_with = "amount")]
    option_disc_scs16: Option<Decimal>,
}

impl TryFrom<PriceRecord> for PriceListRow {
    type Error = String;

    fn try_from(record: PriceRecord) -> Result<Self, Self::Error> {
        let valve_type = record.valve_type.ok_or_else(|| "missing valveType".to_string())?;
        Ok(Self {
            valve_type,
            base_price: record.body_price,
            reference_quantity: record.quantity,
            surcharges: OptionSurcharges {
                internal_coating: record.option_ip,
                external_coating: record.option_op,
                lock: record.option_lock,
                indicator: record.option_ind,
                limit_switch: record.option_lsw,
                extension: record.option_ext,
                disc_scs13: record.option_disc_scs13,
                disc_scs16: record.option_disc_scs16,
            },
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct OrderRecord {
    #[serde(default, deserialize_with = "text")]
    material_no: Option<String>,
    #[serde(default, deserialize_with = "text")]
    valve_type: Option<String>,
    #[serde(default, deserialize_with = "text")]
    description: Option<String>,
    #[serde(default, deserialize_with = "text")]
    vendor: Option<String>,
    #[serde(default, deserialize_with = "text")]
    order_date: Option<String>,
    #[serde(default, deserialize_with = "amount")]
    order_amount: Option<Decimal>,
    #[serde(default, deserialize_with = "amount")]
    quantity: Option<Decimal>,
    #[serde(default, deserialize_with = "text")]
    uom: Option<String>,
    #[serde(default, deserialize_with = "text")]
    valve_no: Option<String>,
    #[serde(default, deserialize_with = "amount")]
    total_weight: Option<Decimal>,
    #[serde(default, deserialize_with = "amount")]
    unit_weight: Option<Decimal>,
}

impl OrderRecord {
    /// An unreadable `orderDate` leaves the row undated and adds a note.
    pub(crate) fn into_row(self, notes: &mut Vec<String>) -> OrderRow {
        let order_date = self.order_date.as_deref().and_then(|raw| {
            let parsed = parse_date(raw);
            if parsed.is_none() {
                notes.push(format!("bad orderDate `{raw}`"));
            }
            parsed
        });
        OrderRow {
            material_no: self.material_no.unwrap_or_default(),
            valve_type: self.valve_type,
            description: self.description.unwrap_or_default(),
            vendor: self.vendor.unwrap_or_default(),
            order_date,
            quantity: self.quantity,
            amount: self.order_amount,
            uom: self.uom,
            valve_no: self.valve_no,
            total_weight_tn: self.total_weight,
            unit_weight_kg: self.unit_weight,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct QuoteRecord {
    #[serde(default)]
    no: Option<u32>,
    #[serde(default, deserialize_with = "text")]
    material_no: Option<String>,
    #[serde(default, deserialize_with = "text")]
    description: Option<String>,
    #[serde(default, deserialize_with = "amount")]
    quote_price: Option<Decimal>,
    #[serde(default, deserialize_with = "amount")]
    quantity: Option<Decimal>,
    #[serde(default, deserialize_with = "text")]
    inner_paint: Option<String>,
    #[serde(default, deserialize_with = "text")]
    outer_paint: Option<String>,
    #[serde(default, deserialize_with = "text")]
    spec: Option<String>,
    #[serde(default, deserialize_with = "text")]
    review_comment: Option<String>,
}

impl QuoteRecord {
    /// Rows without a sequence number are numbered by position, 1-based.
    pub(crate) fn into_row(self, position: usize) -> Result<QuoteRow, String> {
        let quoted_price = self.quote_price.ok_or_else(|| "missing quotePrice".to_string())?;
        let no = match self.no {
            Some(no) => no,
            None => u32::try_from(position + 1).map_err(|_| "row index overflow".to_string())?,
        };
        Ok(QuoteRow {
            no,
            material_no: self.material_no.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            quoted_price,
            quantity: self.quantity,
            internal_coating: self.inner_paint,
            external_coating: self.outer_paint,
            spec: self.spec,
            review_comment: self.review_comment,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CommodityRecord {
    month: u32,
    #[serde(default, deserialize_with = "amount")]
    cu_price_per_ton: Option<Decimal>,
    #[serde(default, deserialize_with = "amount")]
    sn_price_per_ton: Option<Decimal>,
}

impl TryFrom<CommodityRecord> for CommodityMonth {
    type Error = String;

    fn try_from(record: CommodityRecord) -> Result<Self, Self::Error> {
        if !(1..=12).contains(&record.month) {
            return Err(format!("month {} is outside 1..=12", record.month));
        }
        let price = |value: Option<Decimal>, field: &str| {
            value
                .and_then(|value| value.to_f64())
                .ok_or_else(|| format!("missing {field} for month {}", record.month))
        };
        Ok(Self {
            month: record.month,
            copper: price(record.cu_price_per_ton, "cuPricePerTon")?,
            tin: price(record.sn_price_per_ton, "snPricePerTon")?,
        })
    }
}

/// Accepts `YYYY-MM-DD`, optionally followed by a time part.
pub(crate) fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let date_part = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

// Spreadsheet exports mix numbers and strings freely, so both decode to text.
fn text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(text)) => Some(text.trim().to_string()).filter(|text| !text.is_empty()),
        Some(Value::Number(number)) => Some(number.to_string()),
        Some(Value::Bool(flag)) => Some(flag.to_string()),
        _ => None,
    })
}

fn amount<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(number)) => {
            let parsed = if let Some(int) = number.as_i64() {
                Some(Decimal::from(int))
            } else {
                number.as_f64().and_then(|float| Decimal::try_from(float).ok())
            };
            parsed
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("number `{number}` out of range")))
        }
        Some(Value::String(text)) => {
            let cleaned = text.trim().replace(',', "");
            if cleaned.is_empty() || cleaned == "-" {
                return Ok(None);
            }
            cleaned
                .parse::<Decimal>()
                .map(Some)
                .map_err(|_| serde::de::Error::custom(format!("`{text}` is not a number")))
        }
        Some(other) => Err(serde::de::Error::custom(format!("expected a number, got {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use serde_json::json;

    use super::{parse_date, CommodityRecord, OrderRecord, PriceRecord, QuoteRecord};
    use valvey_core::domain::{CommodityMonth, PriceListRow};

    #[test]
    fn dates_accept_trailing_time() {
        let expected = chrono::NaiveDate::from_ymd_opt(2024, 3, 7);
        assert_eq!(parse_date("2024-03-07"), expected);
        assert_eq!(parse_date("2024-03-07 00:00:00"), expected);
        assert_eq!(parse_date("2024-03-07T12:30:00"), expected);
        assert_eq!(parse_date("07/03/2024"), None);
    }

    #[test]
    fn price_record_maps_option_columns() {
        let record: PriceRecord = serde_json::from_value(json!({
            "valveType": "VGBARR240AT",
            "bodyPrice": "1,200",
            "quantity": 1,
            "optionIP": 50,
            "optionLSW": null,
            "optionDiscSCS13": 12.5
        }))
        .expect("record");
        let row = PriceListRow::try_from(record).expect("row");

        assert_eq!(row.base_price, Some(Decimal::new(1200, 0)));
        assert_eq!(row.surcharges.internal_coating, Some(Decimal::new(50, 0)));
        assert_eq!(row.surcharges.limit_switch, None);
        assert_eq!(row.surcharges.disc_scs13, Some(Decimal::new(125, 1)));
    }

    #[test]
    fn price_record_without_valve_type_is_rejected() {
        let record: PriceRecord =
            serde_json::from_value(json!({ "bodyPrice": 10 })).expect("record");
        assert!(PriceListRow::try_from(record).is_err());
    }

    #[test]
    fn order_record_tolerates_numeric_codes_and_blank_amounts() {
        let record: OrderRecord = serde_json::from_value(json!({
            "materialNo": 100012345,
            "valveType": "  ",
            "orderDate": "2024-01-15 00:00:00",
            "orderAmount": "",
            "quantity": 2
        }))
        .expect("record");
        let mut notes = Vec::new();
        let row = record.into_row(&mut notes);

        assert!(notes.is_empty());
        assert_eq!(row.material_no, "100012345");
        assert_eq!(row.valve_type, None);
        assert_eq!(row.amount, None);
        assert_eq!(row.order_month(), Some(1));
    }

    #[test]
    fn order_record_with_unreadable_date_keeps_the_row() {
        let record: OrderRecord = serde_json::from_value(json!({
            "valveType": "VGA1",
            "orderDate": "2024/03/07",
            "orderAmount": 100,
            "quantity": 1
        }))
        .expect("record");
        let mut notes = Vec::new();
        let row = record.into_row(&mut notes);

        assert_eq!(row.order_date, None);
        assert_eq!(row.amount, Some(Decimal::from(100)));
        assert_eq!(notes, vec!["bad orderDate `2024/03/07`".to_string()]);
    }

    #[test]
    fn commodity_record_requires_both_prices() {
        let record: CommodityRecord =
            serde_json::from_value(json!({ "month": 2, "cuPricePerTon": "8,600" }))
                .expect("record");
        assert!(CommodityMonth::try_from(record).is_err());
    }

    #[test]
    fn quote_without_number_takes_its_position() {
        let record: QuoteRecord =
            serde_json::from_value(json!({ "quotePrice": 99 })).expect("record");
        let row = record.into_row(4).expect("row");
        assert_eq!(row.no, 5);
        assert_eq!(row.quoted_price, Decimal::new(99, 0));
    }
}
