use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Vendor quote line awaiting an adequacy verdict.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteRow {
    pub no: u32,
    pub material_no: String,
    pub description: String,
    pub quoted_price: Decimal,
    pub quantity: Option<Decimal>,
    pub internal_coating: Option<String>,
    pub external_coating: Option<String>,
    pub spec: Option<String>,
    pub review_comment: Option<String>,
}
