pub mod commodity;
pub mod order;
pub mod price_list;
pub mod quote;

pub use commodity::CommodityMonth;
pub use order::OrderRow;
pub use price_list::{OptionSurcharges, PriceListRow, SurchargeColumn};
pub use quote::QuoteRow;
