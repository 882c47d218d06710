pub mod config;
pub mod context;
pub mod domain;
pub mod engines;
pub mod errors;
pub mod history;
pub mod pricing;

pub use context::{PricingContext, TableSizes, Tables};
pub use domain::{
    CommodityMonth, OptionSurcharges, OrderRow, PriceListRow, QuoteRow, SurchargeColumn,
};
pub use engines::{
    AnalysisEngine, AssessmentReport, AssessmentResult, MarketLagEngine, MarketLagReport,
    MarketLagSettings, QuoteAssessmentEngine, RecommendationEngine, RecommendationReport,
    RecommendationResult, TrendOutcome, TrendPoint, Verdict,
};
pub use errors::{ApplicationError, Degradation, InterfaceError};
pub use history::{HistoryMatch, MatchTier, OrderHistoryIndex};
pub use pricing::{ContractPricing, PriceIndex};
