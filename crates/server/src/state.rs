use std::sync::Arc;

use valvey_agent::NarrativeService;
use valvey_core::{MarketLagEngine, PricingContext};
use valvey_data::LoadIssue;

/// Shared, read-only request state. Tables are loaded once at startup.
#[derive(Clone)]
pub struct AppState {
    pub context: Arc<PricingContext>,
    pub market_lag: Arc<MarketLagEngine>,
    pub narrative: NarrativeService,
    pub load_issues: Arc<Vec<LoadIssue>>,
}

impl AppState {
    pub fn new(
        context: PricingContext,
        market_lag: MarketLagEngine,
        narrative: NarrativeService,
        load_issues: Vec<LoadIssue>,
    ) -> Self {
        Self {
            context: Arc::new(context),
            market_lag: Arc::new(market_lag),
            narrative,
            load_issues: Arc::new(load_issues),
        }
    }
}
