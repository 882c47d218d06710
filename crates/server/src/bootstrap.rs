use thiserror::Error;
use tracing::{info, warn};

use valvey_agent::{client_from_config, LlmError, NarrativeService};
use valvey_core::config::{AppConfig, ConfigError, LoadOptions};
use valvey_core::{MarketLagEngine, PricingContext};
use valvey_data::load_tables;

use crate::state::AppState;

pub struct Application {
    pub config: AppConfig,
    pub state: AppState,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("narrative client could not be initialized: {0}")]
    Narrative(#[source] LlmError),
}

pub fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config)
}

pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        data_dir = %config.data.dir.display(),
        "starting application bootstrap"
    );

    let report = load_tables(&config.data.dir);
    for issue in &report.issues {
        warn!(
            event_name = "system.bootstrap.data_issue",
            correlation_id = "bootstrap",
            dataset = issue.dataset.as_str(),
            detail = %issue.message,
            "data table degraded"
        );
    }
    let context = PricingContext::new(report.tables);
    let sizes = context.sizes();
    info!(
        event_name = "system.bootstrap.context_ready",
        correlation_id = "bootstrap",
        price_list = sizes.price_list,
        quotes = sizes.quotes,
        orders = sizes.orders,
        commodity_months = sizes.commodity_months,
        mapped_materials = sizes.mapped_materials,
        "pricing context built"
    );

    let client = client_from_config(&config.llm).map_err(BootstrapError::Narrative)?;
    let narrative = NarrativeService::new(client);
    info!(
        event_name = "system.bootstrap.narrative",
        correlation_id = "bootstrap",
        enabled = narrative.is_enabled(),
        "narrative service initialized"
    );

    let state = AppState::new(
        context,
        MarketLagEngine::new(config.analysis.clone()),
        narrative,
        report.issues,
    );
    Ok(Application { config, state })
}
