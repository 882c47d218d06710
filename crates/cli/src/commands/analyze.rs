use std::path::PathBuf;

use serde::Serialize;
use valvey_core::{
    AnalysisEngine, MarketLagEngine, PricingContext, QuoteAssessmentEngine, RecommendationEngine,
};
use valvey_data::{load_tables, LoadIssue};

use crate::commands::{load_config, CommandResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Screen {
    Recommend,
    Assess,
    MarketLag,
}

impl Screen {
    pub fn command_name(&self) -> &'static str {
        match self {
            Self::Recommend => "recommend",
            Self::Assess => "assess",
            Self::MarketLag => "market-lag",
        }
    }
}

#[derive(Debug, Serialize)]
struct AnalysisOutput<T: Serialize> {
    command: &'static str,
    status: &'static str,
    issues: Vec<LoadIssue>,
    summary: String,
    report: T,
}

/// Runs one screen over the configured data directory and prints its report as JSON.
pub fn run(screen: Screen, data_dir: Option<PathBuf>) -> CommandResult {
    let command = screen.command_name();
    let config = match load_config(command, data_dir) {
        Ok(config) => config,
        Err(result) => return result,
    };

    let loaded = load_tables(&config.data.dir);
    let issues = loaded.issues;
    let context = PricingContext::new(loaded.tables);

    let encoded = match screen {
        Screen::Recommend => {
            let report = RecommendationEngine.run(&context);
            encode(command, issues, report.local_summary(), report)
        }
        Screen::Assess => {
            let report = QuoteAssessmentEngine.run(&context);
            encode(command, issues, report.local_summary(), report)
        }
        Screen::MarketLag => {
            let report = MarketLagEngine::new(config.analysis.clone()).run(&context);
            encode(command, issues, report.local_summary(), report)
        }
    };

    match encoded {
        Ok(output) => CommandResult { exit_code: 0, output },
        Err(error) => CommandResult::failure(
            command,
            "serialization",
            format!("report could not be encoded: {error}"),
            3,
        ),
    }
}

fn encode<T: Serialize>(
    command: &'static str,
    issues: Vec<LoadIssue>,
    summary: String,
    report: T,
) -> Result<String, serde_json::Error> {
    let status = if issues.is_empty() { "ok" } else { "degraded" };
    serde_json::to_string_pretty(&AnalysisOutput { command, status, issues, summary, report })
}
