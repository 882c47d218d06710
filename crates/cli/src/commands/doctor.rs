use serde::Serialize;
use valvey_core::config::{AppConfig, LlmProvider, LoadOptions};
use valvey_data::{load_tables, Dataset};

use crate::commands::CommandResult;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> CommandResult {
    let report = build_report(AppConfig::load(LoadOptions::default()));
    let exit_code = if report.overall_status == CheckStatus::Pass { 0 } else { 1 };

    if json_output {
        let output = serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
        return CommandResult { exit_code, output };
    }

    CommandResult { exit_code, output: render_human(&report) }
}

fn build_report<E: std::fmt::Display>(config: Result<AppConfig, E>) -> DoctorReport {
    let mut checks = Vec::new();

    match config {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation".to_string(),
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.extend(check_data_tables(&config));
            checks.push(check_narrative(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation".to_string(),
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            checks.push(DoctorCheck {
                name: "data_tables".to_string(),
                status: CheckStatus::Skipped,
                details: "skipped because configuration did not load".to_string(),
            });
            checks.push(DoctorCheck {
                name: "narrative_readiness".to_string(),
                status: CheckStatus::Skipped,
                details: "skipped because configuration did not load".to_string(),
            });
        }
    }

    // Narratives are optional, so a skipped check does not fail the run.
    let any_fail = checks.iter().any(|check| check.status == CheckStatus::Fail);
    let overall_status = if any_fail { CheckStatus::Fail } else { CheckStatus::Pass };
    let summary = if any_fail {
        "doctor: one or more readiness checks failed".to_string()
    } else {
        "doctor: all readiness checks passed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_data_tables(config: &AppConfig) -> Vec<DoctorCheck> {
    let report = load_tables(&config.data.dir);
    let tables = &report.tables;

    Dataset::ALL
        .into_iter()
        .map(|dataset| {
            let rows = match dataset {
                Dataset::PriceTable => tables.price_list.len(),
                Dataset::Quotes => tables.quotes.len(),
                Dataset::Orders => tables.orders.len(),
                Dataset::Commodities => tables.commodities.len(),
            };
            let issues: Vec<&str> = report
                .issues
                .iter()
                .filter(|issue| issue.dataset == dataset)
                .map(|issue| issue.message.as_str())
                .collect();

            let (status, details) = if rows == 0 {
                let reason = if issues.is_empty() {
                    "table is empty".to_string()
                } else {
                    issues.join("; ")
                };
                (CheckStatus::Fail, reason)
            } else if issues.is_empty() {
                (CheckStatus::Pass, format!("{rows} rows loaded"))
            } else {
                (CheckStatus::Pass, format!("{rows} rows loaded ({})", issues.join("; ")))
            };

            DoctorCheck { name: format!("data_{}", dataset.as_str()), status, details }
        })
        .collect()
}

fn check_narrative(config: &AppConfig) -> DoctorCheck {
    let name = "narrative_readiness".to_string();
    if !config.llm.enabled {
        return DoctorCheck {
            name,
            status: CheckStatus::Skipped,
            details: "narratives disabled; local summaries only".to_string(),
        };
    }
    if config.llm.is_ready() {
        return DoctorCheck {
            name,
            status: CheckStatus::Pass,
            details: format!(
                "{:?} client configured with model `{}`",
                config.llm.provider, config.llm.model
            ),
        };
    }
    let details = match config.llm.provider {
        LlmProvider::Anthropic => {
            "no api key set (VALVEY_LLM_API_KEY or ANTHROPIC_API_KEY); local summaries only"
        }
        LlmProvider::Ollama => "no base url set; local summaries only",
    };
    DoctorCheck { name, status: CheckStatus::Skipped, details: details.to_string() }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
