use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::ExposeSecret;
use serde::Serialize;
use toml::Value;
use valvey_core::config::AppConfig;

use super::{load_config, CommandResult};

const COMMAND: &str = "config";

/// One reported setting: dotted key, rendered value, env override key.
struct Field {
    key: &'static str,
    value: String,
    env_keys: &'static [&'static str],
}

#[derive(Debug, Serialize)]
struct ConfigReport {
    command: &'static str,
    status: &'static str,
    precedence: &'static str,
    fields: Vec<FieldReport>,
}

#[derive(Debug, Serialize)]
struct FieldReport {
    key: &'static str,
    value: String,
    source: String,
}

/// Prints the effective configuration as JSON; a config that fails to load exits with 2.
pub fn run() -> CommandResult {
    let config = match load_config(COMMAND, None) {
        Ok(config) => config,
        Err(result) => return result,
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let fields = fields(&config)
        .into_iter()
        .map(|field| FieldReport {
            key: field.key,
            source: field_source(
                field.key,
                field.env_keys,
                config_file_doc.as_ref(),
                config_file_path.as_deref(),
            ),
            value: field.value,
        })
        .collect();
    let report = ConfigReport {
        command: COMMAND,
        status: "ok",
        precedence: "overrides > env > file > default",
        fields,
    };

    match serde_json::to_string_pretty(&report) {
        Ok(output) => CommandResult { exit_code: 0, output },
        Err(error) => CommandResult::failure(
            COMMAND,
            "serialization",
            format!("config could not be encoded: {error}"),
            3,
        ),
    }
}

fn fields(config: &AppConfig) -> Vec<Field> {
    let llm_api_key = config
        .llm
        .api_key
        .as_ref()
        .map(|key| redact_token(key.expose_secret()))
        .unwrap_or_else(|| "<unset>".to_string());

    vec![
        Field {
            key: "data.dir",
            value: config.data.dir.display().to_string(),
            env_keys: &["VALVEY_DATA_DIR"],
        },
        Field {
            key: "server.bind_address",
            value: config.server.bind_address.clone(),
            env_keys: &["VALVEY_SERVER_BIND_ADDRESS"],
        },
        Field {
            key: "server.port",
            value: config.server.port.to_string(),
            env_keys: &["VALVEY_SERVER_PORT", "PORT"],
        },
        Field {
            key: "llm.enabled",
            value: config.llm.enabled.to_string(),
            env_keys: &["VALVEY_LLM_ENABLED"],
        },
        Field {
            key: "llm.provider",
            value: format!("{:?}", config.llm.provider),
            env_keys: &["VALVEY_LLM_PROVIDER"],
        },
        Field {
            key: "llm.model",
            value: config.llm.model.clone(),
            env_keys: &["VALVEY_LLM_MODEL"],
        },
        Field {
            key: "llm.base_url",
            value: config.llm.base_url.clone().unwrap_or_else(|| "<unset>".to_string()),
            env_keys: &["VALVEY_LLM_BASE_URL"],
        },
        Field {
            key: "llm.api_key",
            value: llm_api_key,
            env_keys: &["VALVEY_LLM_API_KEY", "ANTHROPIC_API_KEY"],
        },
        Field {
            key: "llm.timeout_secs",
            value: config.llm.timeout_secs.to_string(),
            env_keys: &["VALVEY_LLM_TIMEOUT_SECS"],
        },
        Field {
            key: "analysis.family_prefix",
            value: config.analysis.family_prefix.clone(),
            env_keys: &["VALVEY_ANALYSIS_FAMILY_PREFIX"],
        },
        Field {
            key: "analysis.family_suffix",
            value: config.analysis.family_suffix.clone(),
            env_keys: &["VALVEY_ANALYSIS_FAMILY_SUFFIX"],
        },
        Field {
            key: "analysis.excluded_keyword",
            value: config.analysis.excluded_keyword.clone(),
            env_keys: &[],
        },
        Field {
            key: "logging.level",
            value: config.logging.level.clone(),
            env_keys: &["VALVEY_LOGGING_LEVEL", "VALVEY_LOG_LEVEL"],
        },
        Field {
            key: "logging.format",
            value: format!("{:?}", config.logging.format),
            env_keys: &["VALVEY_LOGGING_FORMAT", "VALVEY_LOG_FORMAT"],
        },
    ]
}

fn detect_config_path() -> Option<PathBuf> {
    let root = PathBuf::from("valvey.toml");
    if root.exists() {
        return Some(root);
    }

    let nested = PathBuf::from("config/valvey.toml");
    if nested.exists() {
        return Some(nested);
    }

    None
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn redact_token(token: &str) -> String {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    if let Some((prefix, _)) = trimmed.split_once('-') {
        return format!("{prefix}-***");
    }

    "<redacted>".to_string()
}
