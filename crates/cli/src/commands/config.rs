use std::env;
use std::fs;
use std::path::Path;

use creditgate_core::config::{resolve_config_path, AppConfig, LoadOptions, LogFormat};
use toml::Value;

struct Field {
    key_path: &'static str,
    env_keys: &'static [&'static str],
    value: String,
}

pub fn run(options: LoadOptions) -> String {
    let config_file_path = resolve_config_path(options.config_path.as_deref());
    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for field in effective_fields(&config) {
        let source = field_source(
            field.key_path,
            field.env_keys,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        lines.push(render_line(field.key_path, &field.value, source));
    }

    lines.join("\n")
}

fn effective_fields(config: &AppConfig) -> Vec<Field> {
    let engine = &config.engine;
    vec![
        Field {
            key_path: "engine.limits.advisor",
            env_keys: &["CREDITGATE_LIMIT_ADVISOR"],
            value: engine.limits.advisor.to_string(),
        },
        Field {
            key_path: "engine.limits.business_manager",
            env_keys: &["CREDITGATE_LIMIT_BUSINESS_MANAGER"],
            value: engine.limits.business_manager.to_string(),
        },
        Field {
            key_path: "engine.limits.branch_director",
            env_keys: &["CREDITGATE_LIMIT_BRANCH_DIRECTOR"],
            value: engine.limits.branch_director.to_string(),
        },
        Field {
            key_path: "engine.half_rule_mode",
            env_keys: &["CREDITGATE_HALF_RULE_MODE"],
            value: engine.half_rule_mode.as_str().to_string(),
        },
        Field {
            key_path: "engine.crossing_boundary",
            env_keys: &["CREDITGATE_CROSSING_BOUNDARY"],
            value: engine.crossing_boundary.as_str().to_string(),
        },
        Field {
            key_path: "engine.supplementary_approver",
            env_keys: &["CREDITGATE_SUPPLEMENTARY_APPROVER"],
            value: engine.supplementary_approver.as_str().to_string(),
        },
        Field {
            key_path: "engine.joint_approval_trigger",
            env_keys: &["CREDITGATE_JOINT_APPROVAL_TRIGGER"],
            value: engine.joint_approval_trigger.as_str().to_string(),
        },
        Field {
            key_path: "engine.joint_bank_threshold",
            env_keys: &["CREDITGATE_JOINT_BANK_THRESHOLD"],
            value: engine.joint_bank_threshold.to_string(),
        },
        Field {
            key_path: "engine.joint_secondary_threshold",
            env_keys: &["CREDITGATE_JOINT_SECONDARY_THRESHOLD"],
            value: engine.joint_secondary_threshold.to_string(),
        },
        Field {
            key_path: "engine.risk_ltv_threshold_pct",
            env_keys: &["CREDITGATE_RISK_LTV_THRESHOLD_PCT"],
            value: engine.risk_ltv_threshold_pct.to_string(),
        },
        Field {
            key_path: "engine.risk_debt_factor_threshold",
            env_keys: &["CREDITGATE_RISK_DEBT_FACTOR_THRESHOLD"],
            value: engine.risk_debt_factor_threshold.to_string(),
        },
        Field {
            key_path: "logging.level",
            env_keys: &["CREDITGATE_LOGGING_LEVEL", "CREDITGATE_LOG_LEVEL"],
            value: config.logging.level.clone(),
        },
        Field {
            key_path: "logging.format",
            env_keys: &["CREDITGATE_LOGGING_FORMAT", "CREDITGATE_LOG_FORMAT"],
            value: log_format_name(config.logging.format).to_string(),
        },
    ]
}

fn log_format_name(format: LogFormat) -> &'static str {
    match format {
        LogFormat::Compact => "compact",
        LogFormat::Pretty => "pretty",
        LogFormat::Json => "json",
    }
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

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
