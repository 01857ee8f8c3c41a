use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::approvals::blocks::CrossingBoundary;
use crate::approvals::half_rule::HalfRuleMode;
use crate::approvals::joint::JointApprovalTrigger;
use crate::approvals::ApprovalPolicy;
use crate::domain::decision::Approver;
use crate::domain::limits::RoleLimits;

pub const CONFIG_FILE_CANDIDATES: [&str; 2] = ["creditgate.toml", "config/creditgate.toml"];

#[derive(Clone, Debug, Default)]
pub struct AppConfig {
    pub engine: ApprovalPolicy,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "warn".to_string(), format: LogFormat::Compact }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub limits: Option<RoleLimits>,
    pub half_rule_mode: Option<HalfRuleMode>,
    pub crossing_boundary: Option<CrossingBoundary>,
    pub joint_approval_trigger: Option<JointApprovalTrigger>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("`{path}` is not valid TOML: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("config file `{0}` does not exist")]
    MissingConfigFile(PathBuf),
    #[error("`${{{var}}}` is referenced in the config file but not set")]
    MissingEnvInterpolation { var: String },
    #[error("`${{` without a closing `}}` in the config file")]
    UnterminatedInterpolation,
    #[error("{key}=`{value}` is not a valid value")]
    InvalidEnvOverride { key: String, value: String },
    #[error("invalid configuration: {0}")]
    Validation(String),
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl std::str::FromStr for HalfRuleMode {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match normalize_choice(value).as_str() {
            "halve_ceilings" => Ok(Self::HalveCeilings),
            "bank_share" => Ok(Self::BankShare),
            other => Err(ConfigError::Validation(format!(
                "unsupported half rule mode `{other}` (expected halve_ceilings|bank_share)"
            ))),
        }
    }
}

impl std::str::FromStr for CrossingBoundary {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match normalize_choice(value).as_str() {
            "first" => Ok(Self::First),
            "last" => Ok(Self::Last),
            other => Err(ConfigError::Validation(format!(
                "unsupported crossing boundary `{other}` (expected first|last)"
            ))),
        }
    }
}

impl std::str::FromStr for JointApprovalTrigger {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match normalize_choice(value).as_str() {
            "group_exposure" => Ok(Self::GroupExposure),
            "new_total" => Ok(Self::NewTotal),
            other => Err(ConfigError::Validation(format!(
                "unsupported joint approval trigger `{other}` (expected group_exposure|new_total)"
            ))),
        }
    }
}

impl std::str::FromStr for Approver {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match normalize_choice(value).as_str() {
            "advisor" => Ok(Self::Advisor),
            "business_manager" => Ok(Self::BusinessManager),
            "branch_director" => Ok(Self::BranchDirector),
            "credit" => Ok(Self::Credit),
            "credit_policy_board" => Ok(Self::CreditPolicyBoard),
            other => Err(ConfigError::Validation(format!("unknown approver `{other}`"))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from(CONFIG_FILE_CANDIDATES[0]));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(engine) = patch.engine {
            if let Some(limits) = engine.limits {
                if let Some(advisor) = limits.advisor {
                    self.engine.limits.advisor = advisor;
                }
                if let Some(business_manager) = limits.business_manager {
                    self.engine.limits.business_manager = business_manager;
                }
                if let Some(branch_director) = limits.branch_director {
                    self.engine.limits.branch_director = branch_director;
                }
            }
            if let Some(half_rule_mode) = engine.half_rule_mode {
                self.engine.half_rule_mode = half_rule_mode;
            }
            if let Some(crossing_boundary) = engine.crossing_boundary {
                self.engine.crossing_boundary = crossing_boundary;
            }
            if let Some(supplementary_approver) = engine.supplementary_approver {
                self.engine.supplementary_approver = supplementary_approver;
            }
            if let Some(joint_approval_trigger) = engine.joint_approval_trigger {
                self.engine.joint_approval_trigger = joint_approval_trigger;
            }
            if let Some(joint_bank_threshold) = engine.joint_bank_threshold {
                self.engine.joint_bank_threshold = joint_bank_threshold;
            }
            if let Some(joint_secondary_threshold) = engine.joint_secondary_threshold {
                self.engine.joint_secondary_threshold = joint_secondary_threshold;
            }
            if let Some(risk_ltv_threshold_pct) = engine.risk_ltv_threshold_pct {
                self.engine.risk_ltv_threshold_pct = risk_ltv_threshold_pct;
            }
            if let Some(risk_debt_factor_threshold) = engine.risk_debt_factor_threshold {
                self.engine.risk_debt_factor_threshold = risk_debt_factor_threshold;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("CREDITGATE_LIMIT_ADVISOR") {
            self.engine.limits.advisor = parse_decimal("CREDITGATE_LIMIT_ADVISOR", &value)?;
        }
        if let Some(value) = read_env("CREDITGATE_LIMIT_BUSINESS_MANAGER") {
            self.engine.limits.business_manager =
                parse_decimal("CREDITGATE_LIMIT_BUSINESS_MANAGER", &value)?;
        }
        if let Some(value) = read_env("CREDITGATE_LIMIT_BRANCH_DIRECTOR") {
            self.engine.limits.branch_director =
                parse_decimal("CREDITGATE_LIMIT_BRANCH_DIRECTOR", &value)?;
        }

        if let Some(value) = read_env("CREDITGATE_HALF_RULE_MODE") {
            self.engine.half_rule_mode = value.parse()?;
        }
        if let Some(value) = read_env("CREDITGATE_CROSSING_BOUNDARY") {
            self.engine.crossing_boundary = value.parse()?;
        }
        if let Some(value) = read_env("CREDITGATE_SUPPLEMENTARY_APPROVER") {
            self.engine.supplementary_approver = value.parse()?;
        }
        if let Some(value) = read_env("CREDITGATE_JOINT_APPROVAL_TRIGGER") {
            self.engine.joint_approval_trigger = value.parse()?;
        }
        if let Some(value) = read_env("CREDITGATE_JOINT_BANK_THRESHOLD") {
            self.engine.joint_bank_threshold =
                parse_decimal("CREDITGATE_JOINT_BANK_THRESHOLD", &value)?;
        }
        if let Some(value) = read_env("CREDITGATE_JOINT_SECONDARY_THRESHOLD") {
            self.engine.joint_secondary_threshold =
                parse_decimal("CREDITGATE_JOINT_SECONDARY_THRESHOLD", &value)?;
        }
        if let Some(value) = read_env("CREDITGATE_RISK_LTV_THRESHOLD_PCT") {
            self.engine.risk_ltv_threshold_pct =
                parse_decimal("CREDITGATE_RISK_LTV_THRESHOLD_PCT", &value)?;
        }
        if let Some(value) = read_env("CREDITGATE_RISK_DEBT_FACTOR_THRESHOLD") {
            self.engine.risk_debt_factor_threshold =
                parse_decimal("CREDITGATE_RISK_DEBT_FACTOR_THRESHOLD", &value)?;
        }

        let log_level =
            read_env("CREDITGATE_LOGGING_LEVEL").or_else(|| read_env("CREDITGATE_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("CREDITGATE_LOGGING_FORMAT").or_else(|| read_env("CREDITGATE_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(limits) = overrides.limits {
            self.engine.limits = limits;
        }
        if let Some(half_rule_mode) = overrides.half_rule_mode {
            self.engine.half_rule_mode = half_rule_mode;
        }
        if let Some(crossing_boundary) = overrides.crossing_boundary {
            self.engine.crossing_boundary = crossing_boundary;
        }
        if let Some(joint_approval_trigger) = overrides.joint_approval_trigger {
            self.engine.joint_approval_trigger = joint_approval_trigger;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(log_format) = overrides.log_format {
            self.logging.format = log_format;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_engine(&self.engine)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    CONFIG_FILE_CANDIDATES.into_iter().map(PathBuf::from).find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

/// Expands `${VAR}` and `${VAR:-fallback}` references before TOML parsing.
fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        output.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after.find('}').ok_or(ConfigError::UnterminatedInterpolation)?;
        let expression = &after[..end];

        let (var, fallback) = match expression.split_once(":-") {
            Some((var, fallback)) => (var.trim(), Some(fallback)),
            None => (expression.trim(), None),
        };
        match (env::var(var), fallback) {
            (Ok(value), _) => output.push_str(&value),
            (Err(_), Some(fallback)) => output.push_str(fallback),
            (Err(_), None) => {
                return Err(ConfigError::MissingEnvInterpolation { var: var.to_string() })
            }
        }

        rest = &after[end + 1..];
    }

    output.push_str(rest);
    Ok(output)
}

fn validate_engine(engine: &ApprovalPolicy) -> Result<(), ConfigError> {
    for (role, ceiling) in engine.limits.tiers() {
        if ceiling <= Decimal::ZERO {
            return Err(ConfigError::Validation(format!(
                "engine.limits.{} must be greater than zero",
                role.as_str()
            )));
        }
    }

    let supplementary = engine.supplementary_approver;
    if !matches!(supplementary, Approver::BusinessManager | Approver::BranchDirector) {
        return Err(ConfigError::Validation(
            "engine.supplementary_approver must be business_manager or branch_director".to_string(),
        ));
    }

    let thresholds = [
        ("engine.joint_bank_threshold", engine.joint_bank_threshold),
        ("engine.joint_secondary_threshold", engine.joint_secondary_threshold),
        ("engine.risk_ltv_threshold_pct", engine.risk_ltv_threshold_pct),
        ("engine.risk_debt_factor_threshold", engine.risk_debt_factor_threshold),
    ];
    if let Some((key, _)) = thresholds.into_iter().find(|(_, value)| *value < Decimal::ZERO) {
        return Err(ConfigError::Validation(format!("{key} must not be negative")));
    }

    if engine.risk_ltv_threshold_pct > Decimal::ONE_HUNDRED {
        return Err(ConfigError::Validation(
            "engine.risk_ltv_threshold_pct must be in range 0..=100".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn normalize_choice(value: &str) -> String {
    value.trim().to_ascii_lowercase().replace('-', "_")
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_decimal(key: &str, value: &str) -> Result<Decimal, ConfigError> {
    value.trim().replace('_', "").parse::<Decimal>().map_err(|_| {
        ConfigError::InvalidEnvOverride { key: key.to_string(), value: value.to_string() }
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    engine: Option<EnginePatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct EnginePatch {
    limits: Option<LimitsPatch>,
    half_rule_mode: Option<HalfRuleMode>,
    crossing_boundary: Option<CrossingBoundary>,
    supplementary_approver: Option<Approver>,
    joint_approval_trigger: Option<JointApprovalTrigger>,
    joint_bank_threshold: Option<Decimal>,
    joint_secondary_threshold: Option<Decimal>,
    risk_ltv_threshold_pct: Option<Decimal>,
    risk_debt_factor_threshold: Option<Decimal>,
}

#[derive(Debug, Default, Deserialize)]
struct LimitsPatch {
    advisor: Option<Decimal>,
    business_manager: Option<Decimal>,
    branch_director: Option<Decimal>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
