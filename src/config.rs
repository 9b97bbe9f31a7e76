//! TOML-based run configuration and preset definitions.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::data::ColumnRoles;
use crate::model::BoostingParams;
use crate::realloc::ReallocationPolicy;

/// Top-level run configuration parsed from TOML.
///
/// All fields have defaults matching the baseline preset. Load from TOML
/// with [`RunConfig::from_toml_file`] or use [`RunConfig::baseline`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    /// Input tables and column roles.
    #[serde(default)]
    pub data: DataConfig,
    /// Booster hyperparameters.
    #[serde(default)]
    pub model: BoostingParams,
    /// Reallocation policy and usage source.
    #[serde(default)]
    pub reallocation: ReallocationConfig,
}

/// Input tables and column roles.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DataConfig {
    /// Training-period CSV (overridable with `--train`).
    pub train: Option<PathBuf>,
    /// Test-period CSV (overridable with `--test`).
    pub test: Option<PathBuf>,
    pub borough_column: String,
    pub district_column: String,
    pub date_column: String,
    /// Regression target column.
    pub target_column: String,
    /// Feature column holding the existing station count.
    pub station_column: String,
    /// Feature column holding the population flow.
    pub population_column: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        let roles = ColumnRoles::default();
        Self {
            train: None,
            test: None,
            borough_column: roles.borough,
            district_column: roles.district,
            date_column: roles.date,
            target_column: roles.target,
            station_column: "station_count".to_string(),
            population_column: "population_flow".to_string(),
        }
    }
}

impl DataConfig {
    /// Column roles for the CSV reader.
    pub fn roles(&self) -> ColumnRoles {
        ColumnRoles {
            borough: self.borough_column.clone(),
            district: self.district_column.clone(),
            date: self.date_column.clone(),
            target: self.target_column.clone(),
        }
    }
}

/// Which usage totals drive the reallocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UsageKind {
    /// Observed test-period rentals.
    #[default]
    Observed,
    /// Model predictions for the test period.
    Predicted,
}

impl UsageKind {
    /// Parses a CLI value (`observed` or `predicted`).
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "observed" => Some(Self::Observed),
            "predicted" => Some(Self::Predicted),
            _ => None,
        }
    }
}

impl fmt::Display for UsageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Observed => write!(f, "observed"),
            Self::Predicted => write!(f, "predicted"),
        }
    }
}

/// Reallocation policy parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReallocationConfig {
    /// Exponent on the usage-per-station ratio.
    pub alpha: f64,
    /// Exponent on the usage-per-population ratio.
    pub beta: f64,
    /// Largest per-district change in station count.
    pub max_change: u32,
    /// Usage source for the district totals.
    pub usage: UsageKind,
}

impl Default for ReallocationConfig {
    fn default() -> Self {
        let policy = ReallocationPolicy::default();
        Self {
            alpha: policy.alpha,
            beta: policy.beta,
            max_change: policy.max_change,
            usage: UsageKind::default(),
        }
    }
}

impl ReallocationConfig {
    pub fn policy(&self) -> ReallocationPolicy {
        ReallocationPolicy {
            alpha: self.alpha,
            beta: self.beta,
            max_change: self.max_change,
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug)]
pub struct ConfigError {
    /// Dotted field path (e.g., `"model.max_depth"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config error: {}: {}", self.field, self.message)
    }
}

impl std::error::Error for ConfigError {}

impl RunConfig {
    /// Returns the baseline run: tuned booster, unit exponents, +/-2 stations.
    pub fn baseline() -> Self {
        Self::default()
    }

    /// Returns the conservative preset: damped signals, at most one station
    /// moved per district.
    pub fn conservative() -> Self {
        Self {
            reallocation: ReallocationConfig {
                alpha: 0.5,
                beta: 0.5,
                max_change: 1,
                ..ReallocationConfig::default()
            },
            ..Self::default()
        }
    }

    /// Returns the aggressive preset: amplified efficiency signal, wider
    /// bound, reallocation driven by predicted demand.
    pub fn aggressive() -> Self {
        Self {
            reallocation: ReallocationConfig {
                alpha: 1.5,
                beta: 1.0,
                max_change: 5,
                usage: UsageKind::Predicted,
            },
            ..Self::default()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline", "conservative", "aggressive"];

    /// Loads a run configuration from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "conservative" => Ok(Self::conservative()),
            "aggressive" => Ok(Self::aggressive()),
            _ => Err(ConfigError {
                field: "preset".to_string(),
                message: format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            }),
        }
    }

    /// Parses a run configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError {
            field: "config".to_string(),
            message: format!("cannot read \"{}\": {e}", path.display()),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a run configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError {
            field: "toml".to_string(),
            message: e.to_string(),
        })
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let mut push = |field: &str, message: String| {
            errors.push(ConfigError {
                field: field.to_string(),
                message,
            });
        };

        let d = &self.data;
        let roles = [
            ("data.borough_column", &d.borough_column),
            ("data.district_column", &d.district_column),
            ("data.date_column", &d.date_column),
            ("data.target_column", &d.target_column),
        ];
        for (i, (field, name)) in roles.iter().enumerate() {
            if name.is_empty() {
                push(*field, "must not be empty".into());
            } else if roles[..i].iter().any(|(_, other)| other == name) {
                push(*field, format!("\"{name}\" is already used by another role"));
            }
        }
        let role_names = d.roles();
        for (field, name) in [
            ("data.station_column", &d.station_column),
            ("data.population_column", &d.population_column),
        ] {
            if name.is_empty() {
                push(field, "must not be empty".into());
            } else if role_names.is_role(name) {
                push(field, format!("\"{name}\" is an identifier/target column, not a feature"));
            }
        }

        let m = &self.model;
        if !(m.learning_rate.is_finite() && m.learning_rate > 0.0) {
            push("model.learning_rate", "must be > 0".into());
        }
        if !(m.reg_alpha.is_finite() && m.reg_alpha >= 0.0) {
            push("model.reg_alpha", "must be >= 0".into());
        }
        if !(m.reg_lambda.is_finite() && m.reg_lambda >= 0.0) {
            push("model.reg_lambda", "must be >= 0".into());
        }
        if !(m.gamma.is_finite() && m.gamma >= 0.0) {
            push("model.gamma", "must be >= 0".into());
        }
        if !(m.min_child_weight.is_finite() && m.min_child_weight >= 0.0) {
            push("model.min_child_weight", "must be >= 0".into());
        }
        if !(m.subsample > 0.0 && m.subsample <= 1.0) {
            push("model.subsample", "must be in (0.0, 1.0]".into());
        }
        if !(m.colsample_bytree > 0.0 && m.colsample_bytree <= 1.0) {
            push("model.colsample_bytree", "must be in (0.0, 1.0]".into());
        }
        if m.max_bin < 2 {
            push("model.max_bin", "must be >= 2".into());
        }

        let r = &self.reallocation;
        if !r.alpha.is_finite() {
            push("reallocation.alpha", "must be finite".into());
        }
        if !r.beta.is_finite() {
            push("reallocation.beta", "must be finite".into());
        }

        errors
    }
}
