use crate::errors::{DashError, DashResult};
use crate::numeric_range::{RangeOverride, RangeTable};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

pub const DEFAULT_CONFIG_FILE: &str = "churn_dash.toml";
pub const ENV_PREFIX: &str = "CHURN_";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8501,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LabelConfig {
    /// Raw model label -> display text
    #[serde(default = "default_tiers")]
    pub tiers: BTreeMap<String, String>,
    /// Raw labels framed as an alert
    #[serde(default = "default_alert_labels")]
    pub alert_labels: Vec<String>,
}

fn default_tiers() -> BTreeMap<String, String> {
    (1..=3).map(|i| (i.to_string(), format!("Tier {i}"))).collect()
}

fn default_alert_labels() -> Vec<String> {
    vec!["LEAVE".to_string()]
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            tiers: default_tiers(),
            alert_labels: default_alert_labels(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DashConfig {
    pub model_path: String,
    pub feature_spec_path: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub labels: LabelConfig,
    /// Per-feature slider ranges layered over the standard table
    #[serde(default)]
    pub ranges: BTreeMap<String, RangeOverride>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for DashConfig {
    fn default() -> Self {
        Self {
            model_path: "models/pipeline.json".to_string(),
            feature_spec_path: "models/feature_spec.json".to_string(),
            log_level: default_log_level(),
            server: ServerConfig::default(),
            labels: LabelConfig::default(),
            ranges: BTreeMap::new(),
        }
    }
}

impl DashConfig {
    pub fn range_table(&self) -> DashResult<RangeTable> {
        RangeTable::with_overrides(&self.ranges)
    }

    fn validate(&self) -> DashResult<()> {
        if self.model_path.trim().is_empty() {
            return Err(DashError::config("model_path must be set"));
        }
        if self.feature_spec_path.trim().is_empty() {
            return Err(DashError::config("feature_spec_path must be set"));
        }
        self.range_table()?;
        Ok(())
    }
}

/// Defaults, then the TOML file (`churn_dash.toml` unless given), then
/// `CHURN_*` environment variables (`__` separates nested keys).
pub fn load_config(path: Option<&Path>) -> DashResult<DashConfig> {
    let file = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
    let figment = Figment::from(Serialized::defaults(DashConfig::default()))
        .merge(Toml::file(file))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));

    let config: DashConfig = figment.extract()?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = DashConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.labels.tiers.get("2").map(String::as_str), Some("Tier 2"));
        assert_eq!(config.labels.alert_labels, vec!["LEAVE"]);
    }

    #[test]
    fn empty_paths_are_rejected() {
        let config = DashConfig {
            model_path: "  ".to_string(),
            ..DashConfig::default()
        };
        assert!(matches!(config.validate(), Err(DashError::Config { .. })));
    }
}
