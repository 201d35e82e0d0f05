// adstar-core/src/domain/project/configuration.rs

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use validator::Validate;

use crate::domain::bridge::{CuratedMapping, CuratedTable, StrategyKind};

/// Contents of `adstar.yaml`.
#[derive(Debug, Deserialize, Serialize, Clone, Validate)]
pub struct ProjectConfig {
    #[validate(length(min = 1, message = "Project name cannot be empty"))]
    pub name: String,
    #[serde(default = "default_version")]
    pub version: String,

    #[validate(nested)]
    #[serde(default)]
    pub staging: StagingConfig,

    #[validate(nested)]
    #[serde(default)]
    pub output: OutputConfig,

    #[validate(nested)]
    #[serde(default)]
    pub bridge: BridgeConfig,

    #[validate(nested)]
    #[serde(default)]
    pub warehouse: WarehouseConfig,

    #[serde(rename = "clean-targets", default = "default_clean_targets")]
    pub clean_targets: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Validate)]
pub struct StagingConfig {
    #[validate(length(min = 1))]
    #[serde(rename = "ad-path", default = "default_ad_path")]
    pub ad_path: String,
    #[validate(length(min = 1))]
    #[serde(rename = "web-path", default = "default_web_path")]
    pub web_path: String,
}

impl Default for StagingConfig {
    fn default() -> Self {
        Self {
            ad_path: default_ad_path(),
            web_path: default_web_path(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Validate)]
pub struct OutputConfig {
    /// Star schema snapshot (dimensions, bridge, facts).
    #[validate(length(min = 1))]
    #[serde(rename = "target-path", default = "default_target_path")]
    pub target_path: String,
    /// KPI tables, report and run results.
    #[validate(length(min = 1))]
    #[serde(rename = "kpi-path", default = "default_kpi_path")]
    pub kpi_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            target_path: default_target_path(),
            kpi_path: default_kpi_path(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Validate)]
pub struct BridgeConfig {
    /// Matchers in precedence order.
    #[validate(custom(function = "validate_unique_strategies"))]
    #[serde(default = "default_strategies")]
    pub strategies: Vec<StrategyKind>,

    /// Floor for the normalized_token matcher.
    #[validate(range(min = 0.0, max = 1.0))]
    #[serde(rename = "min-confidence", default = "default_min_confidence")]
    pub min_confidence: f64,

    #[validate(range(min = 1, max = 16))]
    #[serde(rename = "probe-parts", default = "default_probe_parts")]
    pub probe_parts: usize,

    #[validate(nested)]
    #[serde(default = "CuratedTable::reference_entries")]
    pub curated: Vec<CuratedMapping>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            strategies: default_strategies(),
            min_confidence: default_min_confidence(),
            probe_parts: default_probe_parts(),
            curated: CuratedTable::reference_entries(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Validate)]
pub struct WarehouseConfig {
    #[serde(default)]
    pub enabled: bool,
    #[validate(length(min = 1))]
    #[serde(default = "default_warehouse_path")]
    pub path: String,
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: default_warehouse_path(),
        }
    }
}

fn validate_unique_strategies(strategies: &[StrategyKind]) -> Result<(), validator::ValidationError> {
    let mut seen = HashSet::new();
    for strategy in strategies {
        if !seen.insert(strategy) {
            let mut err = validator::ValidationError::new("duplicate_strategy");
            err.message = Some(format!("strategy '{}' listed twice", strategy.as_str()).into());
            return Err(err);
        }
    }
    Ok(())
}

fn default_version() -> String {
    "1.0".to_string()
}
fn default_ad_path() -> String {
    "data/staging/ad_staging.csv".to_string()
}
fn default_web_path() -> String {
    "data/staging/web_staging.csv".to_string()
}
fn default_target_path() -> String {
    "target/dimensional".to_string()
}
fn default_kpi_path() -> String {
    "target/outputs".to_string()
}
fn default_strategies() -> Vec<StrategyKind> {
    vec![StrategyKind::Curated]
}
fn default_min_confidence() -> f64 {
    0.6
}
fn default_probe_parts() -> usize {
    3
}
fn default_warehouse_path() -> String {
    "target/adstar.duckdb".to_string()
}
fn default_clean_targets() -> Vec<String> {
    vec!["target".to_string()]
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_gets_defaults() {
        let config: ProjectConfig = serde_yaml::from_str("name: demo\n").unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.staging.ad_path, "data/staging/ad_staging.csv");
        assert_eq!(config.output.kpi_path, "target/outputs");
        assert_eq!(config.bridge.strategies, vec![StrategyKind::Curated]);
        assert_eq!(config.bridge.curated.len(), 3);
        assert!(!config.warehouse.enabled);
    }

    #[test]
    fn test_full_config() {
        let yaml = r#"
name: flight_q4
staging:
  ad-path: in/ad.csv
  web-path: in/web.csv
bridge:
  strategies: [curated, normalized_token]
  min-confidence: 0.5
  curated:
    - creative: Banner_A
      ad_content: banner-a
      confidence: 0.9
warehouse:
  enabled: true
  path: out/wh.duckdb
"#;
        let config: ProjectConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.bridge.curated[0].confidence, 0.9);
        assert_eq!(config.bridge.strategies[1], StrategyKind::NormalizedToken);
        assert_eq!(config.warehouse.path, "out/wh.duckdb");
    }

    #[test]
    fn test_rejects_out_of_range_confidence() {
        let yaml = r#"
name: demo
bridge:
  curated:
    - creative: a
      ad_content: b
      confidence: 2.0
"#;
        let config: ProjectConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_duplicate_strategies() {
        let yaml = "name: demo\nbridge:\n  strategies: [exact, exact]\n";
        let config: ProjectConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_unknown_strategy() {
        let yaml = "name: demo\nbridge:\n  strategies: [fuzzy]\n";
        assert!(serde_yaml::from_str::<ProjectConfig>(yaml).is_err());
    }
}
