// adstar-core/src/infrastructure/config/project.rs

use anyhow::Context;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};
use validator::Validate;

use crate::domain::project::configuration::ProjectConfig;
use crate::infrastructure::error::InfrastructureError;

const CONFIG_CANDIDATES: [&str; 2] = ["adstar_project.yaml", "adstar.yaml"];

/// Environment layer applied on top of the YAML file.
#[derive(Debug, Default, Clone)]
pub struct EnvOverrides {
    pub target_path: Option<String>,
    pub kpi_path: Option<String>,
    pub warehouse: Option<String>,
}

impl EnvOverrides {
    pub fn from_env() -> Self {
        Self {
            target_path: std::env::var("ADSTAR_TARGET_PATH").ok(),
            kpi_path: std::env::var("ADSTAR_KPI_PATH").ok(),
            warehouse: std::env::var("ADSTAR_WAREHOUSE").ok(),
        }
    }
}

// --- LOADER ---

#[instrument(skip(project_dir))]
pub fn load_project_config(project_dir: &Path) -> Result<ProjectConfig, InfrastructureError> {
    load_project_config_with(project_dir, &EnvOverrides::from_env())
}

pub fn load_project_config_with(
    project_dir: &Path,
    overrides: &EnvOverrides,
) -> Result<ProjectConfig, InfrastructureError> {
    let config_path = find_main_config(project_dir)?;
    info!(path = ?config_path, "Loading project configuration");

    let content = fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read project config at {:?}", config_path))?;
    let mut config: ProjectConfig = serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse project config YAML at {:?}", config_path))?;

    apply_env_overrides(&mut config, overrides);
    config.validate()?;

    Ok(config)
}

fn find_main_config(root: &Path) -> Result<PathBuf, InfrastructureError> {
    for filename in CONFIG_CANDIDATES {
        let p = root.join(filename);
        if p.exists() {
            return Ok(p);
        }
    }
    Err(InfrastructureError::ConfigNotFound(format!(
        "No configuration file found in {:?}. Checked: {:?}",
        root, CONFIG_CANDIDATES
    )))
}

// Permet de faire: ADSTAR_TARGET_PATH=/tmp/build adstar run
fn apply_env_overrides(config: &mut ProjectConfig, overrides: &EnvOverrides) {
    if let Some(val) = &overrides.target_path {
        info!(old = ?config.output.target_path, new = ?val, "Overriding target path via ENV");
        config.output.target_path = val.clone();
    }
    if let Some(val) = &overrides.kpi_path {
        info!(old = ?config.output.kpi_path, new = ?val, "Overriding KPI path via ENV");
        config.output.kpi_path = val.clone();
    }
    if let Some(val) = &overrides.warehouse {
        info!(path = ?val, "Warehouse publishing enabled via ENV");
        config.warehouse.enabled = true;
        config.warehouse.path = val.clone();
    }
}

/// Resolves a configured path against the project directory.
pub fn resolve(project_dir: &Path, configured: &str) -> PathBuf {
    let path = Path::new(configured);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        project_dir.join(path)
    }
}
