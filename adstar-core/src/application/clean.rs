// adstar-core/src/application/clean.rs

use crate::error::AdstarError;
use crate::infrastructure::config::ProjectConfig;
use crate::infrastructure::error::InfrastructureError;
use std::fs;
use std::path::{Component, Path};

/// Removes the configured clean targets. Returns the targets actually removed.
pub fn clean_project(project_dir: &Path, config: &ProjectConfig) -> Result<Vec<String>, AdstarError> {
    tracing::info!("🧹 Initializing adstar cleanup sequence...");

    let targets = if config.clean_targets.is_empty() {
        vec!["target".to_string()]
    } else {
        config.clean_targets.clone()
    };

    // Zero-Trust Path Traversal Guard: every target is checked before anything is removed
    for target_rel_path in &targets {
        if !is_contained(target_rel_path) {
            return Err(AdstarError::UnsafePath(target_rel_path.clone()));
        }
    }

    let mut removed = Vec::new();
    for target_rel_path in targets {
        let full_path = project_dir.join(&target_rel_path);
        if full_path.exists() {
            if full_path.is_dir() {
                fs::remove_dir_all(&full_path)
                    .map_err(|e| AdstarError::Infrastructure(InfrastructureError::Io(e)))?;
            } else {
                fs::remove_file(&full_path)
                    .map_err(|e| AdstarError::Infrastructure(InfrastructureError::Io(e)))?;
            }
            tracing::info!(path = %target_rel_path, "Artifact removed");
            removed.push(target_rel_path);
        }
    }

    Ok(removed)
}

/// Relative, no `..`, not the project root itself.
fn is_contained(target: &str) -> bool {
    let path = Path::new(target);
    let mut depth = 0usize;
    for component in path.components() {
        match component {
            Component::Normal(_) => depth += 1,
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return false,
        }
    }
    depth > 0
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::tempdir;

    fn config(targets: &[&str]) -> ProjectConfig {
        let mut config: ProjectConfig = serde_yaml::from_str("name: demo\n").unwrap();
        config.clean_targets = targets.iter().map(|t| t.to_string()).collect();
        config
    }

    #[test]
    fn test_removes_targets() -> Result<()> {
        let dir = tempdir()?;
        fs::create_dir_all(dir.path().join("target/dimensional"))?;
        fs::write(dir.path().join("adstar.log"), "x")?;

        let removed = clean_project(dir.path(), &config(&["target", "adstar.log", "absent"]))?;

        assert_eq!(removed, vec!["target", "adstar.log"]);
        assert!(!dir.path().join("target").exists());
        Ok(())
    }

    #[test]
    fn test_rejects_traversal() -> Result<()> {
        let dir = tempdir()?;
        fs::create_dir_all(dir.path().join("target"))?;

        for bad in ["../elsewhere", "/etc", ".", "target/../.."] {
            let err = clean_project(dir.path(), &config(&["target", bad])).unwrap_err();
            assert!(matches!(err, AdstarError::UnsafePath(_)));
        }
        // nothing removed when any target is unsafe
        assert!(dir.path().join("target").exists());
        Ok(())
    }
}
