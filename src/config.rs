use crate::adapter::AdapterRegistry;
use crate::graph::{DEFAULT_FOLDER_THRESHOLD, GraphOptions};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "routemap.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutemapConfig {
    /// Extra gitignore-style patterns skipped during the scan
    pub exclude: Vec<String>,
    pub respect_gitignore: bool,
    /// Extraction workers; 0 means available parallelism
    pub threads: usize,
    pub graph_threshold: usize,
    pub include_external: bool,
    /// Framework adapters in priority order
    pub adapters: Vec<String>,
}

impl Default for RoutemapConfig {
    fn default() -> Self {
        Self {
            exclude: Vec::new(),
            respect_gitignore: false,
            threads: 0,
            graph_threshold: DEFAULT_FOLDER_THRESHOLD,
            include_external: false,
            adapters: vec!["crud".to_string(), "fastapi".to_string()],
        }
    }
}

impl RoutemapConfig {
    pub fn graph_options(&self) -> GraphOptions {
        GraphOptions {
            folder_threshold: self.graph_threshold,
            include_external: self.include_external,
        }
    }

    pub fn adapter_registry(&self) -> Result<AdapterRegistry> {
        AdapterRegistry::from_names(&self.adapters)
    }

    pub fn worker_count(&self) -> usize {
        if self.threads > 0 {
            return self.threads;
        }
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    }
}

pub fn default_config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE_NAME)
}

/// Load the config for `root`.
///
/// An explicit path must exist; the default `routemap.toml` in the root is
/// optional and falls back to defaults when missing.
pub fn load_config(explicit: Option<&Path>, root: &Path) -> Result<RoutemapConfig> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let path = default_config_path(root);
            if !path.exists() {
                return Ok(RoutemapConfig::default());
            }
            path
        }
    };

    let contents = std::fs::read_to_string(&path)
        .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
    let config: RoutemapConfig = toml::from_str(&contents)
        .map_err(|e| Error::Config(format!("invalid {}: {}", path.display(), e)))?;
    Ok(config)
}
