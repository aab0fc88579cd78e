use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Main configuration structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SchedulerConfig {
    pub store: StoreSettings,
}

/// Shared store settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StoreSettings {
    /// Store backend: "redis" or "memory"
    pub backend: String,

    /// Redis connection URL (ignored by the memory backend)
    pub redis_url: String,

    /// Optional prefix namespacing every key, so multiple fleets can share
    /// one store
    pub key_prefix: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            store: StoreSettings {
                backend: "redis".to_string(),
                redis_url: "redis://localhost:6379".to_string(),
                key_prefix: String::new(),
            },
        }
    }
}

impl SchedulerConfig {
    /// Get the path to the config directory
    fn config_dir() -> PathBuf {
        if let Some(proj_dirs) =
            directories::ProjectDirs::from("com", "crawl-scheduler", "crawl-scheduler")
        {
            proj_dirs.config_dir().to_path_buf()
        } else {
            PathBuf::from("./config")
        }
    }

    /// Load the default configuration, creating it on first run
    pub fn load_default() -> Result<Self> {
        let config_path = Self::config_dir().join("default.yaml");

        if config_path.exists() {
            Self::load_from_file(&config_path)
        } else {
            info!("Default configuration not found. Creating...");
            let config = Self::default();
            config.save_to_file(&config_path)?;
            Ok(config)
        }
    }

    /// Load configuration from a file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from: {}", path.display());
        let contents = fs::read_to_string(path)
            .context(format!("Failed to read configuration file: {}", path.display()))?;

        let config: Self = serde_yaml::from_str(&contents)
            .context(format!("Failed to parse configuration file: {}", path.display()))?;

        Ok(config)
    }

    /// Save the configuration to a file
    fn save_to_file(&self, path: &Path) -> Result<()> {
        debug!("Saving configuration to: {}", path.display());

        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)
                    .context(format!("Failed to create directory: {}", parent.display()))?;
            }
        }

        let contents = serde_yaml::to_string(self)
            .context("Failed to serialize configuration")?;

        fs::write(path, contents)
            .context(format!("Failed to write configuration file: {}", path.display()))?;

        Ok(())
    }
}
