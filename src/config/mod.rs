use crate::models::ResolverConfig;
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;

/// Default settings file, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "vmsnap.yaml";

/// Configuration manager for the resolver settings file.
///
/// The file is optional: every field has a default matching the limits of
/// a boot-time resolver: 20 snapshots, 20 hops, 1024 bytes of output.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_path: Utf8PathBuf,
}

impl ConfigManager {
    /// Create a ConfigManager reading `config_path`.
    pub fn new<P: AsRef<Utf8Path>>(config_path: P) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
        }
    }

    /// Load the resolver settings.
    ///
    /// # Returns
    /// The loaded ResolverConfig, or defaults if the file doesn't exist
    pub fn load(&self) -> Result<ResolverConfig> {
        if !self.config_path.exists() {
            tracing::warn!(
                "Config file not found at {}, using defaults",
                self.config_path
            );
            return Ok(ResolverConfig::default());
        }

        let file_contents = fs::read_to_string(&self.config_path)
            .with_context(|| format!("Failed to read config: {}", self.config_path))?;

        let config: ResolverConfig = serde_yaml_ng::from_str(&file_contents)
            .with_context(|| format!("Failed to parse config: {}", self.config_path))?;

        tracing::info!("Loaded config from {}", self.config_path);
        Ok(config)
    }

    /// Get the configuration file path.
    pub fn config_path(&self) -> &Utf8Path {
        &self.config_path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIG_FILE)
    }
}
