//! Configuration for the object factory bridge
//!
//! The bridge reads a single TOML file:
//! - Type-safe config struct via serde
//! - Auto-generation of the default file when missing
//! - Manual reload capability
//!
//! # Example
//!
//! ```toml
//! version = 1
//! debug = false
//! strict_type_names = false
//! work_queue_capacity = 1024
//! max_tasks_per_update = 1024
//!
//! [exclusion]
//! prefixes = ["system."]
//! names = ["hidden_scope"]
//! ```

mod loader;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::module::ExclusionPolicy;
use crate::tasks::{DEFAULT_QUEUE_CAPACITY, DEFAULT_TASKS_PER_UPDATE};

pub use loader::{configs_dir, core_config_path, objbridge_base_dir, CONFIG_DIR_ENV};

/// Configuration system errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read or write config file
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse TOML content
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Failed to serialize config to TOML
    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    /// Could not determine config directory from the library location
    #[error("Config directory not available - could not resolve bridge base path")]
    NoConfigDirectory,
}

/// Result type for config operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Core bridge configuration.
///
/// Loaded from `<base>/configs/objbridge.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Config version for future migration support
    pub version: u32,

    /// Enable debug logging
    pub debug: bool,

    /// Reject a factory whose type name is already registered by a
    /// different type instead of overwriting it
    pub strict_type_names: bool,

    /// Modules skipped by the startup scan
    pub exclusion: ExclusionPolicy,

    /// Main thread queue capacity (0 = unbounded)
    pub work_queue_capacity: usize,

    /// Tasks run per update (0 = drain the queue)
    pub max_tasks_per_update: usize,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            version: 1,
            debug: false,
            strict_type_names: false,
            exclusion: ExclusionPolicy::default(),
            work_queue_capacity: DEFAULT_QUEUE_CAPACITY,
            max_tasks_per_update: DEFAULT_TASKS_PER_UPDATE,
        }
    }
}

impl CoreConfig {
    /// Load core config from file, creating default if missing.
    pub fn load() -> ConfigResult<Self> {
        Self::load_from(&core_config_path()?)
    }

    /// Load from an explicit path, creating default if missing.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config = Self::from_toml_str(&content)?;
            tracing::debug!("Loaded core config from {:?}", path);
            Ok(config)
        } else {
            let default = Self::default();
            default.save_to(path)?;
            tracing::info!("Created default core config at {:?}", path);
            Ok(default)
        }
    }

    /// Parse config from TOML text; missing keys take their defaults.
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Save core config to file.
    pub fn save(&self) -> ConfigResult<()> {
        self.save_to(&core_config_path()?)
    }

    /// Save to an explicit path. Creates parent directories if needed.
    pub fn save_to(&self, path: &Path) -> ConfigResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        tracing::debug!("Saved core config to {:?}", path);
        Ok(())
    }

    /// Reload core config from file.
    pub fn reload(&mut self) -> ConfigResult<()> {
        let path = core_config_path()?;
        let content = std::fs::read_to_string(&path)?;
        *self = Self::from_toml_str(&content)?;
        tracing::debug!("Reloaded core config from {:?}", path);
        Ok(())
    }
}
