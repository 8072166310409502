//! Config path resolution
//!
//! Handles resolving paths for configuration files based on the bridge
//! library's location.

use std::path::PathBuf;

use super::{ConfigError, ConfigResult};

/// Environment variable overriding the bridge base directory
pub const CONFIG_DIR_ENV: &str = "OBJBRIDGE_CONFIG_DIR";

/// Returns the objbridge base directory.
///
/// The bridge is loaded from `<base>/bin/<host executable>`, so the base is
/// two levels up from the running executable. `OBJBRIDGE_CONFIG_DIR` takes
/// precedence when set.
pub fn objbridge_base_dir() -> ConfigResult<PathBuf> {
    if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV) {
        return Ok(PathBuf::from(dir));
    }

    let exe = std::env::current_exe().map_err(ConfigError::IoError)?;

    // Navigate: executable -> bin -> base
    exe.parent() // bin/
        .and_then(|p| p.parent()) // base/
        .map(PathBuf::from)
        .ok_or(ConfigError::NoConfigDirectory)
}

/// Returns the base configs directory.
///
/// Path: `<base>/configs/`
pub fn configs_dir() -> ConfigResult<PathBuf> {
    Ok(objbridge_base_dir()?.join("configs"))
}

/// Returns the core bridge config path.
///
/// Path: `<base>/configs/objbridge.toml`
pub fn core_config_path() -> ConfigResult<PathBuf> {
    Ok(configs_dir()?.join("objbridge.toml"))
}
