// SPDX-License-Identifier: MIT

//! Launchpad config file: where the WAL lives and the tunables handed
//! to [`fwrs_engine::LaunchpadConfig`]. Resolution order follows the
//! global flags: `-l/--launchpad_file` names the WAL directly;
//! otherwise `-c/--config_dir` (or `FW_CONFIG_FILE`, or the platform
//! config dir) names a directory holding `fw_config.toml`.

use crate::exit_error::ExitError;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "fw_config.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FwConfig {
    /// Path to the WAL file backing the store.
    pub launchpad_file: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reservation_expiration_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_expiration_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ping_interval_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lock_ttl_secs: Option<u64>,
}

impl FwConfig {
    pub fn to_launchpad_config(&self) -> fwrs_engine::LaunchpadConfig {
        let mut cfg = fwrs_engine::LaunchpadConfig::default();
        if let Some(v) = self.reservation_expiration_secs {
            cfg = cfg.reservation_expiration_secs(v);
        }
        if let Some(v) = self.run_expiration_secs {
            cfg = cfg.run_expiration_secs(v);
        }
        if let Some(v) = self.ping_interval_secs {
            cfg = cfg.ping_interval_secs(v);
        }
        if let Some(v) = self.lock_ttl_secs {
            cfg = cfg.lock_ttl_secs(v);
        }
        cfg
    }
}

/// `OJ_STATE_DIR`-style resolution (`daemon::env::state_dir`, adapted):
/// `FW_CONFIG_FILE` env var names the TOML file directly; otherwise
/// fall back to `$XDG_CONFIG_HOME/fwrs` / `~/.config/fwrs`.
pub fn default_config_dir() -> Result<PathBuf, ExitError> {
    if let Ok(dir) = std::env::var("FW_CONFIG_DIR") {
        return Ok(PathBuf::from(dir));
    }
    dirs::config_dir().map(|d| d.join("fwrs")).ok_or_else(|| ExitError::user("could not determine a config directory; pass -c explicitly"))
}

fn config_file_path(config_dir: Option<&Path>) -> Result<PathBuf, ExitError> {
    if let Ok(path) = std::env::var("FW_CONFIG_FILE") {
        return Ok(PathBuf::from(path));
    }
    let dir = match config_dir {
        Some(dir) => dir.to_path_buf(),
        None => default_config_dir()?,
    };
    Ok(dir.join(CONFIG_FILE_NAME))
}

/// Resolve the launchpad file to open: `-l` wins outright; otherwise
/// load the config file (from `-c`, `FW_CONFIG_FILE`, or the default
/// directory) and read `launchpad_file` from it.
pub fn resolve_launchpad_file(launchpad_file: Option<&Path>, config_dir: Option<&Path>) -> Result<PathBuf, ExitError> {
    if let Some(path) = launchpad_file {
        return Ok(path.to_path_buf());
    }
    let config = load(config_dir)?;
    Ok(config.launchpad_file)
}

pub fn load(config_dir: Option<&Path>) -> Result<FwConfig, ExitError> {
    let path = config_file_path(config_dir)?;
    let text = std::fs::read_to_string(&path)
        .map_err(|e| ExitError::user(format!("could not read config file {}: {e}", path.display())))?;
    toml::from_str(&text).map_err(|e| ExitError::user(format!("invalid config file {}: {e}", path.display())))
}

pub fn write(config_dir: Option<&Path>, config: &FwConfig) -> Result<PathBuf, ExitError> {
    let path = config_file_path(config_dir)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ExitError::user(format!("could not create {}: {e}", parent.display())))?;
    }
    let text = toml::to_string_pretty(config).map_err(|e| ExitError::user(e.to_string()))?;
    std::fs::write(&path, text).map_err(|e| ExitError::user(format!("could not write {}: {e}", path.display())))?;
    Ok(path)
}

/// Interactive `init`, translated from `lpad_run.py`'s
/// `init_yaml` prompt flow to TOML. Reads from `stdin`/writes to
/// `stdout` directly since it is inherently a terminal interaction.
pub fn init_interactive(config_dir: Option<&Path>) -> Result<PathBuf, ExitError> {
    let default_dir = match config_dir {
        Some(d) => d.to_path_buf(),
        None => default_config_dir()?,
    };
    let default_wal = default_dir.join("launchpad.wal");

    print!("Launchpad WAL file [{}]: ", default_wal.display());
    std::io::stdout().flush().ok();
    let mut line = String::new();
    std::io::stdin().read_line(&mut line).map_err(|e| ExitError::user(e.to_string()))?;
    let trimmed = line.trim();
    let launchpad_file = if trimmed.is_empty() { default_wal } else { PathBuf::from(trimmed) };

    let config = FwConfig {
        launchpad_file,
        reservation_expiration_secs: None,
        run_expiration_secs: None,
        ping_interval_secs: None,
        lock_ttl_secs: None,
    };
    write(config_dir, &config)
}
