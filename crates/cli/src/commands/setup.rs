// SPDX-License-Identifier: MIT

//! `init`, `reset`, `add`.

use crate::config;
use crate::confirm::confirm_bulk;
use crate::exit_error::ExitError;
use fwrs_core::{SystemClock, WorkflowDraft};
use fwrs_engine::Launchpad;
use std::path::{Path, PathBuf};

pub fn init(config_dir: Option<&Path>) -> Result<(), ExitError> {
    let path = config::init_interactive(config_dir)?;
    println!("wrote launchpad config to {}", path.display());
    Ok(())
}

/// Wipe every collection. Always requires confirmation regardless of
/// how small the store is.
pub fn reset(launchpad_file: &Path, password: Option<&str>, yes: bool) -> Result<(), ExitError> {
    confirm_bulk(usize::MAX, password, yes)?;
    std::fs::remove_file(launchpad_file).ok();
    println!("launchpad reset: {}", launchpad_file.display());
    Ok(())
}

fn workflow_files(paths: &[PathBuf], dir_mode: bool) -> Result<Vec<PathBuf>, ExitError> {
    if !dir_mode {
        return Ok(paths.to_vec());
    }
    let mut files = Vec::new();
    for dir in paths {
        let entries = std::fs::read_dir(dir).map_err(|e| ExitError::user(format!("could not read {}: {e}", dir.display())))?;
        for entry in entries {
            let entry = entry.map_err(|e| ExitError::user(e.to_string()))?;
            if entry.path().extension().and_then(|e| e.to_str()) == Some("json") {
                files.push(entry.path());
            }
        }
    }
    Ok(files)
}

pub fn add(launchpad: &Launchpad<SystemClock>, paths: Vec<PathBuf>, dir_mode: bool) -> Result<(), ExitError> {
    let files = workflow_files(&paths, dir_mode)?;
    if files.is_empty() {
        return Err(ExitError::user("no workflow files found"));
    }
    for file in files {
        let text = std::fs::read_to_string(&file).map_err(|e| ExitError::user(format!("could not read {}: {e}", file.display())))?;
        let draft: WorkflowDraft =
            serde_json::from_str(&text).map_err(|e| ExitError::user(format!("invalid workflow file {}: {e}", file.display())))?;
        let root = launchpad.add_workflow(draft)?;
        println!("added workflow '{}' rooted at fw_id {}", file.display(), root.get());
    }
    Ok(())
}
