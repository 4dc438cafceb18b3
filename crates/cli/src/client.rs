// SPDX-License-Identifier: MIT

//! Opens the on-disk store and builds the [`Launchpad`] the command
//! handlers operate on. One `fwlp` invocation opens the WAL, runs one
//! command, and lets the process exit — there is no long-lived daemon
//! here.

use crate::exit_error::ExitError;
use fwrs_core::SystemClock;
use fwrs_engine::{Launchpad, LaunchpadConfig};
use fwrs_storage::WalStore;
use std::path::Path;
use std::sync::Arc;

pub fn open_launchpad(launchpad_file: &Path, config: LaunchpadConfig) -> Result<Launchpad<SystemClock>, ExitError> {
    if let Some(parent) = launchpad_file.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| ExitError::user(format!("could not create {}: {e}", parent.display())))?;
        }
    }
    let store = WalStore::open(launchpad_file, None)
        .map_err(|e| ExitError::new(1, format!("could not open launchpad file {}: {e}", launchpad_file.display())))?;
    Ok(Launchpad::new(Arc::new(store), SystemClock, config))
}
