// SPDX-License-Identifier: MIT

//! Commands that bridge to an external system this repo doesn't
//! implement: a queue adapter (`get_qids`/`cancel_qid`), the web
//! dashboard (`webgui`), offline-mode reconciliation
//! (`recover_offline`/`forget_offline`), and aggregate diagnostics
//! (`report`/`introspect`). Recognized so the command surface is
//! complete, but each exits non-zero with a clear message rather than
//! fabricating behavior for a system that isn't here.

use crate::exit_error::ExitError;

pub fn unimplemented(command: &str) -> Result<(), ExitError> {
    Err(ExitError::new(2, format!("'{command}' requires an external system not implemented by this launchpad")))
}
