// SPDX-License-Identifier: MIT

//! Periodic full-state snapshots, so recovery replays only the WAL tail
//! instead of the log from the beginning.

use crate::error::{StoreError, WalError};
use crate::state::MaterializedState;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Serialize, Deserialize)]
pub struct Snapshot {
    pub wal_seq: u64,
    pub state: MaterializedState,
}

pub fn write(path: &Path, state: &MaterializedState, wal_seq: u64) -> Result<(), StoreError> {
    let snapshot = Snapshot { wal_seq, state: state.clone() };
    let json = serde_json::to_vec(&snapshot).map_err(WalError::from)?;
    let compressed = zstd::encode_all(&json[..], 0).map_err(WalError::Io)?;

    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, compressed).map_err(WalError::Io)?;
    std::fs::rename(&tmp, path).map_err(WalError::Io)?;
    Ok(())
}

pub fn read(path: &Path) -> Result<Option<Snapshot>, StoreError> {
    if !path.exists() {
        return Ok(None);
    }
    let compressed = std::fs::read(path).map_err(WalError::Io)?;
    let json = zstd::decode_all(&compressed[..]).map_err(WalError::Io)?;
    let snapshot: Snapshot = serde_json::from_slice(&json).map_err(WalError::from)?;
    Ok(Some(snapshot))
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
