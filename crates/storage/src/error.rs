// SPDX-License-Identifier: MIT

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WalError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to serialize WAL entry: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("wal error: {0}")]
    Wal(#[from] WalError),
    #[error("task {0} not found")]
    TaskNotFound(u64),
    #[error("launch {0} not found")]
    LaunchNotFound(u64),
    #[error("workflow rooted at task {0} not found")]
    WorkflowNotFound(u64),
    #[error("task {task_id} is not reservable from state {state}")]
    NotReservable { task_id: u64, state: String },
    #[error("launch {launch_id} is not in a runnable state ({state})")]
    NotRunnable { launch_id: u64, state: String },
    #[error("spec patch error: {0}")]
    SpecPatch(#[from] fwrs_core::SpecPatchError),
    #[error("workflow would contain a cycle")]
    Cyclic,
}
