// SPDX-License-Identifier: MIT

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LaunchpadError {
    #[error("storage error: {0}")]
    Store(#[from] fwrs_storage::StoreError),
    #[error("task {0} not found")]
    TaskNotFound(u64),
    #[error("launch {0} not found")]
    LaunchNotFound(u64),
    #[error("workflow rooted at task {0} not found")]
    WorkflowNotFound(u64),
    #[error("workflow would contain a cycle")]
    Cyclic,
    #[error("draft links reference task index {0}, which does not exist")]
    DanglingLink(usize),
    #[error("task {task_id} is not reservable from state {state}")]
    NotReservable { task_id: u64, state: String },
    #[error("launch {launch_id} is not runnable from state {state}")]
    NotRunnable { launch_id: u64, state: String },
    #[error("spec patch error: {0}")]
    SpecPatch(#[from] fwrs_core::SpecPatchError),
    #[error("workflow {0} is locked by another operation")]
    Locked(u64),
    #[error("workflow draft has no tasks")]
    EmptyDraft,
    #[error("task {task_id} cannot {action} from state {state}")]
    InvalidTransition { task_id: u64, action: &'static str, state: String },
}

#[derive(Debug, Error)]
pub enum TaskError {
    #[error("no handler registered for task kind {0:?}")]
    NoHandler(String),
    #[error("task execution failed: {0}")]
    Failed(String),
}

#[derive(Debug, Error)]
pub enum RocketError {
    #[error(transparent)]
    Launchpad(#[from] LaunchpadError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
