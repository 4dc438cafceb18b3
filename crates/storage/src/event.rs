// SPDX-License-Identifier: MIT

//! Facts appended to the write-ahead log. Every mutation the Launchpad
//! makes to a task, launch, or workflow is recorded as one of these
//! before [`crate::state::MaterializedState`] is updated in memory, so
//! a crashed process can reconstruct state by replaying the log.

use fwrs_core::{Action, FWorker, FwState, LaunchId, LaunchState, ModSpecOp, TaskId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    /// A new workflow with its first task, or a standalone task (a
    /// workflow of one). `metadata`/`name` describe the workflow.
    WorkflowCreated {
        root_task_id: TaskId,
        name: String,
        metadata: Map<String, Value>,
        created_on: u64,
    },
    TaskCreated {
        task_id: TaskId,
        workflow_root: TaskId,
        name: String,
        spec: Map<String, Value>,
        created_on: u64,
    },
    LinkAdded {
        workflow_root: TaskId,
        parent: TaskId,
        child: TaskId,
    },
    TaskStateChanged {
        task_id: TaskId,
        state: FwState,
    },
    TaskSpecPatched {
        task_id: TaskId,
        update_spec: Option<Map<String, Value>>,
        mod_spec: Vec<ModSpecOp>,
    },
    TaskLaunchArchived {
        task_id: TaskId,
        launch_id: LaunchId,
    },
    LaunchCreated {
        launch_id: LaunchId,
        task_id: TaskId,
        fworker: FWorker,
        launch_dir: String,
        state: LaunchState,
        timestamp_ms: u64,
    },
    LaunchStateChanged {
        launch_id: LaunchId,
        state: LaunchState,
        timestamp_ms: u64,
    },
    LaunchPinged {
        launch_id: LaunchId,
        timestamp_ms: u64,
        checkpoint: Option<Value>,
    },
    LaunchFinished {
        launch_id: LaunchId,
        state: LaunchState,
        action: Option<Action>,
        timestamp_ms: u64,
    },
    /// A workflow's per-root advisory lock was claimed. `holder` is an opaque token identifying the
    /// claimant; `expires_ms` is when a sweeper may break it forcibly.
    LockAcquired {
        root_task_id: TaskId,
        holder: String,
        acquired_ms: u64,
        expires_ms: u64,
    },
    /// Releases whatever lock is held on `root_task_id`, if any — used
    /// both by the normal acquire/release scope and by the manual
    /// `unlock` admin command.
    LockReleased {
        root_task_id: TaskId,
    },
    /// `delete_workflow`: removes every task, launch, and the workflow
    /// record itself. Irreversible.
    WorkflowDeleted {
        root_task_id: TaskId,
        task_ids: Vec<TaskId>,
        launch_ids: Vec<LaunchId>,
    },
    /// A control entry; never replayed into state, only used so the WAL
    /// sequence number advances past an engine-internal barrier (e.g. a
    /// deliberate shutdown marker during tests).
    Marker,
}

impl Event {
    /// Short name for structured log fields.
    pub fn name(&self) -> &'static str {
        match self {
            Event::WorkflowCreated { .. } => "workflow_created",
            Event::TaskCreated { .. } => "task_created",
            Event::LinkAdded { .. } => "link_added",
            Event::TaskStateChanged { .. } => "task_state_changed",
            Event::TaskSpecPatched { .. } => "task_spec_patched",
            Event::TaskLaunchArchived { .. } => "task_launch_archived",
            Event::LaunchCreated { .. } => "launch_created",
            Event::LaunchStateChanged { .. } => "launch_state_changed",
            Event::LaunchPinged { .. } => "launch_pinged",
            Event::LaunchFinished { .. } => "launch_finished",
            Event::LockAcquired { .. } => "lock_acquired",
            Event::LockReleased { .. } => "lock_released",
            Event::WorkflowDeleted { .. } => "workflow_deleted",
            Event::Marker => "marker",
        }
    }
}
