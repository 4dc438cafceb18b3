// SPDX-License-Identifier: MIT

//! Materialized state built from WAL replay.

use crate::event::Event;
use fwrs_core::{Launch, Task, TaskId, Workflow};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A claim on a workflow's advisory lock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowLock {
    pub holder: String,
    pub acquired_ms: u64,
    pub expires_ms: u64,
}

/// In-memory projection of every task, launch, and workflow, derived
/// entirely from the event log. Rebuildable from scratch by replaying
/// the WAL from seq 0 (or from a snapshot plus the entries after it).
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct MaterializedState {
    pub tasks: HashMap<u64, Task>,
    pub launches: HashMap<u64, Launch>,
    pub workflows: HashMap<u64, Workflow>,
    /// Any member task-id of a workflow, mapped to its root task-id — a
    /// workflow has no id of its own.
    pub task_to_workflow: HashMap<u64, u64>,
    /// Per-workflow-root advisory locks, keyed by root
    /// task-id.
    #[serde(default)]
    pub locks: HashMap<u64, WorkflowLock>,
    /// Centralized counters behind the store's single mutex (see
    /// `fwrs_storage::store`): a task/launch id is allocated by
    /// incrementing here, never by an optimistic read-then-CAS retry loop.
    #[serde(default)]
    next_task_id: u64,
    #[serde(default)]
    next_launch_id: u64,
}

impl MaterializedState {
    pub fn allocate_task_id(&mut self) -> TaskId {
        self.next_task_id += 1;
        TaskId::new(self.next_task_id)
    }

    pub fn allocate_launch_id(&mut self) -> fwrs_core::LaunchId {
        self.next_launch_id += 1;
        fwrs_core::LaunchId::new(self.next_launch_id)
    }

    pub fn get_task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.get(&id.get())
    }

    pub fn get_launch(&self, id: fwrs_core::LaunchId) -> Option<&Launch> {
        self.launches.get(&id.get())
    }

    pub fn workflow_root_of(&self, task_id: TaskId) -> Option<TaskId> {
        self.task_to_workflow.get(&task_id.get()).copied().map(TaskId::new)
    }

    pub fn get_workflow(&self, task_id: TaskId) -> Option<&Workflow> {
        let root = self.workflow_root_of(task_id)?;
        self.workflows.get(&root.get())
    }

    /// Apply an event to derive state changes.
    ///
    /// All handlers here must be idempotent: replaying the same event
    /// twice (as happens after a crash mid-flush, when the WAL and the
    /// in-memory projection briefly disagree) must leave the state
    /// exactly as it would be after applying the event once.
    pub fn apply_event(&mut self, event: &Event) {
        match event {
            Event::WorkflowCreated { root_task_id, name, metadata, created_on } => {
                self.workflows
                    .entry(root_task_id.get())
                    .or_insert_with(|| Workflow::new(name.clone(), metadata.clone(), *created_on));
                self.task_to_workflow.insert(root_task_id.get(), root_task_id.get());
            }
            Event::TaskCreated { task_id, workflow_root, name, spec, created_on } => {
                self.tasks
                    .entry(task_id.get())
                    .or_insert_with(|| Task::new(*task_id, name.clone(), spec.clone(), *created_on));
                self.task_to_workflow.insert(task_id.get(), workflow_root.get());
                if let Some(wf) = self.workflows.get_mut(&workflow_root.get()) {
                    let state = self.tasks.get(&task_id.get()).map(|t| t.state).unwrap_or(fwrs_core::FwState::Waiting);
                    wf.add_node(*task_id, state);
                    wf.refresh_aggregate_state();
                }
            }
            Event::LinkAdded { workflow_root, parent, child } => {
                if let Some(wf) = self.workflows.get_mut(&workflow_root.get()) {
                    if !wf.children_of(*parent).any(|c| c == *child) {
                        wf.add_link(*parent, *child);
                    }
                }
            }
            Event::TaskStateChanged { task_id, state } => {
                if let Some(task) = self.tasks.get_mut(&task_id.get()) {
                    task.state = *state;
                }
                if let Some(root) = self.workflow_root_of(*task_id) {
                    if let Some(wf) = self.workflows.get_mut(&root.get()) {
                        wf.fw_states.insert(*task_id, *state);
                        wf.refresh_aggregate_state();
                    }
                }
            }
            Event::TaskSpecPatched { task_id, update_spec, mod_spec } => {
                if let Some(task) = self.tasks.get_mut(&task_id.get()) {
                    let _ = fwrs_core::action::apply_to_child_spec(&mut task.spec, update_spec.as_ref(), mod_spec);
                }
            }
            Event::TaskLaunchArchived { task_id, launch_id } => {
                if let Some(task) = self.tasks.get_mut(&task_id.get()) {
                    task.archive_launch(*launch_id);
                }
            }
            Event::LaunchCreated { launch_id, task_id, fworker, launch_dir, state, timestamp_ms } => {
                self.launches.entry(launch_id.get()).or_insert_with(|| {
                    Launch::new(*launch_id, *task_id, fworker.clone(), launch_dir.clone(), *state, *timestamp_ms)
                });
                if let Some(task) = self.tasks.get_mut(&task_id.get()) {
                    if !task.launches.contains(launch_id) {
                        task.launches.push(*launch_id);
                    }
                }
            }
            Event::LaunchStateChanged { launch_id, state, timestamp_ms } => {
                if let Some(launch) = self.launches.get_mut(&launch_id.get()) {
                    if launch.state != *state || launch.state_history.last().map(|h| h.state) != Some(*state) {
                        launch.transition(*state, *timestamp_ms);
                    }
                }
            }
            Event::LaunchPinged { launch_id, timestamp_ms, checkpoint } => {
                if let Some(launch) = self.launches.get_mut(&launch_id.get()) {
                    if launch.last_pinged_ms != Some(*timestamp_ms) {
                        launch.ping(*timestamp_ms, checkpoint.clone());
                    }
                }
            }
            Event::LaunchFinished { launch_id, state, action, timestamp_ms } => {
                if let Some(launch) = self.launches.get_mut(&launch_id.get()) {
                    if launch.time_end_ms.is_none() {
                        launch.finish(*state, action.clone(), *timestamp_ms);
                    }
                }
            }
            Event::LockAcquired { root_task_id, holder, acquired_ms, expires_ms } => {
                self.locks.insert(
                    root_task_id.get(),
                    WorkflowLock { holder: holder.clone(), acquired_ms: *acquired_ms, expires_ms: *expires_ms },
                );
            }
            Event::LockReleased { root_task_id } => {
                self.locks.remove(&root_task_id.get());
            }
            Event::WorkflowDeleted { root_task_id, task_ids, launch_ids } => {
                for id in task_ids {
                    self.tasks.remove(&id.get());
                    self.task_to_workflow.remove(&id.get());
                }
                for id in launch_ids {
                    self.launches.remove(&id.get());
                }
                self.workflows.remove(&root_task_id.get());
                self.locks.remove(&root_task_id.get());
            }
            Event::Marker => {}
        }
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
