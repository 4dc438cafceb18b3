// SPDX-License-Identifier: MIT

//! Task ("firework") records — immutable identity, mutable state.

use crate::id::{LaunchId, TaskId};
use crate::state::FwState;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Spec keys the engine itself reads; everything else in `spec` is opaque
/// payload for the task's own `_tasks` list.
pub mod spec_keys {
    pub const PRIORITY: &str = "_priority";
    pub const CATEGORY: &str = "_category";
    pub const LAUNCH_DIR: &str = "_launch_dir";
    pub const QUEUEADAPTER: &str = "_queueadapter";
    pub const ALLOW_FIZZLED_PARENTS: &str = "_allow_fizzled_parents";
    pub const PASS_JOB_INFO: &str = "_pass_job_info";
    pub const DUPEFINDER: &str = "_dupefinder";
    pub const FW_ENV: &str = "_fw_env";
    pub const PRESERVE_FWORKER: &str = "_preserve_fworker";
    pub const BACKGROUND_TASKS: &str = "_background_tasks";
    /// The ordered list of sub-task specs a task's single launch runs
    /// through in sequence. Each entry is resolved by
    /// `_fw_name` against the engine's task-handler registry.
    pub const TASKS: &str = "_tasks";
    pub const FW_NAME: &str = "_fw_name";
}

/// A single DAG node: one execution unit.
///
/// Identity (`task_id`, `spec`, `name`) is set at creation and never
/// mutated; `state`, `launches`, and `archived_launches` are mutated only
/// by the Launchpad.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub task_id: TaskId,
    pub spec: Map<String, Value>,
    pub name: String,
    pub created_on: u64,
    pub state: FwState,
    #[serde(default)]
    pub launches: Vec<LaunchId>,
    #[serde(default)]
    pub archived_launches: Vec<LaunchId>,
}

impl Task {
    pub fn new(task_id: TaskId, name: impl Into<String>, spec: Map<String, Value>, created_on: u64) -> Self {
        Self {
            task_id,
            spec,
            name: name.into(),
            created_on,
            state: FwState::Waiting,
            launches: Vec::new(),
            archived_launches: Vec::new(),
        }
    }

    pub fn priority(&self) -> i64 {
        self.spec.get(spec_keys::PRIORITY).and_then(Value::as_i64).unwrap_or(0)
    }

    pub fn category(&self) -> Option<&str> {
        self.spec.get(spec_keys::CATEGORY).and_then(Value::as_str)
    }

    pub fn allow_fizzled_parents(&self) -> bool {
        self.spec.get(spec_keys::ALLOW_FIZZLED_PARENTS).and_then(Value::as_bool).unwrap_or(false)
    }

    pub fn launch_dir(&self) -> Option<&str> {
        self.spec.get(spec_keys::LAUNCH_DIR).and_then(Value::as_str)
    }

    pub fn preserve_fworker(&self) -> bool {
        self.spec.get(spec_keys::PRESERVE_FWORKER).and_then(Value::as_bool).unwrap_or(false)
    }

    pub fn pass_job_info(&self) -> bool {
        self.spec.get(spec_keys::PASS_JOB_INFO).and_then(Value::as_bool).unwrap_or(false)
    }

    /// The ordered sub-task specs this task's launch runs through
    ///. An empty list for a task with no `_tasks` key.
    pub fn sub_tasks(&self) -> Vec<Map<String, Value>> {
        self.spec
            .get(spec_keys::TASKS)
            .and_then(Value::as_array)
            .map(|arr| arr.iter().filter_map(|v| v.as_object().cloned()).collect())
            .unwrap_or_default()
    }

    /// Tail launch (the most recent attempt), if any.
    pub fn current_launch_id(&self) -> Option<LaunchId> {
        self.launches.last().copied()
    }

    /// Move a completed/fizzled launch out of the active-dependency set
    /// (used on rerun; maintains `archived_launches ∩ launches = ∅`).
    pub fn archive_launch(&mut self, launch_id: LaunchId) {
        if let Some(pos) = self.launches.iter().position(|l| *l == launch_id) {
            self.launches.remove(pos);
        }
        if !self.archived_launches.contains(&launch_id) {
            self.archived_launches.push(launch_id);
        }
    }
}

crate::builder! {
    pub struct TaskBuilder => Task {
        into {
            name: String = "test-task",
        }
        set {
            task_id: TaskId = TaskId::new(1),
            spec: Map<String, Value> = Map::new(),
            created_on: u64 = 1_000_000,
            state: FwState = FwState::Waiting,
            launches: Vec<LaunchId> = Vec::new(),
            archived_launches: Vec<LaunchId> = Vec::new(),
        }
    }
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
