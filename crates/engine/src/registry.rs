// SPDX-License-Identifier: MIT

//! Dynamic dispatch on `_fw_name`, without reflection. A [`TaskRegistry`] is
//! populated at startup with one [`TaskHandler`] per name; the Rocket
//! looks a sub-task's `_fw_name` up in it before running, and fails
//! closed with [`crate::error::TaskError::NoHandler`] for anything
//! unregistered. Concrete task implementations are out of scope for
//! this repo; this module is only the plumbing they'd
//! plug into.

use crate::error::TaskError;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// Context passed to a [`TaskHandler`] when it runs: the full task spec
/// (as mutated by earlier sub-tasks in the same launch) plus identity
/// of the launch it's running under.
#[derive(Debug, Clone)]
pub struct TaskContext {
    pub task_id: u64,
    pub launch_id: u64,
    pub launch_dir: std::path::PathBuf,
    pub fw_spec: Map<String, Value>,
}

/// One registered kind of sub-task, resolved by `_fw_name`.
#[async_trait]
pub trait TaskHandler: Send + Sync {
    /// Run against this sub-task's own spec (one entry of `_tasks`),
    /// returning the action it produces. `ctx.fw_spec` is the *parent*
    /// task's spec as mutated by any prior sub-task in the same launch.
    async fn run(
        &self,
        sub_spec: &Map<String, Value>,
        ctx: &TaskContext,
    ) -> Result<fwrs_core::Action, TaskError>;
}

/// Name -> handler map populated at startup.
#[derive(Default, Clone)]
pub struct TaskRegistry {
    handlers: HashMap<String, Arc<dyn TaskHandler>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, fw_name: impl Into<String>, handler: Arc<dyn TaskHandler>) {
        self.handlers.insert(fw_name.into(), handler);
    }

    pub fn get(&self, fw_name: &str) -> Result<&Arc<dyn TaskHandler>, TaskError> {
        self.handlers.get(fw_name).ok_or_else(|| TaskError::NoHandler(fw_name.to_string()))
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
