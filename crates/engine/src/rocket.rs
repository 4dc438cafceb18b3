// SPDX-License-Identifier: MIT

//! The "rocket": the single-task execution harness a Rapidfire iteration
//! drives once per launch. Checkout, working directory,
//! sub-task execution, completion — with the guarantee that however a
//! launch ends, `complete` is called exactly once.

use crate::error::RocketError;
use crate::launchpad::Launchpad;
use crate::registry::{TaskContext, TaskRegistry};
use fwrs_core::{Clock, FWorker, FwState, LaunchId, Task};
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;

/// What one [`Rocket::run_once`] call did.
#[derive(Debug)]
pub enum RocketOutcome {
    /// No `READY` task was available for this worker.
    Empty,
    /// A task ran to completion (successfully or not).
    Ran { task_id: u64, launch_dir: PathBuf, final_state: FwState },
}

/// Runs one task's full launch: checkout, working directory, sub-tasks in
/// order, completion. Cheap to construct per iteration; holds only a
/// registry reference and the shared Launchpad.
#[derive(Clone)]
pub struct Rocket<C: Clock> {
    launchpad: Launchpad<C>,
    registry: TaskRegistry,
    base_dir: PathBuf,
}

impl<C: Clock + 'static> Rocket<C> {
    pub fn new(launchpad: Launchpad<C>, registry: TaskRegistry, base_dir: impl Into<PathBuf>) -> Self {
        Self { launchpad, registry, base_dir: base_dir.into() }
    }

    pub fn launchpad(&self) -> &Launchpad<C> {
        &self.launchpad
    }

    /// Check out and fully run at most one task for `worker`, generating
    /// this launch's working directory under `self`'s configured base
    /// directory.
    ///
    /// On any exit path other than "nothing to check out", the launch is
    /// finalized via `complete` — even when a sub-task handler fails, in
    /// which case the task is reported `FIZZLED` with the failure message
    /// under `stored_data._exception`.
    pub async fn run_once(&self, worker: &FWorker) -> Result<RocketOutcome, RocketError> {
        let generated_dir = self.base_dir.join(format!("launcher_{}", block_format_now()));
        self.run_once_into(worker, &generated_dir).await
    }

    /// Like [`Rocket::run_once`], but the caller (typically
    /// [`crate::rapidfire::Rapidfire`], which pre-creates one subdirectory
    /// per iteration) supplies the generated working directory instead of
    /// this rocket computing its own.
    pub async fn run_once_into(&self, worker: &FWorker, generated_dir: &std::path::Path) -> Result<RocketOutcome, RocketError> {
        let Some((task, launch_id)) =
            self.launchpad.checkout(worker, false, generated_dir.to_string_lossy().into_owned())?
        else {
            return Ok(RocketOutcome::Empty);
        };

        let launch_dir = task.launch_dir().map(PathBuf::from).unwrap_or_else(|| generated_dir.to_path_buf());
        std::fs::create_dir_all(&launch_dir)?;
        write_sidecar(&launch_dir, &task)?;

        let (combined, failed) = self.run_sub_tasks(&task, launch_id, &launch_dir).await;
        let final_state = if failed.is_some() { FwState::Fizzled } else { FwState::Completed };

        let mut combined = combined;
        if let Some(reason) = failed {
            combined.stored_data.insert("_exception".to_string(), Value::String(reason));
        }

        self.launchpad.complete(launch_id, combined, final_state)?;
        Ok(RocketOutcome::Ran { task_id: task.task_id.get(), launch_dir, final_state })
    }

    async fn run_sub_tasks(
        &self,
        task: &Task,
        launch_id: LaunchId,
        launch_dir: &std::path::Path,
    ) -> (fwrs_core::Action, Option<String>) {
        let mut working_spec = task.spec.clone();
        let mut actions = Vec::new();

        for sub_spec in task.sub_tasks() {
            let Some(fw_name) = sub_spec.get(fwrs_core::task::spec_keys::FW_NAME).and_then(Value::as_str) else {
                return (combine_actions(actions), Some("sub-task is missing _fw_name".to_string()));
            };
            let handler = match self.registry.get(fw_name) {
                Ok(h) => h.clone(),
                Err(e) => return (combine_actions(actions), Some(e.to_string())),
            };

            let ctx = TaskContext {
                task_id: task.task_id.get(),
                launch_id: launch_id.get(),
                launch_dir: launch_dir.to_path_buf(),
                fw_spec: working_spec.clone(),
            };
            let pinger = self.spawn_pinger(launch_id);
            let outcome = handler.run(&sub_spec, &ctx).await;
            pinger.stop();

            match outcome {
                Ok(action) => {
                    let _ = fwrs_core::action::apply_to_child_spec(
                        &mut working_spec,
                        action.update_spec.as_ref(),
                        &action.mod_spec,
                    );
                    actions.push(action);
                }
                Err(e) => return (combine_actions(actions), Some(e.to_string())),
            }
        }

        (combine_actions(actions), None)
    }

    fn spawn_pinger(&self, launch_id: LaunchId) -> PingerHandle {
        PingerHandle::spawn(self.launchpad.clone(), launch_id, self.launchpad.config().ping_interval_secs)
    }
}

/// A periodic heartbeat, started once per sub-task and stopped when it
/// finishes — only emits pings for sub-tasks that outlive one interval.
struct PingerHandle {
    handle: tokio::task::JoinHandle<()>,
}

impl PingerHandle {
    fn spawn<C: Clock + 'static>(launchpad: Launchpad<C>, launch_id: LaunchId, interval_secs: u64) -> Self {
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
            interval.tick().await;
            loop {
                interval.tick().await;
                if launchpad.ping(launch_id, None).is_err() {
                    break;
                }
            }
        });
        Self { handle }
    }

    fn stop(self) {
        self.handle.abort();
    }
}

fn write_sidecar(dir: &std::path::Path, task: &Task) -> Result<(), RocketError> {
    let file = std::fs::File::create(dir.join("FW.json"))?;
    serde_json::to_writer_pretty(file, &task.spec)?;
    Ok(())
}

/// Directory-name timestamp, `FW_BLOCK_FORMAT`-configurable, defaulting
/// to the `launcher_YYYY-MM-DD-HH-MM-SS-ffffff` format.
pub(crate) fn block_format_now() -> String {
    let fmt = std::env::var("FW_BLOCK_FORMAT").unwrap_or_else(|_| "%Y-%m-%d-%H-%M-%S-%6f".to_string());
    chrono::Local::now().format(&fmt).to_string()
}

/// Merge a task's sub-task actions into the single action `complete`
/// applies: later `stored_data`/`update_spec`
/// entries win on key collision, list-valued fields concatenate, boolean
/// flags OR together.
fn combine_actions(actions: Vec<fwrs_core::Action>) -> fwrs_core::Action {
    let mut combined = fwrs_core::Action::default();
    for action in actions {
        combined.stored_data.extend(action.stored_data);
        combined.exit |= action.exit;
        if action.update_spec.is_some() {
            combined.update_spec = action.update_spec;
        }
        combined.mod_spec.extend(action.mod_spec);
        combined.additions.extend(action.additions);
        combined.detours.extend(action.detours);
        combined.defuse_children |= action.defuse_children;
        combined.defuse_workflow |= action.defuse_workflow;
    }
    combined
}

#[cfg(test)]
#[path = "rocket_tests.rs"]
mod tests;
