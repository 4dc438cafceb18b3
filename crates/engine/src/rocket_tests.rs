// SPDX-License-Identifier: MIT

use super::*;
use crate::config::LaunchpadConfig;
use crate::error::TaskError;
use crate::registry::TaskHandler;
use async_trait::async_trait;
use fwrs_core::{FakeClock, WorkflowDraft};
use serde_json::{json, Map};
use std::sync::Arc;
use tempfile::tempdir;

struct Echo;

#[async_trait]
impl TaskHandler for Echo {
    async fn run(&self, sub_spec: &Map<String, Value>, _ctx: &TaskContext) -> Result<fwrs_core::Action, TaskError> {
        let mut stored = Map::new();
        if let Some(tag) = sub_spec.get("tag") {
            stored.insert("tag".to_string(), tag.clone());
        }
        Ok(fwrs_core::Action { stored_data: stored, ..Default::default() })
    }
}

struct AlwaysFails;

#[async_trait]
impl TaskHandler for AlwaysFails {
    async fn run(&self, _sub_spec: &Map<String, Value>, _ctx: &TaskContext) -> Result<fwrs_core::Action, TaskError> {
        Err(TaskError::Failed("boom".to_string()))
    }
}

fn rocket(registry: TaskRegistry) -> (Rocket<FakeClock>, tempfile::TempDir) {
    let dir = tempdir().unwrap();
    let store = Arc::new(fwrs_storage::WalStore::open(dir.path().join("lp.wal"), None).unwrap());
    let launchpad = Launchpad::new(store, FakeClock::new(), LaunchpadConfig::default());
    let rocket = Rocket::new(launchpad, registry, dir.path().join("launches"));
    (rocket, dir)
}

fn task_with_subtasks(entries: Vec<Map<String, Value>>) -> WorkflowDraft {
    let mut spec = Map::new();
    spec.insert("_tasks".to_string(), Value::Array(entries.into_iter().map(Value::Object).collect()));
    WorkflowDraft::single("wf", spec)
}

fn sub_task(fw_name: &str, tag: &str) -> Map<String, Value> {
    let mut m = Map::new();
    m.insert("_fw_name".to_string(), json!(fw_name));
    m.insert("tag".to_string(), json!(tag));
    m
}

#[tokio::test]
async fn run_once_returns_empty_when_nothing_ready() {
    let (rocket, _dir) = rocket(TaskRegistry::new());
    let outcome = rocket.run_once(&FWorker::new("w1")).await.unwrap();
    assert!(matches!(outcome, RocketOutcome::Empty));
}

#[tokio::test]
async fn run_once_completes_a_task_and_writes_the_sidecar() {
    let mut registry = TaskRegistry::new();
    registry.register("Echo", Arc::new(Echo));
    let (rocket, _dir) = rocket(registry);
    rocket.launchpad.add_workflow(task_with_subtasks(vec![sub_task("Echo", "hello")])).unwrap();

    let outcome = rocket.run_once(&FWorker::new("w1")).await.unwrap();
    match outcome {
        RocketOutcome::Ran { task_id, launch_dir, final_state } => {
            assert_eq!(task_id, 1);
            assert_eq!(final_state, FwState::Completed);
            assert!(launch_dir.join("FW.json").exists());
        }
        RocketOutcome::Empty => panic!("expected a task to run"),
    }
}

#[tokio::test]
async fn run_once_merges_stored_data_from_multiple_sub_tasks() {
    let mut registry = TaskRegistry::new();
    registry.register("Echo", Arc::new(Echo));
    let (rocket, _dir) = rocket(registry);
    rocket
        .launchpad
        .add_workflow(task_with_subtasks(vec![sub_task("Echo", "first"), sub_task("Echo", "second")]))
        .unwrap();

    rocket.run_once(&FWorker::new("w1")).await.unwrap();

    rocket.launchpad.store().read(|s| {
        let launch = s.launches.values().next().unwrap();
        let action = launch.action.as_ref().unwrap();
        assert_eq!(action.stored_data.get("tag"), Some(&json!("second")));
    });
}

#[tokio::test]
async fn run_once_fizzles_and_records_the_exception_on_handler_failure() {
    let mut registry = TaskRegistry::new();
    registry.register("AlwaysFails", Arc::new(AlwaysFails));
    let (rocket, _dir) = rocket(registry);
    rocket.launchpad.add_workflow(task_with_subtasks(vec![sub_task("AlwaysFails", "x")])).unwrap();

    let outcome = rocket.run_once(&FWorker::new("w1")).await.unwrap();
    assert!(matches!(outcome, RocketOutcome::Ran { final_state: FwState::Fizzled, .. }));

    rocket.launchpad.store().read(|s| {
        let launch = s.launches.values().next().unwrap();
        let action = launch.action.as_ref().unwrap();
        assert!(action.stored_data.contains_key("_exception"));
    });
}

#[tokio::test]
async fn run_once_fizzles_on_an_unregistered_fw_name() {
    let (rocket, _dir) = rocket(TaskRegistry::new());
    rocket.launchpad.add_workflow(task_with_subtasks(vec![sub_task("Missing", "x")])).unwrap();

    let outcome = rocket.run_once(&FWorker::new("w1")).await.unwrap();
    assert!(matches!(outcome, RocketOutcome::Ran { final_state: FwState::Fizzled, .. }));
}

#[tokio::test]
async fn run_once_with_no_tasks_list_completes_trivially() {
    let mut spec = Map::new();
    spec.insert("name".to_string(), json!("leaf"));
    let (rocket, _dir) = rocket(TaskRegistry::new());
    rocket.launchpad.add_workflow(WorkflowDraft::single("wf", spec)).unwrap();

    let outcome = rocket.run_once(&FWorker::new("w1")).await.unwrap();
    assert!(matches!(outcome, RocketOutcome::Ran { final_state: FwState::Completed, .. }));
}
