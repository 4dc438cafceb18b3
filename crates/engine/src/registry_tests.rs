// SPDX-License-Identifier: MIT

use super::*;
use async_trait::async_trait;
use serde_json::Map;

struct Noop;

#[async_trait]
impl TaskHandler for Noop {
    async fn run(&self, _sub_spec: &Map<String, Value>, _ctx: &TaskContext) -> Result<fwrs_core::Action, TaskError> {
        Ok(fwrs_core::Action::default())
    }
}

fn ctx() -> TaskContext {
    TaskContext { task_id: 1, launch_id: 1, launch_dir: "/tmp/x".into(), fw_spec: Map::new() }
}

#[tokio::test]
async fn unregistered_name_fails_closed() {
    let registry = TaskRegistry::new();
    assert!(matches!(registry.get("Noop"), Err(TaskError::NoHandler(name)) if name == "Noop"));
}

#[tokio::test]
async fn registered_handler_runs() {
    let mut registry = TaskRegistry::new();
    registry.register("Noop", Arc::new(Noop));

    let handler = registry.get("Noop").unwrap();
    let action = handler.run(&Map::new(), &ctx()).await.unwrap();
    assert!(action.is_noop());
}
