// SPDX-License-Identifier: MIT

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::id::{LaunchId, TaskId};
use crate::launch::Launch;
use crate::state::LaunchState;
use crate::task::Task;
use crate::worker::FWorker;
use crate::workflow::Workflow;
use serde_json::Map;

/// Proptest strategies for the state machine types.
pub mod strategies {
    use crate::state::{FwState, LaunchState};
    use proptest::prelude::*;

    pub fn arb_fw_state() -> impl Strategy<Value = FwState> {
        prop_oneof![
            Just(FwState::Waiting),
            Just(FwState::Ready),
            Just(FwState::Reserved),
            Just(FwState::Running),
            Just(FwState::Completed),
            Just(FwState::Fizzled),
            Just(FwState::Defused),
            Just(FwState::Paused),
            Just(FwState::Archived),
        ]
    }

    pub fn arb_launch_state() -> impl Strategy<Value = LaunchState> {
        prop_oneof![
            Just(LaunchState::Reserved),
            Just(LaunchState::Running),
            Just(LaunchState::Completed),
            Just(LaunchState::Fizzled),
            Just(LaunchState::Paused),
            Just(LaunchState::Defused),
        ]
    }
}

/// A task with `name` and an empty spec, created at `t=0`.
pub fn bare_task(task_id: u64, name: &str) -> Task {
    Task::new(TaskId::new(task_id), name, Map::new(), 0)
}

/// A running launch for `task_id`, started at `t=0` on a nameless worker.
pub fn running_launch(launch_id: u64, task_id: u64) -> Launch {
    Launch::new(
        LaunchId::new(launch_id),
        TaskId::new(task_id),
        FWorker::new("test-worker"),
        "/tmp/launcher_test",
        LaunchState::Running,
        0,
    )
}

/// A single-node workflow wrapping `task_id`, in `Waiting` state.
pub fn single_node_workflow(task_id: u64) -> Workflow {
    let mut wf = Workflow::new("test-workflow", Map::new(), 0);
    wf.add_node(TaskId::new(task_id), crate::state::FwState::Waiting);
    wf
}

/// A three-node linear chain `a -> b -> c`, all `Waiting`.
pub fn linear_chain_workflow(a: u64, b: u64, c: u64) -> Workflow {
    let mut wf = Workflow::new("test-chain", Map::new(), 0);
    for id in [a, b, c] {
        wf.add_node(TaskId::new(id), crate::state::FwState::Waiting);
    }
    wf.add_link(TaskId::new(a), TaskId::new(b));
    wf.add_link(TaskId::new(b), TaskId::new(c));
    wf
}
