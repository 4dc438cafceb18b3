// SPDX-License-Identifier: MIT

use super::*;
use fwrs_core::{Action, FWorker, FwState, LaunchId, LaunchState, ModSpecOp};
use serde_json::{json, Map};

fn workflow_created(root: u64) -> Event {
    Event::WorkflowCreated {
        root_task_id: TaskId::new(root),
        name: "wf".into(),
        metadata: Map::new(),
        created_on: 0,
    }
}

fn task_created(id: u64, root: u64) -> Event {
    Event::TaskCreated {
        task_id: TaskId::new(id),
        workflow_root: TaskId::new(root),
        name: format!("t{id}"),
        spec: Map::new(),
        created_on: 0,
    }
}

#[test]
fn replaying_task_created_twice_is_idempotent() {
    let mut state = MaterializedState::default();
    state.apply_event(&workflow_created(1));
    state.apply_event(&task_created(1, 1));
    state.apply_event(&task_created(1, 1));

    assert_eq!(state.tasks.len(), 1);
    assert_eq!(state.get_workflow(TaskId::new(1)).unwrap().nodes.len(), 1);
}

#[test]
fn link_added_is_idempotent() {
    let mut state = MaterializedState::default();
    state.apply_event(&workflow_created(1));
    state.apply_event(&task_created(1, 1));
    state.apply_event(&task_created(2, 1));

    let link = Event::LinkAdded { workflow_root: TaskId::new(1), parent: TaskId::new(1), child: TaskId::new(2) };
    state.apply_event(&link);
    state.apply_event(&link);

    let wf = state.get_workflow(TaskId::new(1)).unwrap();
    assert_eq!(wf.children_of(TaskId::new(1)).count(), 1);
}

#[test]
fn task_state_changed_updates_workflow_aggregate() {
    let mut state = MaterializedState::default();
    state.apply_event(&workflow_created(1));
    state.apply_event(&task_created(1, 1));

    state.apply_event(&Event::TaskStateChanged { task_id: TaskId::new(1), state: FwState::Running });

    assert_eq!(state.get_task(TaskId::new(1)).unwrap().state, FwState::Running);
    assert_eq!(state.get_workflow(TaskId::new(1)).unwrap().state, FwState::Running);
}

#[test]
fn task_spec_patched_applies_update_then_mod_spec() {
    let mut state = MaterializedState::default();
    state.apply_event(&workflow_created(1));
    state.apply_event(&task_created(1, 1));

    let mut update = Map::new();
    update.insert("count".into(), json!(10));
    let patch = Event::TaskSpecPatched {
        task_id: TaskId::new(1),
        update_spec: Some(update),
        mod_spec: vec![ModSpecOp::Inc { path: "count".into(), by: 1 }],
    };
    state.apply_event(&patch);

    assert_eq!(state.get_task(TaskId::new(1)).unwrap().spec.get("count"), Some(&json!(11)));
}

#[test]
fn launch_created_attaches_to_task() {
    let mut state = MaterializedState::default();
    state.apply_event(&workflow_created(1));
    state.apply_event(&task_created(1, 1));

    let launch = Event::LaunchCreated {
        launch_id: LaunchId::new(1),
        task_id: TaskId::new(1),
        fworker: FWorker::new("w"),
        launch_dir: "/tmp/x".into(),
        state: LaunchState::Running,
        timestamp_ms: 0,
    };
    state.apply_event(&launch);
    state.apply_event(&launch);

    assert_eq!(state.get_task(TaskId::new(1)).unwrap().launches, vec![LaunchId::new(1)]);
    assert!(state.get_launch(LaunchId::new(1)).is_some());
}

#[test]
fn id_allocation_is_monotonic_and_never_reuses() {
    let mut state = MaterializedState::default();
    let a = state.allocate_task_id();
    let b = state.allocate_task_id();
    assert_eq!(a, TaskId::new(1));
    assert_eq!(b, TaskId::new(2));

    let l1 = state.allocate_launch_id();
    assert_eq!(l1, LaunchId::new(1));
}

#[test]
fn lock_acquired_then_released_round_trips() {
    let mut state = MaterializedState::default();
    state.apply_event(&workflow_created(1));

    state.apply_event(&Event::LockAcquired {
        root_task_id: TaskId::new(1),
        holder: "worker-a".into(),
        acquired_ms: 0,
        expires_ms: 10_000,
    });
    assert_eq!(state.locks.get(&1).unwrap().holder, "worker-a");

    state.apply_event(&Event::LockReleased { root_task_id: TaskId::new(1) });
    assert!(state.locks.get(&1).is_none());
}

#[test]
fn unlock_is_idempotent_when_no_lock_is_held() {
    let mut state = MaterializedState::default();
    state.apply_event(&Event::LockReleased { root_task_id: TaskId::new(1) });
    assert!(state.locks.is_empty());
}

#[test]
fn workflow_deleted_removes_tasks_launches_and_workflow() {
    let mut state = MaterializedState::default();
    state.apply_event(&workflow_created(1));
    state.apply_event(&task_created(1, 1));
    state.apply_event(&task_created(2, 1));
    state.apply_event(&Event::LinkAdded { workflow_root: TaskId::new(1), parent: TaskId::new(1), child: TaskId::new(2) });
    state.apply_event(&Event::LaunchCreated {
        launch_id: LaunchId::new(1),
        task_id: TaskId::new(1),
        fworker: FWorker::new("w"),
        launch_dir: "/tmp/x".into(),
        state: LaunchState::Running,
        timestamp_ms: 0,
    });

    state.apply_event(&Event::WorkflowDeleted {
        root_task_id: TaskId::new(1),
        task_ids: vec![TaskId::new(1), TaskId::new(2)],
        launch_ids: vec![LaunchId::new(1)],
    });

    assert!(state.get_task(TaskId::new(1)).is_none());
    assert!(state.get_task(TaskId::new(2)).is_none());
    assert!(state.get_launch(LaunchId::new(1)).is_none());
    assert!(state.workflows.is_empty());
    assert!(state.task_to_workflow.is_empty());
}

#[test]
fn launch_finished_is_idempotent_about_runtime() {
    let mut state = MaterializedState::default();
    state.apply_event(&workflow_created(1));
    state.apply_event(&task_created(1, 1));
    state.apply_event(&Event::LaunchCreated {
        launch_id: LaunchId::new(1),
        task_id: TaskId::new(1),
        fworker: FWorker::new("w"),
        launch_dir: "/tmp/x".into(),
        state: LaunchState::Running,
        timestamp_ms: 0,
    });

    let finish = Event::LaunchFinished {
        launch_id: LaunchId::new(1),
        state: LaunchState::Completed,
        action: Some(Action::default()),
        timestamp_ms: 1000,
    };
    state.apply_event(&finish);
    let runtime_after_first = state.get_launch(LaunchId::new(1)).unwrap().runtime_secs;

    // Re-applying (e.g. after a crash mid-flush) must not recompute runtime
    // from a new "now".
    state.apply_event(&Event::LaunchFinished {
        launch_id: LaunchId::new(1),
        state: LaunchState::Completed,
        action: Some(Action::default()),
        timestamp_ms: 5000,
    });
    assert_eq!(state.get_launch(LaunchId::new(1)).unwrap().runtime_secs, runtime_after_first);
}
