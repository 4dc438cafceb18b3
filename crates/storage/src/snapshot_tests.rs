// SPDX-License-Identifier: MIT

use super::*;
use fwrs_core::{FwState, TaskId};
use tempfile::tempdir;

#[test]
fn missing_snapshot_reads_as_none() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("snap.zst");
    assert!(read(&path).unwrap().is_none());
}

#[test]
fn write_then_read_round_trips_state() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("snap.zst");

    let mut state = MaterializedState::default();
    let id = state.allocate_task_id();
    state.tasks.insert(id.get(), fwrs_core::Task::new(id, "t", Default::default(), 0));
    state.tasks.get_mut(&id.get()).unwrap().state = FwState::Running;

    write(&path, &state, 42).unwrap();
    let loaded = read(&path).unwrap().unwrap();

    assert_eq!(loaded.wal_seq, 42);
    assert_eq!(loaded.state.get_task(TaskId::new(id.get())).unwrap().state, FwState::Running);
}
