// SPDX-License-Identifier: MIT

use super::*;
use fwrs_core::FwState;
use serde_json::Map;
use tempfile::tempdir;

fn create_workflow(store: &WalStore) -> fwrs_core::TaskId {
    store
        .transact(|txn| {
            let id = txn.state_mut().allocate_task_id();
            txn.emit(Event::WorkflowCreated { root_task_id: id, name: "wf".into(), metadata: Map::new(), created_on: 0 });
            txn.emit(Event::TaskCreated {
                task_id: id,
                workflow_root: id,
                name: "root".into(),
                spec: Map::new(),
                created_on: 0,
            });
            id
        })
        .unwrap()
}

#[test]
fn transact_persists_across_reopen() {
    let dir = tempdir().unwrap();
    let wal_path = dir.path().join("lp.wal");

    let id = {
        let store = WalStore::open(&wal_path, None).unwrap();
        let id = create_workflow(&store);
        store.transact(|txn| txn.emit(Event::TaskStateChanged { task_id: id, state: FwState::Running })).unwrap();
        id
    };

    let reopened = WalStore::open(&wal_path, None).unwrap();
    reopened.read(|state| {
        assert_eq!(state.get_task(id).unwrap().state, FwState::Running);
    });
}

#[test]
fn id_allocation_does_not_reset_on_reopen() {
    let dir = tempdir().unwrap();
    let wal_path = dir.path().join("lp.wal");

    let first_id = {
        let store = WalStore::open(&wal_path, None).unwrap();
        create_workflow(&store)
    };

    let store = WalStore::open(&wal_path, None).unwrap();
    let second_id = store.transact(|txn| txn.state_mut().allocate_task_id()).unwrap();
    assert!(second_id.get() > first_id.get());
}

#[test]
fn snapshot_now_truncates_wal_and_state_survives_reopen() {
    let dir = tempdir().unwrap();
    let wal_path = dir.path().join("lp.wal");
    let snap_path = dir.path().join("lp.snapshot.zst");

    let id = {
        let store = WalStore::open(&wal_path, Some(snap_path.clone())).unwrap();
        let id = create_workflow(&store);
        store.snapshot_now().unwrap();
        id
    };

    assert!(snap_path.exists());

    let reopened = WalStore::open(&wal_path, Some(snap_path)).unwrap();
    reopened.read(|state| {
        assert!(state.get_task(id).is_some());
    });
}

#[test]
fn read_does_not_require_a_transaction() {
    let dir = tempdir().unwrap();
    let wal_path = dir.path().join("lp.wal");
    let store = WalStore::open(&wal_path, None).unwrap();
    let id = create_workflow(&store);

    let name = store.read(|state| state.get_task(id).map(|t| t.name.clone()));
    assert_eq!(name, Some("root".to_string()));
}
