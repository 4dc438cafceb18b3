// SPDX-License-Identifier: MIT

use super::*;
use crate::config::LaunchpadConfig;
use crate::error::TaskError;
use crate::registry::{TaskContext, TaskHandler, TaskRegistry};
use async_trait::async_trait;
use fwrs_core::{FakeClock, TaskDraft, WorkflowDraft};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::tempdir;

struct CountingNoop(Arc<AtomicUsize>);

#[async_trait]
impl TaskHandler for CountingNoop {
    async fn run(&self, _sub_spec: &Map<String, Value>, _ctx: &TaskContext) -> Result<fwrs_core::Action, TaskError> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Ok(fwrs_core::Action::default())
    }
}

fn task_spec() -> Map<String, Value> {
    let mut spec = Map::new();
    let mut sub = Map::new();
    sub.insert("_fw_name".to_string(), json!("Noop"));
    spec.insert("_tasks".to_string(), Value::Array(vec![Value::Object(sub)]));
    spec
}

fn chain_of(n: usize) -> WorkflowDraft {
    let mut links = HashMap::new();
    for i in 0..n.saturating_sub(1) {
        links.insert(i, vec![i + 1]);
    }
    WorkflowDraft {
        tasks: (0..n).map(|i| TaskDraft { name: format!("t{i}"), spec: task_spec() }).collect(),
        links,
        name: "chain".into(),
        metadata: Map::new(),
    }
}

fn rapidfire(registry: TaskRegistry, config: RapidfireConfig) -> (Rapidfire<FakeClock>, tempfile::TempDir) {
    let dir = tempdir().unwrap();
    let store = Arc::new(fwrs_storage::WalStore::open(dir.path().join("lp.wal"), None).unwrap());
    let launchpad = Launchpad::new(store, FakeClock::new(), LaunchpadConfig::default());
    let rf = Rapidfire::new(launchpad, registry, FWorker::new("w1"), dir.path().join("launches"), config);
    (rf, dir)
}

fn fast_config(n_launches: i64) -> RapidfireConfig {
    RapidfireConfig {
        n_launches,
        max_loops: 1,
        sleep_time: Duration::from_millis(1),
        poll_interval: Duration::from_millis(1),
    }
}

#[tokio::test]
async fn run_single_drains_a_sequential_chain_until_empty() {
    let mut registry = TaskRegistry::new();
    let counter = Arc::new(AtomicUsize::new(0));
    registry.register("Noop", Arc::new(CountingNoop(Arc::clone(&counter))));
    let (rf, _dir) = rapidfire(registry, fast_config(UNTIL_EMPTY));

    rf.rocket.launchpad().add_workflow(chain_of(3)).unwrap();
    let report = rf.run_single().await;

    assert_eq!(report.num_launched, 3);
    assert_eq!(counter.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn run_single_stops_after_n_launches() {
    let mut registry = TaskRegistry::new();
    let counter = Arc::new(AtomicUsize::new(0));
    registry.register("Noop", Arc::new(CountingNoop(Arc::clone(&counter))));
    let (rf, _dir) = rapidfire(registry, fast_config(2));

    rf.rocket.launchpad().add_workflow(chain_of(5)).unwrap();
    let report = rf.run_single().await;

    assert_eq!(report.num_launched, 2);
}

#[tokio::test]
async fn run_single_records_dispatched_task_ids() {
    let mut registry = TaskRegistry::new();
    let counter = Arc::new(AtomicUsize::new(0));
    registry.register("Noop", Arc::new(CountingNoop(counter)));
    let (rf, _dir) = rapidfire(registry, fast_config(UNTIL_EMPTY));

    rf.rocket.launchpad().add_workflow(chain_of(2)).unwrap();
    rf.run_single().await;

    let dispatched = rf.dispatched_task_ids();
    assert_eq!(dispatched.len(), 2);
}

#[test]
fn run_multi_runs_independent_ready_tasks_across_threads() {
    let mut registry = TaskRegistry::new();
    let counter = Arc::new(AtomicUsize::new(0));
    registry.register("Noop", Arc::new(CountingNoop(Arc::clone(&counter))));
    let (rf, _dir) = rapidfire(registry, fast_config(UNTIL_EMPTY));

    // Three independent (parentless) tasks: a valid target for N workers.
    let draft = WorkflowDraft {
        tasks: (0..3).map(|i| TaskDraft { name: format!("t{i}"), spec: task_spec() }).collect(),
        links: HashMap::new(),
        name: "fan".into(),
        metadata: Map::new(),
    };
    rf.rocket.launchpad().add_workflow(draft).unwrap();

    let reports = rf.run_multi(2);

    assert_eq!(reports.len(), 2);
    let total: u64 = reports.iter().map(|r| r.num_launched).sum();
    assert_eq!(total, 3);
    assert_eq!(counter.load(Ordering::SeqCst), 3);
}
