// SPDX-License-Identifier: MIT

use super::*;

#[test]
fn new_reserved_launch_has_no_start_time() {
    let launch =
        Launch::new(LaunchId::new(1), TaskId::new(1), FWorker::new("w"), "/tmp/x", LaunchState::Reserved, 100);
    assert_eq!(launch.time_start_ms, None);
    assert_eq!(launch.state_history.len(), 1);
}

#[test]
fn new_running_launch_records_start_time() {
    let launch =
        Launch::new(LaunchId::new(1), TaskId::new(1), FWorker::new("w"), "/tmp/x", LaunchState::Running, 100);
    assert_eq!(launch.time_start_ms, Some(100));
}

#[test]
fn transition_to_running_sets_start_time_once() {
    let mut launch =
        Launch::new(LaunchId::new(1), TaskId::new(1), FWorker::new("w"), "/tmp/x", LaunchState::Reserved, 100);
    launch.transition(LaunchState::Running, 150);
    assert_eq!(launch.time_start_ms, Some(150));
    assert_eq!(launch.state_history.len(), 2);

    // A later transition to Running again should not move the start time.
    launch.transition(LaunchState::Running, 999);
    assert_eq!(launch.time_start_ms, Some(150));
}

#[test]
fn finish_computes_runtime_from_start() {
    let mut launch =
        Launch::new(LaunchId::new(1), TaskId::new(1), FWorker::new("w"), "/tmp/x", LaunchState::Running, 1000);
    launch.finish(LaunchState::Completed, None, 3500);
    assert_eq!(launch.time_end_ms, Some(3500));
    assert_eq!(launch.runtime_secs, Some(2.5));
    assert_eq!(launch.state, LaunchState::Completed);
}

#[test]
fn ping_updates_heartbeat_and_optionally_checkpoint() {
    let mut launch =
        Launch::new(LaunchId::new(1), TaskId::new(1), FWorker::new("w"), "/tmp/x", LaunchState::Running, 0);
    launch.ping(50, None);
    assert_eq!(launch.last_pinged_ms, Some(50));
    assert_eq!(launch.checkpoint, None);

    launch.ping(100, Some(serde_json::json!({"step": 3})));
    assert_eq!(launch.last_pinged_ms, Some(100));
    assert_eq!(launch.checkpoint, Some(serde_json::json!({"step": 3})));
}
