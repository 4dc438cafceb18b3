// SPDX-License-Identifier: MIT

//! Launch records — one attempt at executing a task.

use crate::action::Action;
use crate::id::{LaunchId, TaskId};
use crate::state::LaunchState;
use crate::worker::FWorker;
use serde::{Deserialize, Serialize};

/// One append-only entry in a launch's `state_history`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateHistoryEntry {
    pub state: LaunchState,
    pub timestamp_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reservation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkpoint: Option<serde_json::Value>,
}

/// A file-tailer record attached to a launch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tracker {
    pub filename: String,
    pub max_lines: usize,
}

/// One attempt at executing a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Launch {
    pub launch_id: LaunchId,
    pub task_id: TaskId,
    pub fworker: FWorker,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    pub launch_dir: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_start_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_end_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime_secs: Option<f64>,
    pub state: LaunchState,
    #[serde(default)]
    pub state_history: Vec<StateHistoryEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<Action>,
    #[serde(default)]
    pub trackers: Vec<Tracker>,
    /// Last heartbeat received via `ping`; `None` until the
    /// first ping after the launch starts running.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_pinged_ms: Option<u64>,
    /// Checkpoint payload persisted by the most recent `ping`, for offline
    /// recovery.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkpoint: Option<serde_json::Value>,
}

impl Launch {
    pub fn new(
        launch_id: LaunchId,
        task_id: TaskId,
        fworker: FWorker,
        launch_dir: impl Into<String>,
        state: LaunchState,
        now_ms: u64,
    ) -> Self {
        Self {
            launch_id,
            task_id,
            fworker,
            host: None,
            ip: None,
            launch_dir: launch_dir.into(),
            time_start_ms: if state == LaunchState::Running { Some(now_ms) } else { None },
            time_end_ms: None,
            runtime_secs: None,
            state,
            state_history: vec![StateHistoryEntry {
                state,
                timestamp_ms: now_ms,
                reservation_id: None,
                checkpoint: None,
            }],
            action: None,
            trackers: Vec::new(),
            last_pinged_ms: None,
            checkpoint: None,
        }
    }

    /// Append a new state to history and update the current state (and
    /// `time_start_ms` the first time it transitions to `RUNNING`).
    pub fn transition(&mut self, new_state: LaunchState, now_ms: u64) {
        if new_state == LaunchState::Running && self.time_start_ms.is_none() {
            self.time_start_ms = Some(now_ms);
        }
        self.state = new_state;
        self.state_history.push(StateHistoryEntry {
            state: new_state,
            timestamp_ms: now_ms,
            reservation_id: None,
            checkpoint: None,
        });
    }

    /// Finalize the launch on completion: set `time_end_ms`/`runtime_secs`
    /// from `time_start_ms`, the terminal state, and the returned action.
    pub fn finish(&mut self, final_state: LaunchState, action: Option<Action>, now_ms: u64) {
        self.transition(final_state, now_ms);
        self.time_end_ms = Some(now_ms);
        self.runtime_secs = self.time_start_ms.map(|start| (now_ms.saturating_sub(start)) as f64 / 1000.0);
        self.action = action;
    }

    pub fn ping(&mut self, now_ms: u64, checkpoint: Option<serde_json::Value>) {
        self.last_pinged_ms = Some(now_ms);
        if checkpoint.is_some() {
            self.checkpoint = checkpoint;
        }
    }
}

crate::builder! {
    pub struct LaunchBuilder => Launch {
        set {
            launch_id: LaunchId = LaunchId::new(1),
            task_id: TaskId = TaskId::new(1),
            fworker: FWorker = FWorker::new("test-worker"),
            host: Option<String> = None,
            ip: Option<String> = None,
            time_start_ms: Option<u64> = None,
            time_end_ms: Option<u64> = None,
            runtime_secs: Option<f64> = None,
            state: LaunchState = LaunchState::Running,
            state_history: Vec<StateHistoryEntry> = Vec::new(),
            action: Option<Action> = None,
            trackers: Vec<Tracker> = Vec::new(),
            last_pinged_ms: Option<u64> = None,
            checkpoint: Option<serde_json::Value> = None,
        }
        into {
            launch_dir: String = "/tmp/launcher_test",
        }
    }
}

#[cfg(test)]
#[path = "launch_tests.rs"]
mod tests;
