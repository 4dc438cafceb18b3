// SPDX-License-Identifier: MIT

//! The task/launch/workflow state machine.
//!
//! This module is deliberately pure: no store access, no clock, no
//! allocation beyond the returned collections. `fwrs_engine::launchpad`
//! is the only place these predicates are combined with store mutations.

use serde::{Deserialize, Serialize};

/// State of a single task ("firework") within a workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FwState {
    Waiting,
    Ready,
    Reserved,
    Running,
    Completed,
    Fizzled,
    Defused,
    Paused,
    Archived,
}

crate::simple_display! {
    FwState {
        Waiting => "WAITING",
        Ready => "READY",
        Reserved => "RESERVED",
        Running => "RUNNING",
        Completed => "COMPLETED",
        Fizzled => "FIZZLED",
        Defused => "DEFUSED",
        Paused => "PAUSED",
        Archived => "ARCHIVED",
    }
}

impl FwState {
    /// Terminal states are never re-evaluated by parents-resolved logic
    /// except via an explicit admin transition (rerun/reignite/resume).
    pub fn is_terminal(self) -> bool {
        matches!(self, FwState::Completed | FwState::Fizzled | FwState::Archived)
    }

    /// A task counts as "resolved" for its children's parents-resolved
    /// check if it's `COMPLETED`, or `FIZZLED` when the child opted into
    /// `_allow_fizzled_parents`.
    pub fn resolves_children(self, allow_fizzled_parents: bool) -> bool {
        match self {
            FwState::Completed => true,
            FwState::Fizzled => allow_fizzled_parents,
            _ => false,
        }
    }
}

/// State of a single launch (one attempt at a task).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LaunchState {
    Reserved,
    Running,
    Completed,
    Fizzled,
    Paused,
    Defused,
}

crate::simple_display! {
    LaunchState {
        Reserved => "RESERVED",
        Running => "RUNNING",
        Completed => "COMPLETED",
        Fizzled => "FIZZLED",
        Paused => "PAUSED",
        Defused => "DEFUSED",
    }
}

impl LaunchState {
    /// The `FwState` a task should carry while its tail launch is in this state.
    pub fn as_fw_state(self) -> FwState {
        match self {
            LaunchState::Reserved => FwState::Reserved,
            LaunchState::Running => FwState::Running,
            LaunchState::Completed => FwState::Completed,
            LaunchState::Fizzled => FwState::Fizzled,
            LaunchState::Paused => FwState::Paused,
            LaunchState::Defused => FwState::Defused,
        }
    }
}

/// Precedence rank used to derive a workflow's aggregate state from its
/// member task states. Higher wins.
///
/// `ARCHIVED > FIZZLED > DEFUSED > PAUSED > RUNNING > RESERVED > READY >
/// WAITING > COMPLETED`.
fn precedence(state: FwState) -> u8 {
    match state {
        FwState::Completed => 0,
        FwState::Waiting => 1,
        FwState::Ready => 2,
        FwState::Reserved => 3,
        FwState::Running => 4,
        FwState::Paused => 5,
        FwState::Defused => 6,
        FwState::Fizzled => 7,
        FwState::Archived => 8,
    }
}

/// Derive a workflow's aggregate state from its member task states.
///
/// An empty workflow (no tasks) is defined as `COMPLETED`, the precedence
/// floor — there is nothing left to do.
pub fn aggregate_state<I: IntoIterator<Item = FwState>>(states: I) -> FwState {
    states.into_iter().max_by_key(|s| precedence(*s)).unwrap_or(FwState::Completed)
}

/// Whether a task whose parents have the given states is `READY` (all
/// parents resolved) as opposed to `WAITING`.
///
/// A task with no parents is immediately ready.
pub fn parents_resolved<I: IntoIterator<Item = FwState>>(
    parent_states: I,
    allow_fizzled_parents: bool,
) -> bool {
    parent_states.into_iter().all(|s| s.resolves_children(allow_fizzled_parents))
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
