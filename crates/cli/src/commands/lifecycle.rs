// SPDX-License-Identifier: MIT

//! Task-level and workflow-level admin state transitions.

use crate::confirm::confirm_bulk;
use crate::exit_error::ExitError;
use crate::output::{print_mutation_summary, OutputFormat};
use fwrs_core::{SystemClock, TaskId};
use fwrs_engine::Launchpad;

fn task_ids(ids: &[u64]) -> Vec<TaskId> {
    ids.iter().copied().map(TaskId::new).collect()
}

/// Every task belonging to the workflow rooted at `root`, used by the
/// workflow-granularity commands that only have a per-task Launchpad
/// entry point to drive (`pause_wflows`/`reignite_wflows`/`resume_wflows`
/// have no dedicated workflow-level method; only
/// `defuse_workflow`/`archive_workflow`/`delete_workflow` operate at
/// that granularity).
fn members_of(launchpad: &Launchpad<SystemClock>, root: TaskId) -> Vec<TaskId> {
    launchpad.store().read(|s| s.get_workflow(root).map(|w| w.nodes.iter().copied().collect()).unwrap_or_default())
}

fn resolve_root(launchpad: &Launchpad<SystemClock>, id: u64) -> Result<TaskId, ExitError> {
    launchpad
        .store()
        .read(|s| s.workflow_root_of(TaskId::new(id)))
        .ok_or_else(|| ExitError::user(format!("no such firework/workflow: {id}")))
}

macro_rules! bulk_task_op {
    ($name:ident, $method:ident, $verb:literal) => {
        pub fn $name(
            launchpad: &Launchpad<SystemClock>,
            fw_ids: Vec<u64>,
            password: Option<&str>,
            yes: bool,
            format: OutputFormat,
        ) -> Result<(), ExitError> {
            confirm_bulk(fw_ids.len(), password, yes)?;
            for id in task_ids(&fw_ids) {
                launchpad.$method(id)?;
            }
            print_mutation_summary($verb, &fw_ids, format).map_err(|e| ExitError::new(1, e.to_string()))
        }
    };
}

bulk_task_op!(rerun_fws, rerun_task, "reran");
bulk_task_op!(defuse_fws, defuse_task, "defused");
bulk_task_op!(pause_fws, pause_task, "paused");
bulk_task_op!(reignite_fws, reignite_task, "reignited");
bulk_task_op!(resume_fws, resume_task, "resumed");

pub fn set_priority(
    launchpad: &Launchpad<SystemClock>,
    fw_ids: Vec<u64>,
    priority: i64,
    password: Option<&str>,
    yes: bool,
    format: OutputFormat,
) -> Result<(), ExitError> {
    confirm_bulk(fw_ids.len(), password, yes)?;
    for id in task_ids(&fw_ids) {
        launchpad.set_priority(id, priority)?;
    }
    print_mutation_summary("set priority on", &fw_ids, format).map_err(|e| ExitError::new(1, e.to_string()))
}

pub fn defuse_wflows(
    launchpad: &Launchpad<SystemClock>,
    fw_ids: Vec<u64>,
    defuse_all_states: bool,
    password: Option<&str>,
    yes: bool,
    format: OutputFormat,
) -> Result<(), ExitError> {
    confirm_bulk(fw_ids.len(), password, yes)?;
    for id in &fw_ids {
        let root = resolve_root(launchpad, *id)?;
        launchpad.defuse_workflow(root, defuse_all_states)?;
    }
    print_mutation_summary("defused", &fw_ids, format).map_err(|e| ExitError::new(1, e.to_string()))
}

pub fn archive_wflows(
    launchpad: &Launchpad<SystemClock>,
    fw_ids: Vec<u64>,
    password: Option<&str>,
    yes: bool,
    format: OutputFormat,
) -> Result<(), ExitError> {
    confirm_bulk(fw_ids.len(), password, yes)?;
    for id in &fw_ids {
        let root = resolve_root(launchpad, *id)?;
        launchpad.archive_workflow(root)?;
    }
    print_mutation_summary("archived", &fw_ids, format).map_err(|e| ExitError::new(1, e.to_string()))
}

pub fn delete_wflows(
    launchpad: &Launchpad<SystemClock>,
    fw_ids: Vec<u64>,
    password: Option<&str>,
    yes: bool,
    format: OutputFormat,
) -> Result<(), ExitError> {
    confirm_bulk(fw_ids.len(), password, yes)?;
    for id in &fw_ids {
        let root = resolve_root(launchpad, *id)?;
        launchpad.delete_workflow(root)?;
    }
    print_mutation_summary("deleted", &fw_ids, format).map_err(|e| ExitError::new(1, e.to_string()))
}

/// `pause_wflows`/`reignite_wflows` apply the task-level transition to
/// every member of the workflow rather than a single dedicated
/// Launchpad method. Members not in an eligible state for `op` are
/// skipped rather than aborting the whole command, matching
/// `Launchpad::defuse_workflow`'s continue-past-ineligible-state
/// behavior — almost every real workflow mixes member states.
fn whole_workflow_task_op(
    launchpad: &Launchpad<SystemClock>,
    fw_ids: Vec<u64>,
    password: Option<&str>,
    yes: bool,
    format: OutputFormat,
    verb: &'static str,
    op: impl Fn(&Launchpad<SystemClock>, TaskId) -> Result<(), fwrs_engine::LaunchpadError>,
) -> Result<(), ExitError> {
    confirm_bulk(fw_ids.len(), password, yes)?;
    let mut touched = Vec::new();
    for id in &fw_ids {
        let root = resolve_root(launchpad, *id)?;
        for member in members_of(launchpad, root) {
            match op(launchpad, member) {
                Ok(()) => touched.push(member.get()),
                Err(fwrs_engine::LaunchpadError::InvalidTransition { .. }) => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }
    print_mutation_summary(verb, &touched, format).map_err(|e| ExitError::new(1, e.to_string()))
}

pub fn pause_wflows(
    launchpad: &Launchpad<SystemClock>,
    fw_ids: Vec<u64>,
    password: Option<&str>,
    yes: bool,
    format: OutputFormat,
) -> Result<(), ExitError> {
    whole_workflow_task_op(launchpad, fw_ids, password, yes, format, "paused", Launchpad::pause_task)
}

pub fn reignite_wflows(
    launchpad: &Launchpad<SystemClock>,
    fw_ids: Vec<u64>,
    password: Option<&str>,
    yes: bool,
    format: OutputFormat,
) -> Result<(), ExitError> {
    whole_workflow_task_op(launchpad, fw_ids, password, yes, format, "reignited", Launchpad::reignite_task)
}
