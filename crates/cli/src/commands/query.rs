// SPDX-License-Identifier: MIT

//! `get_fws` / `get_wflows`: query tasks or workflow roots
//! by id, name, state, or a flat key=value spec filter; sort, limit,
//! and render in one of the `display` modes.

use crate::exit_error::ExitError;
use crate::output::{render_fws, DisplayFormat, FwSummary, OutputFormat};
use clap::Args;
use fwrs_core::{FwState, SystemClock, Task, TaskId};
use fwrs_engine::Launchpad;
use fwrs_storage::MaterializedState;

#[derive(Args, Debug)]
pub struct QueryArgs {
    /// A single task-id to fetch directly.
    #[arg(long)]
    pub fw_id: Option<u64>,
    /// Substring match on the task/workflow name.
    #[arg(long)]
    pub name: Option<String>,
    /// Filter by state (WAITING, READY, RESERVED, RUNNING, COMPLETED,
    /// FIZZLED, DEFUSED, PAUSED, ARCHIVED).
    #[arg(long)]
    pub state: Option<String>,
    /// Flat `key=value` spec filter, may be repeated.
    #[arg(long = "query", value_parser = parse_kv)]
    pub query: Vec<(String, String)>,
    /// Sort ascending by task-id (default) or `priority`.
    #[arg(long)]
    pub sort: Option<String>,
    /// Reverse the sort order.
    #[arg(long)]
    pub rsort: bool,
    #[arg(long)]
    pub limit: Option<usize>,
    #[arg(long, value_enum, default_value = "less")]
    pub display: DisplayFormat,
}

fn parse_kv(s: &str) -> Result<(String, String), String> {
    s.split_once('=').map(|(k, v)| (k.to_string(), v.to_string())).ok_or_else(|| format!("expected key=value, got {s:?}"))
}

fn parse_state(s: &str) -> Result<FwState, ExitError> {
    match s.to_ascii_uppercase().as_str() {
        "WAITING" => Ok(FwState::Waiting),
        "READY" => Ok(FwState::Ready),
        "RESERVED" => Ok(FwState::Reserved),
        "RUNNING" => Ok(FwState::Running),
        "COMPLETED" => Ok(FwState::Completed),
        "FIZZLED" => Ok(FwState::Fizzled),
        "DEFUSED" => Ok(FwState::Defused),
        "PAUSED" => Ok(FwState::Paused),
        "ARCHIVED" => Ok(FwState::Archived),
        other => Err(ExitError::user(format!("unknown state {other:?}"))),
    }
}

fn matches_filters(task: &Task, args: &QueryArgs, state: Option<FwState>) -> bool {
    if let Some(want) = state {
        if task.state != want {
            return false;
        }
    }
    if let Some(name) = &args.name {
        if !task.name.contains(name.as_str()) {
            return false;
        }
    }
    args.query.iter().all(|(k, v)| task.spec.get(k).map(|val| val.to_string().trim_matches('"') == v).unwrap_or(false))
}

/// Like [`matches_filters`], but the `--state` filter is checked against
/// the workflow's aggregate state (the precedence-max over member
/// states), not the root task's own state.
fn matches_wflow_filters(s: &MaterializedState, root: &Task, args: &QueryArgs, state: Option<FwState>) -> bool {
    if let Some(want) = state {
        let wflow_state = s.get_workflow(root.task_id).map(|w| w.state);
        if wflow_state != Some(want) {
            return false;
        }
    }
    if let Some(name) = &args.name {
        if !root.name.contains(name.as_str()) {
            return false;
        }
    }
    args.query.iter().all(|(k, v)| root.spec.get(k).map(|val| val.to_string().trim_matches('"') == v).unwrap_or(false))
}

fn summarize(task: &Task, display: DisplayFormat) -> FwSummary {
    FwSummary {
        fw_id: task.task_id.get(),
        name: task.name.clone(),
        state: task.state.to_string(),
        launch_dir: task.launch_dir().map(str::to_string),
        spec: matches!(display, DisplayFormat::More | DisplayFormat::All).then(|| serde_json::Value::Object(task.spec.clone())),
        members: None,
    }
}

/// Like [`summarize`], but the displayed `state` is the workflow's
/// aggregate state rather than the root task's own state, plus the
/// workflow's descendant tree for `more`/`all`, via
/// `Workflow::descendants_within`.
fn summarize_wflow(launchpad: &Launchpad<SystemClock>, root: &Task, display: DisplayFormat) -> FwSummary {
    let mut summary = summarize(root, display);
    launchpad.store().read(|s| {
        if let Some(wf) = s.get_workflow(root.task_id) {
            summary.state = wf.state.to_string();
        }
        if matches!(display, DisplayFormat::More | DisplayFormat::All) {
            summary.members = s
                .get_workflow(root.task_id)
                .map(|w| w.descendants_within(root.task_id, usize::MAX).iter().map(|id| id.get()).collect());
        }
    });
    summary
}

pub fn get_fws(launchpad: &Launchpad<SystemClock>, args: QueryArgs, format: OutputFormat) -> Result<(), ExitError> {
    let state = args.state.as_deref().map(parse_state).transpose()?;

    let mut matched: Vec<Task> = if let Some(id) = args.fw_id {
        launchpad
            .store()
            .read(|s| s.get_task(TaskId::new(id)).filter(|t| matches_filters(t, &args, state)).cloned())
            .into_iter()
            .collect()
    } else {
        launchpad.store().read(|s| s.tasks.values().filter(|t| matches_filters(t, &args, state)).cloned().collect())
    };

    sort_tasks(&mut matched, args.sort.as_deref(), args.rsort);
    if let Some(limit) = args.limit {
        matched.truncate(limit);
    }

    let summaries: Vec<FwSummary> = matched.iter().map(|t| summarize(t, args.display)).collect();
    render_fws(&summaries, args.display, format).map_err(|e| ExitError::new(1, e.to_string()))?;
    Ok(())
}

pub fn get_wflows(launchpad: &Launchpad<SystemClock>, args: QueryArgs, format: OutputFormat) -> Result<(), ExitError> {
    let state = args.state.as_deref().map(parse_state).transpose()?;

    let mut roots: Vec<Task> = if let Some(id) = args.fw_id {
        launchpad
            .store()
            .read(|s| {
                s.get_task(TaskId::new(id))
                    .filter(|t| s.workflows.contains_key(&t.task_id.get()) && matches_wflow_filters(s, t, &args, state))
                    .cloned()
            })
            .into_iter()
            .collect()
    } else {
        launchpad.store().read(|s| {
            s.workflows
                .keys()
                .filter_map(|root| s.get_task(TaskId::new(*root)).cloned())
                .filter(|t| matches_wflow_filters(s, t, &args, state))
                .collect()
        })
    };

    sort_tasks(&mut roots, args.sort.as_deref(), args.rsort);
    if let Some(limit) = args.limit {
        roots.truncate(limit);
    }

    let summaries: Vec<FwSummary> = roots.iter().map(|t| summarize_wflow(launchpad, t, args.display)).collect();
    render_fws(&summaries, args.display, format).map_err(|e| ExitError::new(1, e.to_string()))?;
    Ok(())
}

fn sort_tasks(tasks: &mut [Task], sort: Option<&str>, rsort: bool) {
    match sort {
        Some("priority") => tasks.sort_by_key(|t| t.priority()),
        _ => tasks.sort_by_key(|t| t.task_id.get()),
    }
    if rsort {
        tasks.reverse();
    }
}
