// SPDX-License-Identifier: MIT

//! Liveness/maintenance admin commands.

use crate::exit_error::ExitError;
use crate::output::OutputFormat;
use fwrs_core::{SystemClock, TaskId};
use fwrs_engine::Launchpad;

pub fn detect_unreserved(
    launchpad: &Launchpad<SystemClock>,
    expiration_secs: u64,
    rerun: bool,
    format: OutputFormat,
) -> Result<(), ExitError> {
    let swept = launchpad.detect_unreserved(expiration_secs, rerun)?;
    let ids: Vec<u64> = swept.iter().map(|id| id.get()).collect();
    print_ids("unreserved swept", &ids, format)
}

pub fn detect_lostruns(
    launchpad: &Launchpad<SystemClock>,
    expiration_secs: u64,
    rerun: bool,
    refresh: bool,
    format: OutputFormat,
) -> Result<(), ExitError> {
    let report = launchpad.detect_lost_runs(expiration_secs, rerun, refresh)?;
    if format.is_text() {
        println!("swept {} lost run(s): {:?}", report.swept.len(), report.swept);
        println!("refreshed {} inconsistent task(s): {:?}", report.refreshed.len(), report.refreshed);
    } else {
        format
            .print_value(&serde_json::json!({
                "swept": report.swept.iter().map(|t| t.get()).collect::<Vec<_>>(),
                "refreshed": report.refreshed.iter().map(|t| t.get()).collect::<Vec<_>>(),
            }))
            .map_err(|e| ExitError::new(1, e.to_string()))?;
    }
    Ok(())
}

pub fn refresh(launchpad: &Launchpad<SystemClock>, format: OutputFormat) -> Result<(), ExitError> {
    let refreshed = launchpad.refresh()?;
    print_ids("refreshed", &refreshed.iter().map(|t| t.get()).collect::<Vec<_>>(), format)
}

pub fn maintain(launchpad: &Launchpad<SystemClock>, format: OutputFormat) -> Result<(), ExitError> {
    let report = launchpad.maintain()?;
    if format.is_text() {
        println!("unreserved swept: {:?}", report.unreserved_swept);
        println!("lost runs swept: {:?}", report.lost_runs.swept);
        println!("inconsistent refreshed: {:?}", report.lost_runs.refreshed);
    } else {
        format
            .print_value(&serde_json::json!({
                "unreserved_swept": report.unreserved_swept.iter().map(|t| t.get()).collect::<Vec<_>>(),
                "lost_runs_swept": report.lost_runs.swept.iter().map(|t| t.get()).collect::<Vec<_>>(),
                "refreshed": report.lost_runs.refreshed.iter().map(|t| t.get()).collect::<Vec<_>>(),
            }))
            .map_err(|e| ExitError::new(1, e.to_string()))?;
    }
    Ok(())
}

pub fn tuneup(launchpad: &Launchpad<SystemClock>) -> Result<(), ExitError> {
    launchpad.tuneup()?;
    println!("tuneup complete");
    Ok(())
}

pub fn unlock(launchpad: &Launchpad<SystemClock>, fw_id: u64) -> Result<(), ExitError> {
    launchpad.unlock(TaskId::new(fw_id))?;
    println!("unlocked workflow rooted at {fw_id}");
    Ok(())
}

fn print_ids(label: &str, ids: &[u64], format: OutputFormat) -> Result<(), ExitError> {
    if format.is_text() {
        println!("{label}: {ids:?}");
        Ok(())
    } else {
        format.print_value(&serde_json::json!({ label: ids })).map_err(|e| ExitError::new(1, e.to_string()))
    }
}
