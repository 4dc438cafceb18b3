// SPDX-License-Identifier: MIT

//! End-to-end specs for the `fwlp` CLI, driven as a subprocess against a
//! throwaway WAL file.

use assert_cmd::Command;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

struct Lpad {
    dir: TempDir,
}

impl Lpad {
    fn new() -> Self {
        Self { dir: TempDir::new().unwrap() }
    }

    fn wal_path(&self) -> PathBuf {
        self.dir.path().join("launchpad.wal")
    }

    fn fwlp(&self) -> Command {
        let mut cmd = Command::cargo_bin("fwlp").unwrap();
        cmd.arg("-l").arg(self.wal_path());
        cmd
    }

    fn workflow_file(&self, name: &str, json: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, json).unwrap();
        path
    }
}

fn single_task_workflow(name: &str) -> String {
    format!(r#"{{"tasks":[{{"name":"{name}","spec":{{}}}}],"links":{{}},"name":"{name}","metadata":{{}}}}"#)
}

#[test]
fn get_fws_on_an_empty_launchpad_returns_zero_count() {
    let lp = Lpad::new();
    lp.fwlp().args(["get-fws", "--display", "count"]).assert().success().stdout("0\n");
}

#[test]
fn add_then_get_fws_finds_the_new_task_by_id() {
    let lp = Lpad::new();
    let wf = lp.workflow_file("wf.json", &single_task_workflow("leaf"));

    lp.fwlp().args(["add"]).arg(&wf).assert().success().stdout(predicates::str::contains("fw_id 1"));

    lp.fwlp().args(["get-fws", "--display", "count"]).assert().success().stdout("1\n");
    lp.fwlp().args(["get-fws", "--fw-id", "1", "--display", "ids"]).assert().success().stdout("1\n");
}

#[test]
fn add_rejects_a_missing_file() {
    let lp = Lpad::new();
    lp.fwlp().args(["add", "no-such-file.json"]).assert().failure();
}

#[test]
fn defuse_then_reignite_round_trips_a_task_state() {
    let lp = Lpad::new();
    let wf = lp.workflow_file("wf.json", &single_task_workflow("leaf"));
    lp.fwlp().args(["add"]).arg(&wf).assert().success();

    lp.fwlp().args(["defuse-fws", "1"]).assert().success();
    lp.fwlp()
        .args(["get-fws", "--fw-id", "1", "--state", "DEFUSED", "--display", "count"])
        .assert()
        .success()
        .stdout("1\n");

    lp.fwlp().args(["reignite-fws", "1"]).assert().success();
    lp.fwlp()
        .args(["get-fws", "--fw-id", "1", "--state", "READY", "--display", "count"])
        .assert()
        .success()
        .stdout("1\n");
}

#[test]
fn set_priority_updates_the_task_spec() {
    let lp = Lpad::new();
    let wf = lp.workflow_file("wf.json", &single_task_workflow("leaf"));
    lp.fwlp().args(["add"]).arg(&wf).assert().success();

    lp.fwlp().args(["set-priority", "7", "1"]).assert().success();

    lp.fwlp()
        .args(["get-fws", "--fw-id", "1", "--display", "all"])
        .assert()
        .success()
        .stdout(predicates::str::contains("_priority"));
}

#[test]
fn delete_wflows_removes_the_workflow_from_queries() {
    let lp = Lpad::new();
    let wf = lp.workflow_file("wf.json", &single_task_workflow("leaf"));
    lp.fwlp().args(["add"]).arg(&wf).assert().success();

    lp.fwlp().args(["delete-wflows", "1"]).assert().success();

    lp.fwlp().args(["get-wflows", "--display", "count"]).assert().success().stdout("0\n");
}

#[test]
fn reset_wipes_the_launchpad_file() {
    let lp = Lpad::new();
    let wf = lp.workflow_file("wf.json", &single_task_workflow("leaf"));
    lp.fwlp().args(["add"]).arg(&wf).assert().success();
    assert!(Path::new(&lp.wal_path()).exists());

    lp.fwlp().args(["reset", "--yes"]).assert().success();
    assert!(!lp.wal_path().exists());

    lp.fwlp().args(["get-fws", "--display", "count"]).assert().success().stdout("0\n");
}

#[test]
fn external_bridge_commands_are_recognized_but_refuse_to_run() {
    let lp = Lpad::new();
    lp.fwlp().args(["webgui"]).assert().code(2);
    lp.fwlp().args(["report"]).assert().code(2);
}

#[test]
fn unlock_a_workflow_with_no_held_lock_is_a_no_op() {
    let lp = Lpad::new();
    let wf = lp.workflow_file("wf.json", &single_task_workflow("leaf"));
    lp.fwlp().args(["add"]).arg(&wf).assert().success();

    lp.fwlp().args(["unlock", "1"]).assert().success();
}

#[test]
fn pause_wflows_skips_ineligible_members_instead_of_aborting() {
    let lp = Lpad::new();
    let wf = lp.workflow_file(
        "wf.json",
        r#"{"tasks":[{"name":"a","spec":{}},{"name":"b","spec":{}},{"name":"c","spec":{}}],"links":{"0":[1],"1":[2]},"name":"chain","metadata":{}}"#,
    );
    lp.fwlp().args(["add"]).arg(&wf).assert().success();

    // Defusing the middle task puts the workflow in a mixed-state shape:
    // fw 1 is READY, fw 2 is DEFUSED (ineligible for pause), fw 3 is WAITING.
    lp.fwlp().args(["defuse-fws", "2"]).assert().success();

    lp.fwlp().args(["pause-wflows", "1"]).assert().success();

    lp.fwlp()
        .args(["get-fws", "--fw-id", "1", "--state", "PAUSED", "--display", "count"])
        .assert()
        .success()
        .stdout("1\n");
    lp.fwlp()
        .args(["get-fws", "--fw-id", "2", "--state", "DEFUSED", "--display", "count"])
        .assert()
        .success()
        .stdout("1\n");
    lp.fwlp()
        .args(["get-fws", "--fw-id", "3", "--state", "PAUSED", "--display", "count"])
        .assert()
        .success()
        .stdout("1\n");
}

#[test]
fn get_wflows_filters_and_displays_the_aggregate_workflow_state() {
    let lp = Lpad::new();
    let wf = lp.workflow_file(
        "wf.json",
        r#"{"tasks":[{"name":"a","spec":{}},{"name":"b","spec":{}}],"links":{"0":[1]},"name":"chain","metadata":{}}"#,
    );
    lp.fwlp().args(["add"]).arg(&wf).assert().success();

    // The root (fw 1) stays READY, but its child (fw 2) is defused, which
    // outranks READY in the aggregate precedence order — get-wflows must
    // report/filter on that aggregate, not the root task's own state.
    lp.fwlp().args(["defuse-fws", "2"]).assert().success();

    lp.fwlp()
        .args(["get-wflows", "--fw-id", "1", "--state", "DEFUSED", "--display", "count"])
        .assert()
        .success()
        .stdout("1\n");
    lp.fwlp()
        .args(["get-wflows", "--fw-id", "1", "--state", "READY", "--display", "count"])
        .assert()
        .success()
        .stdout("0\n");
    lp.fwlp()
        .args(["get-wflows", "--fw-id", "1", "--display", "more"])
        .assert()
        .success()
        .stdout(predicates::str::contains("state: DEFUSED"));
}
