// SPDX-License-Identifier: MIT

use super::*;
use serde_json::json;

#[test]
fn empty_action_is_noop() {
    assert!(Action::default().is_noop());
    assert_eq!(Action::default().name(), "noop");
}

#[test]
fn defuse_workflow_takes_priority_in_name() {
    let action = Action { defuse_workflow: true, defuse_children: true, ..Action::default() };
    assert_eq!(action.name(), "defuse_workflow");
}

#[test]
fn update_spec_merges_shallow() {
    let mut spec = Map::new();
    spec.insert("a".into(), json!(1));
    let mut update = Map::new();
    update.insert("a".into(), json!(2));
    update.insert("b".into(), json!("x"));

    apply_to_child_spec(&mut spec, Some(&update), &[]).unwrap();
    assert_eq!(spec.get("a"), Some(&json!(2)));
    assert_eq!(spec.get("b"), Some(&json!("x")));
}

#[test]
fn mod_spec_set_creates_nested_path() {
    let mut spec = Map::new();
    let ops = vec![ModSpecOp::Set { path: "a.b.c".into(), value: json!(42) }];
    apply_to_child_spec(&mut spec, None, &ops).unwrap();
    assert_eq!(spec["a"]["b"]["c"], json!(42));
}

#[test]
fn mod_spec_push_and_push_all_append() {
    let mut spec = Map::new();
    let ops = vec![
        ModSpecOp::Push { path: "tags".into(), value: json!("x") },
        ModSpecOp::PushAll { path: "tags".into(), values: vec![json!("y"), json!("z")] },
    ];
    apply_to_child_spec(&mut spec, None, &ops).unwrap();
    assert_eq!(spec["tags"], json!(["x", "y", "z"]));
}

#[test]
fn mod_spec_pull_removes_matching_values() {
    let mut spec = Map::new();
    spec.insert("tags".into(), json!(["x", "y", "x"]));
    let ops = vec![ModSpecOp::Pull { path: "tags".into(), value: json!("x") }];
    apply_to_child_spec(&mut spec, None, &ops).unwrap();
    assert_eq!(spec["tags"], json!(["y"]));
}

#[test]
fn mod_spec_inc_defaults_missing_counter_to_zero() {
    let mut spec = Map::new();
    let ops = vec![ModSpecOp::Inc { path: "count".into(), by: 3 }];
    apply_to_child_spec(&mut spec, None, &ops).unwrap();
    assert_eq!(spec["count"], json!(3));

    apply_to_child_spec(&mut spec, None, &ops).unwrap();
    assert_eq!(spec["count"], json!(6));
}

#[test]
fn mod_spec_applies_after_update_spec_in_order() {
    let mut spec = Map::new();
    let mut update = Map::new();
    update.insert("count".into(), json!(10));
    let ops = vec![ModSpecOp::Inc { path: "count".into(), by: 1 }];

    apply_to_child_spec(&mut spec, Some(&update), &ops).unwrap();
    assert_eq!(spec["count"], json!(11));
}

#[test]
fn mod_spec_rejects_path_through_non_object() {
    let mut spec = Map::new();
    spec.insert("a".into(), json!(5));
    let ops = vec![ModSpecOp::Set { path: "a.b".into(), value: json!(1) }];
    assert!(apply_to_child_spec(&mut spec, None, &ops).is_err());
}
