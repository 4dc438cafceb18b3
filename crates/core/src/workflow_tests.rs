// SPDX-License-Identifier: MIT

use super::*;
use crate::state::FwState;
use serde_json::json;

#[test]
fn draft_detects_cycle() {
    let mut draft = WorkflowDraft::single("a", Map::new());
    draft.tasks.push(TaskDraft { name: "b".into(), spec: Map::new() });
    draft.links.insert(0, vec![1]);
    draft.links.insert(1, vec![0]);
    assert!(!draft.is_acyclic());
}

#[test]
fn draft_linear_chain_is_acyclic() {
    let mut draft = WorkflowDraft::single("a", Map::new());
    draft.tasks.push(TaskDraft { name: "b".into(), spec: Map::new() });
    draft.tasks.push(TaskDraft { name: "c".into(), spec: Map::new() });
    draft.links.insert(0, vec![1]);
    draft.links.insert(1, vec![2]);
    assert!(draft.is_acyclic());
}

#[test]
fn add_link_keeps_parent_index_in_sync() {
    let mut wf = Workflow::new("wf", Map::new(), 0);
    wf.add_node(TaskId::new(1), FwState::Waiting);
    wf.add_node(TaskId::new(2), FwState::Waiting);
    wf.add_link(TaskId::new(1), TaskId::new(2));

    assert_eq!(wf.parents_of(TaskId::new(2)).collect::<Vec<_>>(), vec![TaskId::new(1)]);
    assert_eq!(wf.children_of(TaskId::new(1)).collect::<Vec<_>>(), vec![TaskId::new(2)]);
}

#[test]
fn workflow_rejects_cycles() {
    let mut wf = Workflow::new("wf", Map::new(), 0);
    wf.add_node(TaskId::new(1), FwState::Waiting);
    wf.add_node(TaskId::new(2), FwState::Waiting);
    wf.add_link(TaskId::new(1), TaskId::new(2));
    wf.add_link(TaskId::new(2), TaskId::new(1));
    assert!(!wf.is_acyclic());
}

#[test]
fn refresh_aggregate_state_uses_precedence() {
    let mut wf = Workflow::new("wf", Map::new(), 0);
    wf.add_node(TaskId::new(1), FwState::Completed);
    wf.add_node(TaskId::new(2), FwState::Running);
    wf.refresh_aggregate_state();
    assert_eq!(wf.state, FwState::Running);
}

#[test]
fn descendants_within_respects_depth() {
    let mut wf = Workflow::new("wf", Map::new(), 0);
    for i in 1..=4 {
        wf.add_node(TaskId::new(i), FwState::Waiting);
    }
    wf.add_link(TaskId::new(1), TaskId::new(2));
    wf.add_link(TaskId::new(2), TaskId::new(3));
    wf.add_link(TaskId::new(3), TaskId::new(4));

    assert_eq!(wf.descendants_within(TaskId::new(1), 1), vec![TaskId::new(2)]);
    assert_eq!(
        wf.descendants_within(TaskId::new(1), 2),
        vec![TaskId::new(2), TaskId::new(3)]
    );
    assert_eq!(
        wf.descendants_within(TaskId::new(1), 10),
        vec![TaskId::new(2), TaskId::new(3), TaskId::new(4)]
    );
}

#[test]
fn metadata_round_trips_through_json() {
    let mut wf = Workflow::new("wf", Map::new(), 0);
    wf.metadata.insert("owner".into(), json!("me"));
    let encoded = serde_json::to_string(&wf).unwrap();
    let decoded: Workflow = serde_json::from_str(&encoded).unwrap();
    assert_eq!(decoded.metadata.get("owner"), Some(&json!("me")));
}
