// SPDX-License-Identifier: MIT

//! The workflow DAG: task membership, forward/reverse links, and the
//! denormalized aggregate/per-task state used for cheap queries.

use crate::id::TaskId;
use crate::state::{aggregate_state, FwState};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeSet, HashMap, VecDeque};

/// A task not yet assigned a `TaskId` — the shape a workflow arrives in
/// from `add_workflow`, or that an action's `additions`/`detours` carry.
/// `links` refer to other tasks by position in `tasks`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkflowDraft {
    pub tasks: Vec<TaskDraft>,
    /// parent index -> child indices, both into `tasks`.
    pub links: HashMap<usize, Vec<usize>>,
    pub name: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskDraft {
    pub name: String,
    pub spec: Map<String, Value>,
}

impl WorkflowDraft {
    pub fn single(name: impl Into<String>, spec: Map<String, Value>) -> Self {
        let name = name.into();
        Self {
            tasks: vec![TaskDraft { name: name.clone(), spec }],
            links: HashMap::new(),
            name,
            metadata: Map::new(),
        }
    }

    /// Whether `links` (indices into `tasks`) forms an acyclic graph.
    pub fn is_acyclic(&self) -> bool {
        let n = self.tasks.len();
        let mut indegree = vec![0usize; n];
        for children in self.links.values() {
            for &c in children {
                if c < n {
                    indegree[c] += 1;
                }
            }
        }
        let mut queue: VecDeque<usize> =
            (0..n).filter(|&i| indegree[i] == 0).collect();
        let mut visited = 0;
        while let Some(i) = queue.pop_front() {
            visited += 1;
            if let Some(children) = self.links.get(&i) {
                for &c in children {
                    if c >= n {
                        continue;
                    }
                    indegree[c] -= 1;
                    if indegree[c] == 0 {
                        queue.push_back(c);
                    }
                }
            }
        }
        visited == n
    }
}

/// The DAG wrapper: parent->child links, per-task state, metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    pub nodes: BTreeSet<TaskId>,
    pub links: HashMap<TaskId, BTreeSet<TaskId>>,
    /// Cached reverse index of `links`, kept in sync by [`Workflow::add_link`]
    /// and [`Workflow::add_node`].
    pub parent_links: HashMap<TaskId, BTreeSet<TaskId>>,
    pub metadata: Map<String, Value>,
    pub name: String,
    pub created_on: u64,
    pub updated_on: u64,
    pub state: FwState,
    pub fw_states: HashMap<TaskId, FwState>,
}

impl Workflow {
    pub fn new(name: impl Into<String>, metadata: Map<String, Value>, now_ms: u64) -> Self {
        Self {
            nodes: BTreeSet::new(),
            links: HashMap::new(),
            parent_links: HashMap::new(),
            metadata,
            name: name.into(),
            created_on: now_ms,
            updated_on: now_ms,
            state: FwState::Completed,
            fw_states: HashMap::new(),
        }
    }

    pub fn add_node(&mut self, id: TaskId, state: FwState) {
        self.nodes.insert(id);
        self.links.entry(id).or_default();
        self.parent_links.entry(id).or_default();
        self.fw_states.insert(id, state);
    }

    pub fn add_link(&mut self, parent: TaskId, child: TaskId) {
        self.links.entry(parent).or_default().insert(child);
        self.parent_links.entry(child).or_default().insert(parent);
    }

    pub fn parents_of(&self, id: TaskId) -> impl Iterator<Item = TaskId> + '_ {
        self.parent_links.get(&id).into_iter().flatten().copied()
    }

    pub fn children_of(&self, id: TaskId) -> impl Iterator<Item = TaskId> + '_ {
        self.links.get(&id).into_iter().flatten().copied()
    }

    /// Whether the forward link graph restricted to `nodes` is acyclic.
    pub fn is_acyclic(&self) -> bool {
        let mut indegree: HashMap<TaskId, usize> = self.nodes.iter().map(|&n| (n, 0)).collect();
        for children in self.links.values() {
            for c in children {
                if let Some(d) = indegree.get_mut(c) {
                    *d += 1;
                }
            }
        }
        let mut queue: VecDeque<TaskId> =
            indegree.iter().filter(|(_, &d)| d == 0).map(|(&n, _)| n).collect();
        let mut visited = 0;
        while let Some(n) = queue.pop_front() {
            visited += 1;
            for c in self.children_of(n) {
                if let Some(d) = indegree.get_mut(&c) {
                    *d -= 1;
                    if *d == 0 {
                        queue.push_back(c);
                    }
                }
            }
        }
        visited == self.nodes.len()
    }

    /// Recompute the denormalized aggregate `state` from `fw_states`.
    pub fn refresh_aggregate_state(&mut self) {
        self.state = aggregate_state(self.fw_states.values().copied());
    }

    /// Breadth-first descendants of `id`, at most `max_depth` hops away
    /// (depth 1 = direct children). Used by `get_wflows`'s tree display.
    pub fn descendants_within(&self, id: TaskId, max_depth: usize) -> Vec<TaskId> {
        let mut out = Vec::new();
        let mut frontier = vec![id];
        for _ in 0..max_depth {
            let mut next = Vec::new();
            for n in frontier {
                for c in self.children_of(n) {
                    if !out.contains(&c) {
                        out.push(c);
                        next.push(c);
                    }
                }
            }
            if next.is_empty() {
                break;
            }
            frontier = next;
        }
        out
    }
}

#[cfg(test)]
#[path = "workflow_tests.rs"]
mod tests;
