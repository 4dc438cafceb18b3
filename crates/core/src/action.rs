// SPDX-License-Identifier: MIT

//! The result a task hands back to the Launchpad: data to persist,
//! spec mutations for children, and DAG surgery (additions/detours).

use crate::error::SpecPatchError;
use crate::workflow::WorkflowDraft;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One structured patch applied to a child's spec. `path`
/// is a dotted key path (`"a.b.c"`); intermediate maps are created as
/// needed for `Set`/`Push`/`PushAll`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ModSpecOp {
    Set { path: String, value: Value },
    Push { path: String, value: Value },
    PushAll { path: String, values: Vec<Value> },
    Pull { path: String, value: Value },
    Inc { path: String, by: i64 },
}

impl ModSpecOp {
    pub fn path(&self) -> &str {
        match self {
            ModSpecOp::Set { path, .. }
            | ModSpecOp::Push { path, .. }
            | ModSpecOp::PushAll { path, .. }
            | ModSpecOp::Pull { path, .. }
            | ModSpecOp::Inc { path, .. } => path,
        }
    }
}

/// The action returned from a task's completed run. All
/// fields are optional; the empty action is a no-op.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Action {
    #[serde(default)]
    pub stored_data: Map<String, Value>,
    #[serde(default)]
    pub exit: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_spec: Option<Map<String, Value>>,
    #[serde(default)]
    pub mod_spec: Vec<ModSpecOp>,
    #[serde(default)]
    pub additions: Vec<WorkflowDraft>,
    #[serde(default)]
    pub detours: Vec<WorkflowDraft>,
    #[serde(default)]
    pub defuse_children: bool,
    #[serde(default)]
    pub defuse_workflow: bool,
}

impl Action {
    /// Action name for log spans.
    pub fn name(&self) -> &'static str {
        if self.defuse_workflow {
            "defuse_workflow"
        } else if self.defuse_children {
            "defuse_children"
        } else if self.exit {
            "exit"
        } else if !self.detours.is_empty() {
            "detour"
        } else if !self.additions.is_empty() {
            "addition"
        } else if self.update_spec.is_some() || !self.mod_spec.is_empty() {
            "update_spec"
        } else {
            "noop"
        }
    }

    pub fn is_noop(&self) -> bool {
        self.stored_data.is_empty()
            && !self.exit
            && self.update_spec.is_none()
            && self.mod_spec.is_empty()
            && self.additions.is_empty()
            && self.detours.is_empty()
            && !self.defuse_children
            && !self.defuse_workflow
    }
}

/// Apply `update_spec` (a shallow merge) followed by `mod_spec` (ordered
/// structured patches) to a child's spec, in that order.
pub fn apply_to_child_spec(
    spec: &mut Map<String, Value>,
    update_spec: Option<&Map<String, Value>>,
    mod_spec: &[ModSpecOp],
) -> Result<(), SpecPatchError> {
    if let Some(update) = update_spec {
        for (k, v) in update {
            spec.insert(k.clone(), v.clone());
        }
    }
    for op in mod_spec {
        apply_mod_spec_op(spec, op)?;
    }
    Ok(())
}

fn apply_mod_spec_op(spec: &mut Map<String, Value>, op: &ModSpecOp) -> Result<(), SpecPatchError> {
    let segments: Vec<&str> = op.path().split('.').collect();
    let (last, parents) = segments.split_last().ok_or_else(|| SpecPatchError::EmptyPath)?;

    let mut cursor = spec;
    for seg in parents {
        cursor = cursor
            .entry(seg.to_string())
            .or_insert_with(|| Value::Object(Map::new()))
            .as_object_mut()
            .ok_or_else(|| SpecPatchError::NotAnObject { path: op.path().to_string() })?;
    }

    match op {
        ModSpecOp::Set { value, .. } => {
            cursor.insert(last.to_string(), value.clone());
        }
        ModSpecOp::Push { value, .. } => {
            push_values(cursor, last, std::slice::from_ref(value))?;
        }
        ModSpecOp::PushAll { values, .. } => {
            push_values(cursor, last, values)?;
        }
        ModSpecOp::Pull { value, .. } => {
            let arr = cursor
                .entry(last.to_string())
                .or_insert_with(|| Value::Array(Vec::new()))
                .as_array_mut()
                .ok_or_else(|| SpecPatchError::NotAnArray { path: op.path().to_string() })?;
            arr.retain(|v| v != value);
        }
        ModSpecOp::Inc { by, .. } => {
            let current = cursor.get(last.to_owned()).and_then(Value::as_i64).unwrap_or(0);
            cursor.insert(last.to_string(), Value::from(current + by));
        }
    }
    Ok(())
}

fn push_values(cursor: &mut Map<String, Value>, key: &str, values: &[Value]) -> Result<(), SpecPatchError> {
    let arr = cursor
        .entry(key.to_string())
        .or_insert_with(|| Value::Array(Vec::new()))
        .as_array_mut()
        .ok_or_else(|| SpecPatchError::NotAnArray { path: key.to_string() })?;
    arr.extend(values.iter().cloned());
    Ok(())
}

#[cfg(test)]
#[path = "action_tests.rs"]
mod tests;
