// SPDX-License-Identifier: MIT

//! Worker identity used for checkout eligibility matching.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Identity a worker process presents when checking out tasks.
///
/// `category` and `query` narrow the candidate set before priority
/// ordering: a task whose `_category` spec key
/// doesn't match `category` (when set) is never offered to this worker,
/// and `query` is matched as a flat subset-of-spec predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FWorker {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub query: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub env: HashMap<String, String>,
}

impl FWorker {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), category: None, query: Default::default(), env: HashMap::new() }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Whether this worker is eligible to check out a task with the given
    /// `_category` spec value and full spec map (for `query` matching).
    pub fn matches(&self, task_category: Option<&str>, spec: &serde_json::Map<String, serde_json::Value>) -> bool {
        if let Some(want) = &self.category {
            if task_category != Some(want.as_str()) {
                return false;
            }
        }
        self.query.iter().all(|(k, v)| spec.get(k) == Some(v))
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
