// SPDX-License-Identifier: MIT

//! Lazy task access for large-workflow traversal.
//!
//! Attribute-watching proxies that fault in fields on first access are
//! common in dynamic languages; Rust has no `__getattr__`, so the same
//! idea is an explicit two-state enum: a [`LazyTask`] is either
//! already [`LazyTask::Loaded`], or a [`LazyTask::Handle`] holding only
//! the `task_id` until [`LazyTask::resolve`] is called against a
//! [`TaskSource`].

use crate::id::TaskId;
use crate::task::Task;

/// Backing store a [`LazyTask`] resolves itself against. Implemented by
/// the storage crate's task repository; kept here so `fwrs-core` stays
/// free of any storage dependency.
pub trait TaskSource {
    type Error;

    fn load_task(&self, task_id: TaskId) -> Result<Task, Self::Error>;
}

/// A task that may or may not have been fetched yet.
#[derive(Debug, Clone)]
pub enum LazyTask {
    Loaded(Task),
    Handle(TaskId),
}

impl LazyTask {
    pub fn handle(task_id: TaskId) -> Self {
        LazyTask::Handle(task_id)
    }

    /// Reading `task_id` never triggers a fetch, loaded or not.
    pub fn task_id(&self) -> TaskId {
        match self {
            LazyTask::Loaded(task) => task.task_id,
            LazyTask::Handle(id) => *id,
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, LazyTask::Loaded(_))
    }

    /// Fetch the task document if not already loaded, turning this into
    /// `Loaded` in place, then return a reference to it.
    pub fn resolve<S: TaskSource>(&mut self, source: &S) -> Result<&Task, S::Error> {
        if let LazyTask::Handle(id) = self {
            let task = source.load_task(*id)?;
            *self = LazyTask::Loaded(task);
        }
        match self {
            LazyTask::Loaded(task) => Ok(task),
            LazyTask::Handle(_) => unreachable!("resolved above"),
        }
    }

    /// Consume into the owned [`Task`], fetching it first if necessary.
    pub fn into_task<S: TaskSource>(mut self, source: &S) -> Result<Task, S::Error> {
        self.resolve(source)?;
        match self {
            LazyTask::Loaded(task) => Ok(task),
            LazyTask::Handle(_) => unreachable!("resolved above"),
        }
    }
}

#[cfg(test)]
#[path = "lazy_tests.rs"]
mod tests;
