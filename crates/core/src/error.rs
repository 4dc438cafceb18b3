// SPDX-License-Identifier: MIT

//! Error types shared by the data-model crate.

use thiserror::Error;

/// Failures applying a [`crate::action::ModSpecOp`] to a child's spec.
#[derive(Debug, Error, PartialEq)]
pub enum SpecPatchError {
    #[error("mod_spec path is empty")]
    EmptyPath,
    #[error("path {path} traverses a non-object value")]
    NotAnObject { path: String },
    #[error("path {path} does not point to an array")]
    NotAnArray { path: String },
}

/// Failures building or validating a [`crate::workflow::Workflow`].
#[derive(Debug, Error, PartialEq)]
pub enum WorkflowError {
    #[error("workflow contains a cycle")]
    Cyclic,
    #[error("link references task at index {0}, which does not exist in the draft")]
    DanglingLink(usize),
    #[error("workflow has no tasks")]
    Empty,
}
