// SPDX-License-Identifier: MIT

//! Integer identifiers for tasks and launches.
//!
//! Unlike the ambient-entity identifiers elsewhere in this workspace
//! (worker names, decision ids), task-ids and launch-ids are spec-mandated
//! to be positive, monotonically increasing integers allocated by the
//! identifier service (see `fwrs_storage::ids`). `define_int_id!` gives
//! each a small newtype so they can't be swapped for one another at the
//! type level.

/// Define a `Copy` newtype wrapper around `u64` with `Display`, ordering,
/// and serde support. Used for [`TaskId`] and [`LaunchId`].
#[macro_export]
macro_rules! define_int_id {
    (
        $(#[$meta:meta])*
        pub struct $name:ident;
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
            serde::Serialize, serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            pub const fn new(id: u64) -> Self {
                Self(id)
            }

            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(v: u64) -> Self {
                Self(v)
            }
        }

        impl From<$name> for u64 {
            fn from(v: $name) -> u64 {
                v.0
            }
        }
    };
}

crate::define_int_id! {
    /// Unique, process-wide identifier for a task ("firework").
    pub struct TaskId;
}

crate::define_int_id! {
    /// Unique identifier for a single launch (one attempt at a task).
    pub struct LaunchId;
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
