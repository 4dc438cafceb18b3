// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! fwrs-storage: the durable, event-sourced store behind the Launchpad —
//! write-ahead log, materialized state, periodic snapshots, and id
//! allocation.

pub mod error;
pub mod event;
pub mod snapshot;
pub mod state;
pub mod store;
pub mod wal;

pub use error::{StoreError, WalError};
pub use event::Event;
pub use snapshot::Snapshot;
pub use state::{MaterializedState, WorkflowLock};
pub use store::{Transaction, WalStore};
pub use wal::{Wal, WalEntry};
