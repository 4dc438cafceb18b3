// SPDX-License-Identifier: MIT

//! The durable store: WAL-backed [`MaterializedState`] behind a single
//! mutex, so every mutation the Launchpad makes is either a single
//! atomic find-and-modify or scoped to one [`Store::transact`]
//! call.
//!
//! Startup recovery follows the same shape as a conventional event-sourced
//! daemon: load the newest snapshot if one exists, then replay WAL entries
//! after the snapshot's `wal_seq`.

use crate::error::StoreError;
use crate::event::Event;
use crate::state::MaterializedState;
use crate::snapshot;
use crate::wal::Wal;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};

/// Rewrite the snapshot (and truncate the WAL behind it) after this many
/// applied events, bounding how much log a cold start has to replay.
const SNAPSHOT_EVERY: usize = 2_000;

struct Inner {
    wal: Wal,
    state: MaterializedState,
    events_since_snapshot: usize,
}

/// A scope in which reads and writes against the state are all applied
/// before the transaction's events are appended to the WAL — the unit of
/// atomicity the Launchpad composes its operations from.
pub struct Transaction<'a> {
    state: &'a mut MaterializedState,
    pending: Vec<Event>,
}

impl<'a> Transaction<'a> {
    pub fn state(&self) -> &MaterializedState {
        self.state
    }

    pub fn state_mut(&mut self) -> &mut MaterializedState {
        self.state
    }

    /// Apply `event` to the in-memory projection immediately (so later
    /// reads in the same transaction see it) and queue it for the WAL.
    pub fn emit(&mut self, event: Event) {
        self.state.apply_event(&event);
        self.pending.push(event);
    }
}

pub struct WalStore {
    inner: Mutex<Inner>,
    snapshot_path: Option<PathBuf>,
}

impl WalStore {
    /// Open (or create) a store rooted at `wal_path`, with an optional
    /// snapshot file to accelerate recovery.
    pub fn open(wal_path: impl AsRef<Path>, snapshot_path: Option<PathBuf>) -> Result<Self, StoreError> {
        let (mut state, processed_seq) = match snapshot_path.as_deref().map(snapshot::read).transpose()? {
            Some(Some(snap)) => (snap.state, snap.wal_seq),
            _ => (MaterializedState::default(), 0),
        };

        let mut wal = Wal::open(wal_path, processed_seq)?;
        while let Some(entry) = wal.next_unprocessed()? {
            state.apply_event(&entry.event);
            wal.mark_processed(entry.seq);
        }
        wal.flush()?;

        Ok(Self { inner: Mutex::new(Inner { wal, state, events_since_snapshot: 0 }), snapshot_path })
    }

    /// Run `f` against the live state under the store's lock, then durably
    /// append every event `f` emitted. `f`'s return value passes through.
    pub fn transact<R>(&self, f: impl FnOnce(&mut Transaction) -> R) -> Result<R, StoreError> {
        let mut inner = self.inner.lock();
        let mut txn = Transaction { state: &mut inner.state, pending: Vec::new() };
        let result = f(&mut txn);
        let pending = txn.pending;

        for event in &pending {
            inner.wal.append(event)?;
        }
        if inner.wal.needs_flush() {
            inner.wal.flush()?;
        }
        inner.events_since_snapshot += pending.len();

        if inner.events_since_snapshot >= SNAPSHOT_EVERY {
            self.snapshot_locked(&mut inner)?;
        }
        Ok(result)
    }

    /// Read-only access to the current state, for queries that don't need
    /// to mutate anything (`get_fws`, `get_wflows`, etc).
    pub fn read<R>(&self, f: impl FnOnce(&MaterializedState) -> R) -> R {
        f(&self.inner.lock().state)
    }

    pub fn snapshot_now(&self) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        self.snapshot_locked(&mut inner)
    }

    fn snapshot_locked(&self, inner: &mut Inner) -> Result<(), StoreError> {
        let Some(path) = self.snapshot_path.as_deref() else {
            return Ok(());
        };
        inner.wal.flush()?;
        let wal_seq = inner.wal.write_seq();
        snapshot::write(path, &inner.state, wal_seq)?;
        inner.wal.mark_processed(wal_seq);
        inner.wal.truncate_before(wal_seq + 1)?;
        inner.events_since_snapshot = 0;
        Ok(())
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
