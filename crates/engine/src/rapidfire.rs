// SPDX-License-Identifier: MIT

//! The Rapidfire driver: repeatedly runs a [`Rocket`] until the store
//! runs dry for this worker. Single-process mode is a
//! plain loop; multi-process mode runs `np` independent copies of that
//! loop, coordinating only through the shared store — "there is no
//! inter-process messaging".

use crate::launchpad::Launchpad;
use crate::registry::TaskRegistry;
use crate::rocket::{block_format_now, Rocket, RocketOutcome};
use fwrs_core::{Clock, FWorker};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// `n_launches` sentinel meaning "run forever".
pub const INFINITE: i64 = -1;
/// `n_launches` sentinel meaning "run until the store has no more ready
/// work for this worker."
pub const UNTIL_EMPTY: i64 = 0;

/// Small inter-iteration sleep even while tasks are available, so the
/// store gets breathing room between checkouts, ported from
/// `rocket_launcher.py`'s `time.sleep(0.15)`.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(150);
/// Default sleep between outer loops once a pass finds nothing ready.
pub const DEFAULT_SLEEP_TIME: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct RapidfireConfig {
    /// 0 = until the store is empty for this worker, -1 = forever,
    /// otherwise stop after this many tasks have run.
    pub n_launches: i64,
    /// Maximum number of outer "sleep and recheck" loops; `-1` = unbounded.
    pub max_loops: i64,
    /// Sleep between outer loops when a pass found nothing ready.
    pub sleep_time: Duration,
    /// Sleep between iterations within one pass, even when a task ran.
    pub poll_interval: Duration,
}

impl Default for RapidfireConfig {
    fn default() -> Self {
        Self {
            n_launches: UNTIL_EMPTY,
            max_loops: INFINITE,
            sleep_time: DEFAULT_SLEEP_TIME,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Summary of one [`Rapidfire::run_single`] (or one thread's share of a
/// [`Rapidfire::run_multi`]) invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RapidfireReport {
    pub num_launched: u64,
    pub num_loops: u64,
}

/// Drives repeated [`Rocket::run_once_into`] calls for one worker
/// identity. Cheap to clone — a clone shares the same Launchpad and the
/// same dispatched-task-id bookkeeping set, which is how
/// [`Rapidfire::run_multi`] fans a single logical worker out across
/// threads.
#[derive(Clone)]
pub struct Rapidfire<C: Clock> {
    rocket: Rocket<C>,
    worker: FWorker,
    base_dir: PathBuf,
    config: RapidfireConfig,
    /// Task-ids this Rapidfire has dispatched, shared by every thread a
    /// [`Rapidfire::run_multi`] spawns from the same instance. Checkout itself is
    /// already a store-level compare-and-swap and never hands the same
    /// task to two callers; this set is the additional bookkeeping the
    /// spec calls for on top of that guarantee.
    dispatched: Arc<Mutex<HashSet<u64>>>,
}

impl<C: Clock + 'static> Rapidfire<C> {
    pub fn new(
        launchpad: Launchpad<C>,
        registry: TaskRegistry,
        worker: FWorker,
        base_dir: impl Into<PathBuf>,
        config: RapidfireConfig,
    ) -> Self {
        let base_dir = base_dir.into();
        let rocket = Rocket::new(launchpad, registry, base_dir.clone());
        Self { rocket, worker, base_dir, config, dispatched: Arc::new(Mutex::new(HashSet::new())) }
    }

    /// Task-ids dispatched so far by any thread sharing this instance's
    /// bookkeeping set.
    pub fn dispatched_task_ids(&self) -> HashSet<u64> {
        self.dispatched.lock().clone()
    }

    /// Single-process loop: keep launching rockets for `self.worker`
    /// until the store has no more eligible work, then sleep
    /// `sleep_time` and recheck, up to `max_loops` outer iterations.
    pub async fn run_single(&self) -> RapidfireReport {
        let mut num_launched: u64 = 0;
        let mut num_loops: u64 = 0;

        loop {
            while self.rocket.launchpad().run_exists(&self.worker) {
                let iter_dir = self.base_dir.join(format!("launcher_{}", block_format_now()));
                if std::fs::create_dir_all(&iter_dir).is_err() {
                    tracing::error!(dir = %iter_dir.display(), "rapidfire: could not create launcher directory");
                    break;
                }

                match self.rocket.run_once_into(&self.worker, &iter_dir).await {
                    Ok(RocketOutcome::Ran { task_id, final_state, .. }) => {
                        self.dispatched.lock().insert(task_id);
                        num_launched += 1;
                        tracing::info!(task_id, %final_state, num_launched, "rapidfire: rocket ran");
                    }
                    Ok(RocketOutcome::Empty) => {
                        tracing::debug!("rapidfire: rocket did not run");
                        remove_if_empty(&iter_dir);
                    }
                    Err(error) => {
                        tracing::error!(%error, "rapidfire: rocket errored");
                        remove_if_empty(&iter_dir);
                    }
                }

                if self.config.n_launches != UNTIL_EMPTY && num_launched as i64 == self.config.n_launches {
                    return RapidfireReport { num_launched, num_loops };
                }
                tokio::time::sleep(self.config.poll_interval).await;
            }

            if self.config.n_launches == UNTIL_EMPTY || num_launched as i64 == self.config.n_launches {
                break;
            }

            tracing::info!(secs = self.config.sleep_time.as_secs(), "rapidfire: sleeping between loops");
            tokio::time::sleep(self.config.sleep_time).await;
            num_loops += 1;
            if self.config.max_loops != INFINITE && num_loops as i64 >= self.config.max_loops {
                break;
            }
        }

        RapidfireReport { num_launched, num_loops }
    }

    /// Multi-process mode: `np` independent single-process
    /// loops, coordinated only through the shared store. Implemented as
    /// `np` OS threads rather than re-exec'd processes — from the store's
    /// perspective the two are indistinguishable, since coordination
    /// never happens in-process.
    pub fn run_multi(&self, np: usize) -> Vec<RapidfireReport>
    where
        C: 'static,
    {
        let handles: Vec<Option<std::thread::JoinHandle<RapidfireReport>>> = (0..np)
            .map(|i| {
                let this = self.clone();
                let spawned = std::thread::Builder::new().name(format!("rapidfire-{i}")).spawn(move || {
                    match tokio::runtime::Builder::new_current_thread().enable_all().build() {
                        Ok(rt) => rt.block_on(this.run_single()),
                        Err(error) => {
                            tracing::error!(%error, "rapidfire: could not build worker-thread runtime");
                            RapidfireReport::default()
                        }
                    }
                });
                match spawned {
                    Ok(handle) => Some(handle),
                    Err(error) => {
                        tracing::error!(%error, "rapidfire: could not spawn worker thread");
                        None
                    }
                }
            })
            .collect();

        handles.into_iter().map(|h| h.and_then(|h| h.join().ok()).unwrap_or_default()).collect()
    }
}

fn remove_if_empty(dir: &std::path::Path) {
    if let Ok(mut entries) = std::fs::read_dir(dir) {
        if entries.next().is_none() {
            let _ = std::fs::remove_dir(dir);
        }
    }
}

#[cfg(test)]
#[path = "rapidfire_tests.rs"]
mod tests;
