// SPDX-License-Identifier: MIT

//! The Launchpad: the only component permitted to write task, launch,
//! or workflow state. Every mutating entry point here is
//! either a lock-free atomic transaction against the store (checkout,
//! ping, single-record admin edits) or scoped by
//! [`Launchpad::with_workflow_lock`] for anything that touches more than
//! one record of a workflow.

use crate::config::LaunchpadConfig;
use crate::error::LaunchpadError;
use fwrs_core::{
    parents_resolved, Action, Clock, FWorker, FwState, LaunchId, LaunchState, SystemClock, Task,
    TaskId, WorkflowDraft,
};
use fwrs_storage::{Event, Transaction, WalStore};
use std::collections::HashSet;
use std::sync::Arc;

/// Result of one [`Launchpad::detect_lost_runs`] pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LostRunsReport {
    /// Tasks whose launch was declared lost (fizzled or re-queued).
    pub swept: Vec<TaskId>,
    /// Tasks whose `state` disagreed with their tail launch's state and
    /// was re-derived from it.
    pub refreshed: Vec<TaskId>,
}

/// Result of one [`Launchpad::maintain`] pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaintenanceReport {
    pub unreserved_swept: Vec<TaskId>,
    pub lost_runs: LostRunsReport,
}

/// The mediator between worker processes and the durable store.
///
/// Cheap to clone (an `Arc<WalStore>` plus a small config struct); share
/// one instance across worker threads/processes the way Rapidfire's
/// multi-process mode shares the same Launchpad identity.
pub struct Launchpad<C: Clock = SystemClock> {
    store: Arc<WalStore>,
    clock: C,
    config: LaunchpadConfig,
}

impl<C: Clock> Clone for Launchpad<C> {
    fn clone(&self) -> Self {
        Self { store: Arc::clone(&self.store), clock: self.clock.clone(), config: self.config.clone() }
    }
}

impl<C: Clock> Launchpad<C> {
    pub fn new(store: Arc<WalStore>, clock: C, config: LaunchpadConfig) -> Self {
        Self { store, clock, config }
    }

    pub fn store(&self) -> &WalStore {
        &self.store
    }

    pub fn config(&self) -> &LaunchpadConfig {
        &self.config
    }

    fn now_ms(&self) -> u64 {
        self.clock.epoch_ms()
    }

    /// Run `f` inside one atomic store transaction, with no workflow lock.
    /// For operations that touch at most one record, or whose atomicity
    /// is already guaranteed by the store's single mutex.
    fn transact<R>(&self, f: impl FnOnce(&mut Transaction) -> Result<R, LaunchpadError>) -> Result<R, LaunchpadError> {
        self.store.transact(f).map_err(LaunchpadError::from)?
    }

    /// Acquire `root`'s advisory lock, run `f`, then release it — all
    /// within a single store transaction, so the guaranteed-cleanup
    /// scope is structural rather than relying on unwind safety. A lock
    /// held by another caller that hasn't yet expired surfaces as the
    /// retryable [`LaunchpadError::Locked`].
    fn with_workflow_lock<R>(
        &self,
        root: TaskId,
        f: impl FnOnce(&mut Transaction) -> Result<R, LaunchpadError>,
    ) -> Result<R, LaunchpadError> {
        let holder = format!("pid{}-{}", std::process::id(), uuid::Uuid::new_v4());
        let now = self.now_ms();
        let ttl_ms = self.config.lock_ttl_secs.saturating_mul(1000);

        self.transact(move |txn| {
            if let Some(lock) = txn.state().locks.get(&root.get()) {
                if lock.holder != holder && lock.expires_ms > now {
                    return Err(LaunchpadError::Locked(root.get()));
                }
            }
            txn.emit(Event::LockAcquired {
                root_task_id: root,
                holder: holder.clone(),
                acquired_ms: now,
                expires_ms: now + ttl_ms,
            });
            let result = f(txn);
            txn.emit(Event::LockReleased { root_task_id: root });
            result
        })
    }

    /// Forcibly break whatever lock is held on `root`, regardless of
    /// holder or expiry — the manual variant of the sweeper breaking an
    /// expired lock.
    pub fn unlock(&self, root: TaskId) -> Result<(), LaunchpadError> {
        self.transact(|txn| {
            txn.emit(Event::LockReleased { root_task_id: root });
            Ok(())
        })
    }

    fn workflow_root(&self, task_id: TaskId) -> Result<TaskId, LaunchpadError> {
        self.store.read(|s| s.workflow_root_of(task_id)).ok_or(LaunchpadError::TaskNotFound(task_id.get()))
    }

    /// Persist a new workflow. Assigns task-ids in draft order (the
    /// first task becomes the workflow's root) and initializes every
    /// task's state by evaluating the parents-resolved predicate.
    pub fn add_workflow(&self, draft: WorkflowDraft) -> Result<TaskId, LaunchpadError> {
        if draft.tasks.is_empty() {
            return Err(LaunchpadError::EmptyDraft);
        }
        if !draft.is_acyclic() {
            return Err(LaunchpadError::Cyclic);
        }
        for (&parent, children) in &draft.links {
            if parent >= draft.tasks.len() {
                return Err(LaunchpadError::DanglingLink(parent));
            }
            for &c in children {
                if c >= draft.tasks.len() {
                    return Err(LaunchpadError::DanglingLink(c));
                }
            }
        }

        let now = self.now_ms();
        self.transact(move |txn| {
            let ids: Vec<TaskId> = draft.tasks.iter().map(|_| txn.state_mut().allocate_task_id()).collect();
            let root = ids[0];

            txn.emit(Event::WorkflowCreated {
                root_task_id: root,
                name: draft.name.clone(),
                metadata: draft.metadata.clone(),
                created_on: now,
            });
            for (i, t) in draft.tasks.iter().enumerate() {
                txn.emit(Event::TaskCreated {
                    task_id: ids[i],
                    workflow_root: root,
                    name: t.name.clone(),
                    spec: t.spec.clone(),
                    created_on: now,
                });
            }
            for (&p, children) in &draft.links {
                for &c in children {
                    txn.emit(Event::LinkAdded { workflow_root: root, parent: ids[p], child: ids[c] });
                }
            }
            for &id in &ids {
                reevaluate_readiness(txn, root, id);
            }

            tracing::info!(root = root.get(), tasks = ids.len(), "workflow added");
            Ok(root)
        })
    }

    /// Atomically pick one eligible `READY` task for `worker` and mark it
    /// `RESERVED` or `RUNNING`, creating a new launch. `launch_dir` is the directory the caller (typically
    /// the Rocket) has already chosen for this attempt; ignored when
    /// resuming an existing reservation.
    ///
    /// Eligibility and ordering: matches `worker.category`/`worker.query`;
    /// priority-desc, then task-id-asc tie-break. Safe
    /// under concurrent callers because the whole pick-and-mark step runs
    /// inside one store transaction as a single compare-and-swap.
    pub fn checkout(
        &self,
        worker: &FWorker,
        reserve: bool,
        launch_dir: impl Into<String>,
    ) -> Result<Option<(Task, LaunchId)>, LaunchpadError> {
        let now = self.now_ms();
        let launch_dir = launch_dir.into();

        self.transact(move |txn| {
            if !reserve {
                if let Some((task_id, launch_id)) = find_resumable_reservation(txn.state(), worker) {
                    txn.emit(Event::LaunchStateChanged { launch_id, state: LaunchState::Running, timestamp_ms: now });
                    txn.emit(Event::TaskStateChanged { task_id, state: FwState::Running });
                    let task = txn
                        .state()
                        .get_task(task_id)
                        .cloned()
                        .ok_or(LaunchpadError::TaskNotFound(task_id.get()))?;
                    tracing::info!(task_id = task_id.get(), launch_id = launch_id.get(), "checkout resumed reservation");
                    return Ok(Some((task, launch_id)));
                }
            }

            let Some(task_id) = pick_ready_task(txn.state(), worker) else {
                return Ok(None);
            };
            let launch_id = txn.state_mut().allocate_launch_id();
            let launch_state = if reserve { LaunchState::Reserved } else { LaunchState::Running };
            txn.emit(Event::LaunchCreated {
                launch_id,
                task_id,
                fworker: worker.clone(),
                launch_dir,
                state: launch_state,
                timestamp_ms: now,
            });
            txn.emit(Event::TaskStateChanged { task_id, state: launch_state.as_fw_state() });

            let task = txn.state().get_task(task_id).cloned().ok_or(LaunchpadError::TaskNotFound(task_id.get()))?;
            tracing::info!(task_id = task_id.get(), launch_id = launch_id.get(), reserve, "checkout");
            Ok(Some((task, launch_id)))
        })
    }

    /// Finalize a launch with the action it produced: writes the launch's terminal state and action,
    /// updates the task state, applies the action (§4.4), re-evaluates
    /// descendants, and refreshes the workflow's aggregate state (the
    /// last two happen automatically as a consequence of the
    /// `TaskStateChanged` events this emits, via
    /// [`fwrs_storage::MaterializedState::apply_event`]).
    ///
    /// Idempotent: completing an already-finished launch a second time
    /// with the same `launch_id` is a no-op.
    pub fn complete(&self, launch_id: LaunchId, action: Action, final_state: FwState) -> Result<(), LaunchpadError> {
        if !matches!(final_state, FwState::Completed | FwState::Fizzled) {
            return Err(LaunchpadError::InvalidTransition {
                task_id: 0,
                action: "complete",
                state: final_state.to_string(),
            });
        }

        let task_id = self
            .store
            .read(|s| s.get_launch(launch_id).map(|l| l.task_id))
            .ok_or(LaunchpadError::LaunchNotFound(launch_id.get()))?;
        let root = self.workflow_root(task_id)?;
        let now = self.now_ms();

        self.with_workflow_lock(root, move |txn| {
            let already_done = txn.state().get_launch(launch_id).map(|l| l.time_end_ms.is_some()).unwrap_or(false);
            if already_done {
                return Ok(());
            }

            let task = txn.state().get_task(task_id).cloned().ok_or(LaunchpadError::TaskNotFound(task_id.get()))?;
            if task.state != FwState::Running {
                return Err(LaunchpadError::NotRunnable { launch_id: launch_id.get(), state: task.state.to_string() });
            }

            let launch_state =
                if final_state == FwState::Completed { LaunchState::Completed } else { LaunchState::Fizzled };
            txn.emit(Event::LaunchFinished {
                launch_id,
                state: launch_state,
                action: Some(action.clone()),
                timestamp_ms: now,
            });
            txn.emit(Event::TaskStateChanged { task_id, state: final_state });
            apply_action(txn, root, task_id, &action, now);

            tracing::info!(
                task_id = task_id.get(),
                launch_id = launch_id.get(),
                final_state = %final_state,
                action = action.name(),
                "launch completed"
            );
            Ok(())
        })
    }

    /// Liveness heartbeat.
    pub fn ping(&self, launch_id: LaunchId, checkpoint: Option<serde_json::Value>) -> Result<(), LaunchpadError> {
        let now = self.now_ms();
        self.transact(move |txn| {
            if txn.state().get_launch(launch_id).is_none() {
                return Err(LaunchpadError::LaunchNotFound(launch_id.get()));
            }
            txn.emit(Event::LaunchPinged { launch_id, timestamp_ms: now, checkpoint });
            Ok(())
        })
    }

    /// Overwrite `_priority` on a task.
    /// Single-record, so no workflow lock is needed.
    pub fn set_priority(&self, task_id: TaskId, priority: i64) -> Result<(), LaunchpadError> {
        let mut update = serde_json::Map::new();
        update.insert(fwrs_core::task::spec_keys::PRIORITY.to_string(), serde_json::Value::from(priority));
        self.transact(move |txn| {
            if txn.state().get_task(task_id).is_none() {
                return Err(LaunchpadError::TaskNotFound(task_id.get()));
            }
            txn.emit(Event::TaskSpecPatched { task_id, update_spec: Some(update), mod_spec: Vec::new() });
            Ok(())
        })
    }

    /// Patch a task's own spec directly.
    pub fn update_spec(
        &self,
        task_id: TaskId,
        update_spec: Option<serde_json::Map<String, serde_json::Value>>,
        mod_spec: Vec<fwrs_core::ModSpecOp>,
    ) -> Result<(), LaunchpadError> {
        self.transact(move |txn| {
            if txn.state().get_task(task_id).is_none() {
                return Err(LaunchpadError::TaskNotFound(task_id.get()));
            }
            txn.emit(Event::TaskSpecPatched { task_id, update_spec, mod_spec });
            Ok(())
        })
    }

    /// Administratively disable a task; its children lose a resolved
    /// parent and fall back to `WAITING` if they were `READY` only
    /// because of it.
    pub fn defuse_task(&self, task_id: TaskId) -> Result<(), LaunchpadError> {
        let root = self.workflow_root(task_id)?;
        self.with_workflow_lock(root, move |txn| {
            let state = txn.state().get_task(task_id).map(|t| t.state).ok_or(LaunchpadError::TaskNotFound(task_id.get()))?;
            if state.is_terminal() {
                return Err(LaunchpadError::InvalidTransition { task_id: task_id.get(), action: "defuse", state: state.to_string() });
            }
            defuse_one(txn, root, task_id);
            Ok(())
        })
    }

    /// Administratively hold a task; only valid
    /// from `WAITING`/`READY`.
    pub fn pause_task(&self, task_id: TaskId) -> Result<(), LaunchpadError> {
        let root = self.workflow_root(task_id)?;
        self.with_workflow_lock(root, move |txn| {
            let state = txn.state().get_task(task_id).map(|t| t.state).ok_or(LaunchpadError::TaskNotFound(task_id.get()))?;
            if !matches!(state, FwState::Waiting | FwState::Ready) {
                return Err(LaunchpadError::InvalidTransition { task_id: task_id.get(), action: "pause", state: state.to_string() });
            }
            txn.emit(Event::TaskStateChanged { task_id, state: FwState::Paused });
            Ok(())
        })
    }

    /// Re-enable a `DEFUSED` task; re-resolves
    /// parents so it may land directly on `READY`.
    pub fn reignite_task(&self, task_id: TaskId) -> Result<(), LaunchpadError> {
        self.un_hold(task_id, FwState::Defused, "reignite")
    }

    /// Un-pause a `PAUSED` task.
    pub fn resume_task(&self, task_id: TaskId) -> Result<(), LaunchpadError> {
        self.un_hold(task_id, FwState::Paused, "resume")
    }

    fn un_hold(&self, task_id: TaskId, from: FwState, action: &'static str) -> Result<(), LaunchpadError> {
        let root = self.workflow_root(task_id)?;
        self.with_workflow_lock(root, move |txn| {
            let state = txn.state().get_task(task_id).map(|t| t.state).ok_or(LaunchpadError::TaskNotFound(task_id.get()))?;
            if state != from {
                return Err(LaunchpadError::InvalidTransition { task_id: task_id.get(), action, state: state.to_string() });
            }
            txn.emit(Event::TaskStateChanged { task_id, state: FwState::Waiting });
            reevaluate_readiness(txn, root, task_id);
            Ok(())
        })
    }

    /// Move a `COMPLETED`/`FIZZLED` task back to `WAITING`, archiving its
    /// existing launches.
    pub fn rerun_task(&self, task_id: TaskId) -> Result<(), LaunchpadError> {
        let root = self.workflow_root(task_id)?;
        self.with_workflow_lock(root, move |txn| {
            let state = txn.state().get_task(task_id).map(|t| t.state).ok_or(LaunchpadError::TaskNotFound(task_id.get()))?;
            if !matches!(state, FwState::Completed | FwState::Fizzled) {
                return Err(LaunchpadError::InvalidTransition { task_id: task_id.get(), action: "rerun", state: state.to_string() });
            }
            archive_launches_and_rewait(txn, root, task_id);
            Ok(())
        })
    }

    /// Defuse every task in a workflow.
    /// With `defuse_all_states`, even `COMPLETED`/`FIZZLED` tasks are
    /// defused; default is `false`.
    pub fn defuse_workflow(&self, root: TaskId, defuse_all_states: bool) -> Result<(), LaunchpadError> {
        self.with_workflow_lock(root, move |txn| {
            let nodes = workflow_nodes(txn, root)?;
            for id in nodes {
                let state = txn.state().get_task(id).map(|t| t.state);
                let Some(state) = state else { continue };
                if state == FwState::Defused || (!defuse_all_states && state.is_terminal()) {
                    continue;
                }
                txn.emit(Event::TaskStateChanged { task_id: id, state: FwState::Defused });
                for child in children_of_vec(txn, root, id) {
                    reevaluate_readiness(txn, root, child);
                }
            }
            Ok(())
        })
    }

    /// Soft-delete an entire workflow: every
    /// member task moves to `ARCHIVED`, the precedence ceiling.
    pub fn archive_workflow(&self, root: TaskId) -> Result<(), LaunchpadError> {
        self.with_workflow_lock(root, move |txn| {
            let nodes = workflow_nodes(txn, root)?;
            for id in nodes {
                txn.emit(Event::TaskStateChanged { task_id: id, state: FwState::Archived });
            }
            Ok(())
        })
    }

    /// Permanently remove every task, launch, and the workflow record
    /// itself. Irreversible.
    pub fn delete_workflow(&self, root: TaskId) -> Result<(), LaunchpadError> {
        self.with_workflow_lock(root, move |txn| {
            let task_ids = workflow_nodes(txn, root)?;
            let launch_ids: Vec<LaunchId> = task_ids
                .iter()
                .filter_map(|id| txn.state().get_task(*id))
                .flat_map(|t| t.launches.iter().chain(t.archived_launches.iter()).copied())
                .collect();
            txn.emit(Event::WorkflowDeleted { root_task_id: root, task_ids, launch_ids });
            Ok(())
        })
    }

    /// Sweep launches stuck in `RESERVED` longer than `expiration_secs`:
    /// archive the stuck launch and move the task back to `READY` (or,
    /// with `rerun`, all the way back through `WAITING`).
    pub fn detect_unreserved(&self, expiration_secs: u64, rerun: bool) -> Result<Vec<TaskId>, LaunchpadError> {
        let now = self.now_ms();
        let cutoff_ms = expiration_secs.saturating_mul(1000);

        self.transact(move |txn| {
            let stuck: Vec<(TaskId, LaunchId)> = txn
                .state()
                .launches
                .values()
                .filter(|l| l.state == LaunchState::Reserved)
                .filter_map(|l| {
                    let since = l.state_history.last().map(|h| h.timestamp_ms).unwrap_or(0);
                    (now.saturating_sub(since) >= cutoff_ms).then_some((l.task_id, l.launch_id))
                })
                .collect();

            let mut swept = Vec::new();
            for (task_id, launch_id) in stuck {
                txn.emit(Event::LaunchFinished { launch_id, state: LaunchState::Fizzled, action: None, timestamp_ms: now });
                txn.emit(Event::TaskLaunchArchived { task_id, launch_id });
                if rerun {
                    if let Some(root) = txn.state().workflow_root_of(task_id) {
                        archive_launches_and_rewait(txn, root, task_id);
                    }
                } else {
                    txn.emit(Event::TaskStateChanged { task_id, state: FwState::Ready });
                }
                swept.push(task_id);
            }
            if !swept.is_empty() {
                tracing::info!(count = swept.len(), rerun, "swept stuck reservations");
            }
            Ok(swept)
        })
    }

    /// Sweep launches whose last heartbeat is older than
    /// `expiration_secs`: fizzle (or, with `rerun`, re-queue) the task.
    /// With `refresh_inconsistent`, also re-derive any task's state from
    /// its tail launch's state when the two disagree.
    pub fn detect_lost_runs(
        &self,
        expiration_secs: u64,
        rerun: bool,
        refresh_inconsistent: bool,
    ) -> Result<LostRunsReport, LaunchpadError> {
        let now = self.now_ms();
        let cutoff_ms = expiration_secs.saturating_mul(1000);

        self.transact(move |txn| {
            let lost: Vec<TaskId> = txn
                .state()
                .launches
                .values()
                .filter(|l| l.state == LaunchState::Running)
                .filter_map(|l| {
                    let last_seen = l.last_pinged_ms.or(l.time_start_ms).unwrap_or(0);
                    (now.saturating_sub(last_seen) >= cutoff_ms).then_some(l.task_id)
                })
                .collect();

            let mut swept = Vec::new();
            for task_id in lost {
                let Some(launch_id) = txn.state().get_task(task_id).and_then(|t| t.current_launch_id()) else {
                    continue;
                };
                txn.emit(Event::LaunchFinished { launch_id, state: LaunchState::Fizzled, action: None, timestamp_ms: now });
                if rerun {
                    if let Some(root) = txn.state().workflow_root_of(task_id) {
                        archive_launches_and_rewait(txn, root, task_id);
                    }
                } else {
                    txn.emit(Event::TaskStateChanged { task_id, state: FwState::Fizzled });
                }
                swept.push(task_id);
            }
            if !swept.is_empty() {
                tracing::warn!(count = swept.len(), rerun, "swept lost runs");
            }

            let refreshed = if refresh_inconsistent { refresh_inconsistent_tasks(txn) } else { Vec::new() };

            Ok(LostRunsReport { swept, refreshed })
        })
    }

    /// Re-derive any task's state from its tail launch's state where
    /// they disagree, with no expiration filter.
    pub fn refresh(&self) -> Result<Vec<TaskId>, LaunchpadError> {
        self.transact(|txn| Ok(refresh_inconsistent_tasks(txn)))
    }

    /// One maintenance pass: sweep stuck reservations and lost runs
    /// (refreshing inconsistent state along the way), then snapshot the
    /// store so a restart replays less WAL.
    /// A caller drives this on `interval`; this method does one pass.
    pub fn maintain(&self) -> Result<MaintenanceReport, LaunchpadError> {
        let unreserved_swept = self.detect_unreserved(self.config.reservation_expiration_secs, false)?;
        let lost_runs = self.detect_lost_runs(self.config.run_expiration_secs, false, true)?;
        self.tuneup()?;
        Ok(MaintenanceReport { unreserved_swept, lost_runs })
    }

    /// Rebuild indexes / compact storage. This
    /// store has no secondary indexes to rebuild, so it's just an
    /// explicit snapshot-and-truncate.
    pub fn tuneup(&self) -> Result<(), LaunchpadError> {
        self.store.snapshot_now().map_err(LaunchpadError::from)
    }

    /// Whether `worker` currently has any checkout-eligible work: a
    /// `READY` task it matches, or a `RESERVED` reservation of its own to
    /// resume.
    pub fn run_exists(&self, worker: &FWorker) -> bool {
        self.store.read(|s| {
            find_resumable_reservation(s, worker).is_some() || pick_ready_task(s, worker).is_some()
        })
    }
}

fn workflow_nodes(txn: &Transaction, root: TaskId) -> Result<Vec<TaskId>, LaunchpadError> {
    txn.state()
        .workflows
        .get(&root.get())
        .map(|wf| wf.nodes.iter().copied().collect())
        .ok_or(LaunchpadError::WorkflowNotFound(root.get()))
}

fn children_of_vec(txn: &Transaction, root: TaskId, task_id: TaskId) -> Vec<TaskId> {
    txn.state().workflows.get(&root.get()).map(|wf| wf.children_of(task_id).collect()).unwrap_or_default()
}

fn pick_ready_task(state: &fwrs_storage::MaterializedState, worker: &FWorker) -> Option<TaskId> {
    state
        .tasks
        .values()
        .filter(|t| t.state == FwState::Ready && worker.matches(t.category(), &t.spec))
        .max_by(|a, b| a.priority().cmp(&b.priority()).then(b.task_id.cmp(&a.task_id)))
        .map(|t| t.task_id)
}

fn find_resumable_reservation(state: &fwrs_storage::MaterializedState, worker: &FWorker) -> Option<(TaskId, LaunchId)> {
    state.tasks.values().filter(|t| t.state == FwState::Reserved).find_map(|t| {
        let launch_id = t.current_launch_id()?;
        let launch = state.get_launch(launch_id)?;
        (launch.fworker.name == worker.name).then_some((t.task_id, launch_id))
    })
}

/// Recompute whether `task_id` should be `WAITING` or `READY` given its
/// parents' current states, emitting a `TaskStateChanged` only if that
/// differs from its current state. A no-op for tasks in any other state.
fn reevaluate_readiness(txn: &mut Transaction, root: TaskId, task_id: TaskId) {
    let new_state = {
        let state = txn.state();
        let Some(task) = state.get_task(task_id) else { return };
        if !matches!(task.state, FwState::Waiting | FwState::Ready) {
            return;
        }
        let allow = task.allow_fizzled_parents();
        let Some(wf) = state.workflows.get(&root.get()) else { return };
        let parent_states: Vec<FwState> = wf.parents_of(task_id).filter_map(|p| wf.fw_states.get(&p).copied()).collect();
        let ready = parents_resolved(parent_states, allow);
        let computed = if ready { FwState::Ready } else { FwState::Waiting };
        if computed == task.state {
            return;
        }
        computed
    };
    txn.emit(Event::TaskStateChanged { task_id, state: new_state });
}

/// Move a non-terminal task to `DEFUSED` and re-evaluate its direct
/// children (who just lost a resolved parent).
fn defuse_one(txn: &mut Transaction, root: TaskId, task_id: TaskId) {
    let state = txn.state().get_task(task_id).map(|t| t.state);
    if matches!(state, Some(s) if !s.is_terminal() && s != FwState::Defused) {
        txn.emit(Event::TaskStateChanged { task_id, state: FwState::Defused });
    }
    for child in children_of_vec(txn, root, task_id) {
        reevaluate_readiness(txn, root, child);
    }
}

/// Defuse every (transitive) descendant of `task_id`, not `task_id`
/// itself — used by the action field `exit`.
fn defuse_descendants(txn: &mut Transaction, root: TaskId, task_id: TaskId) {
    let mut frontier = children_of_vec(txn, root, task_id);
    let mut seen = HashSet::new();
    while let Some(id) = frontier.pop() {
        if !seen.insert(id) {
            continue;
        }
        let grandchildren = children_of_vec(txn, root, id);
        defuse_one(txn, root, id);
        frontier.extend(grandchildren);
    }
}

/// Archive every launch currently attributed to `task_id`, move it back
/// to `WAITING`, and re-evaluate readiness — the shared tail of `rerun`,
/// `detect_unreserved --rerun`, and `detect_lost_runs --rerun`.
fn archive_launches_and_rewait(txn: &mut Transaction, root: TaskId, task_id: TaskId) {
    let launches: Vec<LaunchId> = txn.state().get_task(task_id).map(|t| t.launches.clone()).unwrap_or_default();
    for launch_id in launches {
        txn.emit(Event::TaskLaunchArchived { task_id, launch_id });
    }
    txn.emit(Event::TaskStateChanged { task_id, state: FwState::Waiting });
    reevaluate_readiness(txn, root, task_id);
}

fn refresh_inconsistent_tasks(txn: &mut Transaction) -> Vec<TaskId> {
    let mismatched: Vec<(TaskId, FwState)> = txn
        .state()
        .tasks
        .values()
        .filter(|t| matches!(t.state, FwState::Reserved | FwState::Running))
        .filter_map(|t| {
            let tail = t.current_launch_id()?;
            let launch = txn.state().get_launch(tail)?;
            let expected = launch.state.as_fw_state();
            (expected != t.state).then_some((t.task_id, expected))
        })
        .collect();

    for (task_id, expected) in &mismatched {
        txn.emit(Event::TaskStateChanged { task_id: *task_id, state: *expected });
    }
    mismatched.into_iter().map(|(id, _)| id).collect()
}

/// Allocate ids for every task in `draft`, create them, and wire up its
/// internal links. Returns `(entries, leaves)`: task-ids with no
/// internal parent, and task-ids with no internal child, in draft order
/// — the attachment points for `additions`/`detours`.
fn create_and_link_draft(txn: &mut Transaction, root: TaskId, draft: &WorkflowDraft, now: u64) -> (Vec<TaskId>, Vec<TaskId>) {
    let ids: Vec<TaskId> = draft.tasks.iter().map(|_| txn.state_mut().allocate_task_id()).collect();
    for (i, t) in draft.tasks.iter().enumerate() {
        txn.emit(Event::TaskCreated {
            task_id: ids[i],
            workflow_root: root,
            name: t.name.clone(),
            spec: t.spec.clone(),
            created_on: now,
        });
    }
    for (&p, children) in &draft.links {
        for &c in children {
            if p < ids.len() && c < ids.len() {
                txn.emit(Event::LinkAdded { workflow_root: root, parent: ids[p], child: ids[c] });
            }
        }
    }

    let has_parent: HashSet<usize> = draft.links.values().flatten().copied().collect();
    let has_child: HashSet<usize> = draft.links.iter().filter(|(_, c)| !c.is_empty()).map(|(&p, _)| p).collect();
    let entries = (0..ids.len()).filter(|i| !has_parent.contains(i)).map(|i| ids[i]).collect();
    let leaves = (0..ids.len()).filter(|i| !has_child.contains(i)).map(|i| ids[i]).collect();
    (entries, leaves)
}

/// Apply a completed task's returned action: DAG surgery
/// first (additions, then detours), then spec patches to the resulting
/// direct children, then the defuse variants. `update_spec` and
/// `mod_spec` are applied to children in that order, evaluated
/// *after* dynamicity has finished inserting new ones.
fn apply_action(txn: &mut Transaction, root: TaskId, task_id: TaskId, action: &Action, now: u64) {
    let original_children = children_of_vec(txn, root, task_id);

    for draft in &action.additions {
        let (entries, _leaves) = create_and_link_draft(txn, root, draft, now);
        for &entry in &entries {
            txn.emit(Event::LinkAdded { workflow_root: root, parent: task_id, child: entry });
        }
        for &entry in &entries {
            reevaluate_readiness(txn, root, entry);
        }
    }

    for draft in &action.detours {
        let (entries, leaves) = create_and_link_draft(txn, root, draft, now);
        for &entry in &entries {
            txn.emit(Event::LinkAdded { workflow_root: root, parent: task_id, child: entry });
        }
        for &leaf in &leaves {
            for &child in &original_children {
                txn.emit(Event::LinkAdded { workflow_root: root, parent: leaf, child });
            }
        }
        for &entry in &entries {
            reevaluate_readiness(txn, root, entry);
        }
        for &child in &original_children {
            reevaluate_readiness(txn, root, child);
        }
    }

    if action.update_spec.is_some() || !action.mod_spec.is_empty() {
        for child in children_of_vec(txn, root, task_id) {
            txn.emit(Event::TaskSpecPatched {
                task_id: child,
                update_spec: action.update_spec.clone(),
                mod_spec: action.mod_spec.clone(),
            });
        }
    }

    if action.defuse_children {
        for &child in &original_children {
            defuse_one(txn, root, child);
        }
    }

    if action.exit {
        defuse_descendants(txn, root, task_id);
    }

    if action.defuse_workflow {
        if let Ok(nodes) = workflow_nodes(txn, root) {
            for id in nodes {
                defuse_one(txn, root, id);
            }
        }
    }
}

#[cfg(test)]
#[path = "launchpad_tests.rs"]
mod tests;
