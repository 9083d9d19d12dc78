//! Single-owner coordinator that turns session events into view state.
//!
//! One tokio task owns [`ViewState`]. Repository work runs in a
//! [`JoinSet`] and reports back as a [`Completion`], so every state change
//! happens on the owner task, one at a time.

use mockable::Clock;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::{self, JoinError, JoinHandle, JoinSet};
use tracing::{debug, error, info, warn};

use super::{
    debounce::Debouncer,
    event::SessionEvent,
    state::{SyncStatus, ViewState, visible_tasks},
};
use crate::config::{ErrorListPolicy, SessionConfig};
use crate::task::{
    domain::{ResourceStream, Task, TaskId, first_outcome},
    ports::{LocalTaskStore, RemoteTaskService},
    services::{LOAD_FAILED_MESSAGE, TaskMutationService, TaskQueryService, TaskSyncService},
};

/// Message shown when a background job fails unexpectedly.
pub const UNEXPECTED_ERROR_MESSAGE: &str = "Something went wrong";

const SYNC_FAILED_MESSAGE: &str = "Sync failed";

/// Errors reported by a [`SessionHandle`].
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum SessionError {
    /// The session loop is no longer running.
    #[error("task session is closed")]
    Closed,
    /// The session loop panicked.
    #[error("task session loop panicked")]
    Panicked,
}

/// Explicitly scoped view-state owner for one task screen.
pub struct TaskSession<L, R, C>
where
    L: LocalTaskStore,
    R: RemoteTaskService,
    C: Clock + Send + Sync,
{
    local: Arc<L>,
    remote: Arc<R>,
    clock: Arc<C>,
    config: SessionConfig,
}

impl<L, R, C> TaskSession<L, R, C>
where
    L: LocalTaskStore + 'static,
    R: RemoteTaskService + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Creates a session over the given adapters.
    #[must_use]
    pub const fn new(local: Arc<L>, remote: Arc<R>, clock: Arc<C>, config: SessionConfig) -> Self {
        Self {
            local,
            remote,
            clock,
            config,
        }
    }

    /// Spawns the owner loop on the current tokio runtime.
    ///
    /// The loop starts the debounced search with an empty query and runs
    /// an initial sync. It stops when the returned handle is shut down or
    /// dropped.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    #[must_use]
    pub fn start(self) -> SessionHandle {
        let (events_tx, events_rx) = mpsc::channel(self.config.event_buffer.max(1));
        let (state_tx, state_rx) = watch::channel(ViewState::default());
        let worker = SessionWorker::new(self, state_tx);
        let task = tokio::spawn(worker.run(events_rx));
        SessionHandle {
            events: events_tx,
            state: state_rx,
            task,
        }
    }
}

/// Handle to a running [`TaskSession`].
#[derive(Debug)]
pub struct SessionHandle {
    events: mpsc::Sender<SessionEvent>,
    state: watch::Receiver<ViewState>,
    task: JoinHandle<()>,
}

impl SessionHandle {
    /// Submits an event, waiting for channel capacity.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Closed`] when the session has stopped.
    pub async fn send(&self, event: SessionEvent) -> Result<(), SessionError> {
        self.events
            .send(event)
            .await
            .map_err(|_| SessionError::Closed)
    }

    /// Returns a receiver that observes every published state.
    #[must_use]
    pub fn state(&self) -> watch::Receiver<ViewState> {
        self.state.clone()
    }

    /// Returns the most recently published state.
    #[must_use]
    pub fn current(&self) -> ViewState {
        self.state.borrow().clone()
    }

    /// Stops the session and waits for the owner loop to finish.
    ///
    /// In-flight repository work is aborted.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Panicked`] if the owner loop panicked.
    pub async fn shutdown(self) -> Result<(), SessionError> {
        let Self { events, task, .. } = self;
        drop(events);
        task.await.map_err(|err| {
            if err.is_panic() {
                SessionError::Panicked
            } else {
                SessionError::Closed
            }
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JobKind {
    Mutation,
    Load,
    Sync,
    Banner,
}

#[derive(Debug)]
enum Completion {
    Mutation(Option<Result<TaskId, String>>),
    Loaded {
        generation: u64,
        outcome: Option<Result<Vec<Task>, String>>,
    },
    Synced(Option<Result<(), String>>),
    BannerElapsed(u64),
}

struct SessionWorker<L, R, C>
where
    L: LocalTaskStore,
    R: RemoteTaskService,
    C: Clock + Send + Sync,
{
    mutations: TaskMutationService<L, R, C>,
    sync: TaskSyncService<L, R, C>,
    query: TaskQueryService<L>,
    config: SessionConfig,
    state: ViewState,
    publisher: watch::Sender<ViewState>,
    applied_query: String,
    debouncer: Debouncer<String>,
    jobs: JoinSet<Completion>,
    job_kinds: HashMap<task::Id, JobKind>,
    pending_mutations: usize,
    load_generation: u64,
    awaiting_load: bool,
    sync_after_load: bool,
    sync_in_flight: bool,
    sync_requested: bool,
    banner_generation: u64,
}

impl<L, R, C> SessionWorker<L, R, C>
where
    L: LocalTaskStore + 'static,
    R: RemoteTaskService + 'static,
    C: Clock + Send + Sync + 'static,
{
    fn new(session: TaskSession<L, R, C>, publisher: watch::Sender<ViewState>) -> Self {
        let TaskSession {
            local,
            remote,
            clock,
            config,
        } = session;
        Self {
            mutations: TaskMutationService::new(
                Arc::clone(&local),
                Arc::clone(&remote),
                Arc::clone(&clock),
            ),
            sync: TaskSyncService::new(Arc::clone(&local), remote, clock),
            query: TaskQueryService::new(local),
            debouncer: Debouncer::new(config.search_debounce),
            config,
            state: ViewState::default(),
            publisher,
            applied_query: String::new(),
            jobs: JoinSet::new(),
            job_kinds: HashMap::new(),
            pending_mutations: 0,
            load_generation: 0,
            awaiting_load: false,
            sync_after_load: false,
            sync_in_flight: false,
            sync_requested: false,
            banner_generation: 0,
        }
    }

    async fn run(mut self, mut events: mpsc::Receiver<SessionEvent>) {
        self.debouncer.push(String::new());
        self.start_sync();

        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => self.handle_event(event),
                    None => break,
                },
                Some(joined) = self.jobs.join_next_with_id() => match joined {
                    Ok((id, completion)) => {
                        self.job_kinds.remove(&id);
                        self.handle_completion(completion);
                    }
                    Err(err) => self.job_failed(&err),
                },
                query = self.debouncer.ready() => self.apply_query(query),
            }
        }
        debug!("task session stopped");
    }

    fn handle_event(&mut self, event: SessionEvent) {
        debug!(?event, "session event");
        match event {
            SessionEvent::SearchQueryChanged(query) => {
                self.state.search_query.clone_from(&query);
                self.publish();
                self.debouncer.push(query);
            }
            SessionEvent::StatusFilterChanged(filter) => {
                self.state.status_filter = filter;
                self.refresh_visible();
                self.publish();
                if self.state.search_query.trim().is_empty() {
                    self.start_load();
                } else {
                    self.debouncer.push(self.state.search_query.clone());
                }
            }
            SessionEvent::SortOrderChanged(order) => {
                self.state.sort_order = order;
                self.refresh_visible();
                self.publish();
            }
            SessionEvent::AddTask(task) => {
                let stream = self.mutations.add(task);
                self.start_mutation(stream);
            }
            SessionEvent::EditTask(task) => {
                let stream = self.mutations.edit(task);
                self.start_mutation(stream);
            }
            SessionEvent::DeleteTask(task) => {
                let stream = self.mutations.remove(task);
                self.start_mutation(stream);
            }
            SessionEvent::CycleStatus(task) => {
                let stream = self.mutations.edit(task.cycled());
                self.start_mutation(stream);
            }
            SessionEvent::Reload => self.start_load(),
            SessionEvent::SyncNow => self.start_sync(),
            SessionEvent::DismissSyncStatus => {
                if self.state.sync_status != SyncStatus::Syncing {
                    self.banner_generation += 1;
                    self.state.sync_status = SyncStatus::None;
                    self.state.error_message = None;
                    self.publish();
                }
            }
        }
    }

    fn handle_completion(&mut self, completion: Completion) {
        match completion {
            Completion::Mutation(outcome) => self.finish_mutation(outcome),
            Completion::Loaded {
                generation,
                outcome,
            } => self.finish_load(generation, outcome),
            Completion::Synced(outcome) => self.finish_sync(outcome),
            Completion::BannerElapsed(generation) => {
                if generation == self.banner_generation
                    && self.state.sync_status == SyncStatus::Success
                {
                    self.state.sync_status = SyncStatus::None;
                }
                self.start_load();
            }
        }
    }

    fn apply_query(&mut self, query: String) {
        debug!(query = %query, "applying debounced search");
        if query.trim().is_empty() {
            self.state.tasks.clear();
            self.publish();
        }
        self.applied_query = query;
        self.start_load();
    }

    fn start_mutation(&mut self, stream: ResourceStream<TaskId>) {
        self.pending_mutations += 1;
        self.update_loading();
        self.publish();
        self.spawn(JobKind::Mutation, async move {
            Completion::Mutation(first_outcome(stream).await)
        });
    }

    fn finish_mutation(&mut self, outcome: Option<Result<TaskId, String>>) {
        self.pending_mutations = self.pending_mutations.saturating_sub(1);
        match outcome {
            Some(Ok(id)) => {
                debug!(task_id = %id, "mutation applied");
                self.sync_after_load |= self.config.sync_after_mutation;
            }
            Some(Err(message)) => self.fail(message),
            None => {
                error!("mutation ended without an outcome");
                self.fail(UNEXPECTED_ERROR_MESSAGE.to_owned());
            }
        }
        self.start_load();
    }

    fn start_load(&mut self) {
        self.load_generation += 1;
        self.awaiting_load = true;
        self.update_loading();
        self.publish();

        let generation = self.load_generation;
        let stream = self.query.observe_all();
        self.spawn(JobKind::Load, async move {
            Completion::Loaded {
                generation,
                outcome: first_outcome(stream).await,
            }
        });
    }

    fn finish_load(&mut self, generation: u64, outcome: Option<Result<Vec<Task>, String>>) {
        if generation != self.load_generation {
            debug!(generation, current = self.load_generation, "ignoring stale load");
            return;
        }
        self.awaiting_load = false;
        match outcome {
            Some(Ok(tasks)) => {
                self.state.all_tasks = tasks;
                self.refresh_visible();
                self.update_loading();
                self.publish();
                if std::mem::take(&mut self.sync_after_load) {
                    if self.sync_in_flight {
                        debug!("sync requested while one is running");
                        self.sync_requested = true;
                    } else {
                        self.start_sync();
                    }
                }
            }
            Some(Err(message)) => {
                self.sync_after_load = false;
                self.fail(message);
                self.update_loading();
                self.publish();
            }
            None => {
                self.sync_after_load = false;
                self.fail(LOAD_FAILED_MESSAGE.to_owned());
                self.update_loading();
                self.publish();
            }
        }
    }

    fn start_sync(&mut self) {
        if self.sync_in_flight {
            debug!("sync already running");
            return;
        }
        self.sync_in_flight = true;
        self.banner_generation += 1;
        self.state.sync_status = SyncStatus::Syncing;
        self.state.error_message = None;
        self.publish();

        let stream = self.sync.sync();
        self.spawn(JobKind::Sync, async move {
            Completion::Synced(first_outcome(stream).await)
        });
    }

    fn finish_sync(&mut self, outcome: Option<Result<(), String>>) {
        self.sync_in_flight = false;
        match outcome {
            Some(Ok(())) => {
                info!("sync finished");
                self.state.sync_status = SyncStatus::Success;
                self.publish();
                self.schedule_banner_reset();
                // Queued by a mutation that finished during this sync.
                if std::mem::take(&mut self.sync_requested) {
                    self.start_sync();
                }
            }
            Some(Err(message)) => {
                self.sync_requested = false;
                self.state.sync_status = SyncStatus::Error;
                self.state.error_message = Some(message);
                self.publish();
                self.start_load();
            }
            None => {
                self.sync_requested = false;
                self.state.sync_status = SyncStatus::Error;
                self.state.error_message = Some(SYNC_FAILED_MESSAGE.to_owned());
                self.publish();
                self.start_load();
            }
        }
    }

    fn schedule_banner_reset(&mut self) {
        self.banner_generation += 1;
        let generation = self.banner_generation;
        let delay = self.config.sync_banner;
        self.spawn(JobKind::Banner, async move {
            tokio::time::sleep(delay).await;
            Completion::BannerElapsed(generation)
        });
    }

    fn job_failed(&mut self, err: &JoinError) {
        let Some(kind) = self.job_kinds.remove(&err.id()) else {
            error!(error = %err, "unknown session job failed");
            return;
        };
        if err.is_panic() {
            error!(?kind, "session job panicked");
        } else {
            warn!(?kind, "session job cancelled");
        }
        self.recover(kind);
    }

    fn recover(&mut self, kind: JobKind) {
        match kind {
            JobKind::Mutation => {
                self.pending_mutations = self.pending_mutations.saturating_sub(1);
            }
            JobKind::Load => self.awaiting_load = false,
            JobKind::Sync => {
                self.sync_in_flight = false;
                self.sync_requested = false;
                self.state.sync_status = SyncStatus::Error;
            }
            JobKind::Banner => self.state.sync_status = SyncStatus::None,
        }
        self.state.all_tasks.clear();
        self.state.tasks.clear();
        self.state.error_message = Some(UNEXPECTED_ERROR_MESSAGE.to_owned());
        self.update_loading();
        self.publish();
    }

    /// Records a user-visible failure and applies the list policy.
    fn fail(&mut self, message: String) {
        warn!(error = %message, "session operation failed");
        if self.config.error_list_policy == ErrorListPolicy::Clear {
            self.state.all_tasks.clear();
            self.state.tasks.clear();
        }
        self.state.error_message = Some(message);
    }

    fn spawn<F>(&mut self, kind: JobKind, job: F)
    where
        F: Future<Output = Completion> + Send + 'static,
    {
        let handle = self.jobs.spawn(job);
        self.job_kinds.insert(handle.id(), kind);
    }

    fn refresh_visible(&mut self) {
        self.state.tasks = visible_tasks(
            &self.state.all_tasks,
            &self.applied_query,
            self.state.status_filter,
            self.state.sort_order,
        );
    }

    const fn update_loading(&mut self) {
        self.state.is_loading = self.pending_mutations > 0 || self.awaiting_load;
    }

    fn publish(&self) {
        self.publisher.send_replace(self.state.clone());
    }
}
