//! Shared test helpers for in-memory integration tests.

use eyre::{Result, WrapErr, eyre};
use mockable::DefaultClock;
use rstest::fixture;
use std::sync::Arc;
use std::time::Duration;
use tasksync::config::SessionConfig;
use tasksync::session::{SessionHandle, TaskSession, ViewState};
use tasksync::task::{
    adapters::memory::{InMemoryLocalTaskStore, InMemoryRemoteTaskService},
    domain::{Task, TaskTitle},
    ports::{LocalTaskStore, TaskRecord},
    services::{TaskMutationService, TaskSyncService},
};

/// Upper bound on how long a test waits for a session state.
pub const STATE_TIMEOUT: Duration = Duration::from_secs(30);

/// Remote service type used by every integration test.
pub type Remote = InMemoryRemoteTaskService<DefaultClock>;

/// In-memory local store and simulated remote sharing one clock.
pub struct Backend {
    /// Local store.
    pub local: Arc<InMemoryLocalTaskStore>,
    /// Simulated remote service.
    pub remote: Arc<Remote>,
    /// Clock shared by services and task construction.
    pub clock: Arc<DefaultClock>,
}

impl Backend {
    /// Builds a backend whose local store and remote hand out the given ids.
    #[must_use]
    pub fn with_ids(local_next_id: i64, remote_next_id: i64) -> Self {
        let clock = Arc::new(DefaultClock);
        Self {
            local: Arc::new(InMemoryLocalTaskStore::with_next_id(local_next_id)),
            remote: Arc::new(
                InMemoryRemoteTaskService::new(Arc::clone(&clock)).with_next_id(remote_next_id),
            ),
            clock,
        }
    }

    /// Mutation service over this backend.
    #[must_use]
    pub fn mutations(&self) -> TaskMutationService<InMemoryLocalTaskStore, Remote, DefaultClock> {
        TaskMutationService::new(
            Arc::clone(&self.local),
            Arc::clone(&self.remote),
            Arc::clone(&self.clock),
        )
    }

    /// Sync service over this backend.
    #[must_use]
    pub fn sync(&self) -> TaskSyncService<InMemoryLocalTaskStore, Remote, DefaultClock> {
        TaskSyncService::new(
            Arc::clone(&self.local),
            Arc::clone(&self.remote),
            Arc::clone(&self.clock),
        )
    }

    /// Starts a session over this backend.
    #[must_use]
    pub fn start_session(&self, config: SessionConfig) -> SessionHandle {
        TaskSession::new(
            Arc::clone(&self.local),
            Arc::clone(&self.remote),
            Arc::clone(&self.clock),
            config,
        )
        .start()
    }

    /// Writes tasks straight into the local store.
    ///
    /// # Errors
    ///
    /// Returns an error if a title is blank or the store rejects a row.
    pub async fn seed_local(&self, titles: &[&str]) -> Result<Vec<Task>> {
        let mut stored = Vec::with_capacity(titles.len());
        for title in titles {
            let task = task(title)?;
            let id = self
                .local
                .insert(&TaskRecord::from(&task))
                .await
                .wrap_err("seed local task")?;
            stored.push(task.with_id(id));
        }
        Ok(stored)
    }
}

/// Provides a backend with ids starting at `1` on both sides.
#[fixture]
pub fn backend() -> Backend {
    Backend::with_ids(1, 1)
}

/// Builds an unsaved task.
///
/// # Errors
///
/// Returns an error if the title is blank.
pub fn task(title: &str) -> Result<Task> {
    let valid = TaskTitle::new(title).wrap_err("task title")?;
    Ok(Task::new(valid, &DefaultClock))
}

/// Waits until the session publishes a state matching `predicate`.
///
/// # Errors
///
/// Returns an error if the session stops or the state never matches.
pub async fn wait_for_state(
    handle: &SessionHandle,
    predicate: impl FnMut(&ViewState) -> bool,
) -> Result<ViewState> {
    let mut receiver = handle.state();
    let matched = tokio::time::timeout(STATE_TIMEOUT, receiver.wait_for(predicate))
        .await
        .map_err(|_| eyre!("timed out waiting for session state: {:?}", handle.current()))?
        .wrap_err("session stopped")?;
    Ok(matched.clone())
}

/// Waits until the startup sync banner has cleared and nothing is loading.
///
/// # Errors
///
/// Returns an error if the session never settles.
pub async fn wait_until_settled(handle: &SessionHandle) -> Result<ViewState> {
    wait_for_state(handle, |state| {
        state.sync_status == tasksync::session::SyncStatus::None && !state.is_loading
    })
    .await
}

/// Titles of the visible tasks.
#[must_use]
pub fn visible_titles(state: &ViewState) -> Vec<String> {
    state
        .tasks
        .iter()
        .map(|task| task.title().to_string())
        .collect()
}
