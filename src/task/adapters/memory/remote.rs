//! Simulated remote task service backed by memory.

use async_trait::async_trait;
use chrono::Duration as ChronoDuration;
use mockable::Clock;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::task::{
    domain::{Priority, TaskId, TaskStatus},
    ports::{RemoteServiceError, RemoteServiceResult, RemoteTask, RemoteTaskService},
};

/// Number of calls the simulated service has received, per operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemoteCallCounts {
    /// `list_all` calls.
    pub list_all: usize,
    /// `create` calls.
    pub create: usize,
    /// `update` calls.
    pub update: usize,
    /// `delete` calls.
    pub delete: usize,
}

/// In-memory stand-in for the network task API.
///
/// Ids are assigned from a counter and timestamps from the injected clock.
/// The service can be taken offline, told to fail a number of upcoming
/// calls, or slowed down with a fixed latency.
#[derive(Debug)]
pub struct InMemoryRemoteTaskService<C>
where
    C: Clock + Send + Sync,
{
    state: Mutex<RemoteState>,
    clock: Arc<C>,
    latency: Duration,
}

#[derive(Debug)]
struct RemoteState {
    tasks: BTreeMap<TaskId, RemoteTask>,
    next_id: i64,
    offline: bool,
    failures_remaining: u32,
    calls: RemoteCallCounts,
}

#[derive(Debug, Clone, Copy)]
enum RemoteCall {
    ListAll,
    Create,
    Update,
    Delete,
}

impl<C> InMemoryRemoteTaskService<C>
where
    C: Clock + Send + Sync,
{
    /// Creates an empty, online service with no latency.
    #[must_use]
    pub fn new(clock: Arc<C>) -> Self {
        Self {
            state: Mutex::new(RemoteState {
                tasks: BTreeMap::new(),
                next_id: 1,
                offline: false,
                failures_remaining: 0,
                calls: RemoteCallCounts::default(),
            }),
            clock,
            latency: Duration::ZERO,
        }
    }

    /// Delays every call by `latency`.
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Sets the next id handed out by `create`.
    #[must_use]
    pub fn with_next_id(self, next_id: i64) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state.next_id = next_id.max(1);
        }
        self
    }

    /// Stores tasks as if they had been created earlier.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteServiceError::Transport`] when the state lock is
    /// poisoned.
    pub fn seed(&self, tasks: impl IntoIterator<Item = RemoteTask>) -> RemoteServiceResult<()> {
        let mut state = self.lock()?;
        for task in tasks {
            state.next_id = state.next_id.max(task.id.value().saturating_add(1));
            state.tasks.insert(task.id, task);
        }
        Ok(())
    }

    /// Seeds three sample tasks with ids `1..=3`.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteServiceError::Transport`] when the state lock is
    /// poisoned.
    pub fn seed_samples(&self) -> RemoteServiceResult<()> {
        let now = self.clock.utc();
        let sample = |id: i64, title: &str, description: &str, age_days: i64| RemoteTask {
            id: TaskId::new(id),
            title: title.to_owned(),
            description: description.to_owned(),
            priority: Priority::Medium,
            status: TaskStatus::Undone,
            created_at: now - ChronoDuration::days(age_days),
            updated_at: now - ChronoDuration::days(age_days.saturating_sub(1)),
        };
        self.seed([
            sample(1, "Buy groceries", "Milk, eggs, bread", 1),
            sample(2, "Finish presentation", "For Monday's meeting", 2),
            sample(3, "Call dentist", "Schedule cleaning appointment", 3),
        ])
    }

    /// Makes every subsequent call fail with `Unavailable` until reset.
    pub fn set_offline(&self, offline: bool) {
        if let Ok(mut state) = self.state.lock() {
            state.offline = offline;
        }
    }

    /// Fails the next `count` calls with `Unavailable`.
    pub fn fail_next(&self, count: u32) {
        if let Ok(mut state) = self.state.lock() {
            state.failures_remaining = count;
        }
    }

    /// Returns the stored tasks ordered by id.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteServiceError::Transport`] when the state lock is
    /// poisoned.
    pub fn tasks(&self) -> RemoteServiceResult<Vec<RemoteTask>> {
        Ok(self.lock()?.tasks.values().cloned().collect())
    }

    /// Returns the per-operation call counters.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteServiceError::Transport`] when the state lock is
    /// poisoned.
    pub fn call_counts(&self) -> RemoteServiceResult<RemoteCallCounts> {
        Ok(self.lock()?.calls)
    }

    fn lock(&self) -> RemoteServiceResult<MutexGuard<'_, RemoteState>> {
        self.state
            .lock()
            .map_err(|err| RemoteServiceError::transport(std::io::Error::other(err.to_string())))
    }

    /// Counts the call, waits out the latency, then applies the failure
    /// switches.
    async fn begin(&self, call: RemoteCall) -> RemoteServiceResult<()> {
        self.lock()?.calls.record(call);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let mut state = self.lock()?;
        if state.offline {
            return Err(RemoteServiceError::Unavailable(format!(
                "network error: failed to {}",
                call.describe()
            )));
        }
        if state.failures_remaining > 0 {
            state.failures_remaining -= 1;
            return Err(RemoteServiceError::Unavailable(format!(
                "network error: failed to {}",
                call.describe()
            )));
        }
        Ok(())
    }
}

impl RemoteCallCounts {
    const fn record(&mut self, call: RemoteCall) {
        match call {
            RemoteCall::ListAll => self.list_all += 1,
            RemoteCall::Create => self.create += 1,
            RemoteCall::Update => self.update += 1,
            RemoteCall::Delete => self.delete += 1,
        }
    }
}

impl RemoteCall {
    const fn describe(self) -> &'static str {
        match self {
            Self::ListAll => "fetch tasks",
            Self::Create => "create task",
            Self::Update => "update task",
            Self::Delete => "delete task",
        }
    }
}

#[async_trait]
impl<C> RemoteTaskService for InMemoryRemoteTaskService<C>
where
    C: Clock + Send + Sync,
{
    async fn list_all(&self) -> RemoteServiceResult<Vec<RemoteTask>> {
        self.begin(RemoteCall::ListAll).await?;
        Ok(self.lock()?.tasks.values().cloned().collect())
    }

    async fn create(&self, task: &RemoteTask) -> RemoteServiceResult<RemoteTask> {
        self.begin(RemoteCall::Create).await?;
        let now = self.clock.utc();
        let mut state = self.lock()?;
        let id = TaskId::new(state.next_id);
        state.next_id += 1;
        let created = RemoteTask {
            id,
            created_at: now,
            updated_at: now,
            ..task.clone()
        };
        state.tasks.insert(id, created.clone());
        Ok(created)
    }

    async fn update(&self, id: TaskId, task: &RemoteTask) -> RemoteServiceResult<RemoteTask> {
        self.begin(RemoteCall::Update).await?;
        let now = self.clock.utc();
        let mut state = self.lock()?;
        let stored = state
            .tasks
            .get_mut(&id)
            .ok_or(RemoteServiceError::NotFound(id))?;
        *stored = RemoteTask {
            id,
            created_at: stored.created_at,
            updated_at: now,
            ..task.clone()
        };
        Ok(stored.clone())
    }

    async fn delete(&self, id: TaskId) -> RemoteServiceResult<()> {
        self.begin(RemoteCall::Delete).await?;
        self.lock()?
            .tasks
            .remove(&id)
            .map(|_| ())
            .ok_or(RemoteServiceError::NotFound(id))
    }
}
