//! In-memory local store with a live, watch-backed query.

use async_trait::async_trait;
use futures::StreamExt;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockWriteGuard};
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::task::{
    domain::TaskId,
    ports::{LocalStoreError, LocalStoreResult, LocalTaskStore, TaskRecord, TaskRecordStream},
};

/// Thread-safe in-memory task store.
///
/// Rows are kept ordered by id. Every write publishes a fresh snapshot to
/// open [`observe_all`](LocalTaskStore::observe_all) streams.
#[derive(Debug, Clone)]
pub struct InMemoryLocalTaskStore {
    state: Arc<RwLock<InMemoryStoreState>>,
    snapshots: Arc<watch::Sender<Vec<TaskRecord>>>,
}

#[derive(Debug)]
struct InMemoryStoreState {
    rows: BTreeMap<TaskId, TaskRecord>,
    next_id: i64,
}

impl InMemoryLocalTaskStore {
    /// Creates an empty store that hands out ids starting at `1`.
    #[must_use]
    pub fn new() -> Self {
        Self::with_next_id(1)
    }

    /// Creates an empty store whose next assigned id is `next_id`.
    #[must_use]
    pub fn with_next_id(next_id: i64) -> Self {
        let (snapshots, _) = watch::channel(Vec::new());
        Self {
            state: Arc::new(RwLock::new(InMemoryStoreState {
                rows: BTreeMap::new(),
                next_id: next_id.max(1),
            })),
            snapshots: Arc::new(snapshots),
        }
    }

    /// Returns every row ordered by id.
    ///
    /// # Errors
    ///
    /// Returns [`LocalStoreError::Persistence`] when the lock is poisoned.
    pub fn records(&self) -> LocalStoreResult<Vec<TaskRecord>> {
        let state = self.state.read().map_err(|err| {
            LocalStoreError::persistence(std::io::Error::other(err.to_string()))
        })?;
        Ok(state.rows.values().cloned().collect())
    }

    fn write(&self) -> LocalStoreResult<RwLockWriteGuard<'_, InMemoryStoreState>> {
        self.state.write().map_err(|err| {
            LocalStoreError::persistence(std::io::Error::other(err.to_string()))
        })
    }

    /// Publishes the current rows while the write lock is still held so
    /// observers see snapshots in write order.
    fn publish(&self, state: &InMemoryStoreState) {
        self.snapshots
            .send_replace(state.rows.values().cloned().collect());
    }
}

impl Default for InMemoryLocalTaskStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStoreState {
    fn assign_id(&mut self, requested: TaskId) -> LocalStoreResult<TaskId> {
        if !requested.is_persisted() {
            while self.rows.contains_key(&TaskId::new(self.next_id)) {
                self.next_id += 1;
            }
            let id = TaskId::new(self.next_id);
            self.next_id += 1;
            return Ok(id);
        }
        if self.rows.contains_key(&requested) {
            return Err(LocalStoreError::DuplicateTask(requested));
        }
        self.next_id = self.next_id.max(requested.value().saturating_add(1));
        Ok(requested)
    }
}

#[async_trait]
impl LocalTaskStore for InMemoryLocalTaskStore {
    async fn insert(&self, record: &TaskRecord) -> LocalStoreResult<TaskId> {
        let mut state = self.write()?;
        let id = state.assign_id(record.id)?;
        let mut row = record.clone();
        row.id = id;
        state.rows.insert(id, row);
        self.publish(&state);
        Ok(id)
    }

    async fn insert_batch_ignoring_conflicts(
        &self,
        records: &[TaskRecord],
    ) -> LocalStoreResult<usize> {
        let mut state = self.write()?;
        let mut inserted = 0;
        for record in records {
            if record.id.is_persisted() && state.rows.contains_key(&record.id) {
                continue;
            }
            let id = state.assign_id(record.id)?;
            let mut row = record.clone();
            row.id = id;
            state.rows.insert(id, row);
            inserted += 1;
        }
        if inserted > 0 {
            self.publish(&state);
        }
        Ok(inserted)
    }

    async fn update(&self, record: &TaskRecord) -> LocalStoreResult<u64> {
        let mut state = self.write()?;
        let Some(row) = state.rows.get_mut(&record.id) else {
            return Ok(0);
        };
        *row = record.clone();
        self.publish(&state);
        Ok(1)
    }

    async fn delete(&self, id: TaskId) -> LocalStoreResult<()> {
        let mut state = self.write()?;
        if state.rows.remove(&id).is_some() {
            self.publish(&state);
        }
        Ok(())
    }

    async fn delete_all(&self) -> LocalStoreResult<()> {
        let mut state = self.write()?;
        state.rows.clear();
        self.publish(&state);
        Ok(())
    }

    fn observe_all(&self) -> LocalStoreResult<TaskRecordStream> {
        let receiver = self.snapshots.subscribe();
        Ok(WatchStream::new(receiver).map(Ok).boxed())
    }
}
