//! Pull-merge synchronisation from the remote service into the local store.

use async_stream::stream;
use mockable::Clock;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::task::{
    domain::{Resource, ResourceStream},
    ports::{LocalTaskStore, RemoteTaskService, TaskRecord},
};

/// Pulls the full remote task list and merges it into the local store.
///
/// The merge only inserts rows whose id is free locally. Existing rows are
/// never overwritten and nothing is deleted, so a failed or repeated sync
/// cannot lose local data.
pub struct TaskSyncService<L, R, C>
where
    L: LocalTaskStore,
    R: RemoteTaskService,
    C: Clock + Send + Sync,
{
    local: Arc<L>,
    remote: Arc<R>,
    clock: Arc<C>,
}

impl<L, R, C> Clone for TaskSyncService<L, R, C>
where
    L: LocalTaskStore,
    R: RemoteTaskService,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            local: Arc::clone(&self.local),
            remote: Arc::clone(&self.remote),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<L, R, C> TaskSyncService<L, R, C>
where
    L: LocalTaskStore + 'static,
    R: RemoteTaskService + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Creates a new sync service.
    #[must_use]
    pub const fn new(local: Arc<L>, remote: Arc<R>, clock: Arc<C>) -> Self {
        Self {
            local,
            remote,
            clock,
        }
    }

    /// Runs one pull-merge.
    ///
    /// Emits `Loading(true)`, then `Success(())` or `Error`, then
    /// `Loading(false)`.
    #[must_use]
    pub fn sync(&self) -> ResourceStream<()> {
        let service = self.clone();
        Box::pin(stream! {
            yield Resource::Loading(true);
            yield service.pull_merge().await;
            yield Resource::Loading(false);
        })
    }

    #[tracing::instrument(skip(self))]
    async fn pull_merge(&self) -> Resource<()> {
        let remote_tasks = match self.remote.list_all().await {
            Ok(tasks) => tasks,
            Err(err) => {
                warn!(error = %err, "error syncing tasks with server");
                return Resource::Error(format!("Failed to sync tasks: {err}"));
            }
        };
        let fetched = remote_tasks.len();

        let added_date = self.clock.utc().date_naive();
        let records: Vec<TaskRecord> = remote_tasks
            .into_iter()
            .filter_map(|task| {
                let id = task.id;
                if !id.is_persisted() {
                    warn!("skipping remote task without an id");
                    return None;
                }
                task.into_record(added_date)
                    .map_err(|err| warn!(task_id = %id, error = %err, "skipping invalid remote task"))
                    .ok()
            })
            .collect();

        match self.local.insert_batch_ignoring_conflicts(&records).await {
            Ok(inserted) => {
                info!(fetched, inserted, "synced tasks from server");
                Resource::Success(())
            }
            Err(err) => {
                error!(error = %err, "failed to store synced tasks");
                Resource::Error("Failed to save synced tasks".to_owned())
            }
        }
    }
}
