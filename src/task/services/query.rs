//! Live query over the local task collection.

use async_stream::stream;
use futures::StreamExt;
use std::sync::Arc;
use tracing::{error, warn};

use crate::task::{
    domain::{Resource, ResourceStream, Task},
    ports::{LocalTaskStore, TaskRecord},
};

/// Message shown when the local store cannot be read.
pub const LOAD_FAILED_MESSAGE: &str = "Failed to load tasks";

/// Exposes the local store as a stream of [`Resource`] task lists.
pub struct TaskQueryService<L>
where
    L: LocalTaskStore,
{
    local: Arc<L>,
}

impl<L> Clone for TaskQueryService<L>
where
    L: LocalTaskStore,
{
    fn clone(&self) -> Self {
        Self {
            local: Arc::clone(&self.local),
        }
    }
}

impl<L> TaskQueryService<L>
where
    L: LocalTaskStore + 'static,
{
    /// Creates a new query service.
    #[must_use]
    pub const fn new(local: Arc<L>) -> Self {
        Self { local }
    }

    /// Observes every task, ordered by id.
    ///
    /// Emits `Loading(true)` once, then `Success` with the full list on
    /// subscription and after every store change, with a single
    /// `Loading(false)` following the first list. The stream only ends
    /// when the store stops publishing or a read fails; a read failure is
    /// reported as a generic `Error` followed by the closing
    /// `Loading(false)` if it was still pending.
    #[must_use]
    pub fn observe_all(&self) -> ResourceStream<Vec<Task>> {
        let local = Arc::clone(&self.local);
        Box::pin(stream! {
            yield Resource::Loading(true);
            match local.observe_all() {
                Err(err) => {
                    error!(error = %err, "failed to subscribe to local task store");
                    yield Resource::Error(LOAD_FAILED_MESSAGE.to_owned());
                    yield Resource::Loading(false);
                }
                Ok(mut rows) => {
                    let mut loading = true;
                    while let Some(batch) = rows.next().await {
                        match batch {
                            Ok(records) => {
                                yield Resource::Success(to_tasks(records));
                                if loading {
                                    loading = false;
                                    yield Resource::Loading(false);
                                }
                            }
                            Err(err) => {
                                error!(error = %err, "error getting tasks from local store");
                                yield Resource::Error(LOAD_FAILED_MESSAGE.to_owned());
                                if loading {
                                    yield Resource::Loading(false);
                                }
                                break;
                            }
                        }
                    }
                }
            }
        })
    }
}

fn to_tasks(records: Vec<TaskRecord>) -> Vec<Task> {
    records
        .into_iter()
        .filter_map(|record| {
            let id = record.id;
            Task::try_from(record)
                .map_err(|err| warn!(task_id = %id, error = %err, "skipping unreadable task row"))
                .ok()
        })
        .collect()
}
