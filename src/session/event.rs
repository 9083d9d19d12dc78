//! Events a presentation layer submits to a task session.

use crate::task::domain::{PriorityOrder, Task, TaskStatus};

/// Closed set of user intents handled by a task session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The search text changed; applied after the debounce window.
    SearchQueryChanged(String),
    /// The status filter changed; `None` shows every status.
    StatusFilterChanged(Option<TaskStatus>),
    /// The priority sort changed; `None` keeps id order.
    SortOrderChanged(Option<PriorityOrder>),
    /// Add a new task.
    AddTask(Task),
    /// Save changes to an existing task.
    EditTask(Task),
    /// Delete a task.
    DeleteTask(Task),
    /// Advance a task to the next status in its cycle.
    CycleStatus(Task),
    /// Reload the task list from the local store.
    Reload,
    /// Pull from the remote service now.
    SyncNow,
    /// Hide the sync banner.
    DismissSyncStatus,
}
