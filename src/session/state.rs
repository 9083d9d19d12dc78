//! UI-facing view state published by a task session.

use crate::task::domain::{PriorityOrder, Task, TaskStatus};

/// Sync banner state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SyncStatus {
    /// No sync activity to report.
    None,
    /// A sync is running.
    #[default]
    Syncing,
    /// The last sync succeeded; resets to `None` after the banner delay.
    Success,
    /// The last sync failed.
    Error,
}

/// Snapshot of everything a presentation layer renders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    /// Search text as typed, before debouncing.
    pub search_query: String,
    /// Active status filter; `None` shows every status.
    pub status_filter: Option<TaskStatus>,
    /// Active priority sort; `None` keeps id order.
    pub sort_order: Option<PriorityOrder>,
    /// Unfiltered mirror of the local store as last loaded.
    pub all_tasks: Vec<Task>,
    /// Tasks to display after search, status filter, and sort.
    pub tasks: Vec<Task>,
    /// `true` while a load or mutation is in flight.
    pub is_loading: bool,
    /// Sync banner state.
    pub sync_status: SyncStatus,
    /// Last failure shown to the user.
    pub error_message: Option<String>,
}

/// Derives the visible list: title search, then status filter, then sort.
///
/// A blank query matches every task.
#[must_use]
pub fn visible_tasks(
    all_tasks: &[Task],
    query: &str,
    status_filter: Option<TaskStatus>,
    sort_order: Option<PriorityOrder>,
) -> Vec<Task> {
    let needle = query.trim();
    let mut visible: Vec<Task> = all_tasks
        .iter()
        .filter(|task| needle.is_empty() || task.title().contains_ignore_case(needle))
        .filter(|task| status_filter.is_none_or(|status| task.status() == status))
        .cloned()
        .collect();
    if let Some(order) = sort_order {
        order.sort(&mut visible);
    }
    visible
}
