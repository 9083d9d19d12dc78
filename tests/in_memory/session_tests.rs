//! Session coordinator tests on tokio's paused clock.

use super::helpers::{
    Backend, backend, task, visible_titles, wait_for_state, wait_until_settled,
};
use async_trait::async_trait;
use eyre::Result;
use mockable::DefaultClock;
use rstest::rstest;
use std::sync::Arc;
use std::time::Duration;
use tasksync::config::{ErrorListPolicy, SessionConfig};
use tasksync::session::{SessionEvent, SyncStatus, TaskSession};
use tasksync::task::adapters::memory::{InMemoryLocalTaskStore, InMemoryRemoteTaskService};
use tasksync::task::domain::{Priority, PriorityOrder, TaskId, TaskStatus};
use tasksync::task::ports::{RemoteServiceResult, RemoteTask, RemoteTaskService};
use tokio::time::Instant;

/// Simulated remote whose listing is much slower than its writes.
struct SlowListingRemote {
    inner: InMemoryRemoteTaskService<DefaultClock>,
    list_delay: Duration,
}

#[async_trait]
impl RemoteTaskService for SlowListingRemote {
    async fn list_all(&self) -> RemoteServiceResult<Vec<RemoteTask>> {
        tokio::time::sleep(self.list_delay).await;
        self.inner.list_all().await
    }

    async fn create(&self, task: &RemoteTask) -> RemoteServiceResult<RemoteTask> {
        self.inner.create(task).await
    }

    async fn update(&self, id: TaskId, task: &RemoteTask) -> RemoteServiceResult<RemoteTask> {
        self.inner.update(id, task).await
    }

    async fn delete(&self, id: TaskId) -> RemoteServiceResult<()> {
        self.inner.delete(id).await
    }
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn startup_syncs_shows_banner_then_resets(backend: Backend) -> Result<()> {
    backend.remote.seed_samples()?;
    let handle = backend.start_session(SessionConfig::default());
    let started = Instant::now();

    let success = wait_for_state(&handle, |state| state.sync_status == SyncStatus::Success).await?;
    assert!(success.error_message.is_none());

    let settled = wait_until_settled(&handle).await?;
    assert!(Instant::now() - started >= Duration::from_secs(2));
    assert_eq!(
        visible_titles(&settled),
        vec!["Buy groceries", "Finish presentation", "Call dentist"]
    );

    handle.shutdown().await?;
    Ok(())
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn failed_startup_sync_still_shows_local_tasks(backend: Backend) -> Result<()> {
    backend.seed_local(&["Written offline"]).await?;
    backend.remote.set_offline(true);
    let handle = backend.start_session(SessionConfig::default());

    let state = wait_for_state(&handle, |state| {
        state.sync_status == SyncStatus::Error && !state.is_loading && !state.tasks.is_empty()
    })
    .await?;

    assert_eq!(visible_titles(&state), vec!["Written offline"]);
    let message = state.error_message.unwrap_or_default();
    assert!(message.starts_with("Failed to sync tasks"), "{message}");

    handle.send(SessionEvent::DismissSyncStatus).await?;
    let dismissed = wait_for_state(&handle, |state| state.sync_status == SyncStatus::None).await?;
    assert!(dismissed.error_message.is_none());

    handle.shutdown().await?;
    Ok(())
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn search_applies_only_after_quiet_window(backend: Backend) -> Result<()> {
    backend
        .seed_local(&["Buy milk", "Walk the dog", "Buy bread"])
        .await?;
    let handle = backend.start_session(SessionConfig::default());
    wait_until_settled(&handle).await?;

    for query in ["b", "bu", "buy m"] {
        handle
            .send(SessionEvent::SearchQueryChanged(query.to_owned()))
            .await?;
        tokio::time::advance(Duration::from_millis(300)).await;
    }
    let typed = wait_for_state(&handle, |state| state.search_query == "buy m").await?;
    assert_eq!(typed.tasks.len(), 3, "search applied before the quiet window");
    let last_keystroke = Instant::now() - Duration::from_millis(300);

    let searched = wait_for_state(&handle, |state| {
        state.tasks.len() == 1 && !state.is_loading
    })
    .await?;

    assert!(Instant::now() - last_keystroke >= Duration::from_millis(1000));
    assert_eq!(visible_titles(&searched), vec!["Buy milk"]);

    handle
        .send(SessionEvent::SearchQueryChanged(String::new()))
        .await?;
    let cleared = wait_for_state(&handle, |state| {
        state.search_query.is_empty() && state.tasks.len() == 3 && !state.is_loading
    })
    .await?;
    assert_eq!(cleared.all_tasks.len(), 3);

    handle.shutdown().await?;
    Ok(())
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn status_filter_hides_and_restores_tasks(backend: Backend) -> Result<()> {
    backend.seed_local(&["Buy milk"]).await?;
    let handle = backend.start_session(SessionConfig::default());
    wait_until_settled(&handle).await?;

    handle
        .send(SessionEvent::StatusFilterChanged(Some(TaskStatus::Doing)))
        .await?;
    let filtered = wait_for_state(&handle, |state| {
        state.status_filter == Some(TaskStatus::Doing) && !state.is_loading
    })
    .await?;
    assert!(filtered.tasks.is_empty());
    assert_eq!(filtered.all_tasks.len(), 1);

    handle.send(SessionEvent::StatusFilterChanged(None)).await?;
    let restored = wait_for_state(&handle, |state| {
        state.status_filter.is_none() && !state.is_loading
    })
    .await?;
    assert_eq!(
        restored.tasks.iter().map(|task| task.id()).collect::<Vec<_>>(),
        vec![TaskId::new(1)]
    );

    handle.shutdown().await?;
    Ok(())
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn sort_order_reorders_visible_tasks(backend: Backend) -> Result<()> {
    let stored = backend.seed_local(&["Low one", "High one"]).await?;
    let low = stored.first().expect("first task").clone();
    let handle = backend.start_session(SessionConfig::default());
    wait_until_settled(&handle).await?;
    handle
        .send(SessionEvent::EditTask(low.with_priority(Priority::Low)))
        .await?;
    wait_for_state(&handle, |state| {
        !state.is_loading
            && state
                .all_tasks
                .iter()
                .any(|task| task.priority() == Priority::Low)
    })
    .await?;

    handle
        .send(SessionEvent::SortOrderChanged(Some(PriorityOrder::LowFirst)))
        .await?;
    let sorted = wait_for_state(&handle, |state| state.sort_order.is_some()).await?;
    assert_eq!(visible_titles(&sorted), vec!["Low one", "High one"]);

    handle
        .send(SessionEvent::SortOrderChanged(Some(PriorityOrder::HighFirst)))
        .await?;
    let reversed = wait_for_state(&handle, |state| {
        state.sort_order == Some(PriorityOrder::HighFirst)
    })
    .await?;
    assert_eq!(visible_titles(&reversed), vec!["High one", "Low one"]);

    handle.shutdown().await?;
    Ok(())
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn added_task_appears_under_server_id_and_triggers_sync() -> Result<()> {
    let backend = Backend::with_ids(5, 42);
    let handle = backend.start_session(SessionConfig::default());
    wait_until_settled(&handle).await?;
    let list_calls_before = backend.remote.call_counts()?.list_all;

    handle.send(SessionEvent::AddTask(task("X")?)).await?;
    let state = wait_for_state(&handle, |state| {
        !state.is_loading && state.tasks.iter().any(|task| task.id() == TaskId::new(42))
    })
    .await?;

    assert_eq!(state.tasks.len(), 1);
    wait_for_state(&handle, |state| state.sync_status == SyncStatus::Success).await?;
    assert_eq!(backend.remote.call_counts()?.list_all, list_calls_before + 1);

    handle.shutdown().await?;
    Ok(())
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn mutations_can_skip_the_follow_up_sync(backend: Backend) -> Result<()> {
    let config = SessionConfig {
        sync_after_mutation: false,
        ..SessionConfig::default()
    };
    let handle = backend.start_session(config);
    wait_until_settled(&handle).await?;

    handle.send(SessionEvent::AddTask(task("Quiet")?)).await?;
    wait_for_state(&handle, |state| !state.is_loading && state.tasks.len() == 1).await?;
    tokio::time::sleep(Duration::from_secs(5)).await;

    assert_eq!(backend.remote.call_counts()?.list_all, 1);
    assert_eq!(handle.current().sync_status, SyncStatus::None);

    handle.shutdown().await?;
    Ok(())
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn cycle_status_and_delete_update_the_list(backend: Backend) -> Result<()> {
    backend.remote.seed_samples()?;
    let handle = backend.start_session(SessionConfig::default());
    let settled = wait_until_settled(&handle).await?;
    let first = settled.tasks.first().expect("sample task").clone();

    handle.send(SessionEvent::CycleStatus(first.clone())).await?;
    let cycled = wait_for_state(&handle, |state| {
        !state.is_loading
            && state
                .tasks
                .iter()
                .any(|task| task.id() == first.id() && task.status() == TaskStatus::Doing)
    })
    .await?;
    assert_eq!(cycled.tasks.len(), 3);

    handle.send(SessionEvent::DeleteTask(first.clone())).await?;
    let remaining = wait_for_state(&handle, |state| !state.is_loading && state.tasks.len() == 2)
        .await?;
    assert!(remaining.tasks.iter().all(|task| task.id() != first.id()));
    assert_eq!(backend.remote.tasks()?.len(), 2);

    handle.shutdown().await?;
    Ok(())
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn failed_mutation_reports_error_then_reloads(backend: Backend) -> Result<()> {
    let stored = backend.seed_local(&["Existing"]).await?;
    let existing = stored.first().expect("seeded task").clone();
    let config = SessionConfig {
        error_list_policy: ErrorListPolicy::Clear,
        ..SessionConfig::default()
    };
    let handle = backend.start_session(config);
    wait_until_settled(&handle).await?;

    handle.send(SessionEvent::AddTask(existing)).await?;
    let state = wait_for_state(&handle, |state| {
        !state.is_loading && state.error_message.is_some()
    })
    .await?;

    assert_eq!(state.error_message.as_deref(), Some("Task 1 already exists"));
    assert_eq!(visible_titles(&state), vec!["Existing"]);
    assert_eq!(backend.remote.call_counts()?.create, 0);

    handle.shutdown().await?;
    Ok(())
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn manual_sync_reports_failure_and_recovers(backend: Backend) -> Result<()> {
    let handle = backend.start_session(SessionConfig::default());
    wait_until_settled(&handle).await?;

    backend.remote.set_offline(true);
    handle.send(SessionEvent::SyncNow).await?;
    let failed = wait_for_state(&handle, |state| state.sync_status == SyncStatus::Error).await?;
    assert!(failed.error_message.is_some());

    backend.remote.set_offline(false);
    backend.remote.seed_samples()?;
    handle.send(SessionEvent::SyncNow).await?;
    wait_for_state(&handle, |state| state.sync_status == SyncStatus::Success).await?;
    let settled = wait_until_settled(&handle).await?;

    assert!(settled.error_message.is_none());
    assert_eq!(settled.tasks.len(), 3);

    handle.shutdown().await?;
    Ok(())
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn reload_picks_up_external_writes(backend: Backend) -> Result<()> {
    let handle = backend.start_session(SessionConfig::default());
    wait_until_settled(&handle).await?;

    backend.seed_local(&["Written elsewhere"]).await?;
    handle.send(SessionEvent::Reload).await?;
    let reloaded = wait_for_state(&handle, |state| {
        !state.is_loading && state.tasks.len() == 1
    })
    .await?;

    assert_eq!(visible_titles(&reloaded), vec!["Written elsewhere"]);
    handle.shutdown().await?;
    Ok(())
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn shutdown_closes_state_stream(backend: Backend) -> Result<()> {
    let handle = backend.start_session(SessionConfig::default());
    let receiver = handle.state();

    handle.shutdown().await?;

    assert!(receiver.has_changed().is_err());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn mutation_during_running_sync_queues_another_sync() -> Result<()> {
    let clock = Arc::new(DefaultClock);
    let remote = Arc::new(SlowListingRemote {
        inner: InMemoryRemoteTaskService::new(Arc::clone(&clock)).with_next_id(42),
        list_delay: Duration::from_secs(5),
    });
    let handle = TaskSession::new(
        Arc::new(InMemoryLocalTaskStore::new()),
        Arc::clone(&remote),
        clock,
        SessionConfig::default(),
    )
    .start();

    tokio::time::sleep(Duration::from_millis(100)).await;
    handle.send(SessionEvent::AddTask(task("Fresh")?)).await?;
    let settled = wait_until_settled(&handle).await?;

    assert_eq!(remote.inner.call_counts()?.list_all, 2);
    assert_eq!(visible_titles(&settled), vec!["Fresh"]);
    assert_eq!(settled.tasks.first().map(|task| task.id()), Some(TaskId::new(42)));

    handle.shutdown().await?;
    Ok(())
}

