//! Then steps for offline sync BDD scenarios.

use super::world::SyncWorld;
use eyre::WrapErr;
use rstest_bdd_macros::then;
use tasksync::task::{domain::TaskId, ports::TaskRecord};

fn local_rows(world: &SyncWorld) -> Result<Vec<TaskRecord>, eyre::Report> {
    world.local.records().wrap_err("read local store")
}

#[then("the add succeeds")]
fn add_succeeds(world: &SyncWorld) -> Result<(), eyre::Report> {
    match world.last_add.as_ref() {
        Some(Some(Ok(_))) => Ok(()),
        Some(Some(Err(message))) => Err(eyre::eyre!("add failed: {message}")),
        Some(None) => Err(eyre::eyre!("add finished without an outcome")),
        None => Err(eyre::eyre!("missing add result in scenario world")),
    }
}

#[then("the sync succeeds")]
fn sync_succeeds(world: &SyncWorld) -> Result<(), eyre::Report> {
    match world.last_sync.as_ref() {
        Some(Some(Ok(()))) => Ok(()),
        Some(Some(Err(message))) => Err(eyre::eyre!("sync failed: {message}")),
        Some(None) => Err(eyre::eyre!("sync finished without an outcome")),
        None => Err(eyre::eyre!("missing sync result in scenario world")),
    }
}

#[then(r#"the sync fails with a message starting "{prefix}""#)]
fn sync_fails(world: &SyncWorld, prefix: String) -> Result<(), eyre::Report> {
    match world.last_sync.as_ref() {
        Some(Some(Err(message))) if message.starts_with(&prefix) => Ok(()),
        Some(Some(Err(message))) => Err(eyre::eyre!(
            "expected message starting with {prefix:?}, found {message:?}"
        )),
        Some(Some(Ok(()))) => Err(eyre::eyre!("expected sync to fail")),
        Some(None) => Err(eyre::eyre!("sync finished without an outcome")),
        None => Err(eyre::eyre!("missing sync result in scenario world")),
    }
}

#[then("the local store task count is {count:usize}")]
fn local_task_count(world: &SyncWorld, count: usize) -> Result<(), eyre::Report> {
    let rows = local_rows(world)?;
    if rows.len() != count {
        return Err(eyre::eyre!(
            "expected {count} local tasks, found {}",
            rows.len()
        ));
    }
    Ok(())
}

#[then(r#"local task {id:i64} is titled "{title}""#)]
fn local_task_titled(world: &SyncWorld, id: i64, title: String) -> Result<(), eyre::Report> {
    let rows = local_rows(world)?;
    let row = rows
        .iter()
        .find(|row| row.id == TaskId::new(id))
        .ok_or_else(|| eyre::eyre!("no local task with id {id}"))?;
    if row.title != title {
        return Err(eyre::eyre!(
            "expected local task {id} titled {title:?}, found {:?}",
            row.title
        ));
    }
    Ok(())
}

#[then("no local task has id {id:i64}")]
fn no_local_task_with_id(world: &SyncWorld, id: i64) -> Result<(), eyre::Report> {
    if local_rows(world)?.iter().any(|row| row.id == TaskId::new(id)) {
        return Err(eyre::eyre!("local task {id} should have been replaced"));
    }
    Ok(())
}

#[then("the visible list is empty")]
fn visible_list_empty(world: &SyncWorld) -> Result<(), eyre::Report> {
    if !world.visible.is_empty() {
        return Err(eyre::eyre!(
            "expected no visible tasks, found {}",
            world.visible.len()
        ));
    }
    Ok(())
}

#[then("the visible list contains only task {id:i64}")]
fn visible_list_contains_only(world: &SyncWorld, id: i64) -> Result<(), eyre::Report> {
    let ids: Vec<TaskId> = world.visible.iter().map(|task| task.id()).collect();
    if ids != vec![TaskId::new(id)] {
        return Err(eyre::eyre!("expected only task {id}, found {ids:?}"));
    }
    Ok(())
}
