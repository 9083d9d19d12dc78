//! When steps for offline sync BDD scenarios.

use super::world::{SyncWorld, run_async};
use eyre::WrapErr;
use rstest_bdd_macros::when;
use tasksync::session::visible_tasks;
use tasksync::task::domain::{Task, TaskStatus, TaskTitle, first_outcome};

fn refresh_visible(world: &mut SyncWorld) -> Result<(), eyre::Report> {
    let records = world.local.records().wrap_err("read local store")?;
    let tasks = records
        .into_iter()
        .map(Task::try_from)
        .collect::<Result<Vec<_>, _>>()
        .wrap_err("decode local rows")?;
    world.visible = visible_tasks(&tasks, "", world.status_filter, None);
    Ok(())
}

#[when(r#"a task titled "{title}" is added"#)]
fn add_task(world: &mut SyncWorld, title: String) -> Result<(), eyre::Report> {
    let valid = TaskTitle::new(title).wrap_err("valid task title")?;
    let task = Task::new(valid, &*world.clock);
    world.last_add = Some(run_async(first_outcome(world.mutations().add(task))));
    Ok(())
}

#[when("the tasks are synced")]
fn sync_tasks(world: &mut SyncWorld) {
    world.last_sync = Some(run_async(first_outcome(world.sync_service().sync())));
}

#[when(r#"the visible list is filtered by status "{status}""#)]
fn filter_by_status(world: &mut SyncWorld, status: String) -> Result<(), eyre::Report> {
    let parsed = TaskStatus::try_from(status.as_str()).wrap_err("known status")?;
    world.status_filter = Some(parsed);
    refresh_visible(world)
}

#[when("the status filter is cleared")]
fn clear_status_filter(world: &mut SyncWorld) -> Result<(), eyre::Report> {
    world.status_filter = None;
    refresh_visible(world)
}
