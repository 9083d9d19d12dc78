//! Headless demo that drives a task session over the in-memory adapters.
//!
//! Usage:
//!
//! ```text
//! tasksync-demo [--add <TITLE>]... [--search <TEXT>] [--status <STATUS>]
//!               [--offline] [--remote-latency-ms <MS>] [--no-samples]
//! ```
//!
//! The simulated remote starts with three sample tasks. The demo starts a
//! session, applies the requested mutations and filters, waits for the
//! search debounce and sync banner to settle, then logs the visible list.

use clap::Parser;
use mockable::DefaultClock;
use std::process::ExitCode;
use std::sync::Arc;
use tasksync::config::{AppConfig, CliArgs};
use tasksync::session::{SessionEvent, SessionHandle, TaskSession, ViewState};
use tasksync::task::adapters::memory::{InMemoryLocalTaskStore, InMemoryRemoteTaskService};
use tasksync::task::domain::{Task, TaskStatus, TaskTitle};
use tasksync::telemetry::init_tracing;
use tracing::{error, info, warn};

#[derive(Debug, Parser)]
#[command(name = "tasksync-demo", about = "Offline-first task sync demo")]
struct DemoArgs {
    #[command(flatten)]
    config: CliArgs,

    /// Add a task with this title; may be repeated.
    #[arg(long = "add", value_name = "TITLE")]
    add: Vec<String>,

    /// Search text applied after the debounce window.
    #[arg(long)]
    search: Option<String>,

    /// Show only tasks with this status (`UNDONE`, `DOING`, `DONE`).
    #[arg(long, value_parser = parse_status)]
    status: Option<TaskStatus>,

    /// Start the simulated remote without sample tasks.
    #[arg(long)]
    no_samples: bool,
}

fn parse_status(value: &str) -> Result<TaskStatus, String> {
    TaskStatus::try_from(value.to_ascii_uppercase().as_str()).map_err(|err| err.to_string())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = DemoArgs::parse();
    let (config, config_error) = match AppConfig::load(&args.config) {
        Ok(config) => (config, None),
        Err(err) => (AppConfig::default(), Some(err)),
    };

    if let Err(err) = init_tracing(&config.log_level) {
        report_without_tracing(&err);
        return ExitCode::FAILURE;
    }
    if let Some(err) = config_error {
        error!(error = %err, "failed to load configuration");
        return ExitCode::FAILURE;
    }

    match run(args, config).await {
        Ok(state) => {
            log_state(&state);
            ExitCode::SUCCESS
        }
        Err(message) => {
            error!(error = %message, "demo failed");
            ExitCode::FAILURE
        }
    }
}

#[expect(
    clippy::print_stderr,
    reason = "no subscriber is installed when tracing setup fails"
)]
fn report_without_tracing(err: &dyn std::error::Error) {
    eprintln!("tasksync-demo: {err}");
}

async fn run(args: DemoArgs, config: AppConfig) -> Result<ViewState, String> {
    let clock = Arc::new(DefaultClock);
    let local = Arc::new(InMemoryLocalTaskStore::new());

    let remote = Arc::new(
        InMemoryRemoteTaskService::new(Arc::clone(&clock)).with_latency(config.remote.latency),
    );
    if !args.no_samples {
        remote.seed_samples().map_err(|err| err.to_string())?;
    }
    remote.set_offline(config.remote.offline);

    let session_config = config.session.clone();
    let handle = TaskSession::new(local, remote, Arc::clone(&clock), config.session).start();

    for title in &args.add {
        match TaskTitle::new(title.as_str()) {
            Ok(valid) => send(&handle, SessionEvent::AddTask(Task::new(valid, &*clock))).await?,
            Err(err) => warn!(title = %title, error = %err, "skipping task with invalid title"),
        }
    }
    if let Some(status) = args.status {
        send(&handle, SessionEvent::StatusFilterChanged(Some(status))).await?;
    }
    if let Some(query) = args.search {
        send(&handle, SessionEvent::SearchQueryChanged(query)).await?;
    }

    let settle = session_config.search_debounce
        + session_config.sync_banner
        + config.remote.latency.saturating_mul(4);
    tokio::time::sleep(settle).await;

    let mut state = handle.state();
    let settled = state
        .wait_for(|view| !view.is_loading)
        .await
        .map(|view| view.clone())
        .map_err(|err| err.to_string())?;

    handle.shutdown().await.map_err(|err| err.to_string())?;
    Ok(settled)
}

async fn send(handle: &SessionHandle, event: SessionEvent) -> Result<(), String> {
    handle.send(event).await.map_err(|err| err.to_string())
}

fn log_state(state: &ViewState) {
    info!(
        sync_status = ?state.sync_status,
        visible = state.tasks.len(),
        total = state.all_tasks.len(),
        error = state.error_message.as_deref().unwrap_or(""),
        "session settled"
    );
    for task in &state.tasks {
        info!(
            task_id = %task.id(),
            title = %task.title(),
            status = task.status().as_str(),
            priority = task.priority().as_str(),
            "task"
        );
    }
}
