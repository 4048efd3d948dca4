//! `dailytask`: daily recovery tasks from the command line.
//!
//! Configuration via CLI flags, environment variables, or config file
//! (`~/.config/dailytask/config.toml`).
//!
//! ```bash
//! # What does the classifier make of this?
//! cargo run --bin dailytask -- classify --text "I am craving a drink"
//!
//! # Ask for a task matching your mood
//! cargo run --bin dailytask -- suggest --text "so stressed today"
//!
//! # List pending tasks and prove one
//! DAILYTASK_USER_ID=6650f0 cargo run --bin dailytask -- tasks
//! DAILYTASK_USER_ID=6650f0 cargo run --bin dailytask -- submit \
//!     --task-id task_1a2b3c4d --photo ./proof.jpg
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing_appender::non_blocking::WorkerGuard;

use dailytask::api::http::HttpTaskApi;
use dailytask::api::{ApiError, Photo};
use dailytask::classifier::IssueClassifier;
use dailytask::config::{CliArgs, ClientConfig, Command, ConfigError};
use dailytask::session::Session;
use dailytask::workflow::{SubmitOutcome, WorkflowController, WorkflowError, WorkflowEvent};
use dailytask_proto::task::{TaskDescriptor, TaskId};

/// Errors that end a command.
#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    #[error("cannot read photo {path}: {source}")]
    Photo {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("no user id configured (use --user-id or DAILYTASK_USER_ID)")]
    MissingUser,

    #[error("no command given, see --help")]
    MissingCommand,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = CliArgs::parse();

    // Logs go to a file so stdout carries only command output.
    let _log_guard = init_logging(&cli.log_level, cli.log_file.as_deref());
    tracing::info!("dailytask starting");

    let result = match ClientConfig::load(&cli) {
        Ok(config) => run(cli.command, &config).await,
        Err(e) => Err(e.into()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Initialize file-based logging.
///
/// Returns a [`WorkerGuard`] that must be held until shutdown to ensure all
/// buffered log entries are flushed.
fn init_logging(level: &str, file_path: Option<&Path>) -> Option<WorkerGuard> {
    let default_path = std::env::temp_dir().join("dailytask.log");
    let log_path = file_path.unwrap_or(&default_path);

    let log_dir = log_path.parent()?;
    let file_name = log_path.file_name()?.to_str()?;

    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(env_filter)
        .with_ansi(false)
        .init();

    Some(guard)
}

async fn run(command: Option<Command>, config: &ClientConfig) -> Result<(), CliError> {
    let command = command.ok_or(CliError::MissingCommand)?;

    if let Command::Classify { text } = &command {
        let tags = IssueClassifier::new(config.keyword_rules.clone()).classify(text);
        let names: Vec<&str> = tags.iter().map(|t| t.as_str()).collect();
        println!("{}", names.join(", "));
        return Ok(());
    }

    let api = HttpTaskApi::new(&config.base_url, config.request_timeout)?;
    let (controller, events) = WorkflowController::new(Arc::new(api), config.workflow_config());
    let log_task = tokio::spawn(log_events(events));

    let result = match command {
        Command::Classify { .. } => Ok(()),
        Command::Tasks => list_tasks(&controller, &session(config)?).await,
        Command::Suggest { text: Some(text) } => {
            let task = controller.request_task(&text).await?;
            print_task(&task);
            Ok(())
        }
        Command::Suggest { text: None } => {
            let task = controller.suggest_for_user(&session(config)?).await?;
            print_task(&task);
            Ok(())
        }
        Command::Submit { task_id, photo } => {
            submit(&controller, &session(config)?, TaskId::new(task_id), &photo).await
        }
    };

    if let Some(notice) = controller.last_notice() {
        tracing::debug!(text = %notice.text, "last notice");
    }
    drop(controller);
    finish_event_log(log_task).await;
    result
}

fn session(config: &ClientConfig) -> Result<Session, CliError> {
    config.session().ok_or(CliError::MissingUser)
}

async fn list_tasks(
    controller: &WorkflowController<HttpTaskApi>,
    session: &Session,
) -> Result<(), CliError> {
    controller.refresh(session).await?;
    let tasks = controller.pending_tasks();
    if tasks.is_empty() {
        println!("No pending tasks.");
    }
    for task in &tasks {
        print_task(task);
    }
    let streak = controller.streak();
    println!("Streak: {} day(s)", streak.count);
    if let Some(badge) = streak.latest_badge() {
        println!("Latest badge: {}", badge.badge);
    }
    Ok(())
}

async fn submit(
    controller: &WorkflowController<HttpTaskApi>,
    session: &Session,
    task_id: TaskId,
    path: &Path,
) -> Result<(), CliError> {
    let photo = Photo::from_path(path)
        .await
        .map_err(|source| CliError::Photo {
            path: path.to_path_buf(),
            source,
        })?;

    // The task must be listed before a proof can be submitted for it.
    controller.refresh(session).await?;

    match controller.submit_proof(session, &task_id, photo).await? {
        SubmitOutcome::Verified { message, .. } => println!("{message}"),
        SubmitOutcome::Rejected { reason } => println!("Rejected: {reason}"),
        SubmitOutcome::Discarded => println!("Task was dismissed; result ignored."),
    }
    Ok(())
}

fn print_task(task: &TaskDescriptor) {
    println!(
        "{}  [{}] {} ({}, badge: {})",
        task.task_id, task.status, task.title, task.difficulty, task.badge
    );
    if let Some(feedback) = &task.feedback {
        println!("    feedback: {feedback}");
    }
}

/// Writes workflow events to the log until the controller is dropped.
async fn log_events(mut events: mpsc::Receiver<WorkflowEvent>) {
    while let Some(event) = events.recv().await {
        tracing::debug!(?event, "workflow event");
    }
}

/// Waits for the event logger to drain. Returns `false` if it panicked or
/// was cancelled.
async fn finish_event_log(task: JoinHandle<()>) -> bool {
    match task.await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "event logger task failed");
            false
        }
    }
}
