//! Single-run execution: stamp the attempt, capture output, record the
//! outcome.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;

use chrono::{Local, Utc};
use chronod_store::{Task, TaskStore};
use tokio::process::Command;
use tracing::{info, warn};

use crate::error::{EngineError, Result};
use crate::logs;

/// How a successful run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The command finished; the task stays scheduled.
    Completed,
    /// The command finished and the task was one-shot: it has been deleted
    /// from the store and its trigger must be dropped via reload.
    Consumed,
}

/// Runs one task's command and records everything about the attempt.
pub(crate) struct Executor {
    store: Arc<TaskStore>,
    logs_dir: PathBuf,
}

impl Executor {
    pub(crate) fn new(store: Arc<TaskStore>, logs_dir: PathBuf) -> Self {
        Self { store, logs_dir }
    }

    /// Execute `task` exactly once.
    ///
    /// `last_run` is stamped before anything else so a crash mid-run still
    /// shows the attempt was made; a failure to stamp it is degraded to a
    /// log line. Failing to create or open the log file aborts this run and
    /// surfaces to the caller; it never affects other tasks.
    pub(crate) async fn run(&self, task: &Task) -> Result<RunOutcome> {
        info!(task_id = task.id, task = %task.name, command = %task.command, "running task");

        if let Err(e) = self.store.update_last_run(task.id, Utc::now()) {
            warn!(task_id = task.id, task = %task.name, "failed to update last_run: {e}");
        }

        fs::create_dir_all(&self.logs_dir)?;

        let now = Local::now();
        let path = self
            .logs_dir
            .join(logs::daily_log_name(task.id, now.date_naive()));
        let mut file = OpenOptions::new().append(true).create(true).open(&path)?;

        writeln!(file, "\n--- Task {} started at {} ---", task.name, now.to_rfc3339())?;

        if task.command.is_empty() {
            writeln!(file, "--- Task {} failed: empty command ---", task.name)?;
            return Err(EngineError::EmptyCommand);
        }

        let status = shell_command(&task.command)
            .stdout(Stdio::from(file.try_clone()?))
            .stderr(Stdio::from(file.try_clone()?))
            .status()
            .await;

        let failure = match status {
            Ok(status) if status.success() => None,
            Ok(status) => Some(match status.code() {
                Some(code) => format!("exit status {code}"),
                None => "terminated by signal".to_string(),
            }),
            Err(e) => Some(format!("launch failed: {e}")),
        };

        if let Some(reason) = failure {
            writeln!(file, "--- Task {} failed: {} ---", task.name, reason)?;
            return Err(EngineError::CommandFailed(reason));
        }

        info!(task_id = task.id, task = %task.name, "task finished");
        writeln!(file, "--- Task {} finished successfully ---", task.name)?;

        if task.one_shot {
            if let Err(e) = self.store.delete_task(task.id) {
                writeln!(file, "--- Failed to delete one-shot task: {} ---", e)?;
                return Err(EngineError::Store(e));
            }
            info!(task_id = task.id, task = %task.name, "one-shot task deleted after first run");
            writeln!(file, "--- One-shot task deleted after first run ---")?;
            return Ok(RunOutcome::Consumed);
        }

        Ok(RunOutcome::Completed)
    }
}

/// Build a platform-shell invocation for `command`.
fn shell_command(command: &str) -> Command {
    #[cfg(windows)]
    {
        let mut cmd = Command::new("cmd");
        cmd.arg("/C").arg(command);
        cmd
    }
    #[cfg(not(windows))]
    {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(command);
        cmd
    }
}
