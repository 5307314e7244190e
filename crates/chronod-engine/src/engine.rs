//! Scheduler: keeps the registry in sync with the store and exposes the
//! manual "run now" path.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use chronod_store::{StoreError, Task, TaskStore};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::error::{EngineError, Result};
use crate::executor::{Executor, RunOutcome};
use crate::janitor::LogJanitor;
use crate::logs;
use crate::registry::{Registry, TriggerHandle};
use crate::trigger::{FirePlan, SchedulePlanner};

/// Cheap-to-clone handle to the scheduling core. Trigger tasks each hold a
/// clone so a firing can reach the executor and request a reload.
#[derive(Clone)]
pub struct Engine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    store: Arc<TaskStore>,
    planner: Box<dyn SchedulePlanner>,
    registry: Registry,
    executor: Executor,
    logs_dir: PathBuf,
    retention: Duration,
}

/// Everything one trigger needs to fire, copied by value at registration
/// time so entries never alias each other.
struct TriggerContext {
    task: Task,
}

impl Engine {
    pub fn new(
        store: Arc<TaskStore>,
        planner: Box<dyn SchedulePlanner>,
        data_dir: impl Into<PathBuf>,
        retention: Duration,
    ) -> Self {
        let logs_dir = logs::logs_dir(&data_dir.into());
        Self {
            inner: Arc::new(EngineInner {
                executor: Executor::new(Arc::clone(&store), logs_dir.clone()),
                store,
                planner,
                registry: Registry::new(),
                logs_dir,
                retention,
            }),
        }
    }

    /// Perform the initial reload and start the log janitor. Trigger tasks
    /// clock themselves on the tokio runtime; there is no extra ticker to
    /// start.
    pub fn start(&self, shutdown: watch::Receiver<bool>) {
        info!("scheduler engine started");
        self.reload();
        LogJanitor::new(self.inner.logs_dir.clone(), self.inner.retention).spawn(shutdown);
    }

    /// Rebuild the live trigger set from the store.
    ///
    /// The store snapshot is read without holding the registry lock; the
    /// lock covers only the cancel/clear/install swap inside
    /// [`Registry::install`]. A malformed schedule expression excludes that
    /// one task (logged), everything else still gets scheduled. Safe to call
    /// concurrently with itself and with trigger firings.
    pub fn reload(&self) {
        let tasks = match self.inner.store.get_tasks() {
            Ok(tasks) => tasks,
            Err(e) => {
                error!("failed to load tasks: {e}");
                self.inner.registry.install(HashMap::new());
                return;
            }
        };

        let mut next = HashMap::new();
        for task in tasks.into_iter().filter(|t| t.enabled) {
            match self.inner.planner.parse(&task.schedule) {
                Ok(plan) => {
                    let id = task.id;
                    let handle = spawn_trigger(self.clone(), TriggerContext { task }, plan);
                    next.insert(id, handle);
                }
                Err(e) => {
                    warn!(task_id = task.id, task = %task.name, "failed to schedule task: {e}");
                }
            }
        }

        let count = next.len();
        self.inner.registry.install(next);
        debug!(count, "registry rebuilt");
    }

    /// Full reconciliation on any change; there is no partial patch path.
    pub fn refresh_task(&self, _id: i64) {
        self.reload();
    }

    /// Run a task immediately in the caller's context, blocking until the
    /// command finishes. The store is consulted directly — never the
    /// registry — so disabled tasks can still be run by hand.
    pub async fn run_task_now(&self, id: i64) -> Result<RunOutcome> {
        let task = self.inner.store.get_task_by_id(id).map_err(|e| match e {
            StoreError::NotFound { id } => EngineError::TaskNotFound { id },
            other => EngineError::Store(other),
        })?;
        self.run_task(&task).await
    }

    /// Cancel every live trigger. The janitor stops via its shutdown channel.
    pub fn stop(&self) {
        self.inner.registry.install(HashMap::new());
    }

    pub fn has_trigger(&self, id: i64) -> bool {
        self.inner.registry.contains(id)
    }

    pub fn registered_task_ids(&self) -> Vec<i64> {
        self.inner.registry.task_ids()
    }

    pub fn trigger_count(&self) -> usize {
        self.inner.registry.len()
    }

    /// Execute one run and reconcile afterwards when the run consumed a
    /// one-shot task.
    async fn run_task(&self, task: &Task) -> Result<RunOutcome> {
        let outcome = self.inner.executor.run(task).await?;
        if matches!(outcome, RunOutcome::Consumed) {
            // The task is gone from the store; drop its live trigger too.
            self.reload();
        }
        Ok(outcome)
    }
}

/// Spawn the timer task for one registry entry.
///
/// Each firing is detached onto its own task, so a long-running command
/// never delays the next scheduled slot, other tasks, or a manual run.
fn spawn_trigger(engine: Engine, ctx: TriggerContext, plan: Box<dyn FirePlan>) -> TriggerHandle {
    TriggerHandle::new(tokio::spawn(async move {
        loop {
            let now = Utc::now();
            let Some(at) = plan.next_fire_after(now) else {
                debug!(task_id = ctx.task.id, "schedule exhausted, trigger retiring");
                break;
            };
            let delay = (at - now).to_std().unwrap_or_default();
            tokio::time::sleep(delay).await;

            let engine = engine.clone();
            let task = ctx.task.clone();
            tokio::spawn(async move {
                if let Err(e) = engine.run_task(&task).await {
                    warn!(task_id = task.id, task = %task.name, "task run failed: {e}");
                }
            });
        }
    }))
}
