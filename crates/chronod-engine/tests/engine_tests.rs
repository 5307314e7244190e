// End-to-end behavior of the scheduling core against a real (in-memory)
// store and a real shell.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chronod_engine::{CronPlanner, Engine, EngineError, RunOutcome};
use chronod_store::{db::init_db, NewTask, StoreError, Task, TaskStore};
use rusqlite::Connection;

fn test_store() -> Arc<TaskStore> {
    let conn = Connection::open_in_memory().unwrap();
    init_db(&conn).unwrap();
    Arc::new(TaskStore::new(conn))
}

fn test_engine(store: &Arc<TaskStore>, data_dir: &Path) -> Engine {
    Engine::new(
        Arc::clone(store),
        Box::new(CronPlanner),
        data_dir,
        Duration::from_secs(48 * 3600),
    )
}

fn seed(store: &TaskStore, name: &str, schedule: &str, command: &str, enabled: bool) -> Task {
    store
        .create_task(NewTask {
            name: name.to_string(),
            schedule: schedule.to_string(),
            command: command.to_string(),
            enabled,
            one_shot: false,
        })
        .unwrap()
}

fn seed_one_shot(store: &TaskStore, name: &str, command: &str) -> Task {
    store
        .create_task(NewTask {
            name: name.to_string(),
            // Jan 1st at midnight: valid, but never fires during a test run.
            schedule: "0 0 1 1 *".to_string(),
            command: command.to_string(),
            enabled: true,
            one_shot: true,
        })
        .unwrap()
}

fn daily_log_path(data_dir: &Path, task_id: i64) -> std::path::PathBuf {
    data_dir.join("logs").join(chronod_engine::logs::daily_log_name(
        task_id,
        chrono::Local::now().date_naive(),
    ))
}

#[tokio::test]
async fn reload_registers_only_enabled_tasks() {
    let store = test_store();
    let dir = tempfile::tempdir().unwrap();
    let engine = test_engine(&store, dir.path());

    let a = seed(&store, "a", "* * * * *", "echo a", true);
    let b = seed(&store, "b", "* * * * *", "echo b", true);
    let disabled = seed(&store, "c", "* * * * *", "echo c", false);

    engine.reload();

    assert_eq!(engine.registered_task_ids(), vec![a.id, b.id]);
    assert!(!engine.has_trigger(disabled.id));
}

#[tokio::test]
async fn reload_is_idempotent() {
    let store = test_store();
    let dir = tempfile::tempdir().unwrap();
    let engine = test_engine(&store, dir.path());

    seed(&store, "a", "* * * * *", "echo a", true);
    seed(&store, "b", "*/5 * * * * *", "echo b", true);

    engine.reload();
    let first = engine.registered_task_ids();
    engine.reload();
    let second = engine.registered_task_ids();

    assert_eq!(first, second);
    assert_eq!(engine.trigger_count(), 2);
}

#[tokio::test]
async fn reload_skips_malformed_schedule() {
    let store = test_store();
    let dir = tempfile::tempdir().unwrap();
    let engine = test_engine(&store, dir.path());

    let bad = seed(&store, "bad", "definitely not cron", "echo x", true);
    let good = seed(&store, "good", "* * * * *", "echo y", true);

    engine.reload();

    assert!(!engine.has_trigger(bad.id));
    assert!(engine.has_trigger(good.id));
    assert_eq!(engine.trigger_count(), 1);
}

#[tokio::test]
async fn manual_run_records_output_and_last_run() {
    let store = test_store();
    let dir = tempfile::tempdir().unwrap();
    let engine = test_engine(&store, dir.path());

    let task = seed(&store, "t", "0 0 1 1 *", "echo hi", false);

    let outcome = engine.run_task_now(task.id).await.unwrap();
    assert_eq!(outcome, RunOutcome::Completed);

    let content = std::fs::read_to_string(daily_log_path(dir.path(), task.id)).unwrap();
    let started = content.find("--- Task t started at ").unwrap();
    let output = content.find("hi\n").unwrap();
    let finished = content.find("--- Task t finished successfully ---").unwrap();
    assert!(started < output && output < finished);

    assert!(store.get_task_by_id(task.id).unwrap().last_run.is_some());
}

#[tokio::test]
async fn empty_command_fails_but_stamps_last_run() {
    let store = test_store();
    let dir = tempfile::tempdir().unwrap();
    let engine = test_engine(&store, dir.path());

    let task = seed(&store, "empty", "0 0 1 1 *", "", false);

    let err = engine.run_task_now(task.id).await.unwrap_err();
    assert!(matches!(err, EngineError::EmptyCommand));

    let content = std::fs::read_to_string(daily_log_path(dir.path(), task.id)).unwrap();
    assert!(content.contains("--- Task empty failed: empty command ---"));

    // The attempt itself is still recorded.
    assert!(store.get_task_by_id(task.id).unwrap().last_run.is_some());
}

#[tokio::test]
async fn failing_command_reports_exit_status() {
    let store = test_store();
    let dir = tempfile::tempdir().unwrap();
    let engine = test_engine(&store, dir.path());

    let task = seed(&store, "boom", "0 0 1 1 *", "exit 3", false);

    let err = engine.run_task_now(task.id).await.unwrap_err();
    match err {
        EngineError::CommandFailed(reason) => assert!(reason.contains("exit status 3")),
        other => panic!("expected CommandFailed, got {other:?}"),
    }

    let content = std::fs::read_to_string(daily_log_path(dir.path(), task.id)).unwrap();
    assert!(content.contains("--- Task boom failed: exit status 3 ---"));
}

#[tokio::test]
async fn one_shot_task_is_consumed_after_success() {
    let store = test_store();
    let dir = tempfile::tempdir().unwrap();
    let engine = test_engine(&store, dir.path());

    let task = seed_one_shot(&store, "once", "echo once");
    engine.reload();
    assert!(engine.has_trigger(task.id));

    let outcome = engine.run_task_now(task.id).await.unwrap();
    assert_eq!(outcome, RunOutcome::Consumed);

    assert!(matches!(
        store.get_task_by_id(task.id),
        Err(StoreError::NotFound { .. })
    ));
    assert!(!engine.has_trigger(task.id));

    // A second manual attempt maps to the distinct not-found condition.
    assert!(matches!(
        engine.run_task_now(task.id).await,
        Err(EngineError::TaskNotFound { .. })
    ));

    let content = std::fs::read_to_string(daily_log_path(dir.path(), task.id)).unwrap();
    assert!(content.contains("--- One-shot task deleted after first run ---"));
}

#[tokio::test]
async fn failed_one_shot_run_keeps_the_task() {
    let store = test_store();
    let dir = tempfile::tempdir().unwrap();
    let engine = test_engine(&store, dir.path());

    let task = seed_one_shot(&store, "fragile", "exit 1");
    engine.reload();

    assert!(engine.run_task_now(task.id).await.is_err());

    // Still persisted and still scheduled for the next trigger.
    assert!(store.get_task_by_id(task.id).is_ok());
    assert!(engine.has_trigger(task.id));
}

#[tokio::test]
async fn run_task_now_unknown_id_is_not_found() {
    let store = test_store();
    let dir = tempfile::tempdir().unwrap();
    let engine = test_engine(&store, dir.path());

    assert!(matches!(
        engine.run_task_now(4242).await,
        Err(EngineError::TaskNotFound { id: 4242 })
    ));
}

#[tokio::test]
async fn scheduled_fire_appends_a_run_block() {
    let store = test_store();
    let dir = tempfile::tempdir().unwrap();
    let engine = test_engine(&store, dir.path());

    // Six-field expression: fires every second, so the test stays fast.
    let task = seed(&store, "tick", "* * * * * *", "echo hi", true);
    engine.reload();

    // Wait for the trigger to fire and the run block to land on disk.
    let path = daily_log_path(dir.path(), task.id);
    let deadline = std::time::Instant::now() + Duration::from_secs(5);
    loop {
        if let Ok(content) = std::fs::read_to_string(&path) {
            if content.contains("--- Task tick finished successfully ---") {
                break;
            }
        }
        assert!(
            std::time::Instant::now() < deadline,
            "scheduled run never produced a log block"
        );
        tokio::time::sleep(Duration::from_millis(200)).await;
    }

    engine.stop();
    assert!(store.get_task_by_id(task.id).unwrap().last_run.is_some());
}
