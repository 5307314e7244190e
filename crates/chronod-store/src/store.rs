use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use tracing::{debug, instrument};

use crate::error::{Result, StoreError};
use crate::types::{NewTask, Task};

/// Thread-safe store for persisted tasks.
///
/// Wraps a single SQLite connection in a `Mutex`, which also serialises
/// concurrent writers. The engine and the gateway share one `TaskStore`
/// behind an `Arc`.
pub struct TaskStore {
    db: Mutex<Connection>,
}

impl TaskStore {
    /// Wrap an already-open (and `init_db`-initialised) connection.
    pub fn new(conn: Connection) -> Self {
        Self {
            db: Mutex::new(conn),
        }
    }

    /// Insert a new task. Returns the fully populated record with its
    /// store-assigned `id` and `created_at`.
    #[instrument(skip(self), fields(name = %new.name))]
    pub fn create_task(&self, new: NewTask) -> Result<Task> {
        let created_at = Utc::now();
        let db = self.db.lock().unwrap();
        db.execute(
            "INSERT INTO tasks (name, schedule, command, enabled, one_shot, created_at, last_run)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, NULL)",
            rusqlite::params![
                new.name,
                new.schedule,
                new.command,
                new.enabled,
                new.one_shot,
                created_at,
            ],
        )?;
        let id = db.last_insert_rowid();
        debug!(task_id = id, "task created");

        Ok(Task {
            id,
            name: new.name,
            schedule: new.schedule,
            command: new.command,
            enabled: new.enabled,
            one_shot: new.one_shot,
            created_at,
            last_run: None,
        })
    }

    /// Return a full snapshot of all tasks.
    pub fn get_tasks(&self) -> Result<Vec<Task>> {
        let db = self.db.lock().unwrap();
        let mut stmt = db.prepare(
            "SELECT id, name, schedule, command, enabled, one_shot, created_at, last_run
             FROM tasks",
        )?;
        let rows = stmt.query_map([], row_to_task)?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    /// Fetch a single task, failing with `NotFound` when the id is absent.
    pub fn get_task_by_id(&self, id: i64) -> Result<Task> {
        let db = self.db.lock().unwrap();
        match db.query_row(
            "SELECT id, name, schedule, command, enabled, one_shot, created_at, last_run
             FROM tasks WHERE id = ?1",
            rusqlite::params![id],
            row_to_task,
        ) {
            Ok(task) => Ok(task),
            Err(rusqlite::Error::QueryReturnedNoRows) => Err(StoreError::NotFound { id }),
            Err(e) => Err(StoreError::Database(e)),
        }
    }

    /// Full-record overwrite by id. `created_at` and `last_run` are owned by
    /// the store and are not touched here.
    #[instrument(skip(self, task), fields(task_id = task.id))]
    pub fn update_task(&self, task: &Task) -> Result<()> {
        let db = self.db.lock().unwrap();
        let rows_changed = db.execute(
            "UPDATE tasks SET name=?1, schedule=?2, command=?3, enabled=?4, one_shot=?5
             WHERE id=?6",
            rusqlite::params![
                task.name,
                task.schedule,
                task.command,
                task.enabled,
                task.one_shot,
                task.id,
            ],
        )?;
        if rows_changed == 0 {
            return Err(StoreError::NotFound { id: task.id });
        }
        Ok(())
    }

    /// Stamp the last execution attempt. Called at the start of every run,
    /// success or failure.
    pub fn update_last_run(&self, id: i64, at: DateTime<Utc>) -> Result<()> {
        let db = self.db.lock().unwrap();
        db.execute(
            "UPDATE tasks SET last_run=?1 WHERE id=?2",
            rusqlite::params![at, id],
        )?;
        Ok(())
    }

    /// Delete a task. Deleting an absent id is not an error.
    #[instrument(skip(self))]
    pub fn delete_task(&self, id: i64) -> Result<()> {
        let db = self.db.lock().unwrap();
        db.execute("DELETE FROM tasks WHERE id=?1", rusqlite::params![id])?;
        Ok(())
    }
}

/// Map a SQLite row to a `Task`.
fn row_to_task(row: &rusqlite::Row<'_>) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get(0)?,
        name: row.get(1)?,
        schedule: row.get(2)?,
        command: row.get(3)?,
        enabled: row.get(4)?,
        one_shot: row.get(5)?,
        created_at: row.get(6)?,
        last_run: row.get(7)?,
    })
}
