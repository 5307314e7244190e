use rusqlite::Connection;

use crate::error::Result;

/// Initialise the task schema in `conn`.
///
/// Idempotent. Databases created before the `one_shot` column existed are
/// migrated in place via `ALTER TABLE`.
pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS tasks (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            name        TEXT    NOT NULL,
            schedule    TEXT    NOT NULL,   -- cron expression, 5 or 6 fields
            command     TEXT    NOT NULL,
            enabled     BOOLEAN NOT NULL DEFAULT 0,
            one_shot    BOOLEAN NOT NULL DEFAULT 0,
            created_at  TEXT    NOT NULL,   -- RFC 3339
            last_run    TEXT                -- RFC 3339 or NULL (never run)
        );
        ",
    )?;

    if !has_column(conn, "tasks", "one_shot")? {
        conn.execute_batch("ALTER TABLE tasks ADD COLUMN one_shot BOOLEAN NOT NULL DEFAULT 0;")?;
    }

    Ok(())
}

/// Probe `PRAGMA table_info` for a column, so migrations stay idempotent.
fn has_column(conn: &Connection, table: &str, column: &str) -> Result<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table})"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        if name == column {
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_db_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        init_db(&conn).unwrap();
        init_db(&conn).unwrap();
        assert!(has_column(&conn, "tasks", "one_shot").unwrap());
    }

    #[test]
    fn init_db_migrates_pre_one_shot_schema() {
        let conn = Connection::open_in_memory().unwrap();
        // Simulate a database created before one_shot existed.
        conn.execute_batch(
            "CREATE TABLE tasks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                schedule TEXT NOT NULL,
                command TEXT NOT NULL,
                enabled BOOLEAN NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                last_run TEXT
            );",
        )
        .unwrap();
        assert!(!has_column(&conn, "tasks", "one_shot").unwrap());

        init_db(&conn).unwrap();
        assert!(has_column(&conn, "tasks", "one_shot").unwrap());
    }
}
