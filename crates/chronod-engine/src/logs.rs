//! Log file naming and readback.
//!
//! New runs always append to a per-day file, `task_<id>_<YYYYMMDD>.log`, so
//! repeated runs on the same day share a file while different days split.
//! Older deployments wrote a single `task_<id>.log`; those files are still
//! readable and their content logically precedes every per-day file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

pub const LOGS_SUBDIR: &str = "logs";

/// The logs directory under a data dir.
pub fn logs_dir(data_dir: &Path) -> PathBuf {
    data_dir.join(LOGS_SUBDIR)
}

/// Per-day log file name for one task.
pub fn daily_log_name(task_id: i64, day: NaiveDate) -> String {
    format!("task_{}_{}.log", task_id, day.format("%Y%m%d"))
}

/// Legacy single-file name; read-only, new runs never write it.
pub fn legacy_log_name(task_id: i64) -> String {
    format!("task_{task_id}.log")
}

/// Read back all recorded output for a task: legacy file first, then every
/// per-day file in ascending filename order (which for the YYYYMMDD key is
/// date order). Returns `None` when no log exists, including when the
/// directory itself is missing.
pub fn read_task_log(logs_dir: &Path, task_id: i64) -> io::Result<Option<String>> {
    let entries = match fs::read_dir(logs_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };

    // Match on the exact "task_<id>_" prefix so task 1 never picks up
    // task 10's files.
    let prefix = format!("task_{task_id}_");
    let mut daily: Vec<PathBuf> = entries
        .flatten()
        .filter(|entry| {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            name.starts_with(&prefix) && name.ends_with(".log")
        })
        .map(|entry| entry.path())
        .collect();
    daily.sort();

    let mut paths = Vec::with_capacity(daily.len() + 1);
    let legacy = logs_dir.join(legacy_log_name(task_id));
    if legacy.is_file() {
        paths.push(legacy);
    }
    paths.extend(daily);

    if paths.is_empty() {
        return Ok(None);
    }

    let mut out = String::new();
    for path in paths {
        // A file removed mid-read (janitor pass) is skipped, not fatal.
        if let Ok(content) = fs::read_to_string(&path) {
            out.push_str(&content);
        }
    }
    Ok(Some(out))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn daily_name_embeds_task_and_date() {
        let day = NaiveDate::from_ymd_opt(2026, 2, 12).unwrap();
        assert_eq!(daily_log_name(3, day), "task_3_20260212.log");
        assert_eq!(legacy_log_name(3), "task_3.log");
    }

    #[test]
    fn readback_puts_legacy_before_daily() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("task_3.log"), "legacy\n").unwrap();
        fs::write(dir.path().join("task_3_20260212.log"), "daily\n").unwrap();

        let content = read_task_log(dir.path(), 3).unwrap().unwrap();
        assert_eq!(content, "legacy\ndaily\n");
    }

    #[test]
    fn readback_orders_daily_files_by_date() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("task_7_20260213.log"), "second\n").unwrap();
        fs::write(dir.path().join("task_7_20260212.log"), "first\n").unwrap();

        let content = read_task_log(dir.path(), 7).unwrap().unwrap();
        assert_eq!(content, "first\nsecond\n");
    }

    #[test]
    fn readback_does_not_mix_tasks_with_id_prefix_overlap() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("task_1_20260212.log"), "one\n").unwrap();
        fs::write(dir.path().join("task_10_20260212.log"), "ten\n").unwrap();

        let content = read_task_log(dir.path(), 1).unwrap().unwrap();
        assert_eq!(content, "one\n");
    }

    #[test]
    fn readback_missing_dir_or_files_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_task_log(&dir.path().join("absent"), 1)
            .unwrap()
            .is_none());
        assert!(read_task_log(dir.path(), 1).unwrap().is_none());
    }
}
