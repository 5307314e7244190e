use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A persisted task record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Positive integer primary key, assigned by the store on creation.
    pub id: i64,
    /// Human-readable label, free text.
    pub name: String,
    /// Cron-style expression, five or six whitespace-separated fields.
    /// Validity is only checked when the task is registered for live
    /// scheduling; a malformed expression excludes the task, nothing more.
    pub schedule: String,
    /// Shell command line, run verbatim through the platform shell.
    pub command: String,
    /// Whether the task participates in live scheduling.
    pub enabled: bool,
    /// Deleted from the store after its first successful run.
    pub one_shot: bool,
    /// Set once at creation, immutable thereafter.
    pub created_at: DateTime<Utc>,
    /// Stamped at the start of every execution attempt; None = never run.
    pub last_run: Option<DateTime<Utc>>,
}

/// Creation payload — the store assigns `id` and `created_at`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTask {
    pub name: String,
    pub schedule: String,
    pub command: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub one_shot: bool,
}
