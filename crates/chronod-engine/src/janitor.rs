//! Background sweep bounding on-disk log growth.

use std::fs;
use std::io;
use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Time between sweeps once running.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Deletes log files whose modification time has fallen out of the retention
/// window. The window is supplied by the surrounding process; nothing is
/// hard-coded here.
pub struct LogJanitor {
    logs_dir: PathBuf,
    retention: Duration,
}

impl LogJanitor {
    pub fn new(logs_dir: PathBuf, retention: Duration) -> Self {
        Self {
            logs_dir,
            retention,
        }
    }

    /// Run the sweep loop until `shutdown` broadcasts `true`.
    ///
    /// The interval's first tick fires immediately, which covers the
    /// run-once-at-startup sweep.
    pub fn spawn(self, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(SWEEP_INTERVAL);
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        self.purge_old_logs();
                    }
                    _ = shutdown.changed() => {
                        if *shutdown.borrow() {
                            info!("log janitor shutting down");
                            break;
                        }
                    }
                }
            }
        })
    }

    /// One sweep with the cutoff derived from the configured retention.
    pub fn purge_old_logs(&self) -> usize {
        let cutoff = SystemTime::now()
            .checked_sub(self.retention)
            .unwrap_or(UNIX_EPOCH);
        self.purge_older_than(cutoff)
    }

    /// Delete every regular file in the log directory modified strictly
    /// before `cutoff`; a file exactly at the cutoff has not expired yet.
    /// A missing directory means nothing to purge; any other read failure is
    /// logged and the sweep skipped.
    pub fn purge_older_than(&self, cutoff: SystemTime) -> usize {
        let entries = match fs::read_dir(&self.logs_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return 0,
            Err(e) => {
                error!("failed to read logs directory: {e}");
                return 0;
            }
        };

        let mut purged = 0;
        for entry in entries.flatten() {
            let Ok(meta) = entry.metadata() else { continue };
            if !meta.is_file() {
                continue;
            }
            let Ok(modified) = meta.modified() else { continue };
            if modified < cutoff && fs::remove_file(entry.path()).is_ok() {
                purged += 1;
            }
        }

        if purged > 0 {
            info!(count = purged, "purged old log files");
        }
        purged
    }
}
