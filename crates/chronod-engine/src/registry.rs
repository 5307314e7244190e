//! The in-memory registry of live triggers.

use std::collections::HashMap;
use std::sync::Mutex;

use tokio::task::JoinHandle;

/// Opaque handle to one live trigger. Cancelling aborts the spawned timer
/// task; a firing already in flight runs to completion.
pub struct TriggerHandle {
    task: JoinHandle<()>,
}

impl TriggerHandle {
    pub(crate) fn new(task: JoinHandle<()>) -> Self {
        Self { task }
    }

    pub fn cancel(&self) {
        self.task.abort();
    }
}

/// The authoritative view of what is currently scheduled, separate from what
/// is persisted.
///
/// Entries are destroyed and rebuilt wholesale on every reload — never
/// partially patched. The single exclusive lock is held only across the
/// cancel/clear/install sequence, never during command execution or store
/// I/O, so an in-flight run can never block a reload (or vice versa).
pub struct Registry {
    entries: Mutex<HashMap<i64, TriggerHandle>>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Cancel every live trigger and install `next` in its place, all under
    /// one lock acquisition.
    pub fn install(&self, next: HashMap<i64, TriggerHandle>) {
        let mut entries = self.entries.lock().unwrap();
        for (_, handle) in entries.drain() {
            handle.cancel();
        }
        *entries = next;
    }

    pub fn contains(&self, id: i64) -> bool {
        self.entries.lock().unwrap().contains_key(&id)
    }

    /// Registered task ids, sorted for stable comparisons.
    pub fn task_ids(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self.entries.lock().unwrap().keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
