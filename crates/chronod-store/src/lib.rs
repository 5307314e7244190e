//! `chronod-store` — durable record of task definitions.
//!
//! Tasks are persisted to a SQLite `tasks` table. The store serialises
//! concurrent writers behind a `Mutex<Connection>`; callers hold only
//! transient `Task` copies read at reload or run time. `id` and `created_at`
//! are assigned here on creation and never change afterwards.

pub mod db;
pub mod error;
pub mod store;
pub mod types;

pub use error::{Result, StoreError};
pub use store::TaskStore;
pub use types::{NewTask, Task};
