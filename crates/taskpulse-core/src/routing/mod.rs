//! Routing - タスク名からキューを解決する
//!
//! - **resolver**: dotted-name wildcard resolution (`a.b.c` → `a.b.*` → `a.*`)
//! - **table**: routing snapshot merged from worker configurations
//! - **attribution**: first-writer-wins `task name → queue` table

mod attribution;
mod resolver;
mod table;

pub use attribution::QueueAttribution;
pub use resolver::{candidates, resolve_queue};
pub use table::{QueueBinding, RoutingTable, WorkerConf};
