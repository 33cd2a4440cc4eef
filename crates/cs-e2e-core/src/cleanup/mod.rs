//! Teardown of server-side resources created by tests.

mod registry;
mod search;

pub use registry::{CleanupHandle, CleanupRegistry};
pub use search::{cleanup_repositories, cleanup_templates, wait_for_completed_tasks, CleanupSummary};
