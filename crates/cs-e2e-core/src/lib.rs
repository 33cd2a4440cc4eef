//! Test infrastructure for end-to-end suites against the Content Sources
//! service.
//!
//! - [`poll`]: bounded waiting for asynchronous server-side work
//! - [`auth`]: per-persona JWT lifecycle and the identity header
//! - [`api`]: typed REST client with rate-limit retry
//! - [`cleanup`]: per-test teardown registry and search-then-delete helpers
//! - [`fixtures`]: configuration, the test context and data helpers

pub mod api;
pub mod auth;
pub mod cleanup;
pub mod fixtures;
pub mod models;
pub mod poll;

pub use api::{ApiClient, ApiError};
pub use auth::{Persona, TokenManager, TokenStatus};
pub use cleanup::CleanupRegistry;
pub use fixtures::{HarnessConfig, TestContext};
pub use poll::{poll, PollOptions, PollTimeout};
