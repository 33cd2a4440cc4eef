//! Per-test fixtures: configuration, the test context, and the data helpers
//! tests draw on.

mod config;
mod context;
mod coverage;
mod db;
mod random;
mod repo_urls;

pub use config::{ConfigError, HarnessConfig};
pub use context::TestContext;
pub use coverage::{sanitize_title, CoverageSink, COVERAGE_DIR};
pub use db::Database;
pub use random::{random_name, random_url, FIXTURE_BASE_URL};
pub use repo_urls::{centirepo_url, worker_range, UnusedRepoUrls, TOTAL_FIXTURE_REPOS};
