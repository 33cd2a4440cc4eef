//! Everything a test needs, bundled and owned per test.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use anyhow::Result;
use futures::FutureExt;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{error, info};

use super::{CoverageSink, Database, HarnessConfig, UnusedRepoUrls};
use crate::api::ApiClient;
use crate::auth::{AuthStateStore, BrowserContext, Persona, TokenCache, TokenManager};
use crate::cleanup::CleanupRegistry;

pub struct TestContext {
    config: HarnessConfig,
    client: ApiClient,
    tokens: TokenManager,
    cleanup: CleanupRegistry,
    db: Database,
    coverage: CoverageSink,
    repo_urls: Mutex<UnusedRepoUrls>,
}

impl TestContext {
    /// Read configuration and persona tokens from the environment
    pub fn from_env() -> Result<Self> {
        let config = HarnessConfig::from_env()?;
        Self::new(config, TokenCache::from_env())
    }

    pub fn new(config: HarnessConfig, tokens: TokenCache) -> Result<Self> {
        let client = ApiClient::from_config(&config)?;
        let manager = TokenManager::new(Arc::new(tokens), AuthStateStore::new(&config.auth_dir))
            .with_buffer(config.token_refresh_buffer);
        let repo_urls = UnusedRepoUrls::new(client.clone(), config.workers, config.worker_index);

        Ok(Self {
            client,
            tokens: manager,
            cleanup: CleanupRegistry::new(),
            db: Database::new(config.db_connection_string.clone()),
            coverage: CoverageSink::in_working_dir(config.coverage),
            repo_urls: Mutex::new(repo_urls),
            config,
        })
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Client authenticated with the configured identity header
    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn tokens(&self) -> &TokenManager {
        &self.tokens
    }

    pub fn cleanup(&self) -> &CleanupRegistry {
        &self.cleanup
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn coverage(&self) -> &CoverageSink {
        &self.coverage
    }

    /// Client carrying `persona`'s cached bearer token, if it has one
    pub async fn client_for(&self, persona: Persona) -> Option<ApiClient> {
        self.tokens
            .token(persona)
            .await
            .map(|token| self.client.with_token(&token))
    }

    /// Fixture repository URL from this worker's slice that the org has not
    /// added yet
    pub async fn unused_repo_url(&self) -> Result<String> {
        self.repo_urls.lock().await.next().await
    }

    /// Per-test token check; see [`TokenManager::prepare_for_test`]
    pub async fn prepare_tokens(
        &self,
        test_name: &str,
        storage_state: Option<&str>,
        browser: &dyn BrowserContext,
    ) -> Option<String> {
        self.tokens
            .prepare_for_test(test_name, storage_state, browser)
            .await
    }

    pub fn record_coverage(&self, test_name: &str, coverage: &Value) {
        self.coverage.write(test_name, coverage);
    }

    /// Run a test body, then the registered cleanups.
    ///
    /// Cleanups run whether the body returns, fails or panics. A body panic is
    /// resumed after cleanup; a body error takes precedence over a cleanup
    /// error.
    pub async fn run_test<'a, F, Fut, T>(&'a self, test_name: &str, body: F) -> Result<T>
    where
        F: FnOnce(&'a TestContext) -> Fut,
        Fut: Future<Output = Result<T>> + 'a,
    {
        info!(test = test_name, "Running test");
        let outcome = AssertUnwindSafe(body(self)).catch_unwind().await;
        let cleanup = self.cleanup.run_all().await;

        match outcome {
            Err(panic) => {
                if let Err(e) = cleanup {
                    error!(test = test_name, error = %e, "Post-test cleanup failed");
                }
                std::panic::resume_unwind(panic)
            }
            Ok(Err(e)) => {
                if let Err(cleanup_err) = cleanup {
                    error!(test = test_name, error = %cleanup_err, "Post-test cleanup failed");
                }
                Err(e)
            }
            Ok(Ok(value)) => cleanup.map(|()| value),
        }
    }
}
