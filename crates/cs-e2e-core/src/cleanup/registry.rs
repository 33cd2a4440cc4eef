//! Per-test registry of async cleanup callbacks.
//!
//! Tests register teardown work as they create server-side resources.
//! [`CleanupRegistry::run_all`] fires every registered callback once,
//! concurrently, whatever the outcome of the test body.

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{anyhow, Result};
use futures::future::{join_all, BoxFuture};
use futures::FutureExt;
use tracing::{debug, warn};

type CleanupFn = Box<dyn FnOnce() -> BoxFuture<'static, Result<()>> + Send>;

/// Handle returned by [`CleanupRegistry::add`], used to deregister
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CleanupHandle(u64);

#[derive(Default)]
struct Inner {
    next_id: AtomicU64,
    callbacks: Mutex<BTreeMap<u64, CleanupFn>>,
}

/// Cheap to clone; clones share the same callbacks.
#[derive(Clone, Default)]
pub struct CleanupRegistry {
    inner: Arc<Inner>,
}

impl fmt::Debug for CleanupRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CleanupRegistry")
            .field("pending", &self.len())
            .finish()
    }
}

impl CleanupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn callbacks(&self) -> MutexGuard<'_, BTreeMap<u64, CleanupFn>> {
        // A panicking callback cannot leave the map half-updated
        self.inner
            .callbacks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register `f` to run at teardown
    pub fn add<F, Fut>(&self, f: F) -> CleanupHandle
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.callbacks().insert(id, Box::new(move || f().boxed()));
        debug!(handle = id, "Registered cleanup");
        CleanupHandle(id)
    }

    /// Run `f` now, then register it for teardown as well.
    ///
    /// Typically used to remove leftovers of an earlier failed run before the
    /// test recreates them. An error from the upfront run is returned and
    /// nothing is registered.
    pub async fn run_and_add<F, Fut>(&self, f: F) -> Result<CleanupHandle>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        f().await?;
        Ok(self.add(f))
    }

    /// Deregister a callback. Returns false if it was already removed or run.
    pub fn remove(&self, handle: CleanupHandle) -> bool {
        self.callbacks().remove(&handle.0).is_some()
    }

    pub fn len(&self) -> usize {
        self.callbacks().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run every registered callback concurrently and empty the registry.
    ///
    /// All callbacks run even if some fail; the failures are logged and
    /// reported together.
    pub async fn run_all(&self) -> Result<()> {
        let callbacks = std::mem::take(&mut *self.callbacks());
        if callbacks.is_empty() {
            return Ok(());
        }

        debug!(count = callbacks.len(), "Running post-test cleanup");
        let results = join_all(callbacks.into_values().map(|f| f())).await;

        let failures: Vec<String> = results
            .into_iter()
            .filter_map(Result::err)
            .map(|e| {
                warn!(error = %e, "Cleanup failed");
                format!("{:#}", e)
            })
            .collect();

        if failures.is_empty() {
            Ok(())
        } else {
            Err(anyhow!(
                "{} cleanup callback(s) failed: {}",
                failures.len(),
                failures.join("; ")
            ))
        }
    }
}
