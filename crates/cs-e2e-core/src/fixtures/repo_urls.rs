//! Picks fixture repository URLs not yet registered in the org.
//!
//! A hundred small "centirepo" fixtures exist. Parallel workers each get their
//! own slice of them, so two workers never race to add the same URL.

use std::collections::HashSet;
use std::ops::RangeInclusive;

use anyhow::{bail, Context, Result};
use rand::Rng;
use tracing::{debug, error};

use crate::api::ApiClient;
use crate::models::ListRepositoriesParams;

pub const TOTAL_FIXTURE_REPOS: usize = 100;

const CENTIREPO_BASE_URL: &str = "https://content-services.github.io/fixtures/yum/centirepos";

/// URL of fixture repository `number` (1-based, zero padded to two digits)
pub fn centirepo_url(number: usize) -> String {
    format!("{}/repo{:02}/", CENTIREPO_BASE_URL, number)
}

/// The slice of fixture numbers owned by `worker_index`
pub fn worker_range(workers: usize, worker_index: usize) -> RangeInclusive<usize> {
    let workers = workers.max(1);
    let per_worker = TOTAL_FIXTURE_REPOS.div_ceil(workers);
    let start = worker_index * per_worker + 1;
    let end = ((worker_index + 1) * per_worker).min(TOTAL_FIXTURE_REPOS);
    start..=end
}

pub struct UnusedRepoUrls {
    client: ApiClient,
    worker_index: usize,
    range: RangeInclusive<usize>,
    used: HashSet<String>,
}

impl UnusedRepoUrls {
    pub fn new(client: ApiClient, workers: usize, worker_index: usize) -> Self {
        Self {
            client,
            worker_index,
            range: worker_range(workers, worker_index),
            used: HashSet::new(),
        }
    }

    pub fn range(&self) -> &RangeInclusive<usize> {
        &self.range
    }

    /// Pick a random fixture URL from this worker's range that the org has
    /// not added yet and this picker has not handed out before.
    ///
    /// Tries as many times as the range is wide. A failed lookup aborts
    /// immediately. A URL counts as free only when the server reports a
    /// count of zero.
    pub async fn next(&mut self) -> Result<String> {
        let (start, end) = (*self.range.start(), *self.range.end());
        if self.range.is_empty() {
            bail!(
                "Worker {} has no fixture repositories (range {}-{})",
                self.worker_index,
                start,
                end
            );
        }
        let attempts = end - start + 1;

        for _ in 0..attempts {
            let number = rand::thread_rng().gen_range(start..=end);
            let url = centirepo_url(number);
            if self.used.contains(&url) {
                continue;
            }

            let params = ListRepositoriesParams {
                origin: Some("external".to_string()),
                search: Some(url.clone()),
                ..Default::default()
            };
            let page = self
                .client
                .list_repositories(&params)
                .await
                .inspect_err(|e| error!(url = %url, error = %e, "Error checking URL"))
                .context("Failed to verify URL availability")?;

            // A page without a count proves nothing, so the URL stays taken
            if page.count() == Some(0) {
                debug!(url = %url, worker = self.worker_index, "Picked unused repository URL");
                self.used.insert(url.clone());
                return Ok(url);
            }
        }

        bail!(
            "Worker {} could not find a free repo in its range {}-{}",
            self.worker_index,
            start,
            end
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centirepo_url_padding() {
        assert_eq!(
            centirepo_url(7),
            "https://content-services.github.io/fixtures/yum/centirepos/repo07/"
        );
        assert_eq!(
            centirepo_url(100),
            "https://content-services.github.io/fixtures/yum/centirepos/repo100/"
        );
    }

    #[test]
    fn test_worker_ranges_partition_fixtures() {
        assert_eq!(worker_range(1, 0), 1..=100);
        assert_eq!(worker_range(3, 0), 1..=34);
        assert_eq!(worker_range(3, 1), 35..=68);
        assert_eq!(worker_range(3, 2), 69..=100);
        assert_eq!(worker_range(0, 0), 1..=100);

        let covered: usize = (0..7).map(|i| worker_range(7, i).count()).sum();
        assert_eq!(covered, TOTAL_FIXTURE_REPOS);

        // More workers than fixtures per slot leaves trailing workers empty
        assert!(worker_range(30, 29).is_empty());
    }

    #[tokio::test]
    async fn test_empty_range_fails_without_requests() {
        let client = ApiClient::new("http://127.0.0.1:9").unwrap();
        let mut picker = UnusedRepoUrls::new(client, 30, 29);
        let err = picker.next().await.unwrap_err();
        assert!(err.to_string().contains("Worker 29"));
    }
}
