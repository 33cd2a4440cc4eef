//! Search-then-delete helpers for leftovers of earlier runs.

use std::collections::BTreeSet;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::api::ApiClient;
use crate::models::{
    Collection, ListRepositoriesParams, ListTasksParams, ListTemplatesParams, TaskInfo, TaskStatus,
    TASK_DELETE_REPOSITORY_SNAPSHOTS, TASK_DELETE_TEMPLATES,
};
use crate::poll::{poll, PollOptions};

// ============================================================================
// Constants
// ============================================================================

/// Pause before the first task probe, so deletion tasks are queued
const TASK_SETTLE_DELAY_MS: u64 = 1000;

/// Page size used to fetch templates before prefix matching
const TEMPLATE_LIST_LIMIT: i64 = 1000;

/// What a cleanup pass removed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupSummary {
    pub deleted: Vec<String>,
    /// Deletion tasks waited on
    pub awaited_tasks: usize,
}

/// Delete every custom repository matching any of `terms` (names or URLs).
///
/// When some of the deleted repositories had snapshots enabled, waits until
/// the same number of `delete-repository-snapshots` tasks have completed.
pub async fn cleanup_repositories<S: AsRef<str>>(
    client: &ApiClient,
    terms: &[S],
    options: PollOptions,
) -> Result<CleanupSummary> {
    let terms: Vec<&str> = terms.iter().map(AsRef::as_ref).collect();
    info!(terms = ?terms, "Cleaning up repositories");

    let mut uuids = BTreeSet::new();
    let mut snapshotting = BTreeSet::new();
    for term in &terms {
        let page = client
            .list_repositories(&ListRepositoriesParams::custom_search(*term))
            .await
            .with_context(|| format!("Failed to search repositories for {:?}", term))?;
        for repo in page.data {
            if repo.snapshot {
                snapshotting.insert(repo.uuid.clone());
            }
            uuids.insert(repo.uuid);
        }
    }

    if uuids.is_empty() {
        debug!("No repositories to clean up");
        return Ok(CleanupSummary::default());
    }

    let deleted: Vec<String> = uuids.into_iter().collect();
    client
        .bulk_delete_repositories(&deleted)
        .await
        .context("Failed to bulk delete repositories")?;
    info!(count = deleted.len(), "Deleted repositories");

    let awaited_tasks = snapshotting.len();
    if awaited_tasks > 0 {
        wait_for_completed_tasks(client, TASK_DELETE_REPOSITORY_SNAPSHOTS, awaited_tasks, options)
            .await?;
    }

    Ok(CleanupSummary {
        deleted,
        awaited_tasks,
    })
}

/// Delete every template whose name starts with any of `prefixes`, then wait
/// for the matching `delete-templates` tasks to complete.
pub async fn cleanup_templates<S: AsRef<str>>(
    client: &ApiClient,
    prefixes: &[S],
    options: PollOptions,
) -> Result<CleanupSummary> {
    let prefixes: Vec<&str> = prefixes.iter().map(AsRef::as_ref).collect();
    info!(prefixes = ?prefixes, "Cleaning up templates");

    let params = ListTemplatesParams {
        limit: Some(TEMPLATE_LIST_LIMIT),
        ..Default::default()
    };
    let page = client
        .list_templates(&params)
        .await
        .context("Failed to list templates")?;

    let deleted: Vec<String> = page
        .data
        .into_iter()
        .filter(|t| prefixes.iter().any(|p| t.name.starts_with(p)))
        .map(|t| t.uuid)
        .collect();

    for uuid in &deleted {
        client
            .delete_template(uuid)
            .await
            .with_context(|| format!("Failed to delete template {}", uuid))?;
    }

    if deleted.is_empty() {
        debug!("No templates to clean up");
        return Ok(CleanupSummary::default());
    }
    info!(count = deleted.len(), "Deleted templates");

    let awaited_tasks = deleted.len();
    wait_for_completed_tasks(client, TASK_DELETE_TEMPLATES, awaited_tasks, options).await?;

    Ok(CleanupSummary {
        deleted,
        awaited_tasks,
    })
}

/// Poll the newest `expected` tasks of `task_type` until all of them are
/// `completed`.
pub async fn wait_for_completed_tasks(
    client: &ApiClient,
    task_type: &str,
    expected: usize,
    options: PollOptions,
) -> Result<()> {
    tokio::time::sleep(Duration::from_millis(TASK_SETTLE_DELAY_MS)).await;

    let params = ListTasksParams::of_type(task_type).limit(expected as i64);
    let completed = |page: &Collection<TaskInfo>| {
        page.data
            .iter()
            .filter(|t| t.status == TaskStatus::Completed)
            .count()
    };

    poll(
        || client.list_tasks(&params),
        |page| completed(page) != expected,
        options,
    )
    .await
    .with_context(|| format!("Waiting for {} {} task(s) to complete", expected, task_type))?;

    debug!(task_type = task_type, count = expected, "Deletion tasks completed");
    Ok(())
}
