//! Request and response types for the Content Sources REST API.
//!
//! - `Collection<T>`: the `{ data, meta, links }` list envelope
//! - `Repository`, `Template`, `Snapshot`, `TaskInfo`: the main resources
//! - Search bodies and results for RPMs, package groups and environments
//! - `PopularRepository` and feature flags

pub mod common;
pub mod popular;
pub mod repository;
pub mod search;
pub mod snapshot;
pub mod task;
pub mod template;

pub use common::{Collection, ErrorResponse, HandlerError, Links, ResponseMetadata, UuidListRequest};
pub use popular::{Feature, FeatureSet, ListPopularParams, PopularRepository};
pub use repository::{
    BulkCreateResult, FieldValidation, ListRepositoriesParams, Repository, RepositoryRequest,
    RepositoryStatus, RepositoryUpdateRequest, RepositoryValidationRequest,
    RepositoryValidationResponse, UrlValidation,
};
pub use search::{
    ContentSearchRequest, EnvironmentSearchResult, PackageGroupSearchResult, RpmSearchResult,
};
pub use snapshot::{ListErrataParams, ListSnapshotsParams, Snapshot, SnapshotErratum};
pub use task::{
    ListTasksParams, TaskInfo, TaskStatus, TASK_DELETE_REPOSITORY_SNAPSHOTS, TASK_DELETE_TEMPLATES,
    TASK_INTROSPECT, TASK_SNAPSHOT,
};
pub use template::{ListTemplatesParams, Template, TemplateRequest};

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_repository_collection() {
        let body = json!({
            "data": [{
                "uuid": "7f1c",
                "name": "centirepo-12",
                "url": "https://content-services.github.io/fixtures/yum/centirepos/repo12/",
                "distribution_versions": ["9"],
                "distribution_arch": "x86_64",
                "org_id": "13476",
                "status": "Valid",
                "package_count": 3,
                "snapshot": true,
                "last_snapshot_uuid": "s-1",
                "last_snapshot": {
                    "uuid": "s-1",
                    "created_at": "2024-05-01T10:00:00Z",
                    "distribution_path": "abc/s-1",
                    "content_counts": { "rpm.package": 3 }
                }
            }],
            "meta": { "limit": 100, "offset": 0, "count": 1 },
            "links": {
                "first": "/repositories/?limit=100&offset=0",
                "last": "/repositories/?limit=100&offset=0"
            }
        });

        let page: Collection<Repository> = serde_json::from_value(body).unwrap();
        assert_eq!(page.total(), 1);
        let repo = &page.data[0];
        assert_eq!(repo.status, RepositoryStatus::Valid);
        assert!(repo.status.is_settled());
        assert_eq!(
            repo.last_snapshot.as_ref().unwrap().content_counts["rpm.package"],
            3
        );
    }

    #[test]
    fn test_unknown_statuses_do_not_fail_parsing() {
        let repo: Repository = serde_json::from_value(json!({
            "uuid": "1", "name": "n", "url": "u", "status": "Throttled"
        }))
        .unwrap();
        assert_eq!(repo.status, RepositoryStatus::Unknown);

        let task: TaskInfo = serde_json::from_value(json!({
            "uuid": "t", "status": "completed", "type": "snapshot"
        }))
        .unwrap();
        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.task_type, TASK_SNAPSHOT);
        assert!(task.status.is_finished());
    }

    #[test]
    fn test_requests_skip_unset_fields() {
        let body = serde_json::to_value(RepositoryRequest::new("repo", "https://x/").snapshot(true))
            .unwrap();
        assert_eq!(body, json!({ "name": "repo", "url": "https://x/", "snapshot": true }));

        let query = serde_json::to_value(ListTasksParams::of_type(TASK_DELETE_TEMPLATES).limit(2))
            .unwrap();
        assert_eq!(query, json!({ "type": "delete-templates", "limit": 2 }));

        let search = serde_json::to_value(ContentSearchRequest::in_urls(vec!["u".into()], "bash"))
            .unwrap();
        assert_eq!(search, json!({ "urls": ["u"], "search": "bash" }));
    }

    #[test]
    fn test_validation_response() {
        let resp: RepositoryValidationResponse = serde_json::from_value(json!({
            "name": { "skipped": false, "valid": true, "error": "" },
            "url": { "skipped": false, "valid": false, "error": "404", "http_code": 404 },
            "gpg_key": { "skipped": true, "valid": true, "error": "" }
        }))
        .unwrap();
        assert!(!resp.is_valid());
        assert_eq!(resp.url.http_code, 404);
    }

    #[test]
    fn test_missing_meta_has_no_count() {
        let bare: Collection<Repository> = serde_json::from_value(json!({ "data": [] })).unwrap();
        assert_eq!(bare.count(), None);
        assert_eq!(bare.total(), 0);

        let no_count: Collection<Repository> =
            serde_json::from_value(json!({ "data": [], "meta": { "limit": 10 } })).unwrap();
        assert_eq!(no_count.count(), None);

        let zero: Collection<Repository> =
            serde_json::from_value(json!({ "data": [], "meta": { "count": 0 } })).unwrap();
        assert_eq!(zero.count(), Some(0));
        assert!(zero.is_empty());
    }
}
