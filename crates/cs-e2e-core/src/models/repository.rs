use serde::{Deserialize, Serialize};

use super::Snapshot;

/// Introspection status of a repository
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RepositoryStatus {
    Valid,
    Invalid,
    Unavailable,
    #[default]
    Pending,
    #[serde(other)]
    Unknown,
}

impl RepositoryStatus {
    /// Introspection has finished, one way or the other
    pub fn is_settled(&self) -> bool {
        !matches!(self, RepositoryStatus::Pending)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RepositoryStatus::Valid => "Valid",
            RepositoryStatus::Invalid => "Invalid",
            RepositoryStatus::Unavailable => "Unavailable",
            RepositoryStatus::Pending => "Pending",
            RepositoryStatus::Unknown => "Unknown",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Repository {
    pub uuid: String,
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub distribution_versions: Vec<String>,
    #[serde(default)]
    pub distribution_arch: String,
    #[serde(default)]
    pub account_id: String,
    #[serde(default)]
    pub org_id: String,
    #[serde(default)]
    pub origin: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub last_introspection_time: Option<String>,
    #[serde(default, rename = "last_success_introspection_time")]
    pub last_introspection_success_time: Option<String>,
    #[serde(default, rename = "last_update_introspection_time")]
    pub last_introspection_update_time: Option<String>,
    #[serde(default)]
    pub last_introspection_error: Option<String>,
    #[serde(default)]
    pub failed_introspections_count: i64,
    #[serde(default)]
    pub package_count: i64,
    #[serde(default)]
    pub status: RepositoryStatus,
    #[serde(default)]
    pub gpg_key: String,
    #[serde(default)]
    pub metadata_verification: bool,
    #[serde(default)]
    pub module_hotfixes: bool,
    #[serde(default)]
    pub snapshot: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_snapshot_uuid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_snapshot: Option<Snapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_snapshot_task_uuid: Option<String>,
}

/// Create/replace body. Only `name` and `url` are required by the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distribution_versions: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distribution_arch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gpg_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata_verification: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module_hotfixes: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
}

impl RepositoryRequest {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: Some(url.into()),
            ..Default::default()
        }
    }

    pub fn snapshot(mut self, enabled: bool) -> Self {
        self.snapshot = Some(enabled);
        self
    }

    pub fn distribution(mut self, versions: &[&str], arch: &str) -> Self {
        self.distribution_versions = Some(versions.iter().map(|v| v.to_string()).collect());
        self.distribution_arch = Some(arch.to_string());
        self
    }
}

/// Partial update body; absent fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryUpdateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distribution_versions: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distribution_arch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gpg_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata_verification: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module_hotfixes: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<bool>,
}

/// One entry of a bulk create response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BulkCreateResult {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub repository: Option<Repository>,
}

/// Query for `GET /repositories/`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ListRepositoriesParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
}

impl ListRepositoriesParams {
    /// Custom (user-created) repositories matching a search term
    pub fn custom_search(term: impl Into<String>) -> Self {
        Self {
            origin: Some("external,upload".to_string()),
            search: Some(term.into()),
            ..Default::default()
        }
    }

    pub fn by_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Default::default()
        }
    }
}

/// Body item for `POST /repository_parameters/validate/`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryValidationRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gpg_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata_verification: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldValidation {
    #[serde(default)]
    pub skipped: bool,
    #[serde(default)]
    pub valid: bool,
    #[serde(default)]
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlValidation {
    #[serde(default)]
    pub skipped: bool,
    #[serde(default)]
    pub valid: bool,
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub http_code: i64,
    #[serde(default)]
    pub metadata_present: bool,
    #[serde(default)]
    pub metadata_signature_present: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryValidationResponse {
    #[serde(default)]
    pub name: FieldValidation,
    #[serde(default)]
    pub url: UrlValidation,
    #[serde(default)]
    pub gpg_key: FieldValidation,
}

impl RepositoryValidationResponse {
    pub fn is_valid(&self) -> bool {
        (self.name.skipped || self.name.valid)
            && (self.url.skipped || self.url.valid)
            && (self.gpg_key.skipped || self.gpg_key.valid)
    }
}
