use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub uuid: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub distribution_path: String,
    #[serde(default)]
    pub repository_path: Option<String>,
    #[serde(default)]
    pub content_counts: HashMap<String, i64>,
}

/// Query for `GET /repositories/{uuid}/snapshots/`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ListSnapshotsParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotErratum {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub errata_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub issued_date: String,
    #[serde(default)]
    pub updated_date: String,
    #[serde(default, rename = "type")]
    pub errata_type: String,
    #[serde(default)]
    pub severity: String,
    #[serde(default)]
    pub reboot_suggested: bool,
    #[serde(default)]
    pub cves: Vec<String>,
}

/// Query for `GET /snapshots/{uuid}/errata`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ListErrataParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub errata_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
}
