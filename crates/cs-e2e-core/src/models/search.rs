use serde::{Deserialize, Serialize};

/// Body shared by the RPM, package-group and environment name searches
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentSearchRequest {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub uuids: Vec<String>,
    pub search: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
}

impl ContentSearchRequest {
    pub fn in_urls(urls: Vec<String>, search: impl Into<String>) -> Self {
        Self {
            urls,
            search: search.into(),
            ..Default::default()
        }
    }

    pub fn in_repositories(uuids: Vec<String>, search: impl Into<String>) -> Self {
        Self {
            uuids,
            search: search.into(),
            ..Default::default()
        }
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpmSearchResult {
    pub package_name: String,
    #[serde(default)]
    pub summary: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageGroupSearchResult {
    pub package_group_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub package_list: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentSearchResult {
    pub environment_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub id: String,
}
