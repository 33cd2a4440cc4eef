use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Curated repository offered to every org; `uuid` is set once the org adds it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopularRepository {
    #[serde(default)]
    pub uuid: String,
    #[serde(default)]
    pub existing_name: String,
    pub suggested_name: String,
    pub url: String,
    #[serde(default)]
    pub distribution_versions: Vec<String>,
    #[serde(default)]
    pub distribution_arch: String,
    #[serde(default)]
    pub gpg_key: String,
    #[serde(default)]
    pub metadata_verification: bool,
}

impl PopularRepository {
    pub fn is_added(&self) -> bool {
        !self.uuid.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ListPopularParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub accessible: bool,
}

/// `GET /features/` maps feature name to its state for the caller
pub type FeatureSet = HashMap<String, Feature>;
