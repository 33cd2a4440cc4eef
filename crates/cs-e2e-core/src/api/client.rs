//! API client for the Content Sources REST API.
//!
//! `ApiClient` wraps a shared reqwest connection pool with the API base path
//! and one set of credentials: either an `x-rh-identity` header or a bearer
//! token. Clones are cheap; `with_token` and `with_identity` derive clients
//! for other personas or orgs without opening new connections.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{header, Client, Method, RequestBuilder, Response, Url};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::auth::{jwt, Identity, IDENTITY_HEADER};
use crate::fixtures::HarnessConfig;
use crate::models::{
    BulkCreateResult, Collection, ContentSearchRequest, EnvironmentSearchResult, FeatureSet,
    ListErrataParams, ListPopularParams, ListRepositoriesParams, ListSnapshotsParams,
    ListTasksParams, ListTemplatesParams, PackageGroupSearchResult, PopularRepository, Repository,
    RepositoryRequest, RepositoryUpdateRequest, RepositoryValidationRequest,
    RepositoryValidationResponse, RpmSearchResult, Snapshot, SnapshotErratum, TaskInfo, Template,
    TemplateRequest, UuidListRequest,
};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// API prefix appended to the application base URL
pub const API_PATH: &str = "/api/content-sources/v1";

/// HTTP request timeout in seconds.
/// Bulk deletes and snapshot triggers can take a while on a loaded stage.
const REQUEST_TIMEOUT_SECS: u64 = 60;

/// Maximum number of retries for rate-limited (429) requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

/// Credentials attached to every request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Pre-encoded `x-rh-identity` value
    Identity(String),
    /// `Bearer <jwt>` value for the `Authorization` header
    Bearer(String),
}

/// Transport settings for [`ApiClient::with_options`]
#[derive(Debug, Clone, Default)]
pub struct ClientOptions {
    pub proxy: Option<String>,
    pub accept_invalid_certs: bool,
}

/// API client for Content Sources.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_path: String,
    credentials: Option<Credentials>,
}

impl ApiClient {
    /// Create an unauthenticated client for `base_url` (no API suffix)
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_options(base_url, &ClientOptions::default())
    }

    pub fn with_options(base_url: &str, options: &ClientOptions) -> Result<Self> {
        let mut builder = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .danger_accept_invalid_certs(options.accept_invalid_certs);

        if let Some(proxy) = options.proxy.as_deref() {
            let proxy = reqwest::Proxy::all(proxy)
                .with_context(|| format!("Invalid proxy URL: {}", proxy))?;
            builder = builder.proxy(proxy);
        }

        Ok(Self {
            client: builder.build()?,
            base_path: api_base_path(base_url),
            credentials: None,
        })
    }

    /// Client for the configured service, authenticated with the configured
    /// identity header when one is set
    pub fn from_config(config: &HarnessConfig) -> Result<Self> {
        let options = ClientOptions {
            proxy: config.proxy.clone(),
            accept_invalid_certs: config.accept_invalid_certs(),
        };
        let mut client = Self::with_options(&config.base_url, &options)?;
        if let Some(identity) = config.identity_header.as_deref() {
            client.credentials = Some(Credentials::Identity(identity.to_string()));
        }
        Ok(client)
    }

    /// Create a new ApiClient with the given token, sharing the connection pool.
    pub fn with_token(&self, token: &str) -> Self {
        Self {
            client: self.client.clone(),
            base_path: self.base_path.clone(),
            credentials: Some(Credentials::Bearer(jwt::bearer(token))),
        }
    }

    /// Create a new ApiClient acting as `identity`, sharing the connection pool.
    pub fn with_identity(&self, identity: &Identity) -> Self {
        Self {
            client: self.client.clone(),
            base_path: self.base_path.clone(),
            credentials: Some(Credentials::Identity(identity.header_value())),
        }
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_path, path)
    }

    fn auth_headers(&self) -> Result<header::HeaderMap> {
        let mut headers = header::HeaderMap::new();
        match self.credentials {
            Some(Credentials::Identity(ref value)) => {
                headers.insert(IDENTITY_HEADER, header::HeaderValue::from_str(value)?);
            }
            Some(Credentials::Bearer(ref token)) => {
                headers.insert(header::AUTHORIZATION, header::HeaderValue::from_str(token)?);
            }
            None => {}
        }
        Ok(headers)
    }

    /// Check if response is successful, returning an error with body if not.
    /// Returns Ok(Some(response)) for success, Ok(None) for rate limit (should retry),
    /// or Err for other errors.
    async fn check_response_for_retry(response: Response) -> Result<Option<Response>> {
        let status = response.status();
        if status.is_success() {
            return Ok(Some(response));
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Ok(None);
        }

        let url = response.url().to_string();
        let body = response.text().await.unwrap_or_default();
        warn!(url = %url, status = status.as_u16(), body = %body, "Response errored");
        Err(ApiError::from_status(status, &body).into())
    }

    /// Send a request, backing off and retrying while the server answers 429.
    ///
    /// `build` is called again for every attempt.
    async fn execute<F>(&self, method: &Method, url: &str, build: F) -> Result<Response>
    where
        F: Fn(RequestBuilder) -> RequestBuilder,
    {
        let mut retries = 0;
        let mut backoff_ms = INITIAL_BACKOFF_MS;

        loop {
            let request = self
                .client
                .request(method.clone(), url)
                .headers(self.auth_headers()?);

            let response = build(request)
                .send()
                .await
                .with_context(|| format!("Failed to send {} request to {}", method, url))?;

            match Self::check_response_for_retry(response).await? {
                Some(response) => {
                    debug!(
                        method = %method,
                        url = url,
                        status = response.status().as_u16(),
                        "Request succeeded"
                    );
                    return Ok(response);
                }
                None => {
                    retries += 1;
                    if retries > MAX_RATE_LIMIT_RETRIES {
                        return Err(ApiError::RateLimited.into());
                    }
                    warn!(
                        url = url,
                        retry = retries,
                        backoff_ms = backoff_ms,
                        "Rate limited, backing off"
                    );
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    backoff_ms *= 2; // Exponential backoff
                }
            }
        }
    }

    async fn parse<T: DeserializeOwned>(response: Response, url: &str) -> Result<T> {
        response
            .json()
            .await
            .with_context(|| format!("Failed to parse JSON response from {}", url))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        let response = self.execute(&Method::GET, &url, |r| r).await?;
        Self::parse(response, &url).await
    }

    async fn get_query<T: DeserializeOwned, Q: Serialize>(
        &self,
        path: &str,
        query: &Q,
    ) -> Result<T> {
        let url = self.url(path);
        let response = self.execute(&Method::GET, &url, |r| r.query(query)).await?;
        Self::parse(response, &url).await
    }

    async fn send_json<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let url = self.url(path);
        let response = self.execute(&method, &url, |r| r.json(body)).await?;
        Self::parse(response, &url).await
    }

    async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        self.send_json(Method::POST, path, body).await
    }

    /// POST whose response body is ignored (202/204 endpoints)
    async fn post_no_content<B: Serialize>(&self, path: &str, body: &B) -> Result<()> {
        let url = self.url(path);
        self.execute(&Method::POST, &url, |r| r.json(body)).await?;
        Ok(())
    }

    async fn patch<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        self.send_json(Method::PATCH, path, body).await
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let url = self.url(path);
        self.execute(&Method::DELETE, &url, |r| r).await?;
        Ok(())
    }

    // ===== Repositories =====

    pub async fn list_repositories(
        &self,
        params: &ListRepositoriesParams,
    ) -> Result<Collection<Repository>> {
        self.get_query("/repositories/", params).await
    }

    pub async fn get_repository(&self, uuid: &str) -> Result<Repository> {
        self.get(&format!("/repositories/{}", uuid)).await
    }

    pub async fn create_repository(&self, request: &RepositoryRequest) -> Result<Repository> {
        self.post("/repositories/", request).await
    }

    pub async fn bulk_create_repositories(
        &self,
        requests: &[RepositoryRequest],
    ) -> Result<Vec<BulkCreateResult>> {
        self.post("/repositories/bulk_create/", &requests).await
    }

    pub async fn update_repository(
        &self,
        uuid: &str,
        request: &RepositoryUpdateRequest,
    ) -> Result<Repository> {
        self.patch(&format!("/repositories/{}", uuid), request).await
    }

    pub async fn delete_repository(&self, uuid: &str) -> Result<()> {
        self.delete(&format!("/repositories/{}", uuid)).await
    }

    pub async fn bulk_delete_repositories(&self, uuids: &[String]) -> Result<()> {
        let body = UuidListRequest {
            uuids: uuids.to_vec(),
        };
        self.post_no_content("/repositories/bulk_delete/", &body).await
    }

    /// Queue a snapshot of the repository; returns the snapshot task
    pub async fn snapshot_repository(&self, uuid: &str) -> Result<TaskInfo> {
        self.post(&format!("/repositories/{}/snapshot/", uuid), &serde_json::json!({}))
            .await
    }

    pub async fn validate_repository_parameters(
        &self,
        requests: &[RepositoryValidationRequest],
    ) -> Result<Vec<RepositoryValidationResponse>> {
        self.post("/repository_parameters/validate/", &requests).await
    }

    // ===== Templates =====

    pub async fn list_templates(
        &self,
        params: &ListTemplatesParams,
    ) -> Result<Collection<Template>> {
        self.get_query("/templates/", params).await
    }

    pub async fn get_template(&self, uuid: &str) -> Result<Template> {
        self.get(&format!("/templates/{}", uuid)).await
    }

    pub async fn create_template(&self, request: &TemplateRequest) -> Result<Template> {
        self.post("/templates/", request).await
    }

    pub async fn update_template(&self, uuid: &str, request: &TemplateRequest) -> Result<Template> {
        self.patch(&format!("/templates/{}", uuid), request).await
    }

    pub async fn delete_template(&self, uuid: &str) -> Result<()> {
        self.delete(&format!("/templates/{}", uuid)).await
    }

    // ===== Tasks =====

    pub async fn list_tasks(&self, params: &ListTasksParams) -> Result<Collection<TaskInfo>> {
        self.get_query("/tasks/", params).await
    }

    pub async fn get_task(&self, uuid: &str) -> Result<TaskInfo> {
        self.get(&format!("/tasks/{}", uuid)).await
    }

    // ===== Snapshots =====

    pub async fn list_snapshots(
        &self,
        repository_uuid: &str,
        params: &ListSnapshotsParams,
    ) -> Result<Collection<Snapshot>> {
        self.get_query(&format!("/repositories/{}/snapshots/", repository_uuid), params)
            .await
    }

    pub async fn delete_snapshot(&self, repository_uuid: &str, snapshot_uuid: &str) -> Result<()> {
        self.delete(&format!(
            "/repositories/{}/snapshots/{}",
            repository_uuid, snapshot_uuid
        ))
        .await
    }

    pub async fn bulk_delete_snapshots(
        &self,
        repository_uuid: &str,
        snapshot_uuids: &[String],
    ) -> Result<()> {
        let body = UuidListRequest {
            uuids: snapshot_uuids.to_vec(),
        };
        self.post_no_content(
            &format!("/repositories/{}/snapshots/bulk_delete/", repository_uuid),
            &body,
        )
        .await
    }

    pub async fn list_snapshot_errata(
        &self,
        snapshot_uuid: &str,
        params: &ListErrataParams,
    ) -> Result<Collection<SnapshotErratum>> {
        self.get_query(&format!("/snapshots/{}/errata", snapshot_uuid), params)
            .await
    }

    // ===== Popular repositories and features =====

    pub async fn list_popular_repositories(
        &self,
        params: &ListPopularParams,
    ) -> Result<Collection<PopularRepository>> {
        self.get_query("/popular_repositories/", params).await
    }

    pub async fn list_features(&self) -> Result<FeatureSet> {
        self.get("/features/").await
    }

    // ===== Content search =====

    pub async fn search_rpm_names(
        &self,
        request: &ContentSearchRequest,
    ) -> Result<Vec<RpmSearchResult>> {
        self.post("/rpms/names", request).await
    }

    pub async fn search_package_group_names(
        &self,
        request: &ContentSearchRequest,
    ) -> Result<Vec<PackageGroupSearchResult>> {
        self.post("/package_groups/names", request).await
    }

    pub async fn search_environment_names(
        &self,
        request: &ContentSearchRequest,
    ) -> Result<Vec<EnvironmentSearchResult>> {
        self.post("/environments/names", request).await
    }
}

/// `BASE_URL` plus the API prefix, tolerating a trailing slash
pub fn api_base_path(base_url: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), API_PATH)
}

/// Dev proxies serve self-signed certificates on `https://<env>.foo.redhat.com:<port>`
pub fn is_insecure_dev_host(base_url: &str) -> bool {
    let Ok(url) = Url::parse(base_url) else {
        return false;
    };
    let Some(host) = url.host_str() else {
        return false;
    };
    let Some(env) = host.strip_suffix(".foo.redhat.com") else {
        return false;
    };

    url.scheme() == "https"
        && url.port().is_some()
        && matches!(url.path(), "" | "/")
        && !env.is_empty()
        && env.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_base_path() {
        assert_eq!(
            api_base_path("https://stage.foo.redhat.com:1337"),
            "https://stage.foo.redhat.com:1337/api/content-sources/v1"
        );
        assert_eq!(
            api_base_path("http://localhost:8000/"),
            "http://localhost:8000/api/content-sources/v1"
        );
    }

    #[test]
    fn test_is_insecure_dev_host() {
        assert!(is_insecure_dev_host("https://stage.foo.redhat.com:1337"));
        assert!(is_insecure_dev_host("https://prod.foo.redhat.com:8443/"));
        assert!(!is_insecure_dev_host("https://stage.foo.redhat.com"));
        assert!(!is_insecure_dev_host("http://stage.foo.redhat.com:1337"));
        assert!(!is_insecure_dev_host("https://console.redhat.com:443"));
        assert!(!is_insecure_dev_host("https://a.b.foo.redhat.com:1337"));
        assert!(!is_insecure_dev_host("not a url"));
    }

    #[test]
    fn test_with_token_and_identity_share_base_path() {
        let client = ApiClient::new("http://localhost:8000").unwrap();
        assert_eq!(client.credentials(), None);

        let bearer = client.with_token("abc.def.ghi");
        assert_eq!(
            bearer.credentials(),
            Some(&Credentials::Bearer("Bearer abc.def.ghi".to_string()))
        );
        assert_eq!(bearer.base_path(), client.base_path());

        let already_prefixed = client.with_token("Bearer abc.def.ghi");
        assert_eq!(already_prefixed.credentials(), bearer.credentials());

        let identity = Identity::new("13476", "alice");
        let as_alice = client.with_identity(&identity);
        assert_eq!(
            as_alice.credentials(),
            Some(&Credentials::Identity(identity.header_value()))
        );
    }
}
