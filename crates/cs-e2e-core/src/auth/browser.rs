//! The browser-context seam used by token refresh.
//!
//! A refresh only needs two things from a browser: navigate to an
//! authenticated page, then read the cookies the page established.
//! [`HttpBrowserContext`] does both with a reqwest cookie jar seeded from a
//! persona's auth-state file, which is enough when the SSO session cookies in
//! that file are still alive.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::{Client, Url};
use tracing::debug;

use super::state::{AuthState, Cookie};
use crate::api::ApiError;

/// Navigation timeout, matching the browser's network-idle wait.
const NAVIGATION_TIMEOUT_SECS: u64 = 30;

#[async_trait]
pub trait BrowserContext: Send + Sync {
    /// Navigate to `path` (relative to the application base URL) and wait
    /// for the page to settle.
    async fn goto(&self, path: &str) -> Result<()>;

    /// Cookies the context currently holds for the application.
    async fn cookies(&self) -> Result<Vec<Cookie>>;
}

pub struct HttpBrowserContext {
    client: Client,
    jar: Arc<Jar>,
    base_url: Url,
}

impl HttpBrowserContext {
    pub fn new(base_url: &str, seed: &AuthState, accept_invalid_certs: bool) -> Result<Self> {
        let base_url =
            Url::parse(base_url).with_context(|| format!("Invalid base URL: {}", base_url))?;

        let jar = Arc::new(Jar::default());
        for cookie in &seed.cookies {
            jar.add_cookie_str(&set_cookie_line(cookie), &cookie_origin(&base_url, cookie));
        }

        let client = Client::builder()
            .cookie_provider(jar.clone())
            .timeout(Duration::from_secs(NAVIGATION_TIMEOUT_SECS))
            .danger_accept_invalid_certs(accept_invalid_certs)
            .build()?;

        Ok(Self {
            client,
            jar,
            base_url,
        })
    }
}

#[async_trait]
impl BrowserContext for HttpBrowserContext {
    async fn goto(&self, path: &str) -> Result<()> {
        let url = self
            .base_url
            .join(path)
            .with_context(|| format!("Invalid navigation path: {}", path))?;

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("Failed to navigate to {}", url))?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(ApiError::from_status(status, &body).into());
        }

        debug!(url = %url, "Navigation settled");
        Ok(())
    }

    async fn cookies(&self) -> Result<Vec<Cookie>> {
        let Some(header) = self.jar.cookies(&self.base_url) else {
            return Ok(Vec::new());
        };
        let header = header
            .to_str()
            .context("Cookie header is not valid UTF-8")?;
        let domain = self.base_url.host_str().map(str::to_string);

        Ok(header
            .split(';')
            .filter_map(|pair| pair.trim().split_once('='))
            .map(|(name, value)| Cookie {
                domain: domain.clone(),
                path: Some("/".to_string()),
                ..Cookie::new(name, value)
            })
            .collect())
    }
}

/// `Set-Cookie` style line for seeding the jar
fn set_cookie_line(cookie: &Cookie) -> String {
    let mut line = format!(
        "{}={}; Path={}",
        cookie.name,
        cookie.value,
        cookie.path.as_deref().unwrap_or("/")
    );
    if let Some(domain) = cookie.domain.as_deref().filter(|d| !d.is_empty()) {
        line.push_str("; Domain=");
        line.push_str(domain.trim_start_matches('.'));
    }
    line
}

/// URL the cookie is "received from": its own domain when set, else the app
fn cookie_origin(base: &Url, cookie: &Cookie) -> Url {
    let domain = cookie
        .domain
        .as_deref()
        .map(|d| d.trim_start_matches('.'))
        .filter(|d| !d.is_empty());

    match domain {
        Some(domain) => {
            let mut url = base.clone();
            if url.set_host(Some(domain)).is_ok() {
                url.set_path("/");
                url
            } else {
                base.clone()
            }
        }
        None => base.clone(),
    }
}
