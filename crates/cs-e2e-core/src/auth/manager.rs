//! Token lifecycle manager.
//!
//! Before an authenticated test step runs, the persona's credential must be
//! valid for at least the buffer window. The manager resolves the current
//! token, checks its expiry, and refreshes it through a [`BrowserContext`]
//! when it is expired, expiring soon, or unreadable.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Duration;
use tracing::{debug, error, info, warn};

use super::browser::BrowserContext;
use super::cache::TokenCache;
use super::jwt::{self, TokenExpiry, DEFAULT_BUFFER_MINUTES};
use super::state::{find_session_cookie, AuthStateStore};
use super::{Persona, TokenError};

/// Authenticated page that re-establishes the `cs_jwt` cookie
pub const REFRESH_ROUTE: &str = "/insights/content/repositories";

/// Outcome of [`TokenManager::ensure_valid`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenStatus {
    /// No token from any source; callers proceed unauthenticated
    Missing,
    /// The current token is good for longer than the buffer
    Valid(String),
    /// The token was refreshed; the new value is cached and persisted
    Refreshed(String),
}

impl TokenStatus {
    pub fn token(&self) -> Option<&str> {
        match self {
            TokenStatus::Missing => None,
            TokenStatus::Valid(token) | TokenStatus::Refreshed(token) => Some(token),
        }
    }

    pub fn into_token(self) -> Option<String> {
        match self {
            TokenStatus::Missing => None,
            TokenStatus::Valid(token) | TokenStatus::Refreshed(token) => Some(token),
        }
    }

    pub fn was_refreshed(&self) -> bool {
        matches!(self, TokenStatus::Refreshed(_))
    }
}

pub struct TokenManager {
    cache: Arc<TokenCache>,
    store: AuthStateStore,
    buffer: Duration,
    refresh_route: String,
}

impl TokenManager {
    pub fn new(cache: Arc<TokenCache>, store: AuthStateStore) -> Self {
        Self {
            cache,
            store,
            buffer: Duration::minutes(DEFAULT_BUFFER_MINUTES),
            refresh_route: REFRESH_ROUTE.to_string(),
        }
    }

    pub fn with_buffer(mut self, buffer: Duration) -> Self {
        self.buffer = buffer;
        self
    }

    pub fn with_refresh_route(mut self, route: impl Into<String>) -> Self {
        self.refresh_route = route.into();
        self
    }

    pub fn cache(&self) -> &Arc<TokenCache> {
        &self.cache
    }

    pub fn store(&self) -> &AuthStateStore {
        &self.store
    }

    pub fn buffer(&self) -> Duration {
        self.buffer
    }

    /// Cached token for the API-client fixture, without any validation
    pub async fn token(&self, persona: Persona) -> Option<String> {
        self.cache.get(persona).await
    }

    /// Resolve the persona's current token: cache first, then the live
    /// browser session cookie, then the stored auth-state file. An unreadable
    /// file counts as no token.
    pub async fn current_token(
        &self,
        persona: Persona,
        browser: &dyn BrowserContext,
    ) -> Result<Option<String>> {
        if let Some(token) = self.cache.get(persona).await {
            debug!(persona = %persona, source = "cache", "Resolved token");
            return Ok(Some(token));
        }

        let cookies = browser
            .cookies()
            .await
            .context("Failed to read browser cookies")?;
        if let Some(cookie) = find_session_cookie(&cookies) {
            debug!(persona = %persona, source = "browser", "Resolved token");
            return Ok(Some(jwt::bearer(&cookie.value)));
        }

        let stored = self.store.stored_token(persona).unwrap_or_else(|e| {
            warn!(persona = %persona, error = %e, "Ignoring unreadable auth state");
            None
        });
        if stored.is_some() {
            debug!(persona = %persona, source = "auth_state", "Resolved token");
        }
        Ok(stored)
    }

    /// Make sure the persona holds a token valid beyond the buffer window.
    ///
    /// A token that cannot be decoded, or has no `exp`, is refreshed exactly
    /// like an expiring one.
    pub async fn ensure_valid(
        &self,
        persona: Persona,
        browser: &dyn BrowserContext,
    ) -> Result<TokenStatus> {
        let Some(current) = self.current_token(persona, browser).await? else {
            debug!(persona = %persona, "No token found, nothing to validate");
            return Ok(TokenStatus::Missing);
        };

        match jwt::check_expiry(&current, self.buffer) {
            Ok(expiry) if !expiry.needs_refresh() => {
                debug!(
                    persona = %persona,
                    minutes_remaining = expiry.minutes_remaining(),
                    "Token still valid"
                );
                self.cache.set(persona, current.clone()).await;
                Ok(TokenStatus::Valid(current))
            }
            Ok(expiry) => {
                info!(
                    persona = %persona,
                    expired = expiry.is_expired,
                    minutes_remaining = expiry.minutes_remaining(),
                    "Token expiring, refreshing"
                );
                self.refresh(persona, browser).await.map(TokenStatus::Refreshed)
            }
            Err(e) => {
                warn!(persona = %persona, error = %e, "Token unreadable, refreshing");
                self.refresh(persona, browser).await.map(TokenStatus::Refreshed)
            }
        }
    }

    /// Navigate to the refresh route, pick up the new `cs_jwt` cookie, write
    /// it back to the persona's auth-state file and the cache.
    pub async fn refresh(&self, persona: Persona, browser: &dyn BrowserContext) -> Result<String> {
        browser
            .goto(&self.refresh_route)
            .await
            .with_context(|| format!("Failed to load {} for {}", self.refresh_route, persona))?;

        let cookies = browser
            .cookies()
            .await
            .context("Failed to read browser cookies")?;
        let token = find_session_cookie(&cookies)
            .map(|cookie| jwt::bearer(&cookie.value))
            .ok_or(TokenError::MissingSessionCookie { persona })?;

        let mut state = match self.store.load(persona) {
            Ok(state) => state.unwrap_or_default(),
            Err(e) => {
                warn!(persona = %persona, error = %e, "Replacing unreadable auth state");
                Default::default()
            }
        };
        state.merge_cookies(cookies);
        self.store.save(persona, &state)?;

        self.cache.set(persona, token.clone()).await;
        info!(persona = %persona, "Refreshed JWT token");
        Ok(token)
    }

    /// Per-test hook: pick the persona from the test's storage-state path and
    /// make sure its token is valid.
    ///
    /// Failures are logged, never returned, so a flaky refresh does not fail
    /// a test that may not need the token. Unknown auth files are skipped; no
    /// storage state means the admin persona.
    pub async fn prepare_for_test(
        &self,
        test_name: &str,
        storage_state: Option<&str>,
        browser: &dyn BrowserContext,
    ) -> Option<String> {
        let persona = match storage_state {
            Some(path) => match Persona::from_auth_file(path) {
                Some(persona) => persona,
                None => {
                    info!(
                        test = test_name,
                        auth_file = path,
                        "Unknown auth file - skipping token refresh"
                    );
                    return None;
                }
            },
            None => {
                info!(test = test_name, "No storage state configured - using admin_user");
                Persona::AdminUser
            }
        };

        info!(test = test_name, persona = %persona, "Checking token before test");
        match self.ensure_valid(persona, browser).await {
            Ok(status) => status.into_token(),
            Err(e) => {
                error!(test = test_name, persona = %persona, error = %e, "Failed to refresh token");
                None
            }
        }
    }

    /// Expiry of the token stored in the persona's auth-state file
    pub fn stored_expiry(&self, persona: Persona) -> Option<TokenExpiry> {
        self.store.stored_expiry(persona, self.buffer)
    }
}
