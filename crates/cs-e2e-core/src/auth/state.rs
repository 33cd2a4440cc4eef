//! On-disk browser auth state, one JSON file per persona.
//!
//! The files are written by the browser login flow (a cookie list plus
//! per-origin storage). We only care about the `cs_jwt` cookie, but keep every
//! other field so a refreshed file is still usable by the browser.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::jwt::{self, TokenExpiry};
use super::Persona;

/// Session cookie carrying the service JWT
pub const SESSION_COOKIE: &str = "cs_jwt";

/// Default auth directory, relative to the working directory
pub const DEFAULT_AUTH_DIR: &str = ".auth";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cookie {
    pub name: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_only: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secure: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub same_site: Option<String>,
}

impl Cookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            ..Default::default()
        }
    }

    /// Same name, and domain and path agree wherever both are known.
    /// A host falls under a parent cookie domain (`stage.foo.redhat.com`
    /// under `.foo.redhat.com`).
    fn same_slot(&self, other: &Cookie) -> bool {
        fn domains_agree(a: Option<&str>, b: Option<&str>) -> bool {
            match (a, b) {
                (Some(a), Some(b)) => {
                    let (a, b) = (a.trim_start_matches('.'), b.trim_start_matches('.'));
                    a == b || within(a, b) || within(b, a)
                }
                _ => true,
            }
        }
        fn within(host: &str, domain: &str) -> bool {
            host.strip_suffix(domain)
                .is_some_and(|prefix| prefix.ends_with('.'))
        }
        fn paths_agree(a: Option<&str>, b: Option<&str>) -> bool {
            match (a, b) {
                (Some(a), Some(b)) => a == b,
                _ => true,
            }
        }
        self.name == other.name
            && domains_agree(self.domain.as_deref(), other.domain.as_deref())
            && paths_agree(self.path.as_deref(), other.path.as_deref())
    }
}

/// Find a non-empty `cs_jwt` cookie
pub fn find_session_cookie(cookies: &[Cookie]) -> Option<&Cookie> {
    cookies
        .iter()
        .find(|c| c.name == SESSION_COOKIE && !c.value.is_empty())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthState {
    #[serde(default)]
    pub cookies: Vec<Cookie>,
    #[serde(default)]
    pub origins: Vec<serde_json::Value>,
}

impl AuthState {
    /// The session token as a `Bearer` string, if the cookie is present
    pub fn session_token(&self) -> Option<String> {
        find_session_cookie(&self.cookies).map(|c| jwt::bearer(&c.value))
    }

    /// Replace cookies that share name, domain and path; append the rest.
    ///
    /// A fresh non-empty `cs_jwt` replaces every stored one, whatever its
    /// domain, so the file never keeps a stale session token.
    pub fn merge_cookies(&mut self, fresh: Vec<Cookie>) {
        if find_session_cookie(&fresh).is_some() {
            self.cookies.retain(|c| c.name != SESSION_COOKIE);
        }
        for cookie in fresh {
            match self.cookies.iter_mut().find(|c| c.same_slot(&cookie)) {
                Some(existing) => *existing = cookie,
                None => self.cookies.push(cookie),
            }
        }
    }
}

pub struct AuthStateStore {
    dir: PathBuf,
}

impl AuthStateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, persona: Persona) -> PathBuf {
        self.dir.join(persona.auth_file())
    }

    /// Load a persona's auth state; `None` when no file exists yet
    pub fn load(&self, persona: Persona) -> Result<Option<AuthState>> {
        let path = self.path(persona);
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read auth state file: {}", path.display()))?;
        let state: AuthState = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse auth state file: {}", path.display()))?;

        Ok(Some(state))
    }

    pub fn save(&self, persona: Persona, state: &AuthState) -> Result<()> {
        let path = self.path(persona);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(state)?;
        std::fs::write(&path, contents)
            .with_context(|| format!("Failed to write auth state file: {}", path.display()))?;
        debug!(persona = %persona, path = %path.display(), "Saved auth state");
        Ok(())
    }

    /// The stored `cs_jwt` token for a persona, as a `Bearer` string
    pub fn stored_token(&self, persona: Persona) -> Result<Option<String>> {
        Ok(self.load(persona)?.and_then(|state| state.session_token()))
    }

    /// Expiry of the stored token. Any failure (missing file, unreadable
    /// file, missing cookie, malformed token) yields `None`.
    pub fn stored_expiry(&self, persona: Persona, buffer: Duration) -> Option<TokenExpiry> {
        let token = self.stored_token(persona).ok().flatten()?;
        jwt::check_expiry(&token, buffer).ok()
    }
}
