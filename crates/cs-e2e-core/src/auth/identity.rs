//! The `x-rh-identity` header used to call the API as a specific org and user
//! without going through SSO.

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

pub const IDENTITY_HEADER: &str = "x-rh-identity";

const DEFAULT_ACCOUNT_NUMBER: &str = "11111";
const IDENTITY_TYPE: &str = "User";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub org_id: String,
    pub username: String,
    pub account_number: String,
}

#[derive(Serialize, Deserialize)]
struct Envelope {
    identity: Body,
}

#[derive(Serialize, Deserialize)]
struct Body {
    account_number: String,
    org_id: String,
    #[serde(rename = "type")]
    kind: String,
    internal: Internal,
    user: User,
}

#[derive(Serialize, Deserialize)]
struct Internal {
    org_id: String,
}

#[derive(Serialize, Deserialize)]
struct User {
    username: String,
}

impl Identity {
    pub fn new(org_id: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            org_id: org_id.into(),
            username: username.into(),
            account_number: DEFAULT_ACCOUNT_NUMBER.to_string(),
        }
    }

    pub fn with_account_number(mut self, account_number: impl Into<String>) -> Self {
        self.account_number = account_number.into();
        self
    }

    /// Base64 encoded identity document, ready to send as the header value
    pub fn header_value(&self) -> String {
        let envelope = Envelope {
            identity: Body {
                account_number: self.account_number.clone(),
                org_id: self.org_id.clone(),
                kind: IDENTITY_TYPE.to_string(),
                internal: Internal {
                    org_id: self.org_id.clone(),
                },
                user: User {
                    username: self.username.clone(),
                },
            },
        };
        // Serializing plain strings cannot fail
        let json = serde_json::to_string(&envelope).unwrap_or_default();
        STANDARD.encode(json)
    }

    /// Parse a header value. Accepts the bare base64 blob or a full
    /// `x-rh-identity: <blob>` line as CI exports it.
    pub fn parse_header(value: &str) -> Result<Self> {
        let blob = strip_header_name(value);
        let bytes = STANDARD
            .decode(blob)
            .context("Identity header is not valid base64")?;
        let envelope: Envelope =
            serde_json::from_slice(&bytes).context("Identity header is not an identity document")?;
        let body = envelope.identity;
        Ok(Self {
            org_id: body.org_id,
            username: body.user.username,
            account_number: body.account_number,
        })
    }
}

/// Drop a leading `x-rh-identity:` from a header line
pub fn strip_header_name(value: &str) -> &str {
    let trimmed = value.trim();
    match trimmed.split_once(':') {
        Some((name, rest)) if name.trim().eq_ignore_ascii_case(IDENTITY_HEADER) => rest.trim(),
        _ => trimmed,
    }
}
