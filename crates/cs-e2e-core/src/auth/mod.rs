//! Persona credentials: JWT expiry checks, the token cache, on-disk auth
//! state and the refresh flow.

mod browser;
mod cache;
mod error;
mod identity;
pub mod jwt;
mod manager;
mod persona;
mod state;

pub use browser::{BrowserContext, HttpBrowserContext};
pub use cache::TokenCache;
pub use error::TokenError;
pub use identity::{strip_header_name, Identity, IDENTITY_HEADER};
pub use jwt::{Claims, TokenExpiry, DEFAULT_BUFFER_MINUTES};
pub use manager::{TokenManager, TokenStatus, REFRESH_ROUTE};
pub use persona::{Persona, UnknownPersona, DEFAULT_TOKEN_VAR};
pub use state::{
    find_session_cookie, AuthState, AuthStateStore, Cookie, DEFAULT_AUTH_DIR, SESSION_COOKIE,
};
