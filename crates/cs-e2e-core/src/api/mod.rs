//! REST API client for the Content Sources service.
//!
//! Requests go to `BASE_URL + /api/content-sources/v1`, authenticated with
//! either an `x-rh-identity` header or a persona's `cs_jwt` bearer token.

pub mod client;
pub mod error;
pub mod expect;

pub use client::{
    api_base_path, is_insecure_dev_host, ApiClient, ClientOptions, Credentials, API_PATH,
};
pub use error::ApiError;
pub use expect::{expect_error, expect_error_status};
