//! Assertions for negative-path API calls.

use std::future::Future;

use anyhow::{anyhow, bail, Result};
use reqwest::StatusCode;

use super::ApiError;

/// Await `call` and require it to fail with `status`, and, when
/// `body_contains` is non-empty, a response body containing that text.
///
/// Returns the error so callers can inspect it further.
pub async fn expect_error<T, F>(status: u16, body_contains: &str, call: F) -> Result<ApiError>
where
    F: Future<Output = Result<T>>,
{
    let err = match call.await {
        Ok(_) => bail!("Expected the call to fail with status {}, but it succeeded", status),
        Err(err) => err,
    };

    let api_error = err
        .downcast::<ApiError>()
        .map_err(|other| {
            anyhow!("Expected an API error with status {}, got: {:#}", status, other)
        })?;

    let expected = StatusCode::from_u16(status)?;
    match api_error.status() {
        Some(actual) if actual == expected => {}
        actual => bail!(
            "Expected status {}, got {:?}: {}",
            expected,
            actual.map(|s| s.as_u16()),
            api_error
        ),
    }

    if !body_contains.is_empty() {
        let body = api_error.body().unwrap_or_default();
        if !body.contains(body_contains) {
            bail!("Expected response body to contain {:?}, got {:?}", body_contains, body);
        }
    }

    Ok(api_error)
}

/// [`expect_error`] without a body check
pub async fn expect_error_status<T, F>(status: u16, call: F) -> Result<ApiError>
where
    F: Future<Output = Result<T>>,
{
    expect_error(status, "", call).await
}
