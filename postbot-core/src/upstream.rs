//! Shared plumbing for the HTTP collaborators.

use reqwest::{Client, Response};
use std::time::Duration;

use crate::error::{PostbotError, Result};

pub(crate) fn http_client() -> Result<Client> {
    Ok(Client::builder().timeout(Duration::from_secs(30)).build()?)
}

/// Passes 2xx responses through; anything else becomes `UpstreamApi` with the
/// response body embedded.
pub(crate) async fn ensure_success(service: &'static str, response: Response) -> Result<Response> {
    ensure_status(service, response, |s| s.is_success()).await
}

/// Like [`ensure_success`] but with an exact expected status.
pub(crate) async fn ensure_status_code(
    service: &'static str,
    response: Response,
    expected: u16,
) -> Result<Response> {
    ensure_status(service, response, |s| s.as_u16() == expected).await
}

async fn ensure_status(
    service: &'static str,
    response: Response,
    accept: impl Fn(reqwest::StatusCode) -> bool,
) -> Result<Response> {
    let status = response.status();
    if accept(status) {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    tracing::error!(service, status = status.as_u16(), body = %body, "Upstream API error");
    Err(PostbotError::UpstreamApi {
        service,
        status: status.as_u16(),
        body,
    })
}
