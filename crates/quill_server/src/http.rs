//! Shared HTTP plumbing for the clients.

use quill_error::{ServerError, ServerErrorKind};

/// Map a reqwest failure to an HTTP error with a hint for the common cases.
pub(crate) fn request_error(url: &str, e: reqwest::Error) -> ServerError {
    let message = if e.is_connect() {
        format!("Could not connect to {}. Is the server running? {}", url, e)
    } else if e.is_timeout() {
        format!("Request to {} timed out: {}", url, e)
    } else {
        format!("Request to {} failed: {}", url, e)
    };
    tracing::error!("{}", message);
    ServerError::new(ServerErrorKind::Http(message))
}

/// Pass success responses through; turn anything else into an API error.
pub(crate) async fn check_status(
    response: reqwest::Response,
) -> Result<reqwest::Response, ServerError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    tracing::error!(status = status.as_u16(), "Server returned error: {}", body);
    Err(ServerError::new(ServerErrorKind::Api {
        status: status.as_u16(),
        body,
    }))
}

/// GET the base URL and accept any success status.
pub(crate) async fn health_check(
    client: &reqwest::Client,
    base_url: &str,
) -> Result<(), ServerError> {
    tracing::debug!("Checking server health at {}", base_url);
    let response = client
        .get(base_url)
        .send()
        .await
        .map_err(|e| request_error(base_url, e))?;
    check_status(response).await?;
    tracing::debug!("Server is healthy");
    Ok(())
}
