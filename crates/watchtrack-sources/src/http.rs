use crate::error::{SourceError, SourceResult};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Build a reqwest client with the given request timeout
pub fn build_client(service: &'static str, timeout: Duration) -> SourceResult<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("watchtrack/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| SourceError::from_reqwest(service, e))
}

/// Send and fail on any non-success status
pub async fn send(service: &'static str, request: RequestBuilder, what: &str) -> SourceResult<Response> {
    let response = request.send().await.map_err(|e| SourceError::from_reqwest(service, e))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(SourceError::from_status(service, status, body, what));
    }
    Ok(response)
}

/// Send and decode a JSON body
pub async fn send_json<T: DeserializeOwned>(
    service: &'static str,
    request: RequestBuilder,
    what: &str,
) -> SourceResult<T> {
    let response = send(service, request, what).await?;
    response.json::<T>().await.map_err(|e| SourceError::Decode {
        service,
        message: format!("{}: {}", what, e),
    })
}

/// Like [`send_json`] but a 404 is an absent value rather than an error
pub async fn send_json_optional<T: DeserializeOwned>(
    service: &'static str,
    request: RequestBuilder,
    what: &str,
) -> SourceResult<Option<T>> {
    match send_json(service, request, what).await {
        Ok(value) => Ok(Some(value)),
        Err(SourceError::NotFound { .. }) => Ok(None),
        Err(e) => Err(e),
    }
}
