//! Shared async HTTP client
//!
//! One pooled `reqwest::Client` per pipeline. Every transport or status
//! failure surfaces as `ErrorCode::TransientNetwork` so the caller decides
//! whether to retry.

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

use crate::error::{BridgeError, BridgeResult};

/// HTTP client with connection reuse
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new(timeout: Duration, user_agent: &str) -> BridgeResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(5)
            .tcp_keepalive(Duration::from_secs(60))
            .tcp_nodelay(true)
            .user_agent(user_agent)
            .build()
            .map_err(|e| BridgeError::internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// Underlying client, for requests needing custom headers
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// GET and decode JSON, any non-2xx status is an error
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> BridgeResult<T> {
        let response = self.client.get(url).send().await?;
        decode(response, url).await
    }

    /// GET and decode JSON, mapping 404 to `None`
    pub async fn get_optional_json<T: DeserializeOwned>(&self, url: &str) -> BridgeResult<Option<T>> {
        let response = self.client.get(url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        decode(response, url).await.map(Some)
    }

    /// POST a JSON body and decode the JSON response
    pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
    ) -> BridgeResult<T> {
        let response = self.client.post(url).json(body).send().await?;
        decode(response, url).await
    }

    /// POST a JSON body, ignoring the response payload
    pub async fn post_json_unit<B: Serialize + ?Sized>(&self, url: &str, body: &B) -> BridgeResult<()> {
        let response = self.client.post(url).json(body).send().await?;
        check_status(response.status(), url)
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response, url: &str) -> BridgeResult<T> {
    check_status(response.status(), url)?;
    response.json::<T>().await.map_err(|e| {
        BridgeError::transient_network("Malformed response body")
            .with_details(format!("{}: {}", endpoint_label(url), e))
    })
}

fn check_status(status: StatusCode, url: &str) -> BridgeResult<()> {
    if status.is_success() {
        return Ok(());
    }
    Err(BridgeError::transient_network(format!("HTTP {}", status.as_u16()))
        .with_details(endpoint_label(url)))
}

/// Host and path without the query string, for error details
pub fn endpoint_label(url: &str) -> String {
    match url::Url::parse(url) {
        Ok(parsed) => format!("{}{}", parsed.host_str().unwrap_or_default(), parsed.path()),
        Err(_) => url.split('?').next().unwrap_or(url).to_string(),
    }
}

/// Join a base URL and a path without doubling slashes
pub fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_label_drops_query() {
        assert_eq!(
            endpoint_label("https://api.example.com/v1/address?key=secret"),
            "api.example.com/v1/address"
        );
        assert_eq!(endpoint_label("not a url?x=1"), "not a url");
    }

    #[test]
    fn test_join_url() {
        assert_eq!(join_url("https://a.b/", "/c/d"), "https://a.b/c/d");
        assert_eq!(join_url("https://a.b", "c"), "https://a.b/c");
    }

    #[test]
    fn test_client_creation() {
        let client = HttpClient::new(Duration::from_secs(5), "vault-bridge/test").unwrap();
        assert!(client.client().get("https://example.com").build().is_ok());
    }

    #[test]
    fn test_status_errors_are_transient() {
        let err = check_status(StatusCode::BAD_GATEWAY, "https://rpc.example.com/x").unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::TransientNetwork);
        assert!(check_status(StatusCode::OK, "https://rpc.example.com").is_ok());
    }
}
