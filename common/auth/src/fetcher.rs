use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::warn;

use crate::error::{AuthError, AuthResult};
use crate::key_source::PublicKey;

/// Retrieves public key material from a key-distribution endpoint.
#[async_trait]
pub trait KeyFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> AuthResult<PublicKey>;
}

/// Fetches the key over HTTP and treats the response body as opaque PEM text.
#[derive(Clone)]
pub struct HttpKeyFetcher {
    client: Client,
}

impl HttpKeyFetcher {
    pub fn new(timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|err| {
                warn!(error = %err, "failed to build key fetch client, using defaults");
                Client::new()
            });
        Self { client }
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl Default for HttpKeyFetcher {
    fn default() -> Self {
        Self::new(Duration::from_secs(10))
    }
}

#[async_trait]
impl KeyFetcher for HttpKeyFetcher {
    async fn fetch(&self, url: &str) -> AuthResult<PublicKey> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| AuthError::KeyFetch(err.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::KeyFetch(format!(
                "HTTP {} from {}",
                response.status(),
                url
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|err| AuthError::KeyFetch(err.to_string()))?;
        if body.trim().is_empty() {
            return Err(AuthError::KeyFetch(format!("empty key body from {url}")));
        }

        Ok(PublicKey::from(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    const PEM: &str = "-----BEGIN PUBLIC KEY-----\nMFkwEwYHKoZIzj0CAQ==\n-----END PUBLIC KEY-----\n";

    #[tokio::test]
    async fn fetch_returns_body_verbatim() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/public-key");
            then.status(200).body(PEM);
        });

        let key = HttpKeyFetcher::default()
            .fetch(&server.url("/public-key"))
            .await
            .expect("fetch succeeds");

        assert_eq!(key.as_str(), PEM);
        mock.assert();
    }

    #[tokio::test]
    async fn non_success_status_is_a_fetch_failure() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/public-key");
            then.status(503).body("unavailable");
        });

        let err = HttpKeyFetcher::default()
            .fetch(&server.url("/public-key"))
            .await
            .expect_err("fetch should fail");
        assert!(matches!(err, AuthError::KeyFetch(message) if message.contains("503")));
    }

    #[tokio::test]
    async fn empty_body_is_a_fetch_failure() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/public-key");
            then.status(200).body("  \n");
        });

        let err = HttpKeyFetcher::default()
            .fetch(&server.url("/public-key"))
            .await
            .expect_err("fetch should fail");
        assert!(matches!(err, AuthError::KeyFetch(_)));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_fetch_failure() {
        let fetcher = HttpKeyFetcher::new(Duration::from_secs(2));
        let err = fetcher
            .fetch("http://127.0.0.1:1/public-key")
            .await
            .expect_err("fetch should fail");
        assert!(matches!(err, AuthError::KeyFetch(_)));
    }
}
