use std::fmt;
use std::sync::Arc;

use tokio::runtime::Handle;
use tracing::{debug, info, warn};

use crate::bearer::{get_bearer_token, normalize_bearer, HeaderSource};
use crate::claims::Claims;
use crate::config::VerifierConfig;
use crate::decoder::{JwtDecoder, TokenDecoder};
use crate::error::{AuthError, AuthResult};
use crate::fetcher::{HttpKeyFetcher, KeyFetcher};
use crate::key_source::{KeySource, PublicKey};

/// Outcome of [`TokenVerifier::verify`].
#[derive(Debug, Clone)]
pub enum Verification {
    Verified(Claims),
    /// No token was supplied; the caller decides how to respond.
    NoCredential,
    /// Both attempts failed. Deliberately carries no cause.
    Rejected,
}

impl Verification {
    pub fn is_verified(&self) -> bool {
        matches!(self, Verification::Verified(_))
    }

    pub fn claims(&self) -> Option<&Claims> {
        match self {
            Verification::Verified(claims) => Some(claims),
            _ => None,
        }
    }

    /// `Rejected` becomes [`AuthError::VerificationFailed`]; no credential is `Ok(None)`.
    pub fn into_result(self) -> AuthResult<Option<Claims>> {
        match self {
            Verification::Verified(claims) => Ok(Some(claims)),
            Verification::NoCredential => Ok(None),
            Verification::Rejected => Err(AuthError::VerificationFailed),
        }
    }
}

/// Verifies bearer tokens, re-fetching the public key once when a token fails.
///
/// Cloning is cheap; clones share the same [`KeySource`].
#[derive(Clone)]
pub struct TokenVerifier {
    keys: Arc<KeySource>,
    decoder: Arc<dyn TokenDecoder>,
}

impl TokenVerifier {
    /// Build a verifier with the HTTP fetcher and `jsonwebtoken` decoder.
    pub fn new(config: impl Into<VerifierConfig>) -> AuthResult<Self> {
        Self::builder(config).build()
    }

    pub fn builder(config: impl Into<VerifierConfig>) -> TokenVerifierBuilder {
        TokenVerifierBuilder::new(config.into())
    }

    pub fn key_source(&self) -> &Arc<KeySource> {
        &self.keys
    }

    pub fn key_endpoint(&self) -> &str {
        self.keys.key_endpoint()
    }

    /// Verify a token or a full `Bearer <token>` header value.
    ///
    /// Only a failed first attempt suspends: the key is refreshed and the
    /// token is checked exactly once more against whatever key is then current.
    pub async fn verify<'a>(&self, token: impl Into<Option<&'a str>>) -> Verification {
        let token = token.into().and_then(normalize_bearer);
        self.verify_token(token).await
    }

    /// Verify the bearer token carried by a request's `Authorization` header.
    pub async fn verify_request<R>(&self, request: &R) -> Verification
    where
        R: HeaderSource + ?Sized,
    {
        self.verify_token(get_bearer_token(request)).await
    }

    pub(crate) async fn verify_token(&self, token: Option<String>) -> Verification {
        let Some(token) = token else {
            return Verification::NoCredential;
        };

        match self.attempt(&token) {
            Ok(claims) => return Verification::Verified(claims),
            Err(err) => {
                info!(error = %err, "token verification failed, re-fetching public key");
            }
        }

        self.keys.refresh().await;

        match self.attempt(&token) {
            Ok(claims) => Verification::Verified(claims),
            Err(err) => {
                info!(error = %err, "could not verify token");
                Verification::Rejected
            }
        }
    }

    fn attempt(&self, token: &str) -> AuthResult<Claims> {
        let key = self.keys.current_key();
        let claims = self.decoder.decode(token, key.as_deref())?;
        debug!(subject = ?claims.subject, "verified token");
        Ok(claims)
    }

    fn spawn_initial_refresh(&self) {
        match Handle::try_current() {
            Ok(handle) => {
                let keys = self.keys.clone();
                handle.spawn(async move {
                    keys.refresh().await;
                });
            }
            Err(_) => {
                warn!(
                    key_url = %self.keys.key_endpoint(),
                    "no async runtime available; public key will be fetched on first verification"
                );
            }
        }
    }
}

impl fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("keys", &self.keys)
            .finish_non_exhaustive()
    }
}

pub struct TokenVerifierBuilder {
    config: VerifierConfig,
    fetcher: Option<Arc<dyn KeyFetcher>>,
    decoder: Option<Arc<dyn TokenDecoder>>,
    initial_key: Option<PublicKey>,
}

impl TokenVerifierBuilder {
    fn new(config: VerifierConfig) -> Self {
        Self {
            config,
            fetcher: None,
            decoder: None,
            initial_key: None,
        }
    }

    pub fn with_fetcher(mut self, fetcher: Arc<dyn KeyFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn with_decoder(mut self, decoder: Arc<dyn TokenDecoder>) -> Self {
        self.decoder = Some(decoder);
        self
    }

    /// Seed the key cache, e.g. with a PEM shipped alongside local config.
    pub fn with_initial_key(mut self, key: impl Into<PublicKey>) -> Self {
        self.initial_key = Some(key.into());
        self
    }

    /// Validate the configuration and start the background key fetch.
    pub fn build(self) -> AuthResult<TokenVerifier> {
        let endpoint = self.config.key_endpoint()?.to_owned();
        let fetcher = self
            .fetcher
            .unwrap_or_else(|| Arc::new(HttpKeyFetcher::new(self.config.fetch_timeout())));
        let decoder = self
            .decoder
            .unwrap_or_else(|| Arc::new(JwtDecoder::new(&self.config)));

        let mut keys = KeySource::new(endpoint, fetcher)
            .with_min_refresh_interval(self.config.min_refresh_interval());
        if let Some(key) = self.initial_key {
            keys = keys.with_key(key);
        }

        let verifier = TokenVerifier {
            keys: Arc::new(keys),
            decoder,
        };
        if self.config.prefetch {
            verifier.spawn_initial_refresh();
        }
        Ok(verifier)
    }
}
