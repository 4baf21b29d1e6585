use std::time::Duration;

use jsonwebtoken::Algorithm;
use reqwest::Url;
use serde::Deserialize;

use crate::error::{AuthError, AuthResult};

const DEFAULT_FETCH_TIMEOUT_MS: u64 = 10_000;

/// Asymmetric algorithms accepted unless configured otherwise.
pub const DEFAULT_ALGORITHMS: &[Algorithm] = &[
    Algorithm::RS256,
    Algorithm::RS384,
    Algorithm::RS512,
    Algorithm::PS256,
    Algorithm::PS384,
    Algorithm::PS512,
    Algorithm::ES256,
    Algorithm::ES384,
    Algorithm::EdDSA,
];

/// Runtime configuration for the refreshing token verifier.
///
/// Either build it from a bare URL (`"https://auth/key".into()`) or deserialize
/// it from a config object carrying a `public_key_url` field.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VerifierConfig {
    /// Endpoint serving the PEM-encoded public key.
    pub public_key_url: String,
    /// Timeout applied to each key fetch, in milliseconds.
    pub fetch_timeout_ms: u64,
    /// Minimum spacing between two key fetches; zero disables throttling.
    pub min_refresh_interval_ms: u64,
    /// Allowable clock skew in seconds when validating exp/nbf.
    pub leeway_seconds: u64,
    /// Expected issuer claim (iss), unchecked when absent.
    pub issuer: Option<String>,
    /// Expected audience claim (aud), unchecked when absent.
    pub audience: Option<String>,
    pub algorithms: Vec<Algorithm>,
    /// Fetch the key in the background as soon as the verifier is built.
    pub prefetch: bool,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            public_key_url: String::new(),
            fetch_timeout_ms: DEFAULT_FETCH_TIMEOUT_MS,
            min_refresh_interval_ms: 0,
            leeway_seconds: 0,
            issuer: None,
            audience: None,
            algorithms: DEFAULT_ALGORITHMS.to_vec(),
            prefetch: true,
        }
    }
}

impl VerifierConfig {
    pub fn new(public_key_url: impl Into<String>) -> Self {
        Self {
            public_key_url: public_key_url.into(),
            ..Self::default()
        }
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout_ms = duration_millis(timeout);
        self
    }

    pub fn with_min_refresh_interval(mut self, interval: Duration) -> Self {
        self.min_refresh_interval_ms = duration_millis(interval);
        self
    }

    /// Adjust the allowed leeway.
    pub fn with_leeway(mut self, seconds: u64) -> Self {
        self.leeway_seconds = seconds;
        self
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    pub fn with_algorithms(mut self, algorithms: impl IntoIterator<Item = Algorithm>) -> Self {
        self.algorithms = algorithms.into_iter().collect();
        self
    }

    /// Skip the background fetch at build time; the first failing verification fetches instead.
    pub fn without_prefetch(mut self) -> Self {
        self.prefetch = false;
        self
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    pub fn min_refresh_interval(&self) -> Duration {
        Duration::from_millis(self.min_refresh_interval_ms)
    }

    /// Returns the trimmed key endpoint, or a configuration error when it is unusable.
    pub fn key_endpoint(&self) -> AuthResult<&str> {
        let raw = self.public_key_url.trim();
        if raw.is_empty() {
            return Err(AuthError::Configuration(
                "verifier must be initialised with public_key_url".to_string(),
            ));
        }

        let url = Url::parse(raw).map_err(|err| {
            AuthError::Configuration(format!("invalid public_key_url '{raw}': {err}"))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(AuthError::Configuration(format!(
                "public_key_url '{raw}' must use http or https"
            )));
        }

        if self.algorithms.is_empty() {
            return Err(AuthError::Configuration(
                "at least one token algorithm must be allowed".to_string(),
            ));
        }

        Ok(raw)
    }
}

impl From<&str> for VerifierConfig {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for VerifierConfig {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
