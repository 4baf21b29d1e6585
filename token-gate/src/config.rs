use std::env;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use anyhow::{Context, Result};
use common_token_auth::VerifierConfig;

#[derive(Debug, Clone)]
pub struct GateConfig {
    pub verifier: VerifierConfig,
    pub host: String,
    pub port: u16,
}

impl GateConfig {
    pub fn from_env() -> Result<Self> {
        let public_key_url = env::var("PUBLIC_KEY_URL").context("PUBLIC_KEY_URL must be set")?;

        let mut verifier = VerifierConfig::new(public_key_url);
        if let Ok(issuer) = env::var("JWT_ISSUER") {
            verifier = verifier.with_issuer(issuer);
        }
        if let Ok(audience) = env::var("JWT_AUDIENCE") {
            verifier = verifier.with_audience(audience);
        }
        if let Some(leeway) = env::var("JWT_LEEWAY_SECONDS")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
        {
            verifier = verifier.with_leeway(leeway);
        }
        if let Some(timeout_ms) = env::var("KEY_FETCH_TIMEOUT_MS")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
        {
            verifier = verifier.with_fetch_timeout(Duration::from_millis(timeout_ms.max(100)));
        }
        if let Some(interval_ms) = env::var("KEY_MIN_REFRESH_INTERVAL_MS")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
        {
            verifier = verifier.with_min_refresh_interval(Duration::from_millis(interval_ms));
        }

        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(8080);

        Ok(Self {
            verifier,
            host,
            port,
        })
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self
            .host
            .parse()
            .with_context(|| format!("invalid HOST '{}'", self.host))?;
        Ok(SocketAddr::from((ip, self.port)))
    }
}
