//! Best-known public key for token verification and its on-demand refresh.
//!
//! The cached key is an immutable value swapped atomically, so readers never
//! block. Writers are serialized: concurrent refresh requests share a single
//! in-flight fetch instead of racing each other to overwrite the key.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwapOption;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::fetcher::KeyFetcher;

/// Opaque key material as served by the key endpoint (typically PEM text).
#[derive(Clone, PartialEq, Eq)]
pub struct PublicKey(Arc<str>);

impl PublicKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({} bytes)", self.0.len())
    }
}

impl From<String> for PublicKey {
    fn from(value: String) -> Self {
        Self(Arc::from(value))
    }
}

impl From<&str> for PublicKey {
    fn from(value: &str) -> Self {
        Self(Arc::from(value))
    }
}

/// Result of a [`KeySource::refresh`] call. Purely informational.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A fetch succeeded and replaced the cached key.
    Updated,
    /// The fetch failed; the previous key, if any, is still cached.
    Failed,
    /// Skipped because the previous fetch finished less than the minimum interval ago.
    Throttled,
}

impl RefreshOutcome {
    pub fn is_updated(self) -> bool {
        matches!(self, RefreshOutcome::Updated)
    }
}

/// Diagnostic snapshot of a key source.
#[derive(Debug, Clone, Serialize)]
pub struct KeySourceStatus {
    pub key_url: String,
    pub has_key: bool,
    pub last_fetch_succeeded: bool,
    pub fetch_attempts: u64,
}

#[derive(Debug, Default)]
struct RefreshState {
    last_attempt: Option<Instant>,
    last_outcome: Option<RefreshOutcome>,
}

pub struct KeySource {
    endpoint: String,
    fetcher: Arc<dyn KeyFetcher>,
    current: ArcSwapOption<PublicKey>,
    last_fetch_succeeded: AtomicBool,
    completed_fetches: AtomicU64,
    min_refresh_interval: Duration,
    in_flight: Mutex<RefreshState>,
}

impl KeySource {
    pub fn new(endpoint: impl Into<String>, fetcher: Arc<dyn KeyFetcher>) -> Self {
        Self {
            endpoint: endpoint.into(),
            fetcher,
            current: ArcSwapOption::empty(),
            last_fetch_succeeded: AtomicBool::new(false),
            completed_fetches: AtomicU64::new(0),
            min_refresh_interval: Duration::ZERO,
            in_flight: Mutex::new(RefreshState::default()),
        }
    }

    /// Seed the cache with a known key before the first fetch.
    pub fn with_key(self, key: PublicKey) -> Self {
        self.current.store(Some(Arc::new(key)));
        self
    }

    pub fn with_min_refresh_interval(mut self, interval: Duration) -> Self {
        self.min_refresh_interval = interval;
        self
    }

    pub fn key_endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn current_key(&self) -> Option<Arc<PublicKey>> {
        self.current.load_full()
    }

    pub fn last_fetch_succeeded(&self) -> bool {
        self.last_fetch_succeeded.load(Ordering::Acquire)
    }

    /// Number of fetches that have completed, successfully or not. A fetch
    /// dropped before completing is not counted.
    pub fn fetch_attempts(&self) -> u64 {
        self.completed_fetches.load(Ordering::Acquire)
    }

    pub fn status(&self) -> KeySourceStatus {
        KeySourceStatus {
            key_url: self.endpoint.clone(),
            has_key: self.current.load().is_some(),
            last_fetch_succeeded: self.last_fetch_succeeded(),
            fetch_attempts: self.fetch_attempts(),
        }
    }

    /// Fetch the key endpoint and replace the cached key on success.
    ///
    /// Never fails: a failed fetch leaves the previous key in place and is only
    /// visible through [`KeySource::last_fetch_succeeded`]. A caller arriving
    /// while another fetch is in flight waits for it and adopts its outcome.
    pub async fn refresh(&self) -> RefreshOutcome {
        let seen = self.completed_fetches.load(Ordering::Acquire);
        let mut state = self.in_flight.lock().await;

        if self.completed_fetches.load(Ordering::Acquire) != seen {
            return state.last_outcome.unwrap_or(RefreshOutcome::Failed);
        }

        if let Some(last) = state.last_attempt {
            if !self.min_refresh_interval.is_zero() && last.elapsed() < self.min_refresh_interval
            {
                info!(key_url = %self.endpoint, "public key refresh throttled");
                return RefreshOutcome::Throttled;
            }
        }

        info!(key_url = %self.endpoint, "fetching public key");
        let outcome = match self.fetcher.fetch(&self.endpoint).await {
            Ok(key) => {
                self.current.store(Some(Arc::new(key)));
                self.last_fetch_succeeded.store(true, Ordering::Release);
                RefreshOutcome::Updated
            }
            Err(err) => {
                warn!(key_url = %self.endpoint, error = %err, "problem connecting to public key server");
                self.last_fetch_succeeded.store(false, Ordering::Release);
                RefreshOutcome::Failed
            }
        };

        state.last_attempt = Some(Instant::now());
        state.last_outcome = Some(outcome);
        self.completed_fetches.fetch_add(1, Ordering::AcqRel);
        outcome
    }
}

impl fmt::Debug for KeySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeySource")
            .field("endpoint", &self.endpoint)
            .field("has_key", &self.current.load().is_some())
            .field("last_fetch_succeeded", &self.last_fetch_succeeded())
            .finish()
    }
}
