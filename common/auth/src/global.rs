//! Opt-in process-wide verifier for code that cannot thread a handle through.
//!
//! The first successful initialisation wins; later calls get the same
//! instance back and their configuration is ignored.

use once_cell::sync::OnceCell;
use tracing::debug;

use crate::config::VerifierConfig;
use crate::error::AuthResult;
use crate::verifier::TokenVerifier;

static GLOBAL: OnceCell<TokenVerifier> = OnceCell::new();

pub fn init_global(config: impl Into<VerifierConfig>) -> AuthResult<&'static TokenVerifier> {
    let config = config.into();
    if let Some(existing) = GLOBAL.get() {
        debug!(
            key_url = %existing.key_endpoint(),
            requested_url = %config.public_key_url,
            "global token verifier already initialised; ignoring new configuration"
        );
        return Ok(existing);
    }

    GLOBAL.get_or_try_init(|| TokenVerifier::new(config))
}

pub fn global() -> Option<&'static TokenVerifier> {
    GLOBAL.get()
}
