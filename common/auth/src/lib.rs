pub mod bearer;
pub mod claims;
pub mod config;
pub mod decoder;
pub mod error;
pub mod extractors;
pub mod fetcher;
pub mod global;
pub mod key_source;
pub mod verifier;

#[cfg(test)]
mod test_support;

pub use bearer::{get_bearer_token, normalize_bearer, HeaderSource};
pub use claims::Claims;
pub use config::{VerifierConfig, DEFAULT_ALGORITHMS};
pub use decoder::{JwtDecoder, TokenDecoder};
pub use error::{AuthError, AuthResult};
pub use extractors::AuthContext;
pub use fetcher::{HttpKeyFetcher, KeyFetcher};
pub use global::{global, init_global};
pub use key_source::{KeySource, KeySourceStatus, PublicKey, RefreshOutcome};
pub use verifier::{TokenVerifier, TokenVerifierBuilder, Verification};
