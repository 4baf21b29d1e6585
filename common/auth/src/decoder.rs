use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde_json::Value;

use crate::claims::Claims;
use crate::config::VerifierConfig;
use crate::error::{AuthError, AuthResult};
use crate::key_source::PublicKey;

/// Checks a token against a key and returns its decoded payload.
///
/// Implementations must fail on a bad signature, malformed structure, expired
/// or not-yet-valid tokens, and when no key is available yet.
pub trait TokenDecoder: Send + Sync {
    fn decode(&self, token: &str, key: Option<&PublicKey>) -> AuthResult<Claims>;
}

/// Default decoder backed by `jsonwebtoken`, reading the key as PEM.
#[derive(Debug, Clone)]
pub struct JwtDecoder {
    algorithms: Vec<Algorithm>,
    leeway: u64,
    issuer: Option<String>,
    audience: Option<String>,
}

impl JwtDecoder {
    pub fn new(config: &VerifierConfig) -> Self {
        Self {
            algorithms: config.algorithms.clone(),
            leeway: config.leeway_seconds,
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
        }
    }

    fn decoding_key(alg: Algorithm, pem: &[u8]) -> AuthResult<DecodingKey> {
        let key = match alg {
            Algorithm::RS256
            | Algorithm::RS384
            | Algorithm::RS512
            | Algorithm::PS256
            | Algorithm::PS384
            | Algorithm::PS512 => DecodingKey::from_rsa_pem(pem),
            Algorithm::ES256 | Algorithm::ES384 => DecodingKey::from_ec_pem(pem),
            Algorithm::EdDSA => DecodingKey::from_ed_pem(pem),
            // HMAC families use the key text itself as the shared secret.
            _ => Ok(DecodingKey::from_secret(pem)),
        };
        key.map_err(|err| AuthError::KeyParse(err.to_string()))
    }

    fn validation(&self, alg: Algorithm) -> Validation {
        let mut validation = Validation::new(alg);
        validation.leeway = self.leeway;
        validation.validate_nbf = true;
        validation.required_spec_claims.clear();
        match &self.audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }
        if let Some(issuer) = &self.issuer {
            validation.set_issuer(&[issuer]);
        }
        validation
    }
}

impl TokenDecoder for JwtDecoder {
    fn decode(&self, token: &str, key: Option<&PublicKey>) -> AuthResult<Claims> {
        let header =
            decode_header(token).map_err(|err| AuthError::InvalidHeader(err.to_string()))?;
        if !self.algorithms.contains(&header.alg) {
            return Err(AuthError::DisallowedAlgorithm(header.alg));
        }

        let key = key.ok_or(AuthError::MissingKey)?;
        let decoding_key = Self::decoding_key(header.alg, key.as_bytes())?;
        let token_data = decode::<Value>(token, &decoding_key, &self.validation(header.alg))?;
        Claims::try_from(token_data.claims)
    }
}
