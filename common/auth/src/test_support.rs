use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

use async_trait::async_trait;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use rsa::pkcs1::{EncodeRsaPrivateKey, EncodeRsaPublicKey, LineEnding};
use rsa::rand_core::OsRng;
use rsa::RsaPrivateKey;
use serde_json::{json, Value};
use tokio::sync::Notify;

use crate::claims::Claims;
use crate::decoder::TokenDecoder;
use crate::error::{AuthError, AuthResult};
use crate::fetcher::KeyFetcher;
use crate::key_source::PublicKey;

/// Fetcher replaying a fixed list of responses, optionally held until released.
pub(crate) struct ScriptedFetcher {
    responses: Mutex<VecDeque<AuthResult<PublicKey>>>,
    calls: AtomicUsize,
    gate: Option<Arc<Notify>>,
}

impl ScriptedFetcher {
    pub(crate) fn new(responses: Vec<AuthResult<&'static str>>) -> Self {
        Self {
            responses: Mutex::new(
                responses
                    .into_iter()
                    .map(|response| response.map(PublicKey::from))
                    .collect(),
            ),
            calls: AtomicUsize::new(0),
            gate: None,
        }
    }

    pub(crate) fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KeyFetcher for ScriptedFetcher {
    async fn fetch(&self, _url: &str) -> AuthResult<PublicKey> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.responses
            .lock()
            .expect("responses lock")
            .pop_front()
            .unwrap_or_else(|| Err(AuthError::KeyFetch("no scripted response".into())))
    }
}

/// Accepts `signed-by:<key>` tokens when `<key>` is the current key.
#[derive(Default)]
pub(crate) struct StubDecoder {
    calls: AtomicUsize,
}

impl StubDecoder {
    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TokenDecoder for StubDecoder {
    fn decode(&self, token: &str, key: Option<&PublicKey>) -> AuthResult<Claims> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let key = key.ok_or(AuthError::MissingKey)?;
        match token.strip_prefix("signed-by:") {
            Some(signer) if signer == key.as_str() => Claims::try_from(json!({ "sub": signer })),
            _ => Err(AuthError::Token("signature mismatch".into())),
        }
    }
}

pub(crate) struct RsaKeyPair {
    pub(crate) encoding: EncodingKey,
    pub(crate) public: PublicKey,
}

fn generate_key_pair() -> RsaKeyPair {
    let mut rng = OsRng;
    let private_key = RsaPrivateKey::new(&mut rng, 2048).expect("key generation");
    let public_key = private_key.to_public_key();

    let private_pem = private_key
        .to_pkcs1_pem(LineEnding::LF)
        .expect("private pem");
    let public_pem = public_key.to_pkcs1_pem(LineEnding::LF).expect("public pem");

    RsaKeyPair {
        encoding: EncodingKey::from_rsa_pem(private_pem.as_bytes()).expect("encoding key"),
        public: PublicKey::from(public_pem),
    }
}

/// Two distinct RSA key pairs, generated once per test binary.
pub(crate) fn key_pairs() -> &'static [RsaKeyPair; 2] {
    static PAIRS: OnceLock<[RsaKeyPair; 2]> = OnceLock::new();
    PAIRS.get_or_init(|| [generate_key_pair(), generate_key_pair()])
}

pub(crate) fn issue_token_with(pair: &RsaKeyPair, claims: Value) -> String {
    encode(&Header::new(Algorithm::RS256), &claims, &pair.encoding).expect("sign token")
}

pub(crate) fn issue_token(pair: &RsaKeyPair, subject: &str) -> String {
    let issued_at = chrono::Utc::now().timestamp();
    issue_token_with(
        pair,
        json!({ "sub": subject, "iat": issued_at, "exp": issued_at + 600 }),
    )
}
