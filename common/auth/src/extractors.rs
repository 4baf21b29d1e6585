use async_trait::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;

use crate::bearer::get_bearer_token;
use crate::claims::Claims;
use crate::error::AuthError;
use crate::verifier::TokenVerifier;

/// Extracts verified token claims from the request using the state's verifier.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub claims: Claims,
    pub token: String,
}

impl AuthContext {
    pub fn into_claims(self) -> Claims {
        self.claims
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthContext
where
    TokenVerifier: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let verifier = TokenVerifier::from_ref(state);
        let token = get_bearer_token(parts).ok_or(AuthError::MissingAuthorization)?;

        let claims = verifier
            .verify_token(Some(token.clone()))
            .await
            .into_result()?
            .ok_or(AuthError::MissingAuthorization)?;

        Ok(Self { claims, token })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VerifierConfig;
    use crate::test_support::{ScriptedFetcher, StubDecoder};
    use axum::body::Body;
    use axum::http::Request;
    use std::sync::Arc;

    fn verifier() -> TokenVerifier {
        TokenVerifier::builder(VerifierConfig::new("https://auth.internal/key").without_prefetch())
            .with_fetcher(Arc::new(ScriptedFetcher::new(vec![])))
            .with_decoder(Arc::new(StubDecoder::default()))
            .with_initial_key("K1")
            .build()
            .expect("valid config")
    }

    async fn extract(header: Option<&'static str>) -> Result<AuthContext, AuthError> {
        let mut builder = Request::builder().uri("/whoami");
        if let Some(value) = header {
            builder = builder.header("Authorization", value);
        }
        let (mut parts, _) = builder.body(Body::empty()).expect("request").into_parts();
        AuthContext::from_request_parts(&mut parts, &verifier()).await
    }

    #[tokio::test]
    async fn extracts_claims_for_valid_token() {
        let auth = extract(Some("Bearer signed-by:K1")).await.expect("authorised");
        assert_eq!(auth.token, "signed-by:K1");
        assert_eq!(auth.into_claims().subject.as_deref(), Some("K1"));
    }

    #[tokio::test]
    async fn missing_header_is_rejected() {
        let err = extract(None).await.expect_err("should reject");
        assert!(matches!(err, AuthError::MissingAuthorization));
    }

    #[tokio::test]
    async fn empty_bearer_is_treated_as_missing() {
        let err = extract(Some("Bearer ")).await.expect_err("should reject");
        assert!(matches!(err, AuthError::MissingAuthorization));
    }

    #[tokio::test]
    async fn invalid_token_is_rejected_after_refresh() {
        let err = extract(Some("Bearer signed-by:K2"))
            .await
            .expect_err("should reject");
        assert!(matches!(err, AuthError::VerificationFailed));
    }
}
