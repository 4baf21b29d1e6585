use axum::extract::State;
use axum::Json;
use common_token_auth::{AuthContext, KeySourceStatus};
use serde::Serialize;

use crate::app_state::AppState;

pub async fn health() -> &'static str {
    "ok"
}

pub async fn key_status(State(state): State<AppState>) -> Json<KeySourceStatus> {
    Json(state.verifier.key_source().status())
}

#[derive(Debug, Serialize)]
pub struct WhoAmI {
    pub subject: Option<String>,
    pub issuer: Option<String>,
    pub audience: Vec<String>,
    pub expires_at: Option<i64>,
    pub claims: serde_json::Value,
}

pub async fn whoami(auth: AuthContext) -> Json<WhoAmI> {
    let claims = auth.into_claims();
    Json(WhoAmI {
        subject: claims.subject,
        issuer: claims.issuer,
        audience: claims.audience,
        expires_at: claims.expires_at.map(|at| at.timestamp()),
        claims: claims.raw,
    })
}
