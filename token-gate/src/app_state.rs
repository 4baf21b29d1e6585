use axum::extract::FromRef;
use common_token_auth::TokenVerifier;

#[derive(Clone)]
pub struct AppState {
    pub verifier: TokenVerifier,
}

impl AppState {
    pub fn new(verifier: TokenVerifier) -> Self {
        Self { verifier }
    }
}

impl FromRef<AppState> for TokenVerifier {
    fn from_ref(state: &AppState) -> Self {
        state.verifier.clone()
    }
}
