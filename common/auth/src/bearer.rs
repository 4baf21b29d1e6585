use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::{HeaderMap, Request};

const BEARER_PREFIX: &str = "Bearer ";

/// Strip one `"Bearer "` occurrence and then one stray space from a credential.
///
/// Returns `None` when nothing is left, which callers treat as "no credential".
pub fn normalize_bearer(raw: &str) -> Option<String> {
    let token = raw.replacen(BEARER_PREFIX, "", 1).replacen(' ', "", 1);
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

/// Anything exposing a case-insensitive header lookup.
pub trait HeaderSource {
    fn header(&self, name: &str) -> Option<&str>;
}

impl HeaderSource for HeaderMap {
    fn header(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|value| value.to_str().ok())
    }
}

impl HeaderSource for Parts {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers.header(name)
    }
}

impl<B> HeaderSource for Request<B> {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers().header(name)
    }
}

/// Read the `Authorization` header and normalize it into a bare token.
pub fn get_bearer_token<R>(request: &R) -> Option<String>
where
    R: HeaderSource + ?Sized,
{
    request
        .header(AUTHORIZATION.as_str())
        .and_then(normalize_bearer)
}
