use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AuthError, AuthResult};

/// Decoded payload of a verified token.
///
/// The registered claims are lifted into typed fields; everything else stays
/// reachable through [`Claims::raw`].
#[derive(Debug, Clone, Serialize)]
pub struct Claims {
    pub subject: Option<String>,
    pub issuer: Option<String>,
    pub audience: Vec<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub issued_at: Option<DateTime<Utc>>,
    pub raw: Value,
}

impl Claims {
    /// Looks up an arbitrary claim by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.raw.get(name)
    }
}

/// Registered claims as they appear on the wire. Any JSON type is accepted;
/// values of an unexpected type are left out of the typed view.
#[derive(Debug, Deserialize)]
struct ClaimsRepr {
    #[serde(default)]
    sub: Option<Value>,
    #[serde(default)]
    iss: Option<Value>,
    #[serde(default)]
    aud: Option<Value>,
    #[serde(default)]
    exp: Option<Value>,
    #[serde(default)]
    iat: Option<Value>,
}

fn text(value: Option<Value>) -> Option<String> {
    match value? {
        Value::String(text) => Some(text),
        _ => None,
    }
}

fn audience(value: Option<Value>) -> Vec<String> {
    match value {
        Some(Value::String(item)) => vec![item],
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| text(Some(item)))
            .collect(),
        _ => Vec::new(),
    }
}

/// NumericDate may carry a fractional part; it is truncated to whole seconds.
fn timestamp(value: Option<Value>) -> Option<DateTime<Utc>> {
    let seconds = match value? {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))?,
        _ => return None,
    };
    Utc.timestamp_opt(seconds, 0).single()
}

impl From<ClaimsRepr> for Claims {
    fn from(value: ClaimsRepr) -> Self {
        Self {
            subject: text(value.sub),
            issuer: text(value.iss),
            audience: audience(value.aud),
            expires_at: timestamp(value.exp),
            issued_at: timestamp(value.iat),
            raw: Value::Null,
        }
    }
}

impl TryFrom<Value> for Claims {
    type Error = AuthError;

    /// Fails only when the payload is not a JSON object.
    fn try_from(value: Value) -> AuthResult<Self> {
        let repr: ClaimsRepr = serde_json::from_value(value.clone())
            .map_err(|err| AuthError::InvalidJson(err.to_string()))?;
        let mut claims = Claims::from(repr);
        claims.raw = value;
        Ok(claims)
    }
}
