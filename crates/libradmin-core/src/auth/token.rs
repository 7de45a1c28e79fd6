//! Bearer credential decoding.
//!
//! Credentials are JWT-shaped: `header.payload.signature`. The client never
//! verifies the signature; it only reads the payload to learn when the
//! credential stops being worth sending.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, URL_SAFE_NO_PAD};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;

/// JWTs use the URL-safe alphabet without padding, but some issuers pad or
/// use the standard alphabet, so both are accepted.
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Number of dot-separated segments in a well-formed credential
const SEGMENT_COUNT: usize = 3;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("credential has {0} segments, expected 3")]
    Format(usize),

    #[error("credential payload is not valid base64")]
    Encoding,

    #[error("credential payload is not a JSON object: {0}")]
    Payload(String),

    #[error("credential payload has no numeric expiry")]
    MissingExpiry,
}

/// Claims read from a credential payload.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenClaims {
    /// Expiry in seconds since the Unix epoch (may be fractional)
    pub exp: f64,
    pub sub: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
}

impl TokenClaims {
    /// Decode the payload segment of `token`.
    pub fn decode(token: &str) -> Result<Self, TokenError> {
        let segments: Vec<&str> = token.split('.').collect();
        if segments.len() != SEGMENT_COUNT {
            return Err(TokenError::Format(segments.len()));
        }

        let payload = segments[1];
        let bytes = URL_SAFE_LENIENT
            .decode(payload)
            .or_else(|_| STANDARD_LENIENT.decode(payload))
            .map_err(|_| TokenError::Encoding)?;

        let value: Value =
            serde_json::from_slice(&bytes).map_err(|e| TokenError::Payload(e.to_string()))?;
        let object = value
            .as_object()
            .ok_or_else(|| TokenError::Payload("payload is not an object".to_string()))?;

        let exp = object
            .get("exp")
            .and_then(Value::as_f64)
            .ok_or(TokenError::MissingExpiry)?;

        Ok(Self {
            exp,
            sub: object.get("sub").and_then(scalar_to_string),
            email: object.get("email").and_then(scalar_to_string),
            role: object.get("role").and_then(scalar_to_string),
        })
    }

    /// Expiry at millisecond precision
    pub fn exp_millis(&self) -> i64 {
        (self.exp * 1000.0).round() as i64
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.exp_millis())
    }

    /// A credential is expired once its expiry lies strictly before `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.exp_millis() < now.timestamp_millis()
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Best identifier for display: email, then subject.
    pub fn display_name(&self) -> Option<&str> {
        self.email.as_deref().or(self.sub.as_deref())
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Build an unsigned credential carrying `payload`.
///
/// The signature segment is a fixed placeholder. Used by tests and local
/// tooling that need a decodable credential without a live issuer.
pub fn unsigned_token(payload: &Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
    let body = URL_SAFE_NO_PAD.encode(payload.to_string().as_bytes());
    format!("{}.{}.unsigned", header, body)
}
