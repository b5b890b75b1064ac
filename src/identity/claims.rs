use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, URL_SAFE_NO_PAD};
use base64::engine::DecodePaddingMode;
use base64::{alphabet, Engine};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

// base64url, tolerant of trailing '=' since some issuers pad the payload
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Administrator,
    Applicant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Administrator => "ADMINISTRATOR",
            Role::Applicant => "APPLICANT",
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for Role {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ADMINISTRATOR" | "ADMIN" => Ok(Role::Administrator),
            "APPLICANT" => Ok(Role::Applicant),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

/// Claims carried in the middle segment of a bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: Role,
    /// Expiry, seconds since the Unix epoch.
    pub exp: i64,
}

impl Claims {
    /// Expired when `exp` is not strictly after `now_secs`.
    pub fn is_expired_at(&self, now_secs: i64) -> bool { self.exp <= now_secs }

    pub fn identity(&self) -> Identity {
        Identity { id: self.sub.clone(), username: self.sub.clone(), role: self.role }
    }
}

/// Read-only projection of a token's claims. Never persisted on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub username: String,
    pub role: Role,
}

#[derive(Debug, thiserror::Error)]
pub enum DecodeFailure {
    #[error("token is empty")]
    Empty,
    #[error("expected 3 dot-separated segments, found {0}")]
    SegmentCount(usize),
    #[error("payload is not valid base64url: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("payload is not a valid claims object: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Turns a raw credential into typed claims.
///
/// The session manager only talks to this trait, so a decoder that checks
/// signatures can replace [`UnverifiedDecoder`] without touching callers.
pub trait TokenDecoder: Send + Sync {
    fn decode(&self, token: &str) -> Result<Claims, DecodeFailure>;
}

/// Trusts the claims as received. No signature check.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnverifiedDecoder;

impl TokenDecoder for UnverifiedDecoder {
    fn decode(&self, token: &str) -> Result<Claims, DecodeFailure> { decode_claims(token) }
}

pub fn decode_claims(token: &str) -> Result<Claims, DecodeFailure> {
    let token = token.trim();
    if token.is_empty() { return Err(DecodeFailure::Empty); }
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 { return Err(DecodeFailure::SegmentCount(parts.len())); }
    let raw = PAYLOAD_ENGINE.decode(parts[1])?;
    let claims: Claims = serde_json::from_slice(&raw)?;
    Ok(claims)
}

/// Mint an unsigned token for local development logins.
///
/// The header declares `alg: none` and the signature segment is empty; the
/// result is accepted by [`UnverifiedDecoder`] only.
pub fn dev_token(sub: &str, role: Role, exp: i64) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
    let claims = Claims { sub: sub.to_string(), role, exp };
    // Claims is plain data; serialization cannot fail.
    let body = serde_json::to_vec(&claims).unwrap_or_default();
    format!("{}.{}.", header, URL_SAFE_NO_PAD.encode(body))
}
