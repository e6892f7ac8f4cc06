// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Typed, signed, time-bounded tokens.
//!
//! Five token kinds, each with its own secret and TTL. The kind is embedded
//! in the claims (`type`) so a token is self-describing, but verification
//! never trusts that claim to pick a secret: callers declare the kind they
//! expect, the signature is checked with that kind's secret, and only then
//! is the embedded kind compared.
//!
//! | Kind | TTL | Purpose |
//! |---|---|---|
//! | Access | 15 min | short-lived API authorization |
//! | Refresh | 7 days | session renewal |
//! | VerifyEmail | 1 hour | one-time account verification |
//! | Stream | 2 hours | media-ingest authorization |
//! | Internal | 5 min | service-to-service calls |

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use super::AuthError;

/// Token kind discriminator, embedded in claims as `type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenKind {
    Access,
    Refresh,
    VerifyEmail,
    Stream,
    Internal,
}

impl TokenKind {
    /// Fixed lifetime for tokens of this kind.
    pub fn ttl(&self) -> Duration {
        match self {
            TokenKind::Access => Duration::from_secs(15 * 60),
            TokenKind::Refresh => Duration::from_secs(7 * 24 * 60 * 60),
            TokenKind::VerifyEmail => Duration::from_secs(60 * 60),
            TokenKind::Stream => Duration::from_secs(2 * 60 * 60),
            TokenKind::Internal => Duration::from_secs(5 * 60),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "ACCESS",
            TokenKind::Refresh => "REFRESH",
            TokenKind::VerifyEmail => "VERIFY_EMAIL",
            TokenKind::Stream => "STREAM",
            TokenKind::Internal => "INTERNAL",
        }
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-kind signing secrets, one per token kind, resolved from configuration.
#[derive(Clone, Debug)]
pub struct TokenSecrets {
    pub access: String,
    pub refresh: String,
    pub verify_email: String,
    pub stream: String,
    pub internal: String,
}

/// A freshly signed token plus the issuance metadata callers need.
#[derive(Debug, Clone)]
pub struct SignedToken {
    pub token: String,
    pub jti: String,
    pub kind: TokenKind,
    /// Unix seconds
    pub issued_at: i64,
    /// Unix seconds
    pub expires_at: i64,
}

impl SignedToken {
    /// Seconds from issuance to expiry.
    pub fn expires_in(&self) -> i64 {
        self.expires_at - self.issued_at
    }
}

/// Result of a successful verification: the caller's claims plus the
/// reserved claims the service injected at signing time.
#[derive(Debug)]
pub struct Decoded<C> {
    pub claims: C,
    pub jti: String,
    pub kind: TokenKind,
    pub issued_at: i64,
    pub expires_at: i64,
}

impl<C> Decoded<C> {
    /// Remaining lifetime right now; zero if already past expiry.
    pub fn remaining(&self) -> Duration {
        let secs = self.expires_at - Utc::now().timestamp();
        Duration::from_secs(secs.max(0) as u64)
    }
}

/// Claims decoded without any signature or expiry validation.
///
/// Only safe for diagnostics; nothing here may gate a protected flow.
#[derive(Debug)]
pub struct UnverifiedToken {
    pub kind: Option<TokenKind>,
    pub jti: Option<String>,
    pub claims: serde_json::Value,
}

#[derive(Deserialize)]
struct ReservedClaims<C> {
    jti: String,
    #[serde(rename = "type")]
    kind: TokenKind,
    iat: i64,
    exp: i64,
    #[serde(flatten)]
    claims: C,
}

struct KindKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl KindKeys {
    fn from_secret(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

/// Issues and verifies typed tokens. Cheap to share behind an `Arc`.
pub struct TokenService {
    access: KindKeys,
    refresh: KindKeys,
    verify_email: KindKeys,
    stream: KindKeys,
    internal: KindKeys,
}

impl TokenService {
    pub fn new(secrets: &TokenSecrets) -> Self {
        Self {
            access: KindKeys::from_secret(&secrets.access),
            refresh: KindKeys::from_secret(&secrets.refresh),
            verify_email: KindKeys::from_secret(&secrets.verify_email),
            stream: KindKeys::from_secret(&secrets.stream),
            internal: KindKeys::from_secret(&secrets.internal),
        }
    }

    fn keys(&self, kind: TokenKind) -> &KindKeys {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
            TokenKind::VerifyEmail => &self.verify_email,
            TokenKind::Stream => &self.stream,
            TokenKind::Internal => &self.internal,
        }
    }

    /// Sign `claims` as a token of `kind`, injecting fresh `jti`, `iat`,
    /// `exp`, and the embedded `type`.
    ///
    /// `claims` must serialize to a JSON object; the reserved claim names
    /// are owned by the service and overwrite any caller-supplied values.
    pub fn sign<C: Serialize>(&self, kind: TokenKind, claims: &C) -> Result<SignedToken, AuthError> {
        let mut value = serde_json::to_value(claims)
            .map_err(|e| AuthError::InternalError(format!("claim serialization: {e}")))?;
        let object = value
            .as_object_mut()
            .ok_or_else(|| AuthError::InternalError("claims must be a JSON object".to_string()))?;

        let jti = Uuid::new_v4().to_string();
        let issued_at = Utc::now().timestamp();
        let expires_at = issued_at + kind.ttl().as_secs() as i64;

        object.insert("jti".to_string(), json!(jti));
        object.insert("type".to_string(), json!(kind));
        object.insert("iat".to_string(), json!(issued_at));
        object.insert("exp".to_string(), json!(expires_at));

        let token = encode(&Header::default(), &value, &self.keys(kind).encoding)
            .map_err(|e| AuthError::InternalError(format!("token encoding: {e}")))?;

        Ok(SignedToken {
            token,
            jti,
            kind,
            issued_at,
            expires_at,
        })
    }

    /// Verify `token` as a token of `kind`: signature with that kind's
    /// secret, exact expiry (no leeway), then the embedded `type` claim.
    pub fn verify<C: DeserializeOwned>(
        &self,
        kind: TokenKind,
        token: &str,
    ) -> Result<Decoded<C>, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;

        let data = decode::<ReservedClaims<C>>(token, &self.keys(kind).decoding, &validation)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
                _ => AuthError::InvalidToken,
            })?;

        let reserved = data.claims;
        if reserved.kind != kind {
            return Err(AuthError::TokenTypeMismatch);
        }

        Ok(Decoded {
            claims: reserved.claims,
            jti: reserved.jti,
            kind: reserved.kind,
            issued_at: reserved.iat,
            expires_at: reserved.exp,
        })
    }

    /// Decode claims without validating anything.
    pub fn decode_unsafe(&self, token: &str) -> Result<UnverifiedToken, AuthError> {
        let data = jsonwebtoken::dangerous::insecure_decode::<serde_json::Value>(token)
            .map_err(|_| AuthError::InvalidToken)?;
        let claims = data.claims;

        let kind = claims
            .get("type")
            .and_then(|v| serde_json::from_value::<TokenKind>(v.clone()).ok());
        let jti = claims
            .get("jti")
            .and_then(|v| v.as_str())
            .map(str::to_string);

        Ok(UnverifiedToken { kind, jti, claims })
    }
}
