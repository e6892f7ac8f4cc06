// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! HMAC request-signature verification with anti-replay.
//!
//! Every signed request carries a key id, a unix timestamp, a random nonce,
//! and a base64 HMAC-SHA256 over the canonical string
//!
//! ```text
//! METHOD\nURI\nTIMESTAMP\nNONCE\nSHA256HEX(BODY)
//! ```
//!
//! Verification checks, in order: timestamp freshness (±60 s), key id
//! resolution, constant-time signature comparison, then single-use
//! consumption of the signature via an atomic `set_nx` against the session
//! store. Two concurrent requests bearing an identical valid signature race
//! on that final write and exactly one passes.

use std::sync::Arc;
use std::time::Duration;

use base64ct::{Base64, Encoding};
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use uuid::Uuid;

use super::keys::KeyRing;
use super::AuthError;
use crate::store::SessionStore;

type HmacSha256 = Hmac<Sha256>;

/// Allowed clock difference between signer and verifier, in seconds. Doubles
/// as the replay-record TTL: once the window has passed, the timestamp check
/// rejects the signature on its own.
pub const ALLOWED_SKEW_SECS: i64 = 60;

/// Signature material extracted from request headers.
#[derive(Debug, Clone)]
pub struct SignaturePayload {
    pub key_id: String,
    pub timestamp: i64,
    pub nonce: String,
    /// Base64-encoded HMAC-SHA256 over the canonical string
    pub signature: String,
}

/// Verifies (and, for outbound calls and tests, produces) request signatures.
pub struct SignatureVerifier {
    ring: Arc<KeyRing>,
    store: Arc<dyn SessionStore>,
}

impl SignatureVerifier {
    pub fn new(ring: Arc<KeyRing>, store: Arc<dyn SessionStore>) -> Self {
        Self { ring, store }
    }

    /// Validate a signed request.
    ///
    /// The caller maps every `Err` to one uniform unauthorized response; the
    /// distinct variants exist for logs and tests only.
    pub async fn verify(
        &self,
        payload: &SignaturePayload,
        method: &str,
        uri: &str,
        body: &[u8],
    ) -> Result<(), AuthError> {
        let now = Utc::now().timestamp();
        if (now - payload.timestamp).abs() > ALLOWED_SKEW_SECS {
            return Err(AuthError::ExpiredTimestamp);
        }

        let key = self
            .ring
            .resolve(&payload.key_id)
            .ok_or(AuthError::UnknownSigningKey)?;

        let canonical = canonical_string(method, uri, payload.timestamp, &payload.nonce, body);
        let expected = compute_signature(key.secret(), &canonical)?;

        let matches: bool = expected
            .as_bytes()
            .ct_eq(payload.signature.as_bytes())
            .into();
        if !matches {
            return Err(AuthError::InvalidSignature);
        }

        // Consume the signature. set_nx both detects and records consumption
        // in one store-side operation; losing the race means a replay.
        let fresh = self
            .store
            .set_nx(
                &replay_key(&payload.signature),
                "1",
                Duration::from_secs(ALLOWED_SKEW_SECS as u64),
            )
            .await?;
        if !fresh {
            return Err(AuthError::ReplayedRequest);
        }

        Ok(())
    }

    /// Produce a signature payload using the current key, a fresh nonce, and
    /// the present time.
    pub fn sign(&self, method: &str, uri: &str, body: &[u8]) -> Result<SignaturePayload, AuthError> {
        let key = self.ring.current_key();
        let timestamp = Utc::now().timestamp();
        let nonce = Uuid::new_v4().simple().to_string();

        let canonical = canonical_string(method, uri, timestamp, &nonce, body);
        let signature = compute_signature(key.secret(), &canonical)?;

        Ok(SignaturePayload {
            key_id: key.id.clone(),
            timestamp,
            nonce,
            signature,
        })
    }
}

/// Build the string both sides sign.
fn canonical_string(method: &str, uri: &str, timestamp: i64, nonce: &str, body: &[u8]) -> String {
    let body_hash = hex::encode(Sha256::digest(body));
    format!("{method}\n{uri}\n{timestamp}\n{nonce}\n{body_hash}")
}

/// Base64 HMAC-SHA256 of the canonical string.
fn compute_signature(secret: &[u8], canonical: &str) -> Result<String, AuthError> {
    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| AuthError::InternalError(format!("hmac init: {e}")))?;
    mac.update(canonical.as_bytes());
    Ok(Base64::encode_string(&mac.finalize().into_bytes()))
}

/// Store key for a consumed signature: hash the signature rather than keying
/// on client-controlled bytes directly.
fn replay_key(signature: &str) -> String {
    format!("signature:{}", hex::encode(Sha256::digest(signature.as_bytes())))
}
