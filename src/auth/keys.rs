// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Shared-secret signing keys for the request-signature protocol.
//!
//! Keys are parsed once at startup from the `SIGNATURE_KEYS` configuration
//! value (`id:base64secret` pairs, comma separated) and never mutated
//! afterwards. Several keys may be live at once so callers can rotate
//! without a flag day; exactly one key (`SIGNATURE_CURRENT_KEY_ID`) signs
//! new requests.

use std::collections::HashMap;

use base64ct::{Base64, Encoding};
use thiserror::Error;

/// A single shared-secret signing key.
#[derive(Clone, Debug)]
pub struct SigningKey {
    pub id: String,
    secret: Vec<u8>,
}

impl SigningKey {
    pub fn secret(&self) -> &[u8] {
        &self.secret
    }
}

/// Errors raised while building a [`KeyRing`] from configuration.
#[derive(Debug, Error)]
pub enum KeyRingError {
    #[error("no signing keys configured")]
    Empty,
    #[error("malformed signing key entry `{0}` (expected `id:base64secret`)")]
    MalformedEntry(String),
    #[error("signing key `{0}` has an invalid base64 secret")]
    BadSecret(String),
    #[error("signing key `{0}` configured more than once")]
    DuplicateKeyId(String),
    #[error("current key id `{0}` is not among the configured keys")]
    UnknownCurrentKey(String),
}

/// Immutable id → secret map with one designated current key.
#[derive(Clone, Debug)]
pub struct KeyRing {
    keys: HashMap<String, SigningKey>,
    current: String,
}

impl KeyRing {
    /// Parse `id:base64secret,id:base64secret,...` plus the current key id.
    ///
    /// Whitespace around ids and secrets is tolerated; empty segments are
    /// skipped so a trailing comma is harmless.
    pub fn parse(spec: &str, current_key_id: &str) -> Result<Self, KeyRingError> {
        let mut keys = HashMap::new();

        for pair in spec.split(',') {
            let pair = pair.trim();
            if pair.is_empty() {
                continue;
            }
            let (id, secret_b64) = pair
                .split_once(':')
                .ok_or_else(|| KeyRingError::MalformedEntry(pair.to_string()))?;
            let id = id.trim();
            let secret_b64 = secret_b64.trim();
            if id.is_empty() || secret_b64.is_empty() {
                return Err(KeyRingError::MalformedEntry(pair.to_string()));
            }
            let secret = Base64::decode_vec(secret_b64)
                .map_err(|_| KeyRingError::BadSecret(id.to_string()))?;
            if keys
                .insert(
                    id.to_string(),
                    SigningKey {
                        id: id.to_string(),
                        secret,
                    },
                )
                .is_some()
            {
                return Err(KeyRingError::DuplicateKeyId(id.to_string()));
            }
        }

        if keys.is_empty() {
            return Err(KeyRingError::Empty);
        }

        let current = current_key_id.trim();
        if !keys.contains_key(current) {
            return Err(KeyRingError::UnknownCurrentKey(current.to_string()));
        }

        Ok(Self {
            keys,
            current: current.to_string(),
        })
    }

    /// Look up the secret for a key id. Any live key verifies, not only the
    /// current one, so overlapping rotation windows work.
    pub fn resolve(&self, key_id: &str) -> Option<&SigningKey> {
        self.keys.get(key_id)
    }

    /// Id of the key used to produce new signatures.
    pub fn current_key_id(&self) -> &str {
        &self.current
    }

    /// The key used to produce new signatures.
    pub fn current_key(&self) -> &SigningKey {
        // parse() guarantees the current id is present
        &self.keys[&self.current]
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
