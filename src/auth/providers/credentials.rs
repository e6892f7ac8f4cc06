// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Password hashing for the credentials provider.
//!
//! Not a [`TokenVerifier`](super::TokenVerifier): there is no remote party
//! to ask, only a stored bcrypt hash to compare against.

use crate::auth::error::AuthError;

/// Bcrypt work factor. Hashes embed the cost, so this can be raised without
/// invalidating existing hashes.
pub const BCRYPT_COST: u32 = 10;

/// Hash a plaintext password for storage.
pub fn hash_password(plain: &str) -> Result<String, AuthError> {
    bcrypt::hash(plain, BCRYPT_COST)
        .map_err(|e| AuthError::InternalError(format!("bcrypt hash failed: {e}")))
}

/// Compare a plaintext password against a stored hash.
pub fn verify_password(plain: &str, hashed: &str) -> Result<bool, AuthError> {
    bcrypt::verify(plain, hashed)
        .map_err(|e| AuthError::InternalError(format!("bcrypt verify failed: {e}")))
}
