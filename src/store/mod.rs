// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Session Store
//!
//! Thin adapter over a Redis-like keyed cache with per-key TTL. Three
//! concerns share it, each with its own key namespace owned by the caller:
//!
//! - replay detection (`signature:` keys, written by the signature verifier)
//! - session/refresh tracking (`auth_session:` keys, written by the auth
//!   service)
//! - single-use token blacklisting (`blacklist:` keys)
//!
//! The adapter itself is policy-free: it stores opaque strings and knows
//! nothing about key shapes or TTL choices.
//!
//! ## Implementations
//!
//! - [`RedisStore`] - production, multiplexed async connection
//! - [`MemoryStore`] - tests and local development, no external process

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub mod memory;
pub mod redis;

pub use memory::MemoryStore;
pub use redis::RedisStore;

/// Errors surfaced by a session store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Could not establish or reuse a connection
    #[error("store connection failure: {0}")]
    Connection(String),
    /// A command was sent but failed or returned an unexpected shape
    #[error("store command failure: {0}")]
    Command(String),
}

/// Future produced by a [`SessionStore::get_or_set`] factory.
pub type ValueFactory<'a> =
    Pin<Box<dyn Future<Output = Result<String, StoreError>> + Send + 'a>>;

/// Keyed cache with per-key TTL and an atomic check-and-set primitive.
///
/// `set_nx` is the only conditional write: it must atomically set the key
/// iff it does not exist, returning whether the write happened. Replay
/// protection depends on this being a single store-side operation.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Fetch a value. Expired keys read as absent.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write a value, replacing any previous one. `None` TTL means no expiry.
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), StoreError>;

    /// Atomically write `value` iff `key` is absent; returns `true` when the
    /// write happened, `false` when the key already existed.
    async fn set_nx(&self, key: &str, value: &str, ttl: Duration) -> Result<bool, StoreError>;

    /// Whether the key currently exists (and has not expired).
    async fn exists(&self, key: &str) -> Result<bool, StoreError>;

    /// Remove a key. Removing an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Read-through: return the existing value, or run `factory`, store its
    /// result under `ttl`, and return it.
    async fn get_or_set(
        &self,
        key: &str,
        ttl: Option<Duration>,
        factory: ValueFactory<'_>,
    ) -> Result<String, StoreError> {
        if let Some(existing) = self.get(key).await? {
            return Ok(existing);
        }
        let value = factory.await?;
        self.set(key, &value, ttl).await?;
        Ok(value)
    }
}
