// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Request signing, typed tokens, identity federation, and the session
//! flows built on them.
//!
//! ## Request path
//!
//! 1. The signature middleware checks the HMAC headers on every non-exempt
//!    request (key ring lookup, canonical-string HMAC, single-use replay
//!    consumption against the session store)
//! 2. Protected handlers use the `Auth` extractor: bearer header or
//!    `access_token` cookie, verified strictly as an Access token
//! 3. The identity endpoints call [`service::AuthService`], which drives
//!    the token service, the user directory, provider federation, and the
//!    session store
//!
//! ## Security
//!
//! - Verification secrets are chosen by the declared token kind, never by
//!   anything the token itself claims
//! - Refresh rotates the stored session `jti`; stale refresh tokens die
//!   even while cryptographically valid
//! - Signature replay protection is one atomic set-if-absent per signature
//! - Clock skew tolerance for signatures is 60 seconds; token expiry has
//!   no leeway

pub mod claims;
pub mod error;
pub mod extractor;
pub mod keys;
pub mod middleware;
pub mod providers;
pub mod roles;
pub mod service;
pub mod signature;
pub mod tokens;

pub use claims::AuthenticatedUser;
pub use error::AuthError;
pub use extractor::Auth;
pub use keys::KeyRing;
pub use roles::Role;
pub use service::AuthService;
pub use signature::SignatureVerifier;
pub use tokens::{TokenKind, TokenService};

/// Cookie names shared by the handlers that set them and the extractors
/// that read them.
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";
pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token";
/// Readable by the frontend so it can schedule a proactive refresh.
pub const SESSION_EXP_COOKIE: &str = "auth_session_exp";
/// Readable by the frontend; names the provider that issued the session.
pub const AUTH_PROVIDER_COOKIE: &str = "auth_provider";
