// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::service::AuthService;
use crate::auth::signature::SignatureVerifier;
use crate::auth::tokens::TokenService;
use crate::store::SessionStore;

/// Shared application state, cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthService,
    pub tokens: Arc<TokenService>,
    pub signatures: Arc<SignatureVerifier>,
    pub sessions: Arc<dyn SessionStore>,
    /// Mark auth cookies `Secure`; off for local development over http.
    pub cookie_secure: bool,
}

impl AppState {
    pub fn new(
        auth: AuthService,
        tokens: Arc<TokenService>,
        signatures: Arc<SignatureVerifier>,
        sessions: Arc<dyn SessionStore>,
        cookie_secure: bool,
    ) -> Self {
        Self {
            auth,
            tokens,
            signatures,
            sessions,
            cookie_secure,
        }
    }
}
