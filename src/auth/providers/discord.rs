// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Discord access token verification.
//!
//! Discord OAuth2 access tokens are opaque, so there is nothing to verify
//! locally. The verifier presents the token to Discord's `users/@me`
//! endpoint; if Discord accepts it, the returned profile is the identity.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::{NormalizedIdentity, ProviderKind, TokenVerifier};
use crate::auth::error::AuthError;

/// Discord's authenticated-user endpoint.
pub const DISCORD_USERINFO_URL: &str = "https://discord.com/api/users/@me";

/// Verifies Discord access tokens by calling the userinfo endpoint.
#[derive(Clone)]
pub struct DiscordVerifier {
    /// Userinfo endpoint
    userinfo_url: String,
    /// HTTP client
    client: reqwest::Client,
}

impl DiscordVerifier {
    pub fn new() -> Self {
        Self {
            userinfo_url: DISCORD_USERINFO_URL.to_string(),
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .expect("Failed to create HTTP client"),
        }
    }

    /// Override the userinfo endpoint.
    #[allow(dead_code)]
    pub fn with_userinfo_url(mut self, url: impl Into<String>) -> Self {
        self.userinfo_url = url.into();
        self
    }
}

impl Default for DiscordVerifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TokenVerifier for DiscordVerifier {
    async fn verify(&self, raw_token: &str) -> Result<NormalizedIdentity, AuthError> {
        let response = self
            .client
            .get(&self.userinfo_url)
            .bearer_auth(raw_token)
            .send()
            .await
            .map_err(|e| AuthError::ProviderUnreachable(e.to_string()))?;

        // Discord answers 401 for revoked or malformed tokens
        if !response.status().is_success() {
            return Err(AuthError::InvalidToken);
        }

        let user: DiscordUser = response
            .json()
            .await
            .map_err(|_| AuthError::InvalidToken)?;

        identity_from_user(user)
    }
}

/// Subset of the Discord user object we care about.
#[derive(Debug, Deserialize)]
struct DiscordUser {
    email: Option<String>,
    username: Option<String>,
    global_name: Option<String>,
    avatar: Option<String>,
}

/// Require an email and a usable display name. `global_name` is the
/// user-facing name; older accounts only have `username`.
fn identity_from_user(user: DiscordUser) -> Result<NormalizedIdentity, AuthError> {
    let email = user.email.ok_or(AuthError::InvalidToken)?;
    let name = user
        .global_name
        .or(user.username)
        .ok_or(AuthError::InvalidToken)?;

    Ok(NormalizedIdentity {
        provider: ProviderKind::Discord,
        email,
        name,
        avatar: user.avatar,
    })
}
