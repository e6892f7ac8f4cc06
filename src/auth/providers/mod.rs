// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Identity provider federation.
//!
//! Social sign-in hands us a provider-issued credential (a Google ID token,
//! a Discord OAuth access token). Each provider verifies its own credential
//! format and maps the result into a [`NormalizedIdentity`] so the rest of
//! the auth stack never sees provider-specific payloads.
//!
//! `CREDENTIALS` is a provider in the data model (it names the account link
//! a password belongs to) but has no remote verifier; resolving it through
//! the registry is rejected.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::error::AuthError;

pub mod credentials;
pub mod discord;
pub mod google;

pub use discord::DiscordVerifier;
pub use google::GoogleVerifier;

/// Identity provider an account is linked through.
///
/// Wire values are SCREAMING_SNAKE_CASE; the same strings appear in the
/// `x-provider` request header, in token claims, and in the `auth_provider`
/// cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProviderKind {
    /// Google ID token (OpenID Connect)
    Google,
    /// Discord OAuth2 access token
    Discord,
    /// Email + password, local to this service
    Credentials,
}

impl ProviderKind {
    /// Parse the `x-provider` header value. Exact match only.
    pub fn from_header(s: &str) -> Option<ProviderKind> {
        match s {
            "GOOGLE" => Some(ProviderKind::Google),
            "DISCORD" => Some(ProviderKind::Discord),
            "CREDENTIALS" => Some(ProviderKind::Credentials),
            _ => None,
        }
    }

    /// Wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Google => "GOOGLE",
            ProviderKind::Discord => "DISCORD",
            ProviderKind::Credentials => "CREDENTIALS",
        }
    }

    /// Whether this provider vouches for the user's email out of band.
    ///
    /// Accounts created through a federated provider start verified;
    /// credentials accounts must confirm their email.
    pub fn is_federated(&self) -> bool {
        !matches!(self, ProviderKind::Credentials)
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Provider-agnostic identity extracted from a verified credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedIdentity {
    /// Provider that vouched for this identity
    pub provider: ProviderKind,
    /// Email address asserted by the provider
    pub email: String,
    /// Display name asserted by the provider
    pub name: String,
    /// Avatar reference, if the provider supplied one
    pub avatar: Option<String>,
}

/// Verifies a provider-issued credential and extracts the identity it
/// asserts.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, raw_token: &str) -> Result<NormalizedIdentity, AuthError>;
}

impl std::fmt::Debug for dyn TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("TokenVerifier")
    }
}

/// Maps a [`ProviderKind`] to its verifier.
#[derive(Clone)]
pub struct ProviderRegistry {
    google: Arc<dyn TokenVerifier>,
    discord: Arc<dyn TokenVerifier>,
}

impl ProviderRegistry {
    pub fn new(google: Arc<dyn TokenVerifier>, discord: Arc<dyn TokenVerifier>) -> Self {
        Self { google, discord }
    }

    /// Resolve the verifier for a provider.
    ///
    /// `CREDENTIALS` is not a federated provider and cannot be resolved.
    pub fn resolve(&self, kind: ProviderKind) -> Result<Arc<dyn TokenVerifier>, AuthError> {
        match kind {
            ProviderKind::Google => Ok(Arc::clone(&self.google)),
            ProviderKind::Discord => Ok(Arc::clone(&self.discord)),
            ProviderKind::Credentials => Err(AuthError::UnsupportedProvider),
        }
    }

    /// Resolve and verify in one step.
    pub async fn verify(
        &self,
        kind: ProviderKind,
        raw_token: &str,
    ) -> Result<NormalizedIdentity, AuthError> {
        self.resolve(kind)?.verify(raw_token).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubVerifier {
        provider: ProviderKind,
    }

    #[async_trait]
    impl TokenVerifier for StubVerifier {
        async fn verify(&self, raw_token: &str) -> Result<NormalizedIdentity, AuthError> {
            if raw_token == "good" {
                Ok(NormalizedIdentity {
                    provider: self.provider,
                    email: "user@example.com".to_string(),
                    name: "User".to_string(),
                    avatar: None,
                })
            } else {
                Err(AuthError::InvalidToken)
            }
        }
    }

    fn registry() -> ProviderRegistry {
        ProviderRegistry::new(
            Arc::new(StubVerifier {
                provider: ProviderKind::Google,
            }),
            Arc::new(StubVerifier {
                provider: ProviderKind::Discord,
            }),
        )
    }

    #[test]
    fn header_parsing_is_exact_match() {
        assert_eq!(ProviderKind::from_header("GOOGLE"), Some(ProviderKind::Google));
        assert_eq!(ProviderKind::from_header("DISCORD"), Some(ProviderKind::Discord));
        assert_eq!(
            ProviderKind::from_header("CREDENTIALS"),
            Some(ProviderKind::Credentials)
        );
        assert_eq!(ProviderKind::from_header("google"), None);
        assert_eq!(ProviderKind::from_header("GitHub"), None);
        assert_eq!(ProviderKind::from_header(""), None);
    }

    #[test]
    fn wire_format_is_screaming_snake_case() {
        assert_eq!(
            serde_json::to_string(&ProviderKind::Google).unwrap(),
            "\"GOOGLE\""
        );
        assert_eq!(
            serde_json::from_str::<ProviderKind>("\"DISCORD\"").unwrap(),
            ProviderKind::Discord
        );
        assert_eq!(ProviderKind::Credentials.to_string(), "CREDENTIALS");
    }

    #[test]
    fn only_credentials_is_not_federated() {
        assert!(ProviderKind::Google.is_federated());
        assert!(ProviderKind::Discord.is_federated());
        assert!(!ProviderKind::Credentials.is_federated());
    }

    #[tokio::test]
    async fn registry_routes_to_matching_verifier() {
        let registry = registry();

        let identity = registry.verify(ProviderKind::Google, "good").await.unwrap();
        assert_eq!(identity.provider, ProviderKind::Google);

        let identity = registry.verify(ProviderKind::Discord, "good").await.unwrap();
        assert_eq!(identity.provider, ProviderKind::Discord);
    }

    #[tokio::test]
    async fn credentials_kind_is_rejected_by_registry() {
        let registry = registry();
        let err = registry.resolve(ProviderKind::Credentials).unwrap_err();
        assert!(matches!(err, AuthError::UnsupportedProvider));
    }

    #[tokio::test]
    async fn verifier_failures_pass_through() {
        let registry = registry();
        let err = registry
            .verify(ProviderKind::Google, "bad")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken));
    }
}
