// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Claim payloads for the token kinds this service issues, plus the
//! [`AuthenticatedUser`] snapshot handlers work with.
//!
//! Claim structs serialize camelCase to match the wire format the web and
//! mobile clients already parse. The reserved claims (`jti`, `type`, `iat`,
//! `exp`) are injected by the token service and are not part of these
//! structs.

use serde::{Deserialize, Serialize};

use super::providers::ProviderKind;
use super::roles::Role;

/// Claims carried by an Access token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessClaims {
    /// User id
    pub sub: String,
    /// Session id shared with the paired refresh token
    pub sid: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub is_verified: bool,
    /// Identity provider that established this session
    pub provider: ProviderKind,
}

/// Claims carried by a Refresh token. Deliberately minimal: user data is
/// re-read from the directory at refresh time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshClaims {
    pub sub: String,
    pub sid: String,
    pub provider: ProviderKind,
}

/// Claims carried by a single-use email-verification token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailVerifyClaims {
    pub sub: String,
    pub sid: String,
}

/// The authenticated caller, extracted from a verified Access token and
/// inserted into request extensions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub user_id: String,
    pub session_id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub is_verified: bool,
    pub provider: ProviderKind,
}

impl AuthenticatedUser {
    pub fn from_claims(claims: AccessClaims) -> Self {
        Self {
            user_id: claims.sub,
            session_id: claims.sid,
            email: claims.email,
            name: claims.name,
            role: claims.role,
            is_verified: claims.is_verified,
            provider: claims.provider,
        }
    }

    /// Check if the user has at least the required role.
    pub fn has_role(&self, required: Role) -> bool {
        self.role.has_privilege(required)
    }
}
