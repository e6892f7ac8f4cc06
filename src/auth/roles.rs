// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User roles for authorization.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// User roles for authorization.
///
/// ## Role Hierarchy
///
/// - `Admin` - Full access, including moderation endpoints
/// - `Streamer` - Can manage channels and go live
/// - `Viewer` - Normal account; can watch, chat, follow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full administrative access
    Admin,
    /// Channel owner (may broadcast)
    Streamer,
    /// Normal viewer account
    Viewer,
}

impl Role {
    /// Check if this role has at least the privileges of the required role.
    pub fn has_privilege(&self, required: Role) -> bool {
        match (self, required) {
            // Admin can do anything
            (Role::Admin, _) => true,
            // Streamers retain viewer privileges
            (Role::Streamer, Role::Streamer) | (Role::Streamer, Role::Viewer) => true,
            (Role::Viewer, Role::Viewer) => true,
            // Everything else is denied
            _ => false,
        }
    }

    /// Parse role from string (case-insensitive).
    pub fn from_str(s: &str) -> Option<Role> {
        match s.to_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "streamer" => Some(Role::Streamer),
            "viewer" => Some(Role::Viewer),
            _ => None,
        }
    }
}

impl Default for Role {
    /// Default role is Viewer (least privilege; every new account starts here).
    fn default() -> Self {
        Role::Viewer
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Streamer => write!(f, "streamer"),
            Role::Viewer => write!(f, "viewer"),
        }
    }
}
