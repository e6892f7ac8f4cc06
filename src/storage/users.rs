// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User directory.
//!
//! Users are looked up by email at sign-in and by id everywhere else. Each
//! user carries one linked account per provider; the `CREDENTIALS` account
//! holds the password hash, federated accounts are created verified.
//!
//! [`UserDirectory`] is the seam a SQL-backed implementation plugs into;
//! [`InMemoryUserDirectory`] is the shipped implementation and the test
//! double.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::auth::providers::ProviderKind;
use crate::auth::roles::Role;

/// Error type for directory operations.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    /// Entity not found
    #[error("not found: {0}")]
    NotFound(String),
    /// Email already registered
    #[error("email already registered: {0}")]
    DuplicateEmail(String),
    /// Provider already linked to this user
    #[error("account already linked: {0}")]
    DuplicateAccount(String),
    /// Account is already verified
    #[error("account already verified: {0}")]
    AlreadyVerified(String),
    /// Backing store failure
    #[error("directory backend error: {0}")]
    Backend(String),
}

/// Result type for directory operations.
pub type DirectoryResult<T> = Result<T, DirectoryError>;

/// A registered user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    /// Unique user identifier (UUID)
    pub id: String,
    /// Email address (unique across the directory)
    pub email: String,
    /// Display name
    pub name: String,
    /// Avatar reference, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    /// Authorization role
    pub role: Role,
    /// When the user was created
    pub created_at: DateTime<Utc>,
}

/// A provider link on a user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LinkedAccount {
    /// Provider this link belongs to
    pub provider: ProviderKind,
    /// Provider-side account id (the email for every provider we support)
    pub provider_account_id: String,
    /// Bcrypt hash, only present on `CREDENTIALS` links
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    /// Whether the email behind this link is confirmed
    pub verified: bool,
}

/// A user together with all linked accounts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserRecord {
    pub user: User,
    pub accounts: Vec<LinkedAccount>,
}

impl UserRecord {
    /// The link for a given provider, if present.
    pub fn account(&self, provider: ProviderKind) -> Option<&LinkedAccount> {
        self.accounts.iter().find(|a| a.provider == provider)
    }
}

/// Input for creating a user with its first linked account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub avatar: Option<String>,
    pub role: Role,
    pub account: NewAccount,
}

/// Input for linking an account to a user.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub provider: ProviderKind,
    pub password_hash: Option<String>,
    pub verified: bool,
}

/// Port for user lookup and mutation.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Find a user by email.
    async fn find_by_email(&self, email: &str) -> DirectoryResult<Option<UserRecord>>;

    /// Find a user by id.
    async fn find_by_id(&self, user_id: &str) -> DirectoryResult<Option<UserRecord>>;

    /// Create a user with its first linked account.
    async fn create_user(&self, new_user: NewUser) -> DirectoryResult<UserRecord>;

    /// Link an additional provider to an existing user.
    async fn link_account(&self, user_id: &str, account: NewAccount)
        -> DirectoryResult<UserRecord>;

    /// Mark a provider link verified.
    ///
    /// Fails with [`DirectoryError::AlreadyVerified`] if the link is already
    /// verified, so a verification token cannot be observed to succeed twice.
    async fn mark_verified(
        &self,
        user_id: &str,
        provider: ProviderKind,
    ) -> DirectoryResult<UserRecord>;
}

/// In-memory user directory.
#[derive(Default)]
pub struct InMemoryUserDirectory {
    /// Users keyed by id
    users: RwLock<HashMap<String, UserRecord>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find_by_email(&self, email: &str) -> DirectoryResult<Option<UserRecord>> {
        let users = self.users.read().await;
        Ok(users.values().find(|r| r.user.email == email).cloned())
    }

    async fn find_by_id(&self, user_id: &str) -> DirectoryResult<Option<UserRecord>> {
        let users = self.users.read().await;
        Ok(users.get(user_id).cloned())
    }

    async fn create_user(&self, new_user: NewUser) -> DirectoryResult<UserRecord> {
        let mut users = self.users.write().await;

        if users.values().any(|r| r.user.email == new_user.email) {
            return Err(DirectoryError::DuplicateEmail(new_user.email));
        }

        let user = User {
            id: Uuid::new_v4().to_string(),
            email: new_user.email,
            name: new_user.name,
            avatar: new_user.avatar,
            role: new_user.role,
            created_at: Utc::now(),
        };
        let record = UserRecord {
            accounts: vec![LinkedAccount {
                provider: new_user.account.provider,
                provider_account_id: user.email.clone(),
                password_hash: new_user.account.password_hash,
                verified: new_user.account.verified,
            }],
            user,
        };

        users.insert(record.user.id.clone(), record.clone());
        Ok(record)
    }

    async fn link_account(
        &self,
        user_id: &str,
        account: NewAccount,
    ) -> DirectoryResult<UserRecord> {
        let mut users = self.users.write().await;

        let record = users
            .get_mut(user_id)
            .ok_or_else(|| DirectoryError::NotFound(format!("User {user_id}")))?;

        if record.account(account.provider).is_some() {
            return Err(DirectoryError::DuplicateAccount(format!(
                "{} for user {user_id}",
                account.provider
            )));
        }

        record.accounts.push(LinkedAccount {
            provider: account.provider,
            provider_account_id: record.user.email.clone(),
            password_hash: account.password_hash,
            verified: account.verified,
        });

        Ok(record.clone())
    }

    async fn mark_verified(
        &self,
        user_id: &str,
        provider: ProviderKind,
    ) -> DirectoryResult<UserRecord> {
        let mut users = self.users.write().await;

        let record = users
            .get_mut(user_id)
            .ok_or_else(|| DirectoryError::NotFound(format!("User {user_id}")))?;

        let account = record
            .accounts
            .iter_mut()
            .find(|a| a.provider == provider)
            .ok_or_else(|| {
                DirectoryError::NotFound(format!("{provider} account for user {user_id}"))
            })?;

        if account.verified {
            return Err(DirectoryError::AlreadyVerified(format!(
                "{provider} account for user {user_id}"
            )));
        }
        account.verified = true;

        Ok(record.clone())
    }
}
