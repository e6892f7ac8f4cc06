// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Auth orchestrator.
//!
//! Coordinates the sign-in, sign-up, refresh, and verification flows across
//! the token service, the session store, the user directory, and provider
//! federation. Every successful flow ends the same way: an access+refresh
//! pair sharing one session id, with the refresh token's `jti` persisted
//! under `auth_session:<userId>:<sid>:refresh` for exactly the refresh TTL.
//!
//! ## Session rotation
//!
//! Refresh compares the presented token's `jti` against the stored value
//! before reissuing. A refresh token that was already rotated away fails
//! with `SessionNotFound` even though its signature and expiry are valid,
//! which turns a stolen-but-stale refresh token into a dead end.

use std::sync::Arc;
use std::time::Duration;

use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::notify::{MailSink, VerificationMail};
use crate::storage::{DirectoryError, NewAccount, NewUser, User, UserDirectory, UserRecord};
use crate::store::SessionStore;

use super::claims::{AccessClaims, AuthenticatedUser, EmailVerifyClaims, RefreshClaims};
use super::error::AuthError;
use super::providers::{credentials, NormalizedIdentity, ProviderKind, ProviderRegistry};
use super::roles::Role;
use super::tokens::{SignedToken, TokenKind, TokenService};

/// An issued access+refresh pair, ready to be placed in cookies.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub access: SignedToken,
    pub refresh: SignedToken,
    /// Provider the session was established through; echoed in a cookie
    pub provider: ProviderKind,
}

/// Coordinates authentication flows.
#[derive(Clone)]
pub struct AuthService {
    tokens: Arc<TokenService>,
    sessions: Arc<dyn SessionStore>,
    users: Arc<dyn UserDirectory>,
    providers: ProviderRegistry,
    mailer: Arc<dyn MailSink>,
    /// Base URL verification links point at
    frontend_url: String,
}

impl AuthService {
    pub fn new(
        tokens: Arc<TokenService>,
        sessions: Arc<dyn SessionStore>,
        users: Arc<dyn UserDirectory>,
        providers: ProviderRegistry,
        mailer: Arc<dyn MailSink>,
        frontend_url: impl Into<String>,
    ) -> Self {
        Self {
            tokens,
            sessions,
            users,
            providers,
            mailer,
            frontend_url: frontend_url.into(),
        }
    }

    /// Email + password sign-in.
    ///
    /// Every failure mode collapses to [`AuthError::InvalidCredentials`] so
    /// the endpoint cannot be used to probe which emails are registered.
    pub async fn sign_in_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<IssuedSession, AuthError> {
        let record = self
            .users
            .find_by_email(email)
            .await
            .map_err(directory_error)?
            .ok_or(AuthError::InvalidCredentials)?;

        let account = record
            .account(ProviderKind::Credentials)
            .ok_or(AuthError::InvalidCredentials)?;
        let hash = account
            .password_hash
            .as_deref()
            .ok_or(AuthError::InvalidCredentials)?;

        if !credentials::verify_password(password, hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        let verified = account.verified;
        let sid = new_session_id();
        self.issue_session(&record.user, ProviderKind::Credentials, verified, &sid)
            .await
    }

    /// Social sign-in with a provider-issued credential.
    ///
    /// Verifies the credential with the provider, then gets or creates the
    /// linked account. First-time links are created verified; the provider
    /// already confirmed the email.
    pub async fn sign_in_social(
        &self,
        kind: ProviderKind,
        raw_token: &str,
    ) -> Result<IssuedSession, AuthError> {
        let identity = self.providers.verify(kind, raw_token).await?;
        let record = self.resolve_social_account(identity).await?;

        let verified = record.account(kind).map(|a| a.verified).ok_or_else(|| {
            AuthError::InternalError("provider account missing after resolve".to_string())
        })?;

        let sid = new_session_id();
        self.issue_session(&record.user, kind, verified, &sid).await
    }

    /// Register a credentials account.
    ///
    /// Issues a session immediately (the account starts unverified) and
    /// hands a verification mail to the sink. Mail dispatch failure is
    /// logged, not surfaced; the user can request a fresh link later.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> Result<IssuedSession, AuthError> {
        let hash = credentials::hash_password(password)?;

        let record = self
            .users
            .create_user(NewUser {
                email: email.to_string(),
                name: full_name.to_string(),
                avatar: None,
                role: Role::default(),
                account: NewAccount {
                    provider: ProviderKind::Credentials,
                    password_hash: Some(hash),
                    verified: false,
                },
            })
            .await
            .map_err(|e| match e {
                DirectoryError::DuplicateEmail(_) => AuthError::DuplicateEmail,
                other => directory_error(other),
            })?;

        let sid = new_session_id();
        let session = self
            .issue_session(&record.user, ProviderKind::Credentials, false, &sid)
            .await?;

        let verify = self.tokens.sign(
            TokenKind::VerifyEmail,
            &EmailVerifyClaims {
                sub: record.user.id.clone(),
                sid: sid.clone(),
            },
        )?;

        let mail = VerificationMail::verify_account(
            &record.user.email,
            &record.user.name,
            &self.frontend_url,
            &verify.token,
            verify.expires_in().max(0) as u64,
        );
        if let Err(err) = self.mailer.send(mail).await {
            tracing::warn!(
                user_id = %record.user.id,
                error = %err,
                "verification mail not dispatched"
            );
        }

        Ok(session)
    }

    /// Rotate a session with a refresh token.
    ///
    /// The presented token's `jti` must match the stored session value; on
    /// mismatch the rotation is refused. The pair is reissued under the
    /// same session id and the stored `jti` is overwritten.
    pub async fn refresh(&self, raw_token: &str) -> Result<IssuedSession, AuthError> {
        let decoded = self
            .tokens
            .verify::<RefreshClaims>(TokenKind::Refresh, raw_token)?;
        let claims = decoded.claims;

        let key = session_key(&claims.sub, &claims.sid);
        let stored = self
            .sessions
            .get(&key)
            .await?
            .ok_or(AuthError::SessionNotFound)?;
        if stored != decoded.jti {
            tracing::warn!(
                user_id = %claims.sub,
                sid = %claims.sid,
                "refresh jti does not match stored session, possible token reuse"
            );
            return Err(AuthError::SessionNotFound);
        }

        let record = self
            .users
            .find_by_id(&claims.sub)
            .await
            .map_err(directory_error)?
            .ok_or(AuthError::SessionNotFound)?;
        let verified = record
            .account(claims.provider)
            .map(|a| a.verified)
            .unwrap_or(false);

        self.issue_session(&record.user, claims.provider, verified, &claims.sid)
            .await
    }

    /// Consume an email-verification token for the signed-in user.
    ///
    /// The token is single-use: its `jti` is blacklisted for the remainder
    /// of its lifetime once the account is marked verified. A fresh session
    /// pair is issued under the current session id so the verified claim is
    /// visible immediately.
    pub async fn verify_email(
        &self,
        auth: &AuthenticatedUser,
        raw_token: &str,
    ) -> Result<IssuedSession, AuthError> {
        let decoded = self
            .tokens
            .verify::<EmailVerifyClaims>(TokenKind::VerifyEmail, raw_token)?;

        let burn_key = blacklist_key(&decoded.jti);
        if self.sessions.exists(&burn_key).await? {
            return Err(AuthError::AccountAlreadyVerified);
        }

        // The token must have been minted for this user
        if decoded.claims.sub != auth.user_id {
            return Err(AuthError::InvalidToken);
        }

        let record = self
            .users
            .mark_verified(&auth.user_id, auth.provider)
            .await
            .map_err(|e| match e {
                DirectoryError::AlreadyVerified(_) | DirectoryError::NotFound(_) => {
                    AuthError::AccountAlreadyVerified
                }
                other => directory_error(other),
            })?;

        let session = self
            .issue_session(&record.user, auth.provider, true, &auth.session_id)
            .await?;

        let remaining = decoded.remaining();
        if !remaining.is_zero() {
            self.sessions.set(&burn_key, "1", Some(remaining)).await?;
        }

        Ok(session)
    }

    /// Get or create the user record backing a federated identity.
    async fn resolve_social_account(
        &self,
        identity: NormalizedIdentity,
    ) -> Result<UserRecord, AuthError> {
        let existing = self
            .users
            .find_by_email(&identity.email)
            .await
            .map_err(directory_error)?;

        match existing {
            None => self
                .users
                .create_user(NewUser {
                    email: identity.email,
                    name: identity.name,
                    avatar: identity.avatar,
                    role: Role::default(),
                    account: NewAccount {
                        provider: identity.provider,
                        password_hash: None,
                        verified: true,
                    },
                })
                .await
                .map_err(directory_error),
            Some(record) if record.account(identity.provider).is_none() => self
                .users
                .link_account(
                    &record.user.id,
                    NewAccount {
                        provider: identity.provider,
                        password_hash: None,
                        verified: true,
                    },
                )
                .await
                .map_err(directory_error),
            Some(record) => Ok(record),
        }
    }

    /// Issue an access+refresh pair and persist the refresh `jti`.
    async fn issue_session(
        &self,
        user: &User,
        provider: ProviderKind,
        is_verified: bool,
        sid: &str,
    ) -> Result<IssuedSession, AuthError> {
        let access = self.tokens.sign(
            TokenKind::Access,
            &AccessClaims {
                sub: user.id.clone(),
                sid: sid.to_string(),
                email: user.email.clone(),
                name: user.name.clone(),
                role: user.role,
                is_verified,
                provider,
            },
        )?;
        let refresh = self.tokens.sign(
            TokenKind::Refresh,
            &RefreshClaims {
                sub: user.id.clone(),
                sid: sid.to_string(),
                provider,
            },
        )?;

        let ttl = Duration::from_secs(refresh.expires_in().max(0) as u64);
        self.sessions
            .set(&session_key(&user.id, sid), &refresh.jti, Some(ttl))
            .await?;

        Ok(IssuedSession {
            access,
            refresh,
            provider,
        })
    }
}

/// Session ids are opaque random strings; hyphenless to keep store keys tidy.
fn new_session_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Store key holding the live refresh `jti` for a session.
fn session_key(user_id: &str, sid: &str) -> String {
    format!("auth_session:{user_id}:{sid}:refresh")
}

/// Store key marking a single-use token as consumed. The `jti` is hashed so
/// store keys never contain token material.
fn blacklist_key(jti: &str) -> String {
    format!("blacklist:{}", hex::encode(Sha256::digest(jti.as_bytes())))
}

/// Map directory failures that have no flow-specific meaning.
fn directory_error(err: DirectoryError) -> AuthError {
    match err {
        DirectoryError::Backend(msg) => AuthError::Store(msg),
        other => AuthError::InternalError(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::providers::TokenVerifier;
    use crate::auth::tokens::TokenSecrets;
    use crate::notify::RecordingMailSink;
    use crate::storage::InMemoryUserDirectory;
    use crate::store::MemoryStore;
    use async_trait::async_trait;

    struct StubVerifier {
        provider: ProviderKind,
        email: &'static str,
        name: &'static str,
    }

    #[async_trait]
    impl TokenVerifier for StubVerifier {
        async fn verify(&self, raw_token: &str) -> Result<NormalizedIdentity, AuthError> {
            if raw_token == "provider-ok" {
                Ok(NormalizedIdentity {
                    provider: self.provider,
                    email: self.email.to_string(),
                    name: self.name.to_string(),
                    avatar: None,
                })
            } else {
                Err(AuthError::InvalidToken)
            }
        }
    }

    struct Fixture {
        service: AuthService,
        tokens: Arc<TokenService>,
        sessions: Arc<MemoryStore>,
        users: Arc<InMemoryUserDirectory>,
        mailer: Arc<RecordingMailSink>,
    }

    fn fixture() -> Fixture {
        let tokens = Arc::new(TokenService::new(&TokenSecrets {
            access: "access-secret".to_string(),
            refresh: "refresh-secret".to_string(),
            verify_email: "verify-secret".to_string(),
            stream: "stream-secret".to_string(),
            internal: "internal-secret".to_string(),
        }));
        let sessions = Arc::new(MemoryStore::new());
        let users = Arc::new(InMemoryUserDirectory::new());
        let mailer = Arc::new(RecordingMailSink::new());

        let providers = ProviderRegistry::new(
            Arc::new(StubVerifier {
                provider: ProviderKind::Google,
                email: "social@example.com",
                name: "Social User",
            }),
            Arc::new(StubVerifier {
                provider: ProviderKind::Discord,
                email: "social@example.com",
                name: "Social User",
            }),
        );

        let service = AuthService::new(
            Arc::clone(&tokens),
            Arc::clone(&sessions) as Arc<dyn SessionStore>,
            Arc::clone(&users) as Arc<dyn UserDirectory>,
            providers,
            Arc::clone(&mailer) as Arc<dyn MailSink>,
            "https://app.example.com/verify",
        );

        Fixture {
            service,
            tokens,
            sessions,
            users,
            mailer,
        }
    }

    fn access_claims(fx: &Fixture, session: &IssuedSession) -> AccessClaims {
        fx.tokens
            .verify::<AccessClaims>(TokenKind::Access, &session.access.token)
            .unwrap()
            .claims
    }

    fn mailed_verify_token(fx: &Fixture) -> String {
        let sent = fx.mailer.sent();
        let url = &sent.last().unwrap().context.url;
        url.split_once("?v=").unwrap().1.to_string()
    }

    #[tokio::test]
    async fn sign_up_issues_pair_and_persists_refresh_jti() {
        let fx = fixture();
        let session = fx
            .service
            .sign_up("ada@example.com", "S3cure!pass", "Ada Lovelace")
            .await
            .unwrap();

        assert_eq!(session.access.kind, TokenKind::Access);
        assert_eq!(session.refresh.kind, TokenKind::Refresh);
        assert_eq!(session.provider, ProviderKind::Credentials);

        let claims = access_claims(&fx, &session);
        assert_eq!(claims.email, "ada@example.com");
        assert_eq!(claims.name, "Ada Lovelace");
        assert_eq!(claims.role, Role::Viewer);
        assert!(!claims.is_verified);

        let stored = fx
            .sessions
            .get(&format!(
                "auth_session:{}:{}:refresh",
                claims.sub, claims.sid
            ))
            .await
            .unwrap();
        assert_eq!(stored.as_deref(), Some(session.refresh.jti.as_str()));
    }

    #[tokio::test]
    async fn sign_up_duplicate_email_is_field_scoped() {
        let fx = fixture();
        fx.service
            .sign_up("ada@example.com", "S3cure!pass", "Ada")
            .await
            .unwrap();

        let err = fx
            .service
            .sign_up("ada@example.com", "0ther!Pass", "Imposter")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::DuplicateEmail));
    }

    #[tokio::test]
    async fn sign_up_dispatches_verification_mail() {
        let fx = fixture();
        fx.service
            .sign_up("ada@example.com", "S3cure!pass", "Ada")
            .await
            .unwrap();

        let sent = fx.mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "ada@example.com");
        assert_eq!(sent[0].context.username, "Ada");
        assert!(sent[0].context.url.contains("?v="));
        // Verify-email tokens live one hour
        assert_eq!(sent[0].context.expires_in, "01:00:00");

        let token = mailed_verify_token(&fx);
        let decoded = fx
            .tokens
            .verify::<EmailVerifyClaims>(TokenKind::VerifyEmail, &token)
            .unwrap();
        let claims = access_claims(
            &fx,
            &fx.service
                .sign_in_credentials("ada@example.com", "S3cure!pass")
                .await
                .unwrap(),
        );
        assert_eq!(decoded.claims.sub, claims.sub);
    }

    #[tokio::test]
    async fn credentials_sign_in_round_trip() {
        let fx = fixture();
        fx.service
            .sign_up("ada@example.com", "S3cure!pass", "Ada")
            .await
            .unwrap();

        let session = fx
            .service
            .sign_in_credentials("ada@example.com", "S3cure!pass")
            .await
            .unwrap();
        assert_eq!(session.provider, ProviderKind::Credentials);

        let err = fx
            .service
            .sign_in_credentials("ada@example.com", "wrong-password")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));

        let err = fx
            .service
            .sign_in_credentials("ghost@example.com", "S3cure!pass")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn sign_in_gets_fresh_session_id_each_time() {
        let fx = fixture();
        fx.service
            .sign_up("ada@example.com", "S3cure!pass", "Ada")
            .await
            .unwrap();

        let first = fx
            .service
            .sign_in_credentials("ada@example.com", "S3cure!pass")
            .await
            .unwrap();
        let second = fx
            .service
            .sign_in_credentials("ada@example.com", "S3cure!pass")
            .await
            .unwrap();

        assert_ne!(
            access_claims(&fx, &first).sid,
            access_claims(&fx, &second).sid
        );
    }

    #[tokio::test]
    async fn social_sign_in_creates_verified_account() {
        let fx = fixture();
        let session = fx
            .service
            .sign_in_social(ProviderKind::Google, "provider-ok")
            .await
            .unwrap();

        assert_eq!(session.provider, ProviderKind::Google);
        let claims = access_claims(&fx, &session);
        assert!(claims.is_verified);
        assert_eq!(claims.provider, ProviderKind::Google);

        let record = fx
            .users
            .find_by_email("social@example.com")
            .await
            .unwrap()
            .unwrap();
        let account = record.account(ProviderKind::Google).unwrap();
        assert!(account.verified);
        assert!(account.password_hash.is_none());
    }

    #[tokio::test]
    async fn social_sign_in_links_to_existing_user() {
        let fx = fixture();
        fx.service
            .sign_up("social@example.com", "S3cure!pass", "Ada")
            .await
            .unwrap();

        fx.service
            .sign_in_social(ProviderKind::Google, "provider-ok")
            .await
            .unwrap();

        let record = fx
            .users
            .find_by_email("social@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.accounts.len(), 2);
        assert!(record.account(ProviderKind::Google).unwrap().verified);
        // The credentials account is untouched by the social link
        assert!(!record.account(ProviderKind::Credentials).unwrap().verified);
    }

    #[tokio::test]
    async fn social_sign_in_rejects_bad_provider_token() {
        let fx = fixture();
        let err = fx
            .service
            .sign_in_social(ProviderKind::Google, "garbage")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken));
    }

    #[tokio::test]
    async fn credentials_sign_in_fails_for_social_only_account() {
        let fx = fixture();
        fx.service
            .sign_in_social(ProviderKind::Google, "provider-ok")
            .await
            .unwrap();

        let err = fx
            .service
            .sign_in_credentials("social@example.com", "any-password")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn refresh_rotates_jti_and_keeps_session_id() {
        let fx = fixture();
        let original = fx
            .service
            .sign_up("ada@example.com", "S3cure!pass", "Ada")
            .await
            .unwrap();
        let original_claims = access_claims(&fx, &original);

        let rotated = fx.service.refresh(&original.refresh.token).await.unwrap();
        let rotated_claims = access_claims(&fx, &rotated);

        assert_eq!(rotated_claims.sid, original_claims.sid);
        assert_eq!(rotated_claims.sub, original_claims.sub);
        assert_ne!(rotated.refresh.jti, original.refresh.jti);

        let stored = fx
            .sessions
            .get(&format!(
                "auth_session:{}:{}:refresh",
                rotated_claims.sub, rotated_claims.sid
            ))
            .await
            .unwrap();
        assert_eq!(stored.as_deref(), Some(rotated.refresh.jti.as_str()));
    }

    #[tokio::test]
    async fn rotated_away_refresh_token_is_dead() {
        let fx = fixture();
        let original = fx
            .service
            .sign_up("ada@example.com", "S3cure!pass", "Ada")
            .await
            .unwrap();

        fx.service.refresh(&original.refresh.token).await.unwrap();

        // The first refresh token is still cryptographically valid, but its
        // jti no longer matches the stored session
        let err = fx
            .service
            .refresh(&original.refresh.token)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::SessionNotFound));
    }

    #[tokio::test]
    async fn refresh_requires_a_live_session_entry() {
        let fx = fixture();
        let session = fx
            .service
            .sign_up("ada@example.com", "S3cure!pass", "Ada")
            .await
            .unwrap();
        let claims = access_claims(&fx, &session);

        fx.sessions
            .delete(&format!(
                "auth_session:{}:{}:refresh",
                claims.sub, claims.sid
            ))
            .await
            .unwrap();

        let err = fx.service.refresh(&session.refresh.token).await.unwrap_err();
        assert!(matches!(err, AuthError::SessionNotFound));
    }

    #[tokio::test]
    async fn refresh_rejects_non_refresh_tokens() {
        let fx = fixture();
        let session = fx
            .service
            .sign_up("ada@example.com", "S3cure!pass", "Ada")
            .await
            .unwrap();

        let err = fx.service.refresh(&session.access.token).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken));
    }

    #[tokio::test]
    async fn verify_email_marks_account_and_upgrades_session() {
        let fx = fixture();
        let session = fx
            .service
            .sign_up("ada@example.com", "S3cure!pass", "Ada")
            .await
            .unwrap();
        let auth = AuthenticatedUser::from_claims(access_claims(&fx, &session));
        let token = mailed_verify_token(&fx);

        let upgraded = fx.service.verify_email(&auth, &token).await.unwrap();
        let claims = access_claims(&fx, &upgraded);
        assert!(claims.is_verified);
        assert_eq!(claims.sid, auth.session_id);

        let record = fx
            .users
            .find_by_id(&auth.user_id)
            .await
            .unwrap()
            .unwrap();
        assert!(record.account(ProviderKind::Credentials).unwrap().verified);
    }

    #[tokio::test]
    async fn verify_email_token_is_single_use() {
        let fx = fixture();
        let session = fx
            .service
            .sign_up("ada@example.com", "S3cure!pass", "Ada")
            .await
            .unwrap();
        let auth = AuthenticatedUser::from_claims(access_claims(&fx, &session));
        let token = mailed_verify_token(&fx);

        fx.service.verify_email(&auth, &token).await.unwrap();

        let err = fx.service.verify_email(&auth, &token).await.unwrap_err();
        assert!(matches!(err, AuthError::AccountAlreadyVerified));
    }

    #[tokio::test]
    async fn verify_email_rejects_foreign_token() {
        let fx = fixture();
        fx.service
            .sign_up("ada@example.com", "S3cure!pass", "Ada")
            .await
            .unwrap();
        let ada_token = mailed_verify_token(&fx);

        let bob = fx
            .service
            .sign_up("bob@example.com", "S3cure!pass", "Bob")
            .await
            .unwrap();
        let bob_auth = AuthenticatedUser::from_claims(access_claims(&fx, &bob));

        let err = fx
            .service
            .verify_email(&bob_auth, &ada_token)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken));
    }

    #[tokio::test]
    async fn verify_email_on_verified_account_fails() {
        let fx = fixture();
        let session = fx
            .service
            .sign_up("ada@example.com", "S3cure!pass", "Ada")
            .await
            .unwrap();
        let auth = AuthenticatedUser::from_claims(access_claims(&fx, &session));
        let token = mailed_verify_token(&fx);
        fx.service.verify_email(&auth, &token).await.unwrap();

        // Ask for a second verification token by re-signing the claims
        let second = fx
            .tokens
            .sign(
                TokenKind::VerifyEmail,
                &EmailVerifyClaims {
                    sub: auth.user_id.clone(),
                    sid: auth.session_id.clone(),
                },
            )
            .unwrap();

        let err = fx
            .service
            .verify_email(&auth, &second.token)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::AccountAlreadyVerified));
    }

    #[tokio::test]
    async fn verify_email_rejects_garbage_tokens() {
        let fx = fixture();
        let session = fx
            .service
            .sign_up("ada@example.com", "S3cure!pass", "Ada")
            .await
            .unwrap();
        let auth = AuthenticatedUser::from_claims(access_claims(&fx, &session));

        let err = fx
            .service
            .verify_email(&auth, "not-a-token")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken));
    }

    #[test]
    fn blacklist_key_hashes_the_jti() {
        let key = blacklist_key("some-jti");
        assert!(key.starts_with("blacklist:"));
        assert!(!key.contains("some-jti"));
        assert_eq!(key.len(), "blacklist:".len() + 64);
    }
}
