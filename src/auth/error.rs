// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication and signature-verification errors.
//!
//! Every rejection in the signature and token layers must look identical to
//! the caller, so `IntoResponse` collapses those variants to one generic
//! unauthorized body. The precise variant is still available internally via
//! [`AuthError::error_code`] for logging and tests.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::store::StoreError;

/// Authentication failure taxonomy.
#[derive(Debug)]
pub enum AuthError {
    /// Request signature does not match (includes missing/malformed signature headers)
    InvalidSignature,
    /// Signature was already consumed within the replay window
    ReplayedRequest,
    /// Signature timestamp outside the allowed skew window
    ExpiredTimestamp,
    /// Signature key id does not resolve to a configured key
    UnknownSigningKey,
    /// Token failed signature validation or could not be parsed
    InvalidToken,
    /// Token is past its expiry
    ExpiredToken,
    /// Token is valid but carries a different type than the caller expected
    TokenTypeMismatch,
    /// Provider discriminator does not name a supported identity provider
    UnsupportedProvider,
    /// Unknown email or wrong password
    InvalidCredentials,
    /// Sign-up email is already registered; surfaces as a field-scoped
    /// validation error rather than a generic failure
    DuplicateEmail,
    /// Email-verification token already consumed, or account already verified
    AccountAlreadyVerified,
    /// No session entry in the store, or the stored refresh jti does not match
    SessionNotFound,
    /// No bearer token or session cookie on a protected route
    MissingCredentials,
    /// Session store unavailable or misbehaving
    Store(String),
    /// Identity provider could not be reached or answered malformed data
    ProviderUnreachable(String),
    /// Internal failure (crypto primitive rejected input, claim serialization)
    InternalError(String),
}

/// One form field and the validation messages attached to it.
#[derive(Debug, Clone, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub errors: Vec<String>,
}

#[derive(Serialize)]
struct AuthErrorBody {
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<Vec<FieldError>>,
}

impl AuthError {
    /// Machine-readable code, used in logs and tests. Never sent to clients
    /// for the unauthorized family (see [`AuthError::public_message`]).
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::InvalidSignature => "invalid_signature",
            AuthError::ReplayedRequest => "replayed_request",
            AuthError::ExpiredTimestamp => "expired_timestamp",
            AuthError::UnknownSigningKey => "unknown_signing_key",
            AuthError::InvalidToken => "invalid_token",
            AuthError::ExpiredToken => "expired_token",
            AuthError::TokenTypeMismatch => "token_type_mismatch",
            AuthError::UnsupportedProvider => "unsupported_provider",
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::DuplicateEmail => "duplicate_email",
            AuthError::AccountAlreadyVerified => "account_already_verified",
            AuthError::SessionNotFound => "session_not_found",
            AuthError::MissingCredentials => "missing_credentials",
            AuthError::Store(_) => "store_error",
            AuthError::ProviderUnreachable(_) => "provider_unreachable",
            AuthError::InternalError(_) => "internal_error",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::InvalidSignature
            | AuthError::ReplayedRequest
            | AuthError::ExpiredTimestamp
            | AuthError::UnknownSigningKey
            | AuthError::InvalidToken
            | AuthError::ExpiredToken
            | AuthError::TokenTypeMismatch
            | AuthError::InvalidCredentials
            | AuthError::SessionNotFound
            | AuthError::MissingCredentials
            | AuthError::UnsupportedProvider => StatusCode::UNAUTHORIZED,
            AuthError::DuplicateEmail | AuthError::AccountAlreadyVerified => {
                StatusCode::BAD_REQUEST
            }
            AuthError::Store(_)
            | AuthError::ProviderUnreachable(_)
            | AuthError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message sent over the wire. All signature- and token-layer rejections
    /// share one string so a caller cannot probe which check failed.
    pub fn public_message(&self) -> &'static str {
        match self {
            AuthError::InvalidSignature
            | AuthError::ReplayedRequest
            | AuthError::ExpiredTimestamp
            | AuthError::UnknownSigningKey
            | AuthError::InvalidToken
            | AuthError::ExpiredToken
            | AuthError::TokenTypeMismatch
            | AuthError::SessionNotFound
            | AuthError::MissingCredentials => "Unauthorized",
            AuthError::InvalidCredentials => "Invalid email or password",
            AuthError::DuplicateEmail => "Validation failed",
            AuthError::UnsupportedProvider => "Unsupported provider",
            AuthError::AccountAlreadyVerified => "Account already verified",
            AuthError::Store(_)
            | AuthError::ProviderUnreachable(_)
            | AuthError::InternalError(_) => "Internal server error",
        }
    }

    /// Field-scoped validation details, when this error maps to a form field.
    pub fn field_errors(&self) -> Option<Vec<FieldError>> {
        match self {
            AuthError::DuplicateEmail => Some(vec![FieldError {
                field: "email",
                errors: vec!["Email already exists".to_string()],
            }]),
            _ => None,
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::InvalidSignature => write!(f, "request signature mismatch"),
            AuthError::ReplayedRequest => write!(f, "signature already consumed"),
            AuthError::ExpiredTimestamp => write!(f, "signature timestamp outside skew window"),
            AuthError::UnknownSigningKey => write!(f, "signature key id is not configured"),
            AuthError::InvalidToken => write!(f, "token is invalid"),
            AuthError::ExpiredToken => write!(f, "token has expired"),
            AuthError::TokenTypeMismatch => write!(f, "token type does not match expectation"),
            AuthError::UnsupportedProvider => write!(f, "unsupported identity provider"),
            AuthError::InvalidCredentials => write!(f, "invalid email or password"),
            AuthError::DuplicateEmail => write!(f, "email already registered"),
            AuthError::AccountAlreadyVerified => write!(f, "account already verified"),
            AuthError::SessionNotFound => write!(f, "session not found or rotated away"),
            AuthError::MissingCredentials => write!(f, "no credentials on protected route"),
            AuthError::Store(msg) => write!(f, "session store error: {msg}"),
            AuthError::ProviderUnreachable(msg) => write!(f, "identity provider error: {msg}"),
            AuthError::InternalError(msg) => write!(f, "internal auth error: {msg}"),
        }
    }
}

impl std::error::Error for AuthError {}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        AuthError::Store(err.to_string())
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error_code = self.error_code(), detail = %self, "auth failure");
        } else {
            tracing::debug!(error_code = self.error_code(), detail = %self, "auth rejection");
        }
        let body = Json(AuthErrorBody {
            success: false,
            message: self.public_message().to_string(),
            errors: self.field_errors(),
        });
        (status, body).into_response()
    }
}
