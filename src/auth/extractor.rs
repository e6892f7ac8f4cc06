// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractor for authenticated users.
//!
//! Use the `Auth` extractor in handlers to require a verified access token:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(user): Auth) -> impl IntoResponse {
//!     // user is AuthenticatedUser
//! }
//! ```
//!
//! The token is taken from the `Authorization: Bearer` header first, then
//! from the `access_token` cookie browser clients carry. Whatever the
//! source, it is verified as an Access token; presenting a refresh or
//! verification token here fails regardless of what its own claims say.

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};

use super::claims::{AccessClaims, AuthenticatedUser};
use super::tokens::TokenKind;
use super::{AuthError, ACCESS_TOKEN_COOKIE};
use crate::state::AppState;

/// Extractor for authenticated users.
///
/// # Example
///
/// ```rust,ignore
/// async fn auth_status(
///     Auth(user): Auth,
///     State(state): State<AppState>,
/// ) -> Result<Json<SessionStatus>, AuthError> {
///     // user.user_id and user.session_id identify the caller
/// }
/// ```
pub struct Auth(pub AuthenticatedUser);

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        // First check if middleware already set the user
        if let Some(user) = parts.extensions.get::<AuthenticatedUser>().cloned() {
            return Ok(Auth(user));
        }

        let token = bearer_token(&parts.headers)
            .or_else(|| cookie_value(&parts.headers, ACCESS_TOKEN_COOKIE))
            .ok_or(AuthError::MissingCredentials)?;

        let decoded = state
            .tokens
            .verify::<AccessClaims>(TokenKind::Access, &token)?;

        Ok(Auth(AuthenticatedUser::from_claims(decoded.claims)))
    }
}

/// Token from the `Authorization: Bearer` header, if present and well formed.
pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(|token| token.trim().to_string())
}

/// Value of the named cookie from the `Cookie` header, if present.
pub(crate) fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}
