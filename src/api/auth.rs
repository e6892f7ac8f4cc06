// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Identity endpoints: sign-in, sign-up, refresh, status, verify-email.
//!
//! Session-issuing handlers all answer the same way: four auth cookies
//! plus an envelope carrying the pair's expiry timestamps. Field validation
//! runs before any service call and reports every failing field at once.

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::error::FieldError;
use crate::auth::extractor::{bearer_token, cookie_value};
use crate::auth::providers::ProviderKind;
use crate::auth::roles::Role;
use crate::auth::service::IssuedSession;
use crate::auth::{
    Auth, AuthError, ACCESS_TOKEN_COOKIE, AUTH_PROVIDER_COOKIE, REFRESH_TOKEN_COOKIE,
    SESSION_EXP_COOKIE,
};
use crate::error::ApiError;
use crate::state::AppState;

use super::envelope::ApiResponse;

/// Header naming the identity provider on social sign-in.
pub const PROVIDER_HEADER: &str = "x-provider";

/// Special characters a password may (and must) contain.
const PASSWORD_SPECIALS: &str = "@$!%*?&";

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CredentialsDto {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignUpDto {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct VerifyEmailDto {
    /// EmailVerify token from the verification link.
    pub token: Option<String>,
}

/// Expiry timestamps for an issued pair, epoch seconds.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionTokens {
    pub access_token_expires_at: i64,
    pub refresh_token_expires_at: i64,
}

/// Authenticated snapshot echoed by the status endpoint.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub is_verified: bool,
    pub provider: ProviderKind,
}

#[utoipa::path(
    post,
    path = "/auth/sign-in/credentials",
    request_body = CredentialsDto,
    tag = "Auth",
    responses(
        (status = 200, description = "Session issued, cookies set", body = ApiResponse<SessionTokens>),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "Invalid email or password")
    )
)]
pub async fn sign_in_credentials(
    State(state): State<AppState>,
    Json(body): Json<CredentialsDto>,
) -> Result<Response, ApiError> {
    validate_credentials(&body)?;

    let session = state
        .auth
        .sign_in_credentials(&body.email, &body.password)
        .await?;

    Ok(session_response(
        &state,
        StatusCode::OK,
        &session,
        "User signed in successfully",
    ))
}

#[utoipa::path(
    post,
    path = "/auth/sign-in/social",
    tag = "Auth",
    params(
        ("x-provider" = String, Header, description = "Identity provider (GOOGLE or DISCORD)")
    ),
    responses(
        (status = 200, description = "Session issued, cookies set", body = ApiResponse<SessionTokens>),
        (status = 401, description = "Provider token rejected or provider unsupported")
    )
)]
pub async fn sign_in_social(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let provider = headers
        .get(PROVIDER_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(ProviderKind::from_header)
        .ok_or(AuthError::UnsupportedProvider)?;

    let token = bearer_token(&headers).ok_or(AuthError::MissingCredentials)?;

    let session = state.auth.sign_in_social(provider, &token).await?;

    Ok(session_response(
        &state,
        StatusCode::OK,
        &session,
        "User signed in successfully",
    ))
}

#[utoipa::path(
    post,
    path = "/auth/sign-up",
    request_body = SignUpDto,
    tag = "Auth",
    responses(
        (status = 201, description = "Account created, session issued, verification mail queued", body = ApiResponse<SessionTokens>),
        (status = 400, description = "Validation failed or email already registered")
    )
)]
pub async fn sign_up(
    State(state): State<AppState>,
    Json(body): Json<SignUpDto>,
) -> Result<Response, ApiError> {
    validate_sign_up(&body)?;

    let session = state
        .auth
        .sign_up(&body.email, &body.password, &body.full_name)
        .await?;

    Ok(session_response(
        &state,
        StatusCode::CREATED,
        &session,
        "User created successfully",
    ))
}

#[utoipa::path(
    post,
    path = "/auth/refresh",
    tag = "Auth",
    responses(
        (status = 200, description = "Pair rotated, cookies replaced", body = ApiResponse<SessionTokens>),
        (status = 401, description = "Missing, expired, or superseded refresh token")
    )
)]
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let token =
        cookie_value(&headers, REFRESH_TOKEN_COOKIE).ok_or(AuthError::MissingCredentials)?;

    let session = state.auth.refresh(&token).await?;

    Ok(session_response(
        &state,
        StatusCode::OK,
        &session,
        "access and refresh tokens refreshed successfully",
    ))
}

#[utoipa::path(
    get,
    path = "/auth/status",
    tag = "Auth",
    responses(
        (status = 200, description = "Caller's session snapshot", body = ApiResponse<SessionStatus>),
        (status = 401, description = "No valid access token")
    )
)]
pub async fn status(Auth(user): Auth) -> Json<ApiResponse<SessionStatus>> {
    Json(ApiResponse::ok(SessionStatus {
        id: user.user_id,
        email: user.email,
        name: user.name,
        role: user.role,
        is_verified: user.is_verified,
        provider: user.provider,
    }))
}

#[utoipa::path(
    post,
    path = "/auth/verify-email",
    request_body = VerifyEmailDto,
    tag = "Auth",
    responses(
        (status = 200, description = "Account verified, fresh verified session issued", body = ApiResponse<SessionTokens>),
        (status = 400, description = "Account already verified"),
        (status = 401, description = "Verification token missing or invalid")
    )
)]
pub async fn verify_email(
    State(state): State<AppState>,
    Auth(user): Auth,
    Json(body): Json<VerifyEmailDto>,
) -> Result<Response, ApiError> {
    let token = body
        .token
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::MissingCredentials)?;

    let session = state.auth.verify_email(&user, &token).await?;

    Ok(session_response(&state, StatusCode::OK, &session, "OK"))
}

/// Status + envelope + the four auth cookies.
fn session_response(
    state: &AppState,
    status: StatusCode,
    session: &IssuedSession,
    message: &str,
) -> Response {
    let payload = SessionTokens {
        access_token_expires_at: session.access.expires_at,
        refresh_token_expires_at: session.refresh.expires_at,
    };
    let mut response =
        (status, Json(ApiResponse::ok(payload).with_message(message))).into_response();

    let headers = response.headers_mut();
    for cookie in session_cookies(session, state.cookie_secure) {
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            headers.append(header::SET_COOKIE, value);
        }
    }
    response
}

/// The cookie set shared by every session-issuing endpoint. Token cookies
/// are httpOnly; the expiry and provider cookies are frontend-readable so
/// the client can schedule a refresh without touching the tokens.
fn session_cookies(session: &IssuedSession, secure: bool) -> Vec<String> {
    let refresh_expiry = http_date(session.refresh.expires_at);
    vec![
        build_cookie(
            ACCESS_TOKEN_COOKIE,
            &session.access.token,
            &http_date(session.access.expires_at),
            true,
            secure,
        ),
        build_cookie(
            REFRESH_TOKEN_COOKIE,
            &session.refresh.token,
            &refresh_expiry,
            true,
            secure,
        ),
        build_cookie(
            SESSION_EXP_COOKIE,
            &session.access.expires_at.to_string(),
            &refresh_expiry,
            false,
            secure,
        ),
        build_cookie(
            AUTH_PROVIDER_COOKIE,
            session.provider.as_str(),
            &refresh_expiry,
            false,
            secure,
        ),
    ]
}

fn build_cookie(name: &str, value: &str, expires: &str, http_only: bool, secure: bool) -> String {
    let mut cookie = format!("{name}={value}; Path=/; SameSite=Lax; Expires={expires}");
    if http_only {
        cookie.push_str("; HttpOnly");
    }
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

fn http_date(epoch_secs: i64) -> String {
    DateTime::<Utc>::from_timestamp(epoch_secs, 0)
        .unwrap_or(DateTime::UNIX_EPOCH)
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string()
}

fn validate_credentials(body: &CredentialsDto) -> Result<(), ApiError> {
    let mut errors = Vec::new();

    if let Some(message) = email_error(&body.email) {
        errors.push(FieldError {
            field: "email",
            errors: vec![message],
        });
    }
    if body.password.is_empty() {
        errors.push(FieldError {
            field: "password",
            errors: vec!["Password is required".to_string()],
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ApiError::validation(errors))
    }
}

fn validate_sign_up(body: &SignUpDto) -> Result<(), ApiError> {
    let mut errors = Vec::new();

    if body.full_name.trim().chars().count() < 4 {
        errors.push(FieldError {
            field: "fullName",
            errors: vec!["Full name must be at least 4 characters long".to_string()],
        });
    }
    if let Some(message) = email_error(&body.email) {
        errors.push(FieldError {
            field: "email",
            errors: vec![message],
        });
    }
    let password_messages = password_errors(&body.password);
    if !password_messages.is_empty() {
        errors.push(FieldError {
            field: "password",
            errors: password_messages,
        });
    }
    if body.confirm_password != body.password {
        errors.push(FieldError {
            field: "confirmPassword",
            errors: vec!["Confirm password does not match password".to_string()],
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ApiError::validation(errors))
    }
}

fn email_error(email: &str) -> Option<String> {
    if is_valid_email(email) {
        None
    } else {
        Some("Invalid email format".to_string())
    }
}

fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.contains(char::is_whitespace)
}

fn password_errors(password: &str) -> Vec<String> {
    let mut errors = Vec::new();

    if password.chars().count() < 8 {
        errors.push("Password must be at least 8 characters long".to_string());
    }
    if password.chars().count() > 30 {
        errors.push("Password must be at most 30 characters long".to_string());
    }

    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_special = password.chars().any(|c| PASSWORD_SPECIALS.contains(c));
    if !(has_lower && has_upper && has_digit && has_special) {
        errors.push(
            "Password must contain at least one uppercase letter, one lowercase letter, \
             one number, and one special character"
                .to_string(),
        );
    }

    if !password
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || PASSWORD_SPECIALS.contains(c))
    {
        errors.push(format!(
            "Password may only contain letters, numbers, and {PASSWORD_SPECIALS}"
        ));
    }

    errors
}
