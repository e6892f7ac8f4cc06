// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Request-signature middleware.
//!
//! Layered over the whole router: a request must carry the four signature
//! headers and verify against the key ring before any handler runs. The
//! body is buffered here because its hash is part of the canonical string;
//! the handler receives a rebuilt request with the same bytes.
//!
//! Docs, health, and the read-only status endpoint are exempt. Everything
//! else, the auth writes included, must be signed.

use axum::{
    body::Body,
    extract::{Request, State},
    http::{HeaderMap, Method},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::signature::SignaturePayload;
use super::AuthError;
use crate::state::AppState;

/// Signature header names shared by signer and verifier.
pub const KEY_ID_HEADER: &str = "x-key-id";
pub const TIMESTAMP_HEADER: &str = "x-timestamp";
pub const NONCE_HEADER: &str = "x-nonce";
pub const SIGNATURE_HEADER: &str = "x-signature";

/// Largest body the middleware will buffer for hashing.
const MAX_SIGNED_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Verify the request signature, or answer with the uniform unauthorized
/// body. Use via `axum::middleware::from_fn_with_state`.
pub async fn require_signature(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if is_exempt(request.method(), request.uri().path()) {
        return next.run(request).await;
    }

    let (parts, body) = request.into_parts();

    let payload = match extract_payload(&parts.headers) {
        Some(payload) => payload,
        None => return AuthError::InvalidSignature.into_response(),
    };

    let bytes = match axum::body::to_bytes(body, MAX_SIGNED_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(_) => return AuthError::InvalidSignature.into_response(),
    };

    // Clients sign the full path+query they requested.
    let uri = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| parts.uri.path());

    if let Err(err) = state
        .signatures
        .verify(&payload, parts.method.as_str(), uri, &bytes)
        .await
    {
        return err.into_response();
    }

    next.run(Request::from_parts(parts, Body::from(bytes))).await
}

fn is_exempt(method: &Method, path: &str) -> bool {
    if path == "/health"
        || path.starts_with("/health/")
        || path.starts_with("/docs")
        || path.starts_with("/api-doc")
    {
        return true;
    }
    *method == Method::GET && path == "/auth/status"
}

/// Pull the four signature headers; `None` if any is missing or malformed.
fn extract_payload(headers: &HeaderMap) -> Option<SignaturePayload> {
    let timestamp = header_value(headers, TIMESTAMP_HEADER)?.parse().ok()?;
    Some(SignaturePayload {
        key_id: header_value(headers, KEY_ID_HEADER)?,
        timestamp,
        nonce: header_value(headers, NONCE_HEADER)?,
        signature: header_value(headers, SIGNATURE_HEADER)?,
    })
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers.get(name)?.to_str().ok().map(str::to_string)
}
