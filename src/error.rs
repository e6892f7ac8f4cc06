// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::auth::error::FieldError;
use crate::auth::AuthError;

/// Handler-level failure: either an auth-layer rejection or a request that
/// failed field validation before touching any service.
#[derive(Debug)]
pub enum ApiError {
    Auth(AuthError),
    Validation(Vec<FieldError>),
}

#[derive(Serialize)]
struct ValidationBody {
    success: bool,
    message: &'static str,
    errors: Vec<FieldError>,
}

impl ApiError {
    pub fn validation(errors: Vec<FieldError>) -> Self {
        ApiError::Validation(errors)
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError::Auth(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Auth(err) => err.into_response(),
            ApiError::Validation(errors) => {
                let body = Json(ValidationBody {
                    success: false,
                    message: "Validation failed",
                    errors,
                });
                (StatusCode::BAD_REQUEST, body).into_response()
            }
        }
    }
}
