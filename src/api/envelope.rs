// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Success envelope shared by every JSON endpoint.
//!
//! The failure side lives in [`crate::error::ApiError`] and
//! [`crate::auth::AuthError`]; both produce the same
//! `{success, message, errors}` shape on the wire.

use serde::Serialize;
use utoipa::ToSchema;

/// `{success: true, message, data}`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: "OK".to_string(),
            data: Some(data),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}
