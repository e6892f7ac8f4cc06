// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! StreamGate - Session and Request Security Service
//!
//! This crate issues and verifies the signed tokens behind every streaming
//! session, federates sign-in across identity providers, and authenticates
//! raw requests with HMAC signatures before they reach a handler.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Token service, request signatures, provider federation
//! - `store` - Redis-backed session and replay state
//! - `storage` - User directory

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod notify;
pub mod state;
pub mod storage;
pub mod store;
