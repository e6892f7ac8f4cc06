// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # User Directory Module
//!
//! Durable user and account records. Session material never lives here;
//! that belongs to the volatile [`store`](crate::store) with its TTLs.
//!
//! The directory is a port ([`UserDirectory`]) so the HTTP layer and the
//! auth orchestrator stay independent of the backing database.

pub mod users;

pub use users::{
    DirectoryError, DirectoryResult, InMemoryUserDirectory, LinkedAccount, NewAccount, NewUser,
    User, UserDirectory, UserRecord,
};
