// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Outbound mail notifications.
//!
//! Sign-up hands a verification mail to a [`MailSink`]; delivery is someone
//! else's job (an external mailer consumes the payload). The payload shape
//! is part of the contract with that consumer, so it is serialized with the
//! exact field names it expects.

use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Mail dispatch failure.
#[derive(Debug, thiserror::Error)]
#[error("mail dispatch failed: {0}")]
pub struct MailError(pub String);

/// Template the mail consumer renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MailTemplate {
    VerifyEmail,
}

/// Template variables for the verification mail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MailContext {
    /// Display name greeting
    pub username: String,
    /// Link the user clicks, carrying the verification token
    pub url: String,
    /// Human-readable token lifetime, `MM:SS` or `HH:MM:SS`
    pub expires_in: String,
}

/// A verification mail ready for dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationMail {
    pub to: String,
    pub subject: String,
    pub template: MailTemplate,
    pub context: MailContext,
}

impl VerificationMail {
    /// Build the account-verification mail for a freshly issued token.
    pub fn verify_account(
        to: impl Into<String>,
        username: impl Into<String>,
        frontend_url: &str,
        token: &str,
        expires_in_secs: u64,
    ) -> Self {
        Self {
            to: to.into(),
            subject: "Verify your account".to_string(),
            template: MailTemplate::VerifyEmail,
            context: MailContext {
                username: username.into(),
                url: format!("{frontend_url}?v={token}"),
                expires_in: format_duration(expires_in_secs),
            },
        }
    }
}

/// Render a second count as a clock string. Hours are only shown when
/// nonzero: `900 -> "15:00"`, `3600 -> "01:00:00"`.
pub fn format_duration(total_secs: u64) -> String {
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let secs = total_secs % 60;

    if hours > 0 {
        format!("{hours:02}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes:02}:{secs:02}")
    }
}

/// Destination for outbound mail.
#[async_trait]
pub trait MailSink: Send + Sync {
    async fn send(&self, mail: VerificationMail) -> Result<(), MailError>;
}

/// Sink that logs the mail instead of delivering it. Stands in until a
/// broker-backed sink is wired up, and keeps local runs self-contained.
#[derive(Default)]
pub struct TracingMailSink;

#[async_trait]
impl MailSink for TracingMailSink {
    async fn send(&self, mail: VerificationMail) -> Result<(), MailError> {
        tracing::info!(
            to = %mail.to,
            subject = %mail.subject,
            expires_in = %mail.context.expires_in,
            "verification mail dispatched"
        );
        Ok(())
    }
}

/// Sink that records every mail, for inspection in tests.
#[derive(Default)]
pub struct RecordingMailSink {
    sent: Mutex<Vec<VerificationMail>>,
}

impl RecordingMailSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything sent so far.
    pub fn sent(&self) -> Vec<VerificationMail> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl MailSink for RecordingMailSink {
    async fn send(&self, mail: VerificationMail) -> Result<(), MailError> {
        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(mail);
        Ok(())
    }
}
