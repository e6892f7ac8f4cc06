// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names and loads them into a
//! [`Config`] at startup. Signing material is mandatory: the service refuses
//! to boot without its token secrets and request-signing keys rather than
//! fall back to something guessable.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info` |
//! | `REDIS_URL` | Session store connection URL | `redis://127.0.0.1:6379` |
//! | `FRONTEND_URL` | Base URL for links in outgoing mail | `http://localhost:3000` |
//! | `COOKIE_SECURE` | Mark auth cookies `Secure` (`true`/`false`) | `false` |
//! | `SIGNATURE_KEYS` | Request-signing keys, `id:base64secret` comma list | Required |
//! | `SIGNATURE_CURRENT_KEY_ID` | Key id new signatures are minted with | Required |
//! | `JWT_ACCESS_SECRET` | Access token signing secret | Required |
//! | `JWT_REFRESH_SECRET` | Refresh token signing secret | Required |
//! | `JWT_VERIFY_EMAIL_SECRET` | Email-verification token signing secret | Required |
//! | `JWT_STREAM_SECRET` | Stream token signing secret | Required |
//! | `JWT_INTERNAL_SECRET` | Internal service token signing secret | Required |
//! | `GOOGLE_CLIENT_ID` | OAuth client id Google ID tokens must be issued for | Required |

use std::env;

use thiserror::Error;

use crate::auth::keys::{KeyRing, KeyRingError};
use crate::auth::tokens::TokenSecrets;

/// Environment variable name for the server bind address.
pub const HOST_ENV: &str = "HOST";

/// Environment variable name for the server bind port.
pub const PORT_ENV: &str = "PORT";

/// Environment variable name for the logging format (`json` or `pretty`).
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Environment variable name for the session store connection URL.
pub const REDIS_URL_ENV: &str = "REDIS_URL";

/// Environment variable name for the frontend base URL used in mail links.
pub const FRONTEND_URL_ENV: &str = "FRONTEND_URL";

/// Environment variable name for the `Secure` cookie toggle.
pub const COOKIE_SECURE_ENV: &str = "COOKIE_SECURE";

/// Environment variable name for the request-signing key list.
///
/// Format: comma-separated `id:base64secret` entries. Every listed key may
/// verify incoming signatures; only [`SIGNATURE_CURRENT_KEY_ID_ENV`] signs.
pub const SIGNATURE_KEYS_ENV: &str = "SIGNATURE_KEYS";

/// Environment variable name for the active signing key id.
pub const SIGNATURE_CURRENT_KEY_ID_ENV: &str = "SIGNATURE_CURRENT_KEY_ID";

/// Environment variable name for the access token secret.
pub const JWT_ACCESS_SECRET_ENV: &str = "JWT_ACCESS_SECRET";

/// Environment variable name for the refresh token secret.
pub const JWT_REFRESH_SECRET_ENV: &str = "JWT_REFRESH_SECRET";

/// Environment variable name for the email-verification token secret.
pub const JWT_VERIFY_EMAIL_SECRET_ENV: &str = "JWT_VERIFY_EMAIL_SECRET";

/// Environment variable name for the stream token secret.
pub const JWT_STREAM_SECRET_ENV: &str = "JWT_STREAM_SECRET";

/// Environment variable name for the internal service token secret.
pub const JWT_INTERNAL_SECRET_ENV: &str = "JWT_INTERNAL_SECRET";

/// Environment variable name for the Google OAuth client id.
pub const GOOGLE_CLIENT_ID_ENV: &str = "GOOGLE_CLIENT_ID";

/// Configuration problems that prevent startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingVar(&'static str),
    #[error("invalid SIGNATURE_KEYS: {0}")]
    SignatureKeys(#[from] KeyRingError),
}

/// Everything the server needs from the environment, loaded once at boot.
#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub redis_url: String,
    pub frontend_url: String,
    pub cookie_secure: bool,
    pub signing_keys: KeyRing,
    pub token_secrets: TokenSecrets,
    pub google_client_id: String,
}

impl Config {
    /// Load configuration from the environment.
    ///
    /// Bind address and store URL fall back to development defaults; all
    /// signing material is required and its absence is an error.
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = env::var(HOST_ENV).unwrap_or_else(|_| "0.0.0.0".to_string());
        let port: u16 = env::var(PORT_ENV)
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .unwrap_or(8080);

        let redis_url =
            env::var(REDIS_URL_ENV).unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());
        let frontend_url =
            env::var(FRONTEND_URL_ENV).unwrap_or_else(|_| "http://localhost:3000".to_string());
        let cookie_secure = env::var(COOKIE_SECURE_ENV)
            .map(|value| matches!(value.as_str(), "1" | "true" | "TRUE" | "True"))
            .unwrap_or(false);

        let key_spec = require(SIGNATURE_KEYS_ENV)?;
        let current_key_id = require(SIGNATURE_CURRENT_KEY_ID_ENV)?;
        let signing_keys = KeyRing::parse(&key_spec, &current_key_id)?;

        let token_secrets = TokenSecrets {
            access: require(JWT_ACCESS_SECRET_ENV)?,
            refresh: require(JWT_REFRESH_SECRET_ENV)?,
            verify_email: require(JWT_VERIFY_EMAIL_SECRET_ENV)?,
            stream: require(JWT_STREAM_SECRET_ENV)?,
            internal: require(JWT_INTERNAL_SECRET_ENV)?,
        };

        Ok(Self {
            host,
            port,
            redis_url,
            frontend_url,
            cookie_secure,
            signing_keys,
            token_secrets,
            google_client_id: require(GOOGLE_CLIENT_ID_ENV)?,
        })
    }
}

fn require(name: &'static str) -> Result<String, ConfigError> {
    match env::var(name) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(ConfigError::MissingVar(name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use base64ct::{Base64, Encoding};

    // Process-wide env mutation; tests in this module must not interleave.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const ALL_VARS: &[&str] = &[
        HOST_ENV,
        PORT_ENV,
        REDIS_URL_ENV,
        FRONTEND_URL_ENV,
        COOKIE_SECURE_ENV,
        SIGNATURE_KEYS_ENV,
        SIGNATURE_CURRENT_KEY_ID_ENV,
        JWT_ACCESS_SECRET_ENV,
        JWT_REFRESH_SECRET_ENV,
        JWT_VERIFY_EMAIL_SECRET_ENV,
        JWT_STREAM_SECRET_ENV,
        JWT_INTERNAL_SECRET_ENV,
        GOOGLE_CLIENT_ID_ENV,
    ];

    fn clear_env() {
        for name in ALL_VARS {
            std::env::remove_var(name);
        }
    }

    fn set_required() {
        let keys = format!("k1:{}", Base64::encode_string(b"signing-secret"));
        std::env::set_var(SIGNATURE_KEYS_ENV, keys);
        std::env::set_var(SIGNATURE_CURRENT_KEY_ID_ENV, "k1");
        std::env::set_var(JWT_ACCESS_SECRET_ENV, "access");
        std::env::set_var(JWT_REFRESH_SECRET_ENV, "refresh");
        std::env::set_var(JWT_VERIFY_EMAIL_SECRET_ENV, "verify");
        std::env::set_var(JWT_STREAM_SECRET_ENV, "stream");
        std::env::set_var(JWT_INTERNAL_SECRET_ENV, "internal");
        std::env::set_var(GOOGLE_CLIENT_ID_ENV, "client-id");
    }

    #[test]
    fn loads_with_defaults_for_optional_vars() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        set_required();

        let config = Config::from_env().unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.redis_url, "redis://127.0.0.1:6379");
        assert!(!config.cookie_secure);
        assert_eq!(config.token_secrets.access, "access");
        clear_env();
    }

    #[test]
    fn missing_secret_is_fatal() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        set_required();
        std::env::remove_var(JWT_REFRESH_SECRET_ENV);

        let err = Config::from_env().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingVar(JWT_REFRESH_SECRET_ENV)
        ));
        clear_env();
    }

    #[test]
    fn malformed_key_list_is_fatal() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        set_required();
        std::env::set_var(SIGNATURE_KEYS_ENV, "not a key list");

        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::SignatureKeys(_)));
        clear_env();
    }

    #[test]
    fn cookie_secure_accepts_common_truthy_values() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        set_required();

        std::env::set_var(COOKIE_SECURE_ENV, "true");
        assert!(Config::from_env().unwrap().cookie_secure);

        std::env::set_var(COOKIE_SECURE_ENV, "0");
        assert!(!Config::from_env().unwrap().cookie_secure);
        clear_env();
    }
}
