//! Authentication configuration parsing and validation.
//!
//! This module centralises the environment-driven token and cookie settings
//! so they are validated consistently and can be tested in isolation.

use std::time::Duration;

use mockable::Env;
use rand::RngCore;
use tracing::warn;
use zeroize::Zeroizing;

const JWT_SECRET_ENV: &str = "JWT_SECRET";
const JWT_EXPIRES_IN_ENV: &str = "JWT_EXPIRES_IN";
const COOKIE_SECURE_ENV: &str = "AUTH_COOKIE_SECURE";
const SECRET_MIN_LEN: usize = 32;
const EPHEMERAL_SECRET_LEN: usize = 64;
const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(24 * 60 * 60);
const BOOL_EXPECTED: &str = "1|0|true|false|yes|no|y|n";
const LIFETIME_EXPECTED: &str = "<n>[s|m|h|d] with n >= 1";

/// Build mode for authentication configuration validation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BuildMode {
    /// Debug builds tolerate defaults and emit warnings for missing values.
    Debug,
    /// Release builds require an explicit signing secret.
    Release,
}

impl BuildMode {
    /// Determine the build mode from `cfg!(debug_assertions)`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use storefront::inbound::http::auth_config::BuildMode;
    ///
    /// let mode = BuildMode::from_debug_assertions();
    /// if cfg!(debug_assertions) {
    ///     assert_eq!(mode, BuildMode::Debug);
    /// } else {
    ///     assert_eq!(mode, BuildMode::Release);
    /// }
    /// ```
    #[must_use]
    pub fn from_debug_assertions() -> Self {
        if cfg!(debug_assertions) {
            Self::Debug
        } else {
            Self::Release
        }
    }

    fn is_debug(self) -> bool {
        matches!(self, Self::Debug)
    }
}

/// Token and cookie settings derived from the environment.
pub struct AuthSettings {
    /// HMAC secret used to sign access tokens. Wiped on drop.
    pub jwt_secret: Zeroizing<Vec<u8>>,
    /// Lifetime of issued tokens and of the `token` cookie.
    pub token_lifetime: Duration,
    /// Whether the `token` cookie is marked `Secure`.
    pub cookie_secure: bool,
}

/// Errors raised while validating authentication configuration.
#[derive(thiserror::Error, Debug)]
pub enum AuthConfigError {
    /// A required environment variable is missing.
    #[error("missing required environment variable: {name}")]
    MissingEnv { name: &'static str },
    /// A variable is present but contains an invalid value.
    #[error("invalid value for {name}='{value}'; expected {expected}")]
    InvalidEnv {
        name: &'static str,
        value: String,
        expected: &'static str,
    },
    /// The signing secret is too short for release builds.
    #[error("JWT_SECRET too short: need >= {min_len} bytes, got {length}")]
    SecretTooShort { length: usize, min_len: usize },
}

/// Build authentication settings from environment variables and build mode.
///
/// # Examples
///
/// ```rust
/// use storefront::inbound::http::auth_config::{auth_settings_from_env, BuildMode};
/// use mockable::MockEnv;
///
/// let mut env = MockEnv::new();
/// env.expect_string().returning(|name| match name {
///     "JWT_SECRET" => Some("x".repeat(48)),
///     "JWT_EXPIRES_IN" => Some("12h".to_owned()),
///     "AUTH_COOKIE_SECURE" => Some("1".to_owned()),
///     _ => None,
/// });
///
/// let settings = auth_settings_from_env(&env, BuildMode::Release).expect("valid settings");
/// assert_eq!(settings.token_lifetime.as_secs(), 12 * 60 * 60);
/// assert!(settings.cookie_secure);
/// ```
///
/// # Errors
///
/// Returns [`AuthConfigError`] when a release build lacks a usable secret or
/// a value cannot be parsed.
pub fn auth_settings_from_env<E: Env>(
    env: &E,
    mode: BuildMode,
) -> Result<AuthSettings, AuthConfigError> {
    Ok(AuthSettings {
        jwt_secret: secret_from_env(env, mode)?,
        token_lifetime: lifetime_from_env(env, mode)?,
        cookie_secure: cookie_secure_from_env(env, mode)?,
    })
}

fn secret_from_env<E: Env>(
    env: &E,
    mode: BuildMode,
) -> Result<Zeroizing<Vec<u8>>, AuthConfigError> {
    let value = env
        .string(JWT_SECRET_ENV)
        .map(Zeroizing::new)
        .filter(|value| !value.trim().is_empty());
    match value {
        Some(secret) => {
            let length = secret.len();
            if mode == BuildMode::Release && length < SECRET_MIN_LEN {
                return Err(AuthConfigError::SecretTooShort {
                    length,
                    min_len: SECRET_MIN_LEN,
                });
            }
            Ok(Zeroizing::new(secret.as_bytes().to_vec()))
        }
        None if mode.is_debug() => {
            warn!("{JWT_SECRET_ENV} not set; using ephemeral signing secret (dev only)");
            let mut bytes = Zeroizing::new(vec![0_u8; EPHEMERAL_SECRET_LEN]);
            rand::thread_rng().fill_bytes(bytes.as_mut_slice());
            Ok(bytes)
        }
        None => Err(AuthConfigError::MissingEnv {
            name: JWT_SECRET_ENV,
        }),
    }
}

fn lifetime_from_env<E: Env>(env: &E, mode: BuildMode) -> Result<Duration, AuthConfigError> {
    let Some(value) = env.string(JWT_EXPIRES_IN_ENV) else {
        return Ok(DEFAULT_TOKEN_LIFETIME);
    };
    match parse_lifetime(&value) {
        Some(lifetime) => Ok(lifetime),
        None if mode.is_debug() => {
            warn!(value = %value, "invalid {JWT_EXPIRES_IN_ENV}; defaulting to 1d");
            Ok(DEFAULT_TOKEN_LIFETIME)
        }
        None => Err(AuthConfigError::InvalidEnv {
            name: JWT_EXPIRES_IN_ENV,
            value,
            expected: LIFETIME_EXPECTED,
        }),
    }
}

fn cookie_secure_from_env<E: Env>(env: &E, mode: BuildMode) -> Result<bool, AuthConfigError> {
    // Local development runs over plain HTTP.
    let default_secure = !mode.is_debug();
    let Some(value) = env.string(COOKIE_SECURE_ENV) else {
        return Ok(default_secure);
    };
    match parse_bool(&value) {
        Some(flag) => Ok(flag),
        None if mode.is_debug() => {
            warn!(value = %value, "invalid {COOKIE_SECURE_ENV}; using default");
            Ok(default_secure)
        }
        None => Err(AuthConfigError::InvalidEnv {
            name: COOKIE_SECURE_ENV,
            value,
            expected: BOOL_EXPECTED,
        }),
    }
}

/// Parse `<n>[s|m|h|d]`; a bare number counts seconds.
pub(crate) fn parse_lifetime(value: &str) -> Option<Duration> {
    let value = value.trim();
    let (digits, unit_secs) = match value.char_indices().last()? {
        (idx, 's') => (&value[..idx], 1),
        (idx, 'm') => (&value[..idx], 60),
        (idx, 'h') => (&value[..idx], 60 * 60),
        (idx, 'd') => (&value[..idx], 24 * 60 * 60),
        _ => (value, 1),
    };
    let amount: u64 = digits.trim().parse().ok()?;
    if amount == 0 {
        return None;
    }
    amount.checked_mul(unit_secs).map(Duration::from_secs)
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" => Some(true),
        "0" | "false" | "no" | "n" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests;
