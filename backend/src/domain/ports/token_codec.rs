//! Port for issuing and verifying signed access tokens.

use std::time::Duration;

use crate::domain::UserId;

use super::define_port_error;

define_port_error! {
    /// Errors raised by token adapters.
    pub enum TokenCodecError {
        /// Signature, structure or expiry check failed.
        Invalid { message: String } => "access token rejected: {message}",
        /// The token could not be signed.
        Signing { message: String } => "access token signing failed: {message}",
    }
}

/// Signed token and its lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    /// Compact encoded token.
    pub value: String,
    /// Time until the token expires.
    pub expires_in: Duration,
}

/// Issues access tokens naming a user and resolves them back.
#[cfg_attr(test, mockall::automock)]
pub trait TokenCodec: Send + Sync {
    /// Sign a token for `user_id`.
    fn issue(&self, user_id: UserId) -> Result<AccessToken, TokenCodecError>;

    /// Verify `token` and return the user it names.
    fn verify(&self, token: &str) -> Result<UserId, TokenCodecError>;
}
