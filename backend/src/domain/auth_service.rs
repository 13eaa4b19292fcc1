//! Sign-up, sign-in and token resolution.

use std::sync::Arc;

use tracing::debug;

use super::ports::{
    AccessToken, CredentialHasher, TokenCodec, UserRepository, UserRepositoryError,
};
use super::repository_errors::{map_hasher_error, map_token_error, map_user_error};
use super::{EmailAddress, Error, NewUser, Password, Role, User, UserName};

/// Message returned when no token accompanies a protected request.
pub const TOKEN_MISSING_MESSAGE: &str = "No autorizado. Token no proporcionado.";
/// Message returned when the token fails verification.
pub const TOKEN_INVALID_MESSAGE: &str = "No autorizado. Token inválido.";
/// Message returned when the token names an account that no longer exists.
pub const TOKEN_USER_MISSING_MESSAGE: &str = "No autorizado. Usuario no encontrado.";

/// Validated sign-up form.
#[derive(Debug)]
pub struct SignUp {
    /// Display name.
    pub name: UserName,
    /// Login email.
    pub email: EmailAddress,
    /// Chosen password.
    pub password: Password,
}

/// Result of a successful sign-up or sign-in.
#[derive(Debug, Clone)]
pub struct Session {
    /// Token to hand back as cookie and body field.
    pub token: AccessToken,
    /// The authenticated account.
    pub user: User,
}

/// Authentication use-cases.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    hasher: Arc<dyn CredentialHasher>,
    tokens: Arc<dyn TokenCodec>,
}

impl AuthService {
    /// Create the service over its collaborators.
    pub fn new(
        users: Arc<dyn UserRepository>,
        hasher: Arc<dyn CredentialHasher>,
        tokens: Arc<dyn TokenCodec>,
    ) -> Self {
        Self {
            users,
            hasher,
            tokens,
        }
    }

    /// Register a new `user` account and sign it in.
    ///
    /// # Errors
    /// `conflict` when the email is taken.
    pub async fn sign_up(&self, request: SignUp) -> Result<Session, Error> {
        let existing = self
            .users
            .find_by_email(&request.email)
            .await
            .map_err(map_user_error)?;
        if existing.is_some() {
            return Err(Error::conflict("User already exists"));
        }

        let password_hash = self
            .hasher
            .hash(&request.password)
            .await
            .map_err(map_hasher_error)?;
        let user = self
            .users
            .create(NewUser {
                name: request.name,
                email: request.email,
                password_hash,
                role: Role::User,
            })
            .await
            .map_err(|err| match err {
                UserRepositoryError::DuplicateEmail { .. } => {
                    Error::conflict("User already exists")
                }
                other => map_user_error(other),
            })?;

        self.open_session(user)
    }

    /// Check credentials and sign the account in.
    ///
    /// # Errors
    /// `not_found` for unknown emails, `unauthorized` for a wrong password.
    pub async fn sign_in(&self, email: &EmailAddress, password: &Password) -> Result<Session, Error> {
        let user = self
            .users
            .find_by_email(email)
            .await
            .map_err(map_user_error)?
            .ok_or_else(|| Error::not_found("User not found"))?;

        let valid = self
            .hasher
            .verify(password.expose(), &user.password_hash)
            .await
            .map_err(map_hasher_error)?;
        if !valid {
            return Err(Error::unauthorized("Invalid password"));
        }

        self.open_session(user)
    }

    /// Resolve a bearer token to the account it names.
    ///
    /// # Errors
    /// `unauthorized` when the token is invalid or the account is gone.
    pub async fn authenticate(&self, token: &str) -> Result<User, Error> {
        let user_id = self.tokens.verify(token).map_err(|err| {
            debug!(error = %err, "rejected access token");
            Error::unauthorized(TOKEN_INVALID_MESSAGE)
        })?;
        self.users
            .find_by_id(user_id)
            .await
            .map_err(map_user_error)?
            .ok_or_else(|| Error::unauthorized(TOKEN_USER_MISSING_MESSAGE))
    }

    fn open_session(&self, user: User) -> Result<Session, Error> {
        let token = self.tokens.issue(user.id).map_err(map_token_error)?;
        Ok(Session { token, user })
    }
}

#[cfg(test)]
#[path = "auth_service_tests.rs"]
mod tests;
