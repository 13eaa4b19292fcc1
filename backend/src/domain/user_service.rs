//! Account administration and sign-up statistics.

use std::sync::Arc;

use mockable::Clock;
use pagination::{Page, PageRequest};

use super::ports::UserRepository;
use super::repository_errors::map_user_error;
use super::{Actor, Error, MonthWindows, User, UserChanges, UserId, UserStats, UserWithOrderCount};

/// Message returned when a user id does not resolve.
pub const USER_NOT_FOUND_MESSAGE: &str = "Usuario no encontrado";
const USER_FORBIDDEN_MESSAGE: &str = "No tienes permiso para ver este usuario";
const DUPLICATE_EMAIL_MESSAGE: &str = "Ya existe un usuario con este email";
const SELF_DELETE_MESSAGE: &str = "No puedes eliminar tu propia cuenta de administrador";

/// User administration use-cases.
#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserRepository>,
    clock: Arc<dyn Clock>,
}

impl UserService {
    /// Create the service; `clock` anchors the calendar-month statistics.
    pub fn new(users: Arc<dyn UserRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { users, clock }
    }

    /// Page of accounts ordered by id.
    ///
    /// # Errors
    /// Store failures only.
    pub async fn list(&self, page: PageRequest) -> Result<Page<UserWithOrderCount>, Error> {
        self.users.list(page).await.map_err(map_user_error)
    }

    /// Sign-ups this calendar month against the previous one.
    ///
    /// # Errors
    /// Store failures only.
    pub async fn stats(&self) -> Result<UserStats, Error> {
        let windows = MonthWindows::calendar(self.clock.utc());
        let total = self.users.count().await.map_err(map_user_error)?;
        let this_month = self
            .users
            .count_created_in(windows.current)
            .await
            .map_err(map_user_error)?;
        let last_month = self
            .users
            .count_created_in(windows.previous)
            .await
            .map_err(map_user_error)?;
        Ok(UserStats::new(total, this_month, last_month))
    }

    /// One account, visible to itself and to admins.
    ///
    /// # Errors
    /// `forbidden` for other non-admin callers, `not_found` for unknown ids.
    pub async fn get(&self, actor: &Actor, id: UserId) -> Result<User, Error> {
        actor.require_access(id, USER_FORBIDDEN_MESSAGE)?;
        self.require(id).await
    }

    /// Merge `changes` into the stored account.
    ///
    /// # Errors
    /// `not_found` for unknown ids, `conflict` when a new email is taken.
    pub async fn update(&self, id: UserId, changes: UserChanges) -> Result<User, Error> {
        let current = self.require(id).await?;
        if let Some(email) = changes.email.as_ref().filter(|email| **email != current.email) {
            let clash = self
                .users
                .find_by_email(email)
                .await
                .map_err(map_user_error)?;
            if clash.is_some_and(|other| other.id != id) {
                return Err(Error::conflict(DUPLICATE_EMAIL_MESSAGE));
            }
        }
        self.users
            .update(id, changes)
            .await
            .map_err(map_user_error)?
            .ok_or_else(|| Error::not_found(USER_NOT_FOUND_MESSAGE))
    }

    /// Delete an account other than the caller's own.
    ///
    /// # Errors
    /// `invalid_request` when an admin targets themselves, `not_found` for
    /// unknown ids.
    pub async fn delete(&self, actor: &Actor, id: UserId) -> Result<(), Error> {
        if actor.id() == id {
            return Err(Error::invalid_request(SELF_DELETE_MESSAGE));
        }
        let deleted = self.users.delete(id).await.map_err(map_user_error)?;
        if deleted {
            Ok(())
        } else {
            Err(Error::not_found(USER_NOT_FOUND_MESSAGE))
        }
    }

    async fn require(&self, id: UserId) -> Result<User, Error> {
        self.users
            .find_by_id(id)
            .await
            .map_err(map_user_error)?
            .ok_or_else(|| Error::not_found(USER_NOT_FOUND_MESSAGE))
    }
}

#[cfg(test)]
#[path = "user_service_tests.rs"]
mod tests;
