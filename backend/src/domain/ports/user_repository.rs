//! Port for user account persistence.

use async_trait::async_trait;
use pagination::{Page, PageRequest};

use crate::domain::{
    EmailAddress, NewUser, TimeWindow, User, UserChanges, UserId, UserWithOrderCount,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by user repository adapters.
    pub enum UserRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "user repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "user repository query failed: {message}",
        /// The email unique constraint rejected the write.
        DuplicateEmail { email: String } => "email already registered: {email}",
    }
}

/// Storage for user accounts.
///
/// Email uniqueness is enforced by the store; adapters surface violations as
/// [`UserRepositoryError::DuplicateEmail`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fetch a user by identifier.
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, UserRepositoryError>;

    /// Fetch a user by normalised email.
    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<User>, UserRepositoryError>;

    /// Insert a user and return the stored row.
    async fn create(&self, user: NewUser) -> Result<User, UserRepositoryError>;

    /// Apply a partial update; `None` when the user does not exist.
    async fn update(
        &self,
        id: UserId,
        changes: UserChanges,
    ) -> Result<Option<User>, UserRepositoryError>;

    /// Delete a user and their orders; `false` when nothing was deleted.
    async fn delete(&self, id: UserId) -> Result<bool, UserRepositoryError>;

    /// Page of users ordered by id, each with their order count.
    async fn list(
        &self,
        page: PageRequest,
    ) -> Result<Page<UserWithOrderCount>, UserRepositoryError>;

    /// Number of accounts.
    async fn count(&self) -> Result<u64, UserRepositoryError>;

    /// Number of accounts created inside `window`.
    async fn count_created_in(&self, window: TimeWindow) -> Result<u64, UserRepositoryError>;
}
