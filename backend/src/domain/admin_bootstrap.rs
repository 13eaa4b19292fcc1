//! Make sure a configured administrator account exists at startup.

use std::sync::Arc;

use tracing::info;

use super::ports::{CredentialHasher, UserRepository};
use super::repository_errors::{map_hasher_error, map_user_error};
use super::{EmailAddress, Error, NewUser, Password, Role, UserChanges, UserId, UserName};

/// Credentials of the administrator to provision.
#[derive(Debug)]
pub struct AdminAccount {
    /// Display name used when the account is created.
    pub name: UserName,
    /// Login email.
    pub email: EmailAddress,
    /// Password used when the account is created.
    pub password: Password,
}

/// What [`AdminBootstrap::ensure`] had to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// A new admin account was inserted.
    Created(UserId),
    /// An existing account was promoted to admin.
    Promoted(UserId),
    /// The account already held the admin role.
    Unchanged(UserId),
}

/// Idempotent administrator provisioning.
#[derive(Clone)]
pub struct AdminBootstrap {
    users: Arc<dyn UserRepository>,
    hasher: Arc<dyn CredentialHasher>,
}

impl AdminBootstrap {
    /// Create the provisioner over the user store and password hasher.
    pub fn new(users: Arc<dyn UserRepository>, hasher: Arc<dyn CredentialHasher>) -> Self {
        Self { users, hasher }
    }

    /// Create the admin account, or promote the account owning its email.
    ///
    /// An existing account keeps its password.
    ///
    /// # Errors
    /// Store or hashing failures.
    pub async fn ensure(&self, account: AdminAccount) -> Result<BootstrapOutcome, Error> {
        let existing = self
            .users
            .find_by_email(&account.email)
            .await
            .map_err(map_user_error)?;

        let outcome = match existing {
            Some(user) if user.role.is_admin() => BootstrapOutcome::Unchanged(user.id),
            Some(user) => {
                let changes = UserChanges {
                    role: Some(Role::Admin),
                    ..UserChanges::default()
                };
                self.users
                    .update(user.id, changes)
                    .await
                    .map_err(map_user_error)?;
                BootstrapOutcome::Promoted(user.id)
            }
            None => {
                let password_hash = self
                    .hasher
                    .hash(&account.password)
                    .await
                    .map_err(map_hasher_error)?;
                let user = self
                    .users
                    .create(NewUser {
                        name: account.name,
                        email: account.email,
                        password_hash,
                        role: Role::Admin,
                    })
                    .await
                    .map_err(map_user_error)?;
                BootstrapOutcome::Created(user.id)
            }
        };
        info!(?outcome, "administrator account ensured");
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::domain::PasswordHash;
    use crate::domain::ports::{MockCredentialHasher, MockUserRepository};
    use crate::domain::test_fixtures::user;

    fn account() -> AdminAccount {
        AdminAccount {
            name: UserName::new("Store Admin").expect("valid name"),
            email: EmailAddress::new("admin@example.com").expect("valid email"),
            password: Password::new("change-me-now").expect("valid password"),
        }
    }

    #[tokio::test]
    async fn creates_missing_admin() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_email().return_once(|_| Ok(None));
        users
            .expect_create()
            .withf(|new_user| new_user.role == Role::Admin)
            .return_once(|new_user| Ok(user(1, new_user.email.as_str(), Role::Admin)));
        let mut hasher = MockCredentialHasher::new();
        hasher
            .expect_hash()
            .return_once(|_| Ok(PasswordHash::new("$argon2id$admin")));

        let outcome = AdminBootstrap::new(Arc::new(users), Arc::new(hasher))
            .ensure(account())
            .await
            .expect("bootstrap");

        assert_eq!(outcome, BootstrapOutcome::Created(UserId::new(1)));
    }

    #[tokio::test]
    async fn promotes_existing_customer() {
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_email()
            .return_once(|_| Ok(Some(user(4, "admin@example.com", Role::User))));
        users
            .expect_update()
            .withf(|_, changes| changes.role == Some(Role::Admin))
            .return_once(|id, _| Ok(Some(user(id.get(), "admin@example.com", Role::Admin))));
        let mut hasher = MockCredentialHasher::new();
        hasher.expect_hash().never();

        let outcome = AdminBootstrap::new(Arc::new(users), Arc::new(hasher))
            .ensure(account())
            .await
            .expect("bootstrap");

        assert_eq!(outcome, BootstrapOutcome::Promoted(UserId::new(4)));
    }

    #[tokio::test]
    async fn leaves_existing_admin_untouched() {
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_email()
            .return_once(|_| Ok(Some(user(2, "admin@example.com", Role::Admin))));
        users.expect_update().never();
        users.expect_create().never();

        let outcome = AdminBootstrap::new(Arc::new(users), Arc::new(MockCredentialHasher::new()))
            .ensure(account())
            .await
            .expect("bootstrap");

        assert_eq!(outcome, BootstrapOutcome::Unchanged(UserId::new(2)));
    }
}
