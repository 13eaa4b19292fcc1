//! Who is acting on a request and what they may touch.

use super::{Error, Role, User, UserId};

/// Message returned when a non-admin reaches an admin-only operation.
pub const ADMIN_REQUIRED_MESSAGE: &str = "Acceso denegado. Se requiere rol de administrador.";

/// Authenticated caller, resolved from a verified token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    id: UserId,
    role: Role,
}

impl Actor {
    /// Build an actor from its id and role.
    pub const fn new(id: UserId, role: Role) -> Self {
        Self { id, role }
    }

    /// Caller's user id.
    pub const fn id(&self) -> UserId {
        self.id
    }

    /// Caller's role.
    pub const fn role(&self) -> Role {
        self.role
    }

    /// Whether the caller holds the admin role.
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Whether the caller is `owner` or an admin.
    pub fn can_access(&self, owner: UserId) -> bool {
        self.is_admin() || self.id == owner
    }

    /// Fail with 403 unless the caller is an admin.
    ///
    /// # Errors
    /// Returns a `forbidden` [`Error`] for non-admin callers.
    pub fn require_admin(&self) -> Result<(), Error> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(Error::forbidden(ADMIN_REQUIRED_MESSAGE))
        }
    }

    /// Fail with 403 and `message` unless the caller is `owner` or an admin.
    ///
    /// # Errors
    /// Returns a `forbidden` [`Error`] carrying `message`.
    pub fn require_access(&self, owner: UserId, message: &str) -> Result<(), Error> {
        if self.can_access(owner) {
            Ok(())
        } else {
            Err(Error::forbidden(message))
        }
    }
}

impl From<&User> for Actor {
    fn from(user: &User) -> Self {
        Self::new(user.id, user.role)
    }
}
