//! User accounts and the values they are built from.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use zeroize::Zeroizing;

use super::UserId;

/// Maximum length of a user's name, in characters.
pub const USER_NAME_MAX: usize = 100;
/// Minimum length of a plaintext password, in characters.
pub const PASSWORD_MIN: usize = 6;

/// Validation errors raised while building user values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserValidationError {
    /// Name missing or blank.
    #[error("name must not be empty")]
    EmptyName,
    /// Name longer than [`USER_NAME_MAX`].
    #[error("name must be at most {max} characters")]
    NameTooLong { max: usize },
    /// Email missing or malformed.
    #[error("email must be a valid address")]
    InvalidEmail,
    /// Password shorter than [`PASSWORD_MIN`].
    #[error("password must be at least {min} characters")]
    PasswordTooShort { min: usize },
    /// Role outside `user`/`admin`.
    #[error("Rol inválido. Debe ser 'user' o 'admin'")]
    InvalidRole { value: String },
}

/// Authorisation role attached to every account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular customer.
    #[default]
    User,
    /// Back-office administrator.
    Admin,
}

impl Role {
    /// Lowercase representation stored and serialised.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }

    /// Parse a role literal.
    ///
    /// # Errors
    /// Returns [`UserValidationError::InvalidRole`] for anything other than
    /// `user` or `admin`.
    pub fn parse(raw: &str) -> Result<Self, UserValidationError> {
        match raw.trim() {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            other => Err(UserValidationError::InvalidRole {
                value: other.to_owned(),
            }),
        }
    }

    /// Whether the role grants administrative access.
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display name of an account holder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserName(String);

impl UserName {
    /// Validate and trim a user name.
    ///
    /// # Errors
    /// Rejects blank names and names over [`USER_NAME_MAX`] characters.
    pub fn new(raw: impl Into<String>) -> Result<Self, UserValidationError> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(UserValidationError::EmptyName);
        }
        if trimmed.chars().count() > USER_NAME_MAX {
            return Err(UserValidationError::NameTooLong { max: USER_NAME_MAX });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for UserName {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<UserName> for String {
    fn from(value: UserName) -> Self {
        value.0
    }
}

impl fmt::Display for UserName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lower-cased email address, unique per account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Validate and normalise an email address.
    ///
    /// The check is structural: one `@`, a non-empty local part, and a
    /// dotted domain without whitespace.
    ///
    /// # Errors
    /// Returns [`UserValidationError::InvalidEmail`] on malformed input.
    ///
    /// # Examples
    /// ```
    /// use storefront::domain::EmailAddress;
    ///
    /// let email = EmailAddress::new(" Ada@Example.COM ").unwrap();
    /// assert_eq!(email.as_str(), "ada@example.com");
    /// assert!(EmailAddress::new("ada@localhost").is_err());
    /// ```
    pub fn new(raw: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let normalised = raw.as_ref().trim().to_lowercase();
        let Some((local, domain)) = normalised.split_once('@') else {
            return Err(UserValidationError::InvalidEmail);
        };
        let domain_ok = domain.contains('.')
            && !domain.starts_with('.')
            && !domain.ends_with('.')
            && !domain.contains('@');
        if local.is_empty() || !domain_ok || normalised.chars().any(char::is_whitespace) {
            return Err(UserValidationError::InvalidEmail);
        }
        Ok(Self(normalised))
    }

    /// Borrow the normalised address.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for EmailAddress {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Plaintext password held only long enough to hash or verify it.
///
/// The buffer is wiped on drop.
pub struct Password(Zeroizing<String>);

impl Password {
    /// Accept a password that meets the minimum length.
    ///
    /// # Errors
    /// Returns [`UserValidationError::PasswordTooShort`] below [`PASSWORD_MIN`].
    pub fn new(raw: impl Into<String>) -> Result<Self, UserValidationError> {
        let raw = Zeroizing::new(raw.into());
        if raw.chars().count() < PASSWORD_MIN {
            return Err(UserValidationError::PasswordTooShort { min: PASSWORD_MIN });
        }
        Ok(Self(raw))
    }

    /// Wrap a candidate password for verification without length rules.
    pub fn candidate(raw: impl Into<String>) -> Self {
        Self(Zeroizing::new(raw.into()))
    }

    /// Expose the secret to a hasher.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(<redacted>)")
    }
}

/// Encoded password hash in PHC string format.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Wrap an encoded hash read from the store or produced by a hasher.
    pub fn new(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    /// Borrow the encoded hash.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordHash(<redacted>)")
    }
}

/// Persisted user account.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// Store-assigned identifier.
    pub id: UserId,
    /// Display name.
    pub name: UserName,
    /// Unique login email.
    pub email: EmailAddress,
    /// Encoded credential hash; never serialised.
    pub password_hash: PasswordHash,
    /// Authorisation role.
    pub role: Role,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

/// User row enriched with the number of orders they placed.
#[derive(Debug, Clone, PartialEq)]
pub struct UserWithOrderCount {
    /// The account.
    pub user: User,
    /// Orders referencing the account.
    pub order_count: u64,
}

/// Values required to insert an account.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Display name.
    pub name: UserName,
    /// Unique login email.
    pub email: EmailAddress,
    /// Encoded credential hash.
    pub password_hash: PasswordHash,
    /// Initial role.
    pub role: Role,
}

/// Partial update applied by administrators; `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserChanges {
    /// New display name.
    pub name: Option<UserName>,
    /// New login email.
    pub email: Option<EmailAddress>,
    /// New role.
    pub role: Option<Role>,
}

impl UserChanges {
    /// Whether the update carries no field at all.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.role.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("ada@example.com", Some("ada@example.com"))]
    #[case("  ADA@Example.Com ", Some("ada@example.com"))]
    #[case("a.b+shop@mail.example.org", Some("a.b+shop@mail.example.org"))]
    #[case("", None)]
    #[case("ada", None)]
    #[case("@example.com", None)]
    #[case("ada@example", None)]
    #[case("ada@.example.com", None)]
    #[case("ada@example.com.", None)]
    #[case("a da@example.com", None)]
    #[case("ada@@example.com", None)]
    fn email_validation(#[case] raw: &str, #[case] expected: Option<&str>) {
        let parsed = EmailAddress::new(raw).ok();
        assert_eq!(parsed.as_ref().map(EmailAddress::as_str), expected);
    }

    #[rstest]
    #[case("user", Ok(Role::User))]
    #[case(" admin ", Ok(Role::Admin))]
    #[case("root", Err(UserValidationError::InvalidRole { value: "root".to_owned() }))]
    #[case("ADMIN", Err(UserValidationError::InvalidRole { value: "ADMIN".to_owned() }))]
    fn role_parsing(#[case] raw: &str, #[case] expected: Result<Role, UserValidationError>) {
        assert_eq!(Role::parse(raw), expected);
    }

    #[rstest]
    fn user_name_is_trimmed_and_bounded() {
        assert_eq!(UserName::new("  Ada ").expect("valid").as_str(), "Ada");
        assert_eq!(UserName::new("   "), Err(UserValidationError::EmptyName));
        let long = "x".repeat(USER_NAME_MAX + 1);
        assert_eq!(
            UserName::new(long),
            Err(UserValidationError::NameTooLong { max: USER_NAME_MAX })
        );
    }

    #[rstest]
    fn password_enforces_minimum_length_and_redacts_debug() {
        assert!(matches!(
            Password::new("12345"),
            Err(UserValidationError::PasswordTooShort { min: PASSWORD_MIN })
        ));
        let password = Password::new("s3cret!").expect("valid password");
        assert_eq!(password.expose(), "s3cret!");
        assert_eq!(format!("{password:?}"), "Password(<redacted>)");
    }

    #[rstest]
    fn password_hash_debug_is_redacted() {
        let hash = PasswordHash::new("$argon2id$v=19$m=19456,t=2,p=1$abc$def");
        assert_eq!(format!("{hash:?}"), "PasswordHash(<redacted>)");
    }
}
