//! Classify Diesel failures once so repositories only decide what a
//! constraint violation means for their port.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

use super::pool::PoolError;

/// Store failure reduced to the cases repositories distinguish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum StoreFailure {
    /// The connection dropped or could not be obtained.
    Connection(String),
    /// Any other query failure.
    Query(String),
    /// A unique constraint rejected the write.
    UniqueViolation { constraint: Option<String> },
    /// A foreign key constraint rejected the write.
    ForeignKeyViolation { constraint: Option<String> },
}

impl From<PoolError> for StoreFailure {
    fn from(error: PoolError) -> Self {
        Self::Connection(error.into_message())
    }
}

impl From<DieselError> for StoreFailure {
    fn from(error: DieselError) -> Self {
        match &error {
            DieselError::DatabaseError(kind, info) => {
                debug!(
                    ?kind,
                    message = info.message(),
                    constraint = info.constraint_name(),
                    "diesel operation failed"
                );
            }
            _ => debug!(
                error_type = %std::any::type_name_of_val(&error),
                "diesel operation failed"
            ),
        }

        match error {
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                Self::UniqueViolation {
                    constraint: info.constraint_name().map(str::to_owned),
                }
            }
            DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, info) => {
                Self::ForeignKeyViolation {
                    constraint: info.constraint_name().map(str::to_owned),
                }
            }
            DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
                Self::Connection("database connection error".to_owned())
            }
            DieselError::NotFound => Self::Query("record not found".to_owned()),
            DieselError::QueryBuilderError(_) => Self::Query("database query error".to_owned()),
            _ => Self::Query("database error".to_owned()),
        }
    }
}

impl StoreFailure {
    /// Message for the port's connection or query variant.
    pub(crate) fn describe(&self) -> String {
        match self {
            Self::Connection(message) | Self::Query(message) => message.clone(),
            Self::UniqueViolation { constraint } => {
                format!("unique constraint violated: {}", constraint_label(constraint))
            }
            Self::ForeignKeyViolation { constraint } => {
                format!("foreign key violated: {}", constraint_label(constraint))
            }
        }
    }
}

fn constraint_label(constraint: &Option<String>) -> &str {
    constraint.as_deref().unwrap_or("unknown")
}

/// Clamp a page request into Diesel's signed limit and offset.
pub(crate) fn page_bounds(page: pagination::PageRequest) -> (i64, i64) {
    let limit = i64::from(page.limit());
    let offset = i64::try_from(page.offset()).unwrap_or(i64::MAX);
    (limit, offset)
}

/// Convert a `COUNT(*)` result to the unsigned counts used by the domain.
pub(crate) fn count_to_u64(count: i64) -> u64 {
    u64::try_from(count).unwrap_or_default()
}

#[cfg(test)]
struct ConstraintInfo(&'static str);

#[cfg(test)]
impl diesel::result::DatabaseErrorInformation for ConstraintInfo {
    fn message(&self) -> &str {
        "constraint violated"
    }
    fn details(&self) -> Option<&str> {
        None
    }
    fn hint(&self) -> Option<&str> {
        None
    }
    fn table_name(&self) -> Option<&str> {
        None
    }
    fn column_name(&self) -> Option<&str> {
        None
    }
    fn constraint_name(&self) -> Option<&str> {
        Some(self.0)
    }
    fn statement_position(&self) -> Option<i32> {
        None
    }
}

/// Database error of `kind` raised by `constraint`, for mapping tests.
#[cfg(test)]
pub(crate) fn database_error(kind: DatabaseErrorKind, constraint: &'static str) -> DieselError {
    DieselError::DatabaseError(kind, Box::new(ConstraintInfo(constraint)))
}
