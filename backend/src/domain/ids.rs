//! Numeric identifiers assigned by the relational store.
//!
//! Identifiers are positive 32-bit integers. Parsing from path segments
//! rejects zero, negatives and non-numeric input so handlers can answer with
//! a resource-specific "invalid id" message before touching the store.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Failure to parse an identifier from untrusted text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("identifier must be a positive integer, got '{value}'")]
pub struct ParseIdError {
    value: String,
}

impl ParseIdError {
    /// Raw value that failed to parse.
    pub fn value(&self) -> &str {
        &self.value
    }
}

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
            ToSchema,
        )]
        #[serde(transparent)]
        pub struct $name(i32);

        impl $name {
            /// Wrap a raw store identifier.
            pub const fn new(raw: i32) -> Self {
                Self(raw)
            }

            /// Raw integer value.
            pub const fn get(self) -> i32 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().parse::<i32>() {
                    Ok(raw) if raw > 0 => Ok(Self(raw)),
                    _ => Err(ParseIdError {
                        value: s.to_owned(),
                    }),
                }
            }
        }
    };
}

entity_id!(
    /// Identifier of a user account.
    UserId
);
entity_id!(
    /// Identifier of a product category.
    CategoryId
);
entity_id!(
    /// Identifier of a catalogue product.
    ProductId
);
entity_id!(
    /// Identifier of a customer order.
    OrderId
);
