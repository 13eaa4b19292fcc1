//! Product categories.

use std::fmt;

use chrono::{DateTime, Utc};

use super::{CategoryId, Product};

/// Maximum length of a category name, in characters.
pub const CATEGORY_NAME_MAX: usize = 100;

/// Validation errors raised while building category values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CategoryValidationError {
    /// Name missing or blank.
    #[error("El nombre de la categoría es obligatorio")]
    EmptyName,
    /// Name longer than [`CATEGORY_NAME_MAX`].
    #[error("El nombre de la categoría no puede superar {max} caracteres")]
    NameTooLong { max: usize },
}

/// Unique, trimmed category name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CategoryName(String);

impl CategoryName {
    /// Validate and trim a category name.
    ///
    /// # Errors
    /// Rejects blank names and names over [`CATEGORY_NAME_MAX`] characters.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, CategoryValidationError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(CategoryValidationError::EmptyName);
        }
        if trimmed.chars().count() > CATEGORY_NAME_MAX {
            return Err(CategoryValidationError::NameTooLong {
                max: CATEGORY_NAME_MAX,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CategoryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Persisted category.
#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    /// Store-assigned identifier.
    pub id: CategoryId,
    /// Unique name.
    pub name: CategoryName,
    /// Free-form description; empty when not provided.
    pub description: String,
    /// Hosted image URL, once uploaded.
    pub image: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Category listing row with the number of products filed under it.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryWithProductCount {
    /// The category.
    pub category: Category,
    /// Products referencing the category.
    pub product_count: u64,
}

/// Category detail view with its products.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryDetails {
    /// The category.
    pub category: Category,
    /// Products referencing the category, ordered by id.
    pub products: Vec<Product>,
}

/// Values required to insert a category.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCategory {
    /// Unique name.
    pub name: CategoryName,
    /// Description; empty when not provided.
    pub description: String,
    /// Optional image URL supplied at creation.
    pub image: Option<String>,
}

/// Partial update; `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryChanges {
    /// New name.
    pub name: Option<CategoryName>,
    /// New description.
    pub description: Option<String>,
    /// New image URL.
    pub image: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Shoes", Ok("Shoes"))]
    #[case("  Hats  ", Ok("Hats"))]
    #[case("", Err(CategoryValidationError::EmptyName))]
    #[case("   ", Err(CategoryValidationError::EmptyName))]
    fn name_validation(
        #[case] raw: &str,
        #[case] expected: Result<&str, CategoryValidationError>,
    ) {
        let parsed = CategoryName::new(raw);
        assert_eq!(parsed.as_ref().map(CategoryName::as_str), expected.as_ref().map(|s| *s));
    }

    #[rstest]
    fn overlong_name_is_rejected() {
        let name = "c".repeat(CATEGORY_NAME_MAX + 1);
        assert_eq!(
            CategoryName::new(name),
            Err(CategoryValidationError::NameTooLong {
                max: CATEGORY_NAME_MAX
            })
        );
    }
}
