//! Typed key/value site configuration.
//!
//! Values are stored as text and interpreted by their declared
//! [`ConfigType`]; [`SiteConfigUpsert::new`] rejects values that the type
//! cannot interpret so readers never see a malformed colour or URL.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use url::Url;
use utoipa::ToSchema;

/// Maximum length of a configuration key.
pub const CONFIG_KEY_MAX: usize = 100;

/// Validation errors raised while building configuration entries.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SiteConfigValidationError {
    /// Key empty, too long or containing characters outside `[A-Za-z0-9_.-]`.
    #[error("Clave de configuración inválida")]
    InvalidKey { key: String },
    /// Type outside the supported set.
    #[error("Tipo de configuración inválido. Debe ser uno de: text, image, color, boolean, number, url, date")]
    InvalidType { value: String },
    /// Value that the declared type cannot interpret.
    #[error("Valor inválido para el tipo '{config_type}'")]
    InvalidValue { config_type: ConfigType },
}

/// Unique configuration key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConfigKey(String);

impl ConfigKey {
    /// Validate a key.
    ///
    /// # Errors
    /// Returns [`SiteConfigValidationError::InvalidKey`] unless the key is
    /// 1 to [`CONFIG_KEY_MAX`] characters of ASCII letters, digits, `_`, `.`
    /// or `-`.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, SiteConfigValidationError> {
        let key = raw.as_ref().trim();
        let valid = !key.is_empty()
            && key.len() <= CONFIG_KEY_MAX
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'));
        if !valid {
            return Err(SiteConfigValidationError::InvalidKey {
                key: raw.as_ref().to_owned(),
            });
        }
        Ok(Self(key.to_owned()))
    }

    /// Borrow the key.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How a configuration value is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ConfigType {
    /// Free text.
    Text,
    /// Absolute http(s) URL of an image.
    Image,
    /// `#rgb` or `#rrggbb` colour.
    Color,
    /// `true` or `false`.
    Boolean,
    /// Finite decimal number.
    Number,
    /// Absolute http(s) URL.
    Url,
    /// RFC 3339 timestamp or `YYYY-MM-DD` date.
    Date,
}

impl ConfigType {
    const ALL: [Self; 7] = [
        Self::Text,
        Self::Image,
        Self::Color,
        Self::Boolean,
        Self::Number,
        Self::Url,
        Self::Date,
    ];

    /// Lowercase literal stored and returned over the API.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Color => "color",
            Self::Boolean => "boolean",
            Self::Number => "number",
            Self::Url => "url",
            Self::Date => "date",
        }
    }

    /// Parse a type literal, ignoring case.
    ///
    /// # Errors
    /// Returns [`SiteConfigValidationError::InvalidType`] for unknown types.
    pub fn parse(raw: &str) -> Result<Self, SiteConfigValidationError> {
        let normalised = raw.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|ty| ty.as_str() == normalised)
            .ok_or_else(|| SiteConfigValidationError::InvalidType {
                value: raw.to_owned(),
            })
    }

    /// Whether `value` is a valid rendition of this type.
    pub fn accepts(self, value: &str) -> bool {
        match self {
            Self::Text => true,
            Self::Boolean => matches!(value, "true" | "false"),
            Self::Number => value
                .trim()
                .parse::<f64>()
                .is_ok_and(f64::is_finite),
            Self::Color => is_hex_colour(value),
            Self::Url | Self::Image => is_http_url(value),
            Self::Date => {
                DateTime::parse_from_rfc3339(value).is_ok()
                    || NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
            }
        }
    }
}

impl fmt::Display for ConfigType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn is_hex_colour(value: &str) -> bool {
    value.strip_prefix('#').is_some_and(|digits| {
        matches!(digits.len(), 3 | 6) && digits.chars().all(|c| c.is_ascii_hexdigit())
    })
}

fn is_http_url(value: &str) -> bool {
    Url::parse(value).is_ok_and(|url| matches!(url.scheme(), "http" | "https") && url.has_host())
}

/// Persisted configuration entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteConfig {
    /// Unique key.
    pub key: ConfigKey,
    /// Interpretation of `value`.
    pub config_type: ConfigType,
    /// Value as text.
    pub value: String,
    /// Human-readable label for admin screens.
    pub label: Option<String>,
    /// Longer explanation for admin screens.
    pub description: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Validated create-or-replace payload for a configuration entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteConfigUpsert {
    key: ConfigKey,
    config_type: ConfigType,
    value: String,
    label: Option<String>,
    description: Option<String>,
}

impl SiteConfigUpsert {
    /// Validate `value` against `config_type`.
    ///
    /// # Errors
    /// Returns [`SiteConfigValidationError::InvalidValue`] when the value
    /// does not parse as the declared type.
    pub fn new(
        key: ConfigKey,
        config_type: ConfigType,
        value: String,
        label: Option<String>,
        description: Option<String>,
    ) -> Result<Self, SiteConfigValidationError> {
        if !config_type.accepts(&value) {
            return Err(SiteConfigValidationError::InvalidValue { config_type });
        }
        Ok(Self {
            key,
            config_type,
            value,
            label,
            description,
        })
    }

    /// Target key.
    pub fn key(&self) -> &ConfigKey {
        &self.key
    }

    /// Declared type.
    pub fn config_type(&self) -> ConfigType {
        self.config_type
    }

    /// Value as text.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Optional label.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Optional description.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}
