//! Application settings loaded via OrthoConfig.
//!
//! Values layer command-line flags over `STOREFRONT_*` environment variables
//! over an optional configuration file. Authentication secrets are read
//! separately by [`storefront::inbound::http::auth_config`].

use std::path::PathBuf;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use url::Url;

use storefront::domain::{AdminAccount, EmailAddress, Password, UserName};
use storefront::outbound::images::CloudinaryCredentials;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_FRONTEND_URL: &str = "http://localhost:5173";
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_ADMIN_NAME: &str = "Administrador";
const UPLOAD_SUBDIR: &str = "storefront-uploads";

/// Errors raised while interpreting loaded settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// `frontend_url` is not an absolute HTTP(S) URL.
    #[error("invalid frontend_url '{value}': {reason}")]
    InvalidFrontendUrl { value: String, reason: String },
    /// Only some of the administrator settings were provided, or one is invalid.
    #[error("invalid administrator settings: {reason}")]
    InvalidAdmin { reason: String },
}

/// Process-wide settings for the HTTP server.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "STOREFRONT")]
pub struct AppSettings {
    /// Interface to bind.
    pub host: Option<String>,
    /// Port to bind.
    pub port: Option<u16>,
    /// PostgreSQL URL; the in-memory store is used when absent.
    pub database_url: Option<String>,
    /// Upper bound on pooled database connections.
    pub db_max_connections: Option<u32>,
    /// Browser origin allowed to call the API with credentials.
    pub frontend_url: Option<String>,
    /// Directory receiving transient upload files.
    pub upload_dir: Option<PathBuf>,
    pub cloudinary_cloud_name: Option<String>,
    pub cloudinary_api_key: Option<String>,
    pub cloudinary_api_secret: Option<String>,
    /// Administrator provisioned at startup when email and password are set.
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
    pub admin_name: Option<String>,
}

impl AppSettings {
    /// Host and port for `HttpServer::bind`.
    pub fn bind_target(&self) -> (String, u16) {
        (
            self.host.clone().unwrap_or_else(|| DEFAULT_HOST.to_owned()),
            self.port.unwrap_or(DEFAULT_PORT),
        )
    }

    pub fn db_max_connections(&self) -> u32 {
        self.db_max_connections
            .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS)
    }

    /// Serialised origin of `frontend_url`, as CORS compares it.
    ///
    /// # Errors
    /// [`SettingsError::InvalidFrontendUrl`] unless the value is an absolute
    /// `http` or `https` URL.
    pub fn frontend_origin(&self) -> Result<String, SettingsError> {
        let raw = self.frontend_url.as_deref().unwrap_or(DEFAULT_FRONTEND_URL);
        let invalid = |reason: String| SettingsError::InvalidFrontendUrl {
            value: raw.to_owned(),
            reason,
        };
        let url = Url::parse(raw).map_err(|err| invalid(err.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
        }
        Ok(url.origin().ascii_serialization())
    }

    pub fn upload_dir(&self) -> PathBuf {
        self.upload_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join(UPLOAD_SUBDIR))
    }

    /// Cloudinary credentials when all three values are set.
    pub fn cloudinary(&self) -> Option<CloudinaryCredentials> {
        CloudinaryCredentials::from_parts(
            self.cloudinary_cloud_name.clone(),
            self.cloudinary_api_key.clone(),
            self.cloudinary_api_secret.clone(),
        )
    }

    /// Administrator account to provision, if configured.
    ///
    /// # Errors
    /// [`SettingsError::InvalidAdmin`] when only one of email and password is
    /// set, or when either fails validation.
    pub fn admin_account(&self) -> Result<Option<AdminAccount>, SettingsError> {
        let invalid = |reason: String| SettingsError::InvalidAdmin { reason };
        match (&self.admin_email, &self.admin_password) {
            (None, None) => Ok(None),
            (Some(email), Some(password)) => {
                let name = self.admin_name.as_deref().unwrap_or(DEFAULT_ADMIN_NAME);
                Ok(Some(AdminAccount {
                    name: UserName::new(name).map_err(|err| invalid(err.to_string()))?,
                    email: EmailAddress::new(email).map_err(|err| invalid(err.to_string()))?,
                    password: Password::new(password.clone())
                        .map_err(|err| invalid(err.to_string()))?,
                }))
            }
            _ => Err(invalid(
                "admin_email and admin_password must be set together".to_owned(),
            )),
        }
    }
}
