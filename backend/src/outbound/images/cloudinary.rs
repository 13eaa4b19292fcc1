//! Reqwest-backed Cloudinary upload adapter.
//!
//! Uploads use Cloudinary's signed REST API: the request carries the API key,
//! a UNIX timestamp, the target folder and a SHA-256 signature over the
//! sorted signed parameters followed by the API secret.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::domain::ports::{HostedImage, ImageFolder, ImageStore, ImageStoreError};

const API_BASE: &str = "https://api.cloudinary.com/v1_1/";

/// Account credentials for signed uploads.
pub struct CloudinaryCredentials {
    /// Cloud (account) name used in the upload URL.
    pub cloud_name: String,
    /// Public API key.
    pub api_key: String,
    /// API secret; only used to sign requests.
    pub api_secret: Zeroizing<String>,
}

impl CloudinaryCredentials {
    /// Credentials when all three values are present and non-blank.
    pub fn from_parts(
        cloud_name: Option<String>,
        api_key: Option<String>,
        api_secret: Option<String>,
    ) -> Option<Self> {
        let present = |value: Option<String>| value.filter(|raw| !raw.trim().is_empty());
        Some(Self {
            cloud_name: present(cloud_name)?,
            api_key: present(api_key)?,
            api_secret: Zeroizing::new(present(api_secret)?),
        })
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponseDto {
    secure_url: String,
    public_id: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponseDto {
    error: ErrorBodyDto,
}

#[derive(Debug, Deserialize)]
struct ErrorBodyDto {
    message: String,
}

/// Image store that forwards files to Cloudinary.
pub struct CloudinaryImageStore {
    client: Client,
    endpoint: Url,
    api_key: String,
    api_secret: Zeroizing<String>,
}

impl CloudinaryImageStore {
    /// Build an adapter for the credentials' cloud with a request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the cloud name does not form a valid URL or the
    /// reqwest client cannot be constructed.
    pub fn new(
        credentials: CloudinaryCredentials,
        timeout: Duration,
    ) -> Result<Self, ImageStoreError> {
        let endpoint = Url::parse(API_BASE)
            .and_then(|base| base.join(&format!("{}/image/upload", credentials.cloud_name)))
            .map_err(|err| ImageStoreError::transport(format!("invalid upload URL: {err}")))?;
        Self::with_endpoint(credentials, endpoint, timeout)
    }

    /// Build an adapter posting to an explicit endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn with_endpoint(
        credentials: CloudinaryCredentials,
        endpoint: Url,
        timeout: Duration,
    ) -> Result<Self, ImageStoreError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| ImageStoreError::transport(err.to_string()))?;
        Ok(Self {
            client,
            endpoint,
            api_key: credentials.api_key,
            api_secret: credentials.api_secret,
        })
    }
}

/// Hex SHA-256 over `folder=…&timestamp=…` followed by the secret.
fn sign(folder: &str, timestamp: i64, api_secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("folder={folder}&timestamp={timestamp}"));
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

fn map_transport_error(error: reqwest::Error) -> ImageStoreError {
    ImageStoreError::transport(error.to_string())
}

fn map_status_error(status: StatusCode, body: &[u8]) -> ImageStoreError {
    let message = serde_json::from_slice::<ErrorResponseDto>(body)
        .map(|dto| dto.error.message)
        .unwrap_or_else(|_| String::from_utf8_lossy(body).into_owned());
    ImageStoreError::rejected(status.as_u16(), message)
}

fn parse_upload(body: &[u8]) -> Result<HostedImage, ImageStoreError> {
    let dto: UploadResponseDto = serde_json::from_slice(body).map_err(|err| {
        ImageStoreError::transport(format!("invalid upload response: {err}"))
    })?;
    Ok(HostedImage {
        url: dto.secure_url,
        public_id: dto.public_id,
    })
}

#[async_trait]
impl ImageStore for CloudinaryImageStore {
    async fn upload(
        &self,
        path: &Path,
        folder: ImageFolder,
    ) -> Result<HostedImage, ImageStoreError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|err| ImageStoreError::transport(format!("reading upload: {err}")))?;
        let file_name = path
            .file_name()
            .map_or_else(|| "upload".to_owned(), |name| name.to_string_lossy().into_owned());

        let timestamp = Utc::now().timestamp();
        let signature = sign(folder.as_str(), timestamp, &self.api_secret);
        let form = Form::new()
            .part("file", Part::bytes(bytes).file_name(file_name))
            .text("api_key", self.api_key.clone())
            .text("timestamp", timestamp.to_string())
            .text("folder", folder.as_str())
            .text("signature", signature);

        let response = self
            .client
            .post(self.endpoint.clone())
            .multipart(form)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }
        parse_upload(body.as_ref())
    }
}
