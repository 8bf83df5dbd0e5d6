//! Image hosting for channels that link to a frame instead of attaching it.

#![cfg(feature = "whatsapp")]

use crate::error::ChannelError;
use crate::Result;
use flareguard_core::config::ImgurConfig;
use flareguard_core::SecretString;
use reqwest::blocking::{multipart, Client};
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use std::fmt::Debug;
use std::path::Path;
use std::time::Duration;
use tracing::{error, info};

/// Longest response body excerpt kept in an error message.
const BODY_EXCERPT_LEN: usize = 200;

/// Uploads a local image and returns its public URL.
pub trait ImageHost: Send + Sync + Debug {
    /// Upload the file at `path`.
    ///
    /// Every failure (missing file, transport, non-2xx status, malformed
    /// body) is logged and returned as [`ChannelError::Upload`].
    fn upload(&self, path: &Path) -> Result<String>;
}

/// Anonymous Imgur uploads authorized with a client id.
pub struct ImgurUploader {
    client_id: Option<SecretString>,
    upload_url: String,
    timeout: Duration,
}

impl Debug for ImgurUploader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImgurUploader")
            .field("upload_url", &self.upload_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct ImgurResponse {
    data: ImgurImage,
}

#[derive(Debug, Deserialize)]
struct ImgurImage {
    #[serde(default)]
    link: Option<String>,
}

impl ImgurUploader {
    /// Create an uploader against the public Imgur API.
    pub fn new(client_id: impl Into<SecretString>) -> Self {
        Self::from_config(&ImgurConfig {
            client_id: Some(client_id.into()),
            ..ImgurConfig::default()
        })
    }

    /// Create from configuration. A missing client id is tolerated here and
    /// reported on each upload.
    pub fn from_config(config: &ImgurConfig) -> Self {
        Self {
            client_id: config.client_id.clone(),
            upload_url: config.upload_url.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Override the upload endpoint.
    pub fn with_upload_url(mut self, url: impl Into<String>) -> Self {
        self.upload_url = url.into();
        self
    }

    /// Override the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn try_upload(&self, path: &Path) -> Result<String> {
        let client_id = self
            .client_id
            .as_ref()
            .filter(|id| !id.is_blank())
            .ok_or_else(|| ChannelError::Config("Imgur client id is missing".to_string()))?;

        let form = multipart::Form::new().file("image", path)?;
        let client = Client::builder().timeout(self.timeout).build()?;

        let response = client
            .post(&self.upload_url)
            .header(AUTHORIZATION, format!("Client-ID {}", client_id.expose_secret()))
            .multipart(form)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ChannelError::channel(
                "imgur",
                format!("HTTP {}: {}", status, excerpt(&body)),
            ));
        }

        let body: ImgurResponse = response.json()?;
        body.data
            .link
            .filter(|link| !link.is_empty())
            .ok_or_else(|| ChannelError::channel("imgur", "response has no image link"))
    }
}

impl ImageHost for ImgurUploader {
    fn upload(&self, path: &Path) -> Result<String> {
        match self.try_upload(path) {
            Ok(link) => {
                info!(path = %path.display(), %link, "Uploaded frame to Imgur");
                Ok(link)
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "Image upload failed");
                Err(ChannelError::Upload(e.to_string()))
            }
        }
    }
}

fn excerpt(body: &str) -> &str {
    match body.char_indices().nth(BODY_EXCERPT_LEN) {
        Some((index, _)) => &body[..index],
        None => body,
    }
}
