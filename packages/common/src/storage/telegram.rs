use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::TryStreamExt;
use reqwest::{Client, StatusCode, header, multipart};
use serde::Deserialize;
use tracing::{debug, warn};

use super::error::StorageError;
use super::traits::{BlobDownload, BlobStore};

/// Bot API method used to push uploads into the chat.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadMethod {
    /// `sendDocument`: bytes are stored verbatim.
    #[default]
    Document,
    /// `sendPhoto`: Telegram recompresses the image; the largest rendition is kept.
    Photo,
}

impl UploadMethod {
    fn endpoint(self) -> &'static str {
        match self {
            Self::Document => "sendDocument",
            Self::Photo => "sendPhoto",
        }
    }

    fn field(self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::Photo => "photo",
        }
    }
}

/// Telegram blob store settings.
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramConfig {
    /// Bot token issued by @BotFather.
    #[serde(default)]
    pub bot_token: String,
    /// Chat or channel the bot posts uploads into.
    #[serde(default)]
    pub chat_id: String,
    /// Bot API base URL. Default: "https://api.telegram.org".
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default)]
    pub method: UploadMethod,
    /// Per-request timeout in seconds. Default: 30.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_api_base() -> String {
    "https://api.telegram.org".into()
}
fn default_timeout_secs() -> u64 {
    30
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            chat_id: String::new(),
            api_base: default_api_base(),
            method: UploadMethod::default(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl TelegramConfig {
    pub fn is_configured(&self) -> bool {
        !self.bot_token.is_empty() && !self.chat_id.is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
}

impl<T> ApiResponse<T> {
    fn into_result(self) -> Result<T, StorageError> {
        if !self.ok {
            return Err(StorageError::Rejected(
                self.description
                    .unwrap_or_else(|| "no description given".into()),
            ));
        }
        self.result
            .ok_or_else(|| StorageError::InvalidResponse("ok response without result".into()))
    }
}

#[derive(Debug, Deserialize)]
struct FileRef {
    file_id: String,
}

#[derive(Debug, Deserialize)]
struct SentMessage {
    #[serde(default)]
    photo: Vec<FileRef>,
    document: Option<FileRef>,
}

impl SentMessage {
    /// Telegram lists photo renditions smallest first.
    fn into_handle(self) -> Result<String, StorageError> {
        if let Some(largest) = self.photo.into_iter().last() {
            return Ok(largest.file_id);
        }
        self.document
            .map(|d| d.file_id)
            .ok_or_else(|| StorageError::InvalidResponse("message carries no file".into()))
    }
}

#[derive(Debug, Deserialize)]
struct RemoteFile {
    file_path: Option<String>,
}

/// Blob store backed by a Telegram chat.
///
/// Uploads are posted to the configured chat; the returned `file_id` is the blob
/// handle. Reads go through `getFile` to obtain a short-lived download path.
pub struct TelegramBlobStore {
    config: TelegramConfig,
    client: Client,
}

impl TelegramBlobStore {
    pub fn new(config: TelegramConfig) -> Result<Self, StorageError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { config, client })
    }

    fn api_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{}",
            self.config.api_base.trim_end_matches('/'),
            self.config.bot_token,
            method
        )
    }

    fn file_url(&self, file_path: &str) -> String {
        format!(
            "{}/file/bot{}/{}",
            self.config.api_base.trim_end_matches('/'),
            self.config.bot_token,
            file_path
        )
    }

    fn require_token(&self) -> Result<(), StorageError> {
        if self.config.bot_token.is_empty() {
            return Err(StorageError::NotConfigured("telegram.bot_token"));
        }
        Ok(())
    }
}

#[async_trait]
impl BlobStore for TelegramBlobStore {
    async fn upload(&self, data: Bytes, filename: &str) -> Result<String, StorageError> {
        self.require_token()?;
        if self.config.chat_id.is_empty() {
            return Err(StorageError::NotConfigured("telegram.chat_id"));
        }

        let method = self.config.method;
        let size = data.len();
        let part = multipart::Part::stream_with_length(data, size as u64)
            .file_name(filename.to_string());
        let form = multipart::Form::new()
            .text("chat_id", self.config.chat_id.clone())
            .part(method.field(), part);

        debug!(method = method.endpoint(), size, filename, "Uploading blob to Telegram");

        let response: ApiResponse<SentMessage> = self
            .client
            .post(self.api_url(method.endpoint()))
            .multipart(form)
            .send()
            .await?
            .json()
            .await?;

        let handle = response.into_result()?.into_handle()?;
        debug!(handle = %handle, "Telegram upload accepted");
        Ok(handle)
    }

    async fn resolve_url(&self, handle: &str) -> Result<String, StorageError> {
        self.require_token()?;

        let response: ApiResponse<RemoteFile> = self
            .client
            .get(self.api_url("getFile"))
            .query(&[("file_id", handle)])
            .send()
            .await?
            .json()
            .await?;

        let file = response.into_result().map_err(|e| match e {
            // Telegram answers unknown ids with a 400 "invalid file_id".
            StorageError::Rejected(msg) if msg.contains("file_id") => {
                StorageError::NotFound(handle.to_string())
            }
            other => other,
        })?;

        let path = file
            .file_path
            .ok_or_else(|| StorageError::InvalidResponse("getFile returned no file_path".into()))?;
        Ok(self.file_url(&path))
    }

    async fn open(&self, handle: &str) -> Result<BlobDownload, StorageError> {
        let url = self.resolve_url(handle).await?;
        let response = self.client.get(&url).send().await?;

        match response.status() {
            status if status.is_success() => {}
            StatusCode::NOT_FOUND => return Err(StorageError::NotFound(handle.to_string())),
            status => {
                warn!(handle, %status, "Telegram file download failed");
                return Err(StorageError::Upstream(format!(
                    "file download returned {status}"
                )));
            }
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .filter(|ct| !is_generic_content_type(ct))
            .map(str::to_string)
            .or_else(|| guess_content_type(&url));
        let content_length = response.content_length();
        let body = response.bytes_stream().map_err(StorageError::from);

        Ok(BlobDownload {
            content_type,
            content_length,
            body: Box::pin(body),
        })
    }
}

/// The file endpoint often answers with a generic type.
fn is_generic_content_type(ct: &str) -> bool {
    ct.starts_with("application/octet-stream")
}

/// Guess from the extension Telegram keeps in `file_path`.
fn guess_content_type(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    mime_guess::from_path(path).first().map(|m| m.to_string())
}
