use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{PixVaultError, Result};
use crate::models::{BinaryPayload, ContentPath, ImageFormat};

#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub project: String,
    pub prompt: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub format: ImageFormat,
    pub smart_url_enabled: bool,
    /// Overrides the client's poll timeout for this request.
    pub timeout: Option<Duration>,
}

impl GenerationRequest {
    pub fn new(project: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            prompt: prompt.into(),
            width: None,
            height: None,
            format: ImageFormat::default(),
            smart_url_enabled: true,
            timeout: None,
        }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn with_format(mut self, format: ImageFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_smart_url(mut self, enabled: bool) -> Self {
        self.smart_url_enabled = enabled;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[derive(Debug, Clone)]
pub enum EditSource {
    /// An existing asset URL; the edit is nested under its path.
    Url(String),
    /// A local image that is uploaded first.
    Upload(BinaryPayload),
}

#[derive(Debug, Clone)]
pub struct EditRequest {
    pub source: EditSource,
    pub instruction: String,
    /// Required when `source` is [`EditSource::Upload`].
    pub project: Option<String>,
    pub format: Option<ImageFormat>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub timeout: Option<Duration>,
}

impl EditRequest {
    pub fn from_url(url: impl Into<String>, instruction: impl Into<String>) -> Self {
        Self::new(EditSource::Url(url.into()), instruction)
    }

    pub fn from_upload(file: BinaryPayload, instruction: impl Into<String>) -> Self {
        Self::new(EditSource::Upload(file), instruction)
    }

    fn new(source: EditSource, instruction: impl Into<String>) -> Self {
        Self {
            source,
            instruction: instruction.into(),
            project: None,
            format: None,
            width: None,
            height: None,
            timeout: None,
        }
    }

    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    pub fn with_format(mut self, format: ImageFormat) -> Self {
        self.format = Some(format);
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// A resolved image. `data` is owned by the caller.
#[derive(Debug, Clone)]
pub struct ImageResult {
    pub data: Vec<u8>,
    pub url: String,
    pub content_path: ContentPath,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendRequest<'a> {
    pub prompt: &'a str,
    pub project: &'a str,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub format: ImageFormat,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendResponse {
    pub slug: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest<'a> {
    pub prompt: &'a str,
    pub project: &'a str,
    pub slug: &'a str,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub format: ImageFormat,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub path: Option<String>,
    pub url: Option<String>,
    pub data: Option<String>,
}

/// Body of a `content/request-json/{path}` answer.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentStatus {
    pub data: Option<String>,
    pub url: Option<String>,
    pub status: Option<String>,
}

impl GenerateResponse {
    pub fn inline_data(&self) -> Option<&str> {
        non_empty(self.data.as_deref())
    }
}

impl ContentStatus {
    pub fn inline_data(&self) -> Option<&str> {
        non_empty(self.data.as_deref())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.trim().is_empty())
}

/// Decode a `data:<mime>;base64,<payload>` string. Everything up to the first
/// comma is discarded.
pub fn decode_data_uri(uri: &str) -> Result<Vec<u8>> {
    let (_, payload) = uri
        .split_once(',')
        .ok_or_else(|| PixVaultError::DecodeError("Inline data is not a data URI".into()))?;
    STANDARD
        .decode(payload.trim())
        .map_err(|e| PixVaultError::DecodeError(format!("Invalid base64 payload: {}", e)))
}
