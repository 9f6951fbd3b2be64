use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Image content handed to the upload endpoint.
#[derive(Debug, Clone)]
pub enum BinaryPayload {
    Bytes { data: Vec<u8>, filename: String },
    /// Read from disk when the multipart form is built.
    File(PathBuf),
}

impl BinaryPayload {
    pub fn bytes(data: impl Into<Vec<u8>>, filename: impl Into<String>) -> Self {
        BinaryPayload::Bytes {
            data: data.into(),
            filename: filename.into(),
        }
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        BinaryPayload::File(path.into())
    }

    pub fn filename(&self) -> String {
        match self {
            BinaryPayload::Bytes { filename, .. } => filename.clone(),
            BinaryPayload::File(path) => path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default(),
        }
    }

    pub(crate) fn mime_type(&self) -> &'static str {
        let filename = self.filename().to_lowercase();
        match filename.rsplit_once('.').map(|(_, ext)| ext) {
            Some("png") => "image/png",
            Some("jpg") | Some("jpeg") => "image/jpeg",
            Some("webp") => "image/webp",
            Some("gif") => "image/gif",
            Some("svg") => "image/svg+xml",
            _ => "application/octet-stream",
        }
    }
}

#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub file: BinaryPayload,
    pub project: String,
    pub slug: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
    pub collection_id: Option<String>,
}

impl UploadRequest {
    /// Fields left unset are filled in server-side.
    pub fn new(file: BinaryPayload, project: impl Into<String>) -> Self {
        Self {
            file,
            project: project.into(),
            slug: None,
            title: None,
            description: None,
            tags: None,
            collection_id: None,
        }
    }

    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_collection(mut self, collection_id: impl Into<String>) -> Self {
        self.collection_id = Some(collection_id.into());
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResult {
    pub id: String,
    /// Canonical content path; edits chain off this value.
    pub path: String,
    pub url: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}
