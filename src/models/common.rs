use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    #[default]
    Png,
    Jpg,
}

impl ImageFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpg => "jpg",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpg => "image/jpeg",
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Location of an asset on the CDN, `{prefix}/{slug}[_{w}x{h}].{ext}`.
///
/// The same value addresses the polling endpoint, so it is built once per
/// request and passed around unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentPath(String);

impl ContentPath {
    /// `prefix` is a project name for fresh assets, or an existing asset's
    /// path when deriving an edit from it. The dimension suffix is only added
    /// when both sides are known.
    pub fn derive(
        prefix: &str,
        slug: &str,
        width: Option<u32>,
        height: Option<u32>,
        format: ImageFormat,
    ) -> Self {
        let prefix = prefix.trim_matches('/');
        let dims = match (width, height) {
            (Some(w), Some(h)) => format!("_{}x{}", w, h),
            _ => String::new(),
        };
        ContentPath(format!("{}/{}{}.{}", prefix, slug, dims, format.extension()))
    }

    /// Wrap a path echoed back by the server.
    pub fn from_server(path: impl Into<String>) -> Self {
        let path: String = path.into();
        ContentPath(path.trim_start_matches('/').to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ContentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ContentPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResult {
    #[serde(default)]
    pub success: bool,
    pub message: Option<String>,
}

impl DeleteResult {
    /// Result for a delete acknowledged with an empty body.
    pub(crate) fn from_body(body: Option<DeleteResult>) -> Self {
        body.unwrap_or(DeleteResult {
            success: true,
            message: None,
        })
    }
}
