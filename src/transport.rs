use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION},
    multipart::{Form, Part},
    Client, Method, Response, StatusCode,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::{
    config::ClientConfig,
    error::{PixVaultError, Result},
    models::BinaryPayload,
};

fn normalize(root: &str) -> String {
    root.trim().trim_end_matches('/').to_string()
}

/// Authenticated HTTP access to the JSON API root and the CDN root.
#[derive(Clone)]
pub struct Transport {
    http: Client,
    api_url: String,
    image_url: String,
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport")
            .field("api_url", &self.api_url)
            .field("image_url", &self.image_url)
            .finish_non_exhaustive()
    }
}

impl Transport {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        config.validate()?;
        let api_key = config.api_key.as_deref().unwrap_or_default();

        let mut auth = HeaderValue::from_str(&format!("Bearer {}", api_key.trim()))
            .map_err(|e| PixVaultError::ConfigError(format!("Invalid API key: {}", e)))?;
        auth.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let mut builder = Client::builder().default_headers(headers);
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;

        Ok(Self {
            http,
            api_url: normalize(&config.api_url),
            image_url: normalize(&config.image_url),
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn image_url(&self) -> &str {
        &self.image_url
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_url, path.trim_start_matches('/'))
    }

    pub fn cdn_url(&self, content_path: &str) -> String {
        format!("{}/{}", self.image_url, content_path.trim_start_matches('/'))
    }

    /// JSON request against the API root. `query` is appended as URL
    /// parameters, `body` is sent as JSON when present.
    pub async fn json_call<B, T>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path);
        log::debug!("{} {}", method, url);

        let mut request = self.http.request(method, &url);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = check(request.send().await?).await?;
        let text = response.text().await?;
        // An empty 2xx body (e.g. 204) reads as JSON null.
        let text = if text.trim().is_empty() { "null" } else { text.as_str() };
        Ok(serde_json::from_str(text)?)
    }

    /// Multipart POST. Text fields whose value is `None` are not sent.
    pub async fn form_call<T>(
        &self,
        path: &str,
        fields: Vec<(&'static str, Option<String>)>,
        file: &BinaryPayload,
    ) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let url = self.endpoint(path);
        let mut form = Form::new();
        for (name, value) in fields {
            if let Some(value) = value {
                form = form.text(name, value);
            }
        }
        form = form.part("file", file_part(file).await?);

        log::debug!("POST {} (multipart, file={})", url, file.filename());
        let response = check(self.http.post(&url).multipart(form).send().await?).await?;
        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }

    /// GET that hands back the status and body whatever the status is.
    pub async fn raw_get(&self, path: &str) -> Result<(StatusCode, String)> {
        let url = self.endpoint(path);
        let response = self.http.get(&url).send().await?;
        let status = response.status();
        let body = response.text().await?;
        log::trace!("GET {} -> {}", url, status);
        Ok((status, body))
    }

    /// Raw bytes of an asset from the CDN root.
    pub async fn fetch_image(&self, content_path: &str) -> Result<Vec<u8>> {
        let url = self.cdn_url(content_path);
        let response = check(self.http.get(&url).send().await?).await?;
        Ok(response.bytes().await?.to_vec())
    }
}

async fn file_part(file: &BinaryPayload) -> Result<Part> {
    let data = match file {
        BinaryPayload::Bytes { data, .. } => data.clone(),
        BinaryPayload::File(path) => tokio::fs::read(path).await?,
    };
    Part::bytes(data)
        .file_name(file.filename())
        .mime_str(file.mime_type())
        .map_err(PixVaultError::from)
}

async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = error_message(&body);
    log::warn!("Request failed with status {}: {}", status.as_u16(), message);
    Err(PixVaultError::ApiError {
        status: status.as_u16(),
        message,
    })
}

/// `message` field of a JSON error body, or the raw body.
pub(crate) fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|json| {
            json.get("message")
                .and_then(|m| m.as_str())
                .map(String::from)
        })
        .unwrap_or_else(|| body.to_string())
}
