pub mod image_client;
pub mod library_client;
pub mod poller;
pub mod project_client;

use crate::{
    config::ClientConfig,
    error::Result,
    models::{
        ContentPath, EditRequest, GenerationRequest, ImageFormat, ImageResult, UploadRequest,
        UploadResult,
    },
    transport::Transport,
};

pub use image_client::ImageClient;
pub use library_client::LibraryClient;
pub use poller::{attempt_budget, Poller};
pub use project_client::ProjectClient;

/// Entry point for the PixVault API. Cloning is cheap and clones share the
/// underlying connection pool.
#[derive(Clone)]
pub struct PixVaultClient {
    transport: Transport,
    image_client: ImageClient,
    library_client: LibraryClient,
    project_client: ProjectClient,
}

impl PixVaultClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let transport = Transport::new(&config)?;
        let library_client = LibraryClient::new(transport.clone());

        Ok(Self {
            image_client: ImageClient::new(
                transport.clone(),
                library_client.clone(),
                config.poll_timeout,
                config.poll_interval,
            ),
            project_client: ProjectClient::new(transport.clone()),
            library_client,
            transport,
        })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env())
    }

    pub fn images(&self) -> &ImageClient {
        &self.image_client
    }

    pub fn library(&self) -> &LibraryClient {
        &self.library_client
    }

    pub fn projects(&self) -> &ProjectClient {
        &self.project_client
    }

    pub async fn generate(&self, request: GenerationRequest) -> Result<ImageResult> {
        self.image_client.generate(request).await
    }

    pub async fn edit(&self, request: EditRequest) -> Result<ImageResult> {
        self.image_client.edit(request).await
    }

    pub async fn upload(&self, request: UploadRequest) -> Result<UploadResult> {
        self.library_client.upload(request).await
    }

    /// CDN URL of a content path.
    pub fn image_url(&self, content_path: &str) -> String {
        self.transport.cdn_url(content_path)
    }

    /// CDN URL for `{project}/{slug}[_{w}x{h}].{ext}`.
    pub fn build_image_url(
        &self,
        project: &str,
        slug: &str,
        width: Option<u32>,
        height: Option<u32>,
        format: ImageFormat,
    ) -> String {
        let path = ContentPath::derive(project, slug, width, height, format);
        self.transport.cdn_url(path.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{setup_client, PNG_DATA_URI};
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_url_builder() {
        let client = PixVaultClient::new(
            ClientConfig::new()
                .with_api_key("k")
                .with_image_url("https://img.example/"),
        )
        .unwrap();

        assert_eq!(
            client.image_url("zoo/fox.png"),
            "https://img.example/zoo/fox.png"
        );
        assert_eq!(
            client.build_image_url("zoo", "fox", Some(100), Some(50), ImageFormat::Jpg),
            "https://img.example/zoo/fox_100x50.jpg"
        );
        assert_eq!(
            client.build_image_url("zoo", "fox", None, Some(50), ImageFormat::Png),
            "https://img.example/zoo/fox.png"
        );
    }

    #[test]
    fn test_client_requires_key() {
        assert!(PixVaultClient::new(ClientConfig::new()).is_err());
    }

    #[tokio::test]
    async fn test_concurrent_edits_poll_independently() {
        let server = MockServer::start().await;
        for slug in ["warmer", "cooler"] {
            Mock::given(method("GET"))
                .and(path(format!("/content/request-json/zoo/fox.png/{}.png", slug)))
                .respond_with(
                    ResponseTemplate::new(200).set_body_json(json!({"data": PNG_DATA_URI})),
                )
                .expect(1)
                .mount(&server)
                .await;
        }

        let client = setup_client(&server);
        let (a, b) = tokio::join!(
            client.edit(EditRequest::from_url("https://cdn.example/zoo/fox.png", "warmer")),
            client.edit(EditRequest::from_url("https://cdn.example/zoo/fox.png", "cooler")),
        );
        assert_eq!(a.unwrap().content_path.as_str(), "zoo/fox.png/warmer.png");
        assert_eq!(b.unwrap().content_path.as_str(), "zoo/fox.png/cooler.png");
    }
}
