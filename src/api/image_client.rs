use chrono::Utc;
use reqwest::{Method, Url};
use std::time::Duration;

use crate::{
    api::{library_client::LibraryClient, poller::Poller},
    error::{PixVaultError, Result},
    logger,
    models::{
        decode_data_uri, BinaryPayload, ContentPath, EditRequest, EditSource, GenerateRequest,
        GenerateResponse, GenerationRequest, ImageFormat, ImageResult, RecommendRequest,
        RecommendResponse, UploadRequest,
    },
    slug::slugify,
    transport::Transport,
};

const GENERATING: &str = "Generating";
const EDITING: &str = "Editing";

/// Generation and edit workflows. Every entry point ends in a content path
/// that is polled until the image is ready.
#[derive(Clone)]
pub struct ImageClient {
    transport: Transport,
    library: LibraryClient,
    poll_timeout: Duration,
    poll_interval: Duration,
}

impl ImageClient {
    pub fn new(
        transport: Transport,
        library: LibraryClient,
        poll_timeout: Duration,
        poll_interval: Duration,
    ) -> Self {
        Self {
            transport,
            library,
            poll_timeout,
            poll_interval,
        }
    }

    pub async fn generate(&self, request: GenerationRequest) -> Result<ImageResult> {
        let _timer = logger::timer("generate");
        let timeout = request.timeout.unwrap_or(self.poll_timeout);

        if !request.smart_url_enabled {
            let content_path = ContentPath::derive(
                &request.project,
                &prompt_slug(&request.prompt),
                request.width,
                request.height,
                request.format,
            );
            log::info!("Generating {} without smart URL", content_path);
            return self.poll(&content_path, GENERATING, timeout).await;
        }

        let slug = self.recommend_slug(&request).await;
        let body = GenerateRequest {
            prompt: &request.prompt,
            project: &request.project,
            slug: &slug,
            width: request.width,
            height: request.height,
            format: request.format,
        };
        let response: GenerateResponse = self
            .transport
            .json_call(Method::POST, "content/generate", &[], Some(&body))
            .await?;

        let content_path = match response.path.as_deref().and_then(echoed_path) {
            Some(path) => ContentPath::from_server(path),
            None => ContentPath::derive(&request.project, &slug, None, None, request.format),
        };

        if let Some(uri) = response.inline_data() {
            log::info!("Generated {} inline", content_path);
            let data = decode_data_uri(uri)?;
            let url = response
                .url
                .clone()
                .unwrap_or_else(|| self.transport.cdn_url(content_path.as_str()));
            return Ok(ImageResult {
                data,
                url,
                content_path,
            });
        }

        self.poll(&content_path, GENERATING, timeout).await
    }

    /// Edit an existing asset URL or an uploaded image, depending on the
    /// request's source.
    pub async fn edit(&self, request: EditRequest) -> Result<ImageResult> {
        let _timer = logger::timer("edit");
        let EditRequest {
            source,
            instruction,
            project,
            format,
            width,
            height,
            timeout,
        } = request;
        let target = EditTarget {
            instruction,
            format: format.unwrap_or(ImageFormat::Png),
            width,
            height,
            timeout: timeout.unwrap_or(self.poll_timeout),
        };

        match source {
            EditSource::Url(url) => {
                let base_path = base_path_from_url(&url)?;
                self.edit_path(&base_path, &target).await
            }
            EditSource::Upload(file) => self.edit_upload(file, project, &target).await,
        }
    }

    async fn edit_upload(
        &self,
        file: BinaryPayload,
        project: Option<String>,
        target: &EditTarget,
    ) -> Result<ImageResult> {
        let project = project
            .filter(|p| !p.trim().is_empty())
            .ok_or(PixVaultError::MissingProject)?;

        let upload = UploadRequest::new(file, project).with_slug(upload_slug());
        let uploaded = self.library.upload(upload).await?;
        log::info!("Uploaded edit source to {}", uploaded.path);

        let base_path = echoed_path(&uploaded.path).ok_or_else(|| {
            PixVaultError::InvalidResponse(format!(
                "upload {} returned no content path",
                uploaded.id
            ))
        })?;
        self.edit_path(base_path, target).await
    }

    async fn edit_path(&self, base_path: &str, target: &EditTarget) -> Result<ImageResult> {
        let content_path = target.content_path(base_path);
        self.poll(&content_path, EDITING, target.timeout).await
    }

    async fn poll(
        &self,
        content_path: &ContentPath,
        label: &str,
        timeout: Duration,
    ) -> Result<ImageResult> {
        Poller::new(&self.transport, self.poll_interval)
            .wait_for(content_path, label, timeout)
            .await
    }

    /// Server-suggested slug, or the local slug of the prompt when the
    /// recommendation cannot be had.
    async fn recommend_slug(&self, request: &GenerationRequest) -> String {
        let body = RecommendRequest {
            prompt: &request.prompt,
            project: &request.project,
            width: request.width,
            height: request.height,
            format: request.format,
        };
        let recommended: Result<RecommendResponse> = self
            .transport
            .json_call(Method::POST, "url/recommend", &[], Some(&body))
            .await;

        match recommended {
            Ok(response) if !response.slug.trim().is_empty() => response.slug.trim().to_string(),
            Ok(_) => {
                log::warn!("Empty slug recommendation, using local slug");
                prompt_slug(&request.prompt)
            }
            Err(e) => {
                log::warn!("Slug recommendation failed, using local slug: {}", e);
                prompt_slug(&request.prompt)
            }
        }
    }
}

fn prompt_slug(prompt: &str) -> String {
    let slug = slugify(prompt);
    if slug.is_empty() {
        "image".to_string()
    } else {
        slug
    }
}

fn upload_slug() -> String {
    format!("upload-{}", Utc::now().timestamp_millis())
}

/// Path of an absolute asset URL, without the leading slash.
pub(crate) fn base_path_from_url(source: &str) -> Result<String> {
    let url = Url::parse(source.trim())
        .map_err(|e| PixVaultError::InvalidSource(format!("{}: {}", source, e)))?;
    if !url.has_host() {
        return Err(PixVaultError::InvalidSource(source.to_string()));
    }
    let base = url.path().trim_matches('/');
    if base.is_empty() {
        return Err(PixVaultError::InvalidSource(format!(
            "{}: URL has no asset path",
            source
        )));
    }
    Ok(base.to_string())
}

/// Server-echoed content path with surrounding slashes removed, or `None`
/// when nothing is left.
fn echoed_path(path: &str) -> Option<&str> {
    let path = path.trim().trim_matches('/');
    (!path.is_empty()).then_some(path)
}

/// Everything an edit needs once its source is resolved to a base path.
pub(crate) struct EditTarget {
    pub(crate) instruction: String,
    pub(crate) format: ImageFormat,
    pub(crate) width: Option<u32>,
    pub(crate) height: Option<u32>,
    pub(crate) timeout: Duration,
}

impl EditTarget {
    /// The edit lives under the source asset: `{base}/{slug}[_{w}x{h}].{ext}`.
    pub(crate) fn content_path(&self, base_path: &str) -> ContentPath {
        ContentPath::derive(
            base_path,
            &prompt_slug(&self.instruction),
            self.width,
            self.height,
            self.format,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{mock_config, setup_client, PNG_BYTES, PNG_DATA_URI, TEST_API_KEY};
    use crate::PixVaultClient;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn bearer() -> String {
        format!("Bearer {}", TEST_API_KEY)
    }

    /// Generate with a stubbed recommendation, asserting the local slug of
    /// "A red fox in the snow" reaches `content/generate`.
    async fn assert_local_slug_used(
        server: &MockServer,
        client: &PixVaultClient,
        recommend: ResponseTemplate,
    ) {
        Mock::given(method("POST"))
            .and(path("/url/recommend"))
            .respond_with(recommend)
            .expect(1)
            .mount(server)
            .await;
        Mock::given(method("POST"))
            .and(path("/content/generate"))
            .and(body_partial_json(json!({"slug": "a-red-fox-in-the-snow"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": PNG_DATA_URI})))
            .expect(1)
            .mount(server)
            .await;

        let result = client
            .images()
            .generate(GenerationRequest::new("zoo", "A red fox in the snow"))
            .await
            .unwrap();
        assert_eq!(result.content_path.as_str(), "zoo/a-red-fox-in-the-snow.png");
    }

    #[test]
    fn test_base_path_from_url() {
        assert_eq!(
            base_path_from_url("https://cdn.example/proj/img_800x600.png").unwrap(),
            "proj/img_800x600.png"
        );
        assert_eq!(
            base_path_from_url("https://cdn.example/proj/a.png?v=2").unwrap(),
            "proj/a.png"
        );
        assert!(matches!(
            base_path_from_url("proj/img.png"),
            Err(PixVaultError::InvalidSource(_))
        ));
        assert!(matches!(
            base_path_from_url("https://cdn.example/"),
            Err(PixVaultError::InvalidSource(_))
        ));
        assert!(matches!(
            base_path_from_url("mailto:someone@example.com"),
            Err(PixVaultError::InvalidSource(_))
        ));
    }

    #[test]
    fn test_edit_content_path() {
        let mut target = EditTarget {
            instruction: "make it sunset".to_string(),
            format: ImageFormat::Png,
            width: None,
            height: None,
            timeout: Duration::from_secs(1),
        };
        let path = target.content_path("proj/img_800x600.png");
        assert_eq!(path.as_str(), "proj/img_800x600.png/make-it-sunset.png");

        target.width = Some(1024);
        target.height = Some(768);
        target.format = ImageFormat::Jpg;
        let path = target.content_path("proj/img_800x600.png");
        assert_eq!(path.as_str(), "proj/img_800x600.png/make-it-sunset_1024x768.jpg");
    }

    #[test]
    fn test_echoed_path() {
        assert_eq!(echoed_path("/zoo/fox.png"), Some("zoo/fox.png"));
        assert_eq!(echoed_path(" zoo/fox.png/ "), Some("zoo/fox.png"));
        assert_eq!(echoed_path("/"), None);
        assert_eq!(echoed_path("  "), None);
        assert_eq!(echoed_path(""), None);
    }

    #[tokio::test]
    async fn test_edit_by_url_polls_chained_path() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/content/request-json/proj/img_800x600.png/make-it-sunset.png"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": PNG_DATA_URI})))
            .expect(1)
            .mount(&server)
            .await;

        let client = setup_client(&server);
        let result = client
            .images()
            .edit(EditRequest::from_url(
                "https://cdn.example/proj/img_800x600.png",
                "make it sunset",
            ))
            .await
            .unwrap();

        assert_eq!(result.data, PNG_BYTES);
        assert_eq!(
            result.content_path.as_str(),
            "proj/img_800x600.png/make-it-sunset.png"
        );
    }

    #[tokio::test]
    async fn test_edit_by_url_rejects_bad_source() {
        let server = MockServer::start().await;
        let client = setup_client(&server);
        let err = client
            .images()
            .edit(EditRequest::from_url("not a url", "make it sunset"))
            .await
            .unwrap_err();
        assert!(matches!(err, PixVaultError::InvalidSource(_)));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_edit_upload_requires_project() {
        let server = MockServer::start().await;
        let client = setup_client(&server);
        let request = EditRequest::from_upload(
            BinaryPayload::bytes(PNG_BYTES.to_vec(), "cat.png"),
            "add a hat",
        );

        let err = client.images().edit(request).await.unwrap_err();
        assert!(matches!(err, PixVaultError::MissingProject));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_edit_upload_chains_off_uploaded_path() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/content/upload"))
            .and(header("authorization", bearer().as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "c_42",
                "path": "pets/upload-1700000000000.png"
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(
                "/content/request-json/pets/upload-1700000000000.png/add-a-hat.png",
            ))
            .and(header("authorization", bearer().as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": PNG_DATA_URI})))
            .expect(1)
            .mount(&server)
            .await;

        let client = setup_client(&server);
        let request = EditRequest::from_upload(
            BinaryPayload::bytes(PNG_BYTES.to_vec(), "cat.png"),
            "Add a hat",
        )
        .with_project("pets");

        let result = client.images().edit(request).await.unwrap();
        assert_eq!(result.data, PNG_BYTES);

        let requests = server.received_requests().await.unwrap();
        let upload_body = String::from_utf8_lossy(&requests[0].body).to_string();
        assert!(upload_body.contains("name=\"project\""));
        assert!(upload_body.contains("upload-"));
    }

    #[tokio::test]
    async fn test_generate_inline_response_skips_polling() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/url/recommend"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"slug": "red-fox"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/content/generate"))
            .and(body_partial_json(json!({"slug": "red-fox", "project": "zoo"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "path": "zoo/red-fox.png",
                "data": PNG_DATA_URI
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(path_regex("^/content/request-json/.*"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let client = setup_client(&server);
        let result = client
            .images()
            .generate(GenerationRequest::new("zoo", "A red fox in the snow"))
            .await
            .unwrap();

        assert_eq!(result.data, PNG_BYTES);
        assert_eq!(result.content_path.as_str(), "zoo/red-fox.png");
        assert_eq!(result.url, format!("{}/cdn/zoo/red-fox.png", server.uri()));
    }

    #[tokio::test]
    async fn test_generate_recommend_failure_falls_back() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/url/recommend"))
            .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/content/generate"))
            .and(body_partial_json(json!({"slug": "a-red-fox-in-the-snow"})))
            .respond_with(ResponseTemplate::new(202).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/content/request-json/zoo/a-red-fox-in-the-snow.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": PNG_DATA_URI})))
            .expect(1)
            .mount(&server)
            .await;

        let client = setup_client(&server);
        let result = client
            .images()
            .generate(
                GenerationRequest::new("zoo", "A red fox in the snow")
                    .with_format(ImageFormat::Jpg),
            )
            .await
            .unwrap();
        assert_eq!(result.content_path.as_str(), "zoo/a-red-fox-in-the-snow.jpg");
    }

    #[tokio::test]
    async fn test_edit_upload_rejects_blank_uploaded_path() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/content/upload"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "c_43",
                "path": " / "
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(path_regex("^/content/request-json/.*"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": PNG_DATA_URI})))
            .expect(0)
            .mount(&server)
            .await;

        let client = setup_client(&server);
        let request = EditRequest::from_upload(
            BinaryPayload::bytes(PNG_BYTES.to_vec(), "cat.png"),
            "add a hat",
        )
        .with_project("pets");

        let err = client.images().edit(request).await.unwrap_err();
        assert!(matches!(err, PixVaultError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_generate_root_echoed_path_falls_back_to_derived() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/url/recommend"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"slug": "red-fox"})))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/content/generate"))
            .respond_with(ResponseTemplate::new(202).set_body_json(json!({"path": "/"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/content/request-json/zoo/red-fox.png"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": PNG_DATA_URI})))
            .expect(1)
            .mount(&server)
            .await;

        let client = setup_client(&server);
        let result = client
            .images()
            .generate(GenerationRequest::new("zoo", "fox"))
            .await
            .unwrap();
        assert_eq!(result.content_path.as_str(), "zoo/red-fox.png");
    }

    #[tokio::test]
    async fn test_generate_malformed_recommendation_falls_back() {
        let server = MockServer::start().await;
        let client = setup_client(&server);
        assert_local_slug_used(
            &server,
            &client,
            ResponseTemplate::new(200).set_body_json(json!({"nope": 1})),
        )
        .await;
    }

    #[tokio::test]
    async fn test_generate_empty_recommendation_falls_back() {
        let server = MockServer::start().await;
        let client = setup_client(&server);
        assert_local_slug_used(
            &server,
            &client,
            ResponseTemplate::new(200).set_body_json(json!({"slug": "  "})),
        )
        .await;
    }

    #[tokio::test]
    async fn test_generate_recommendation_timeout_falls_back() {
        let server = MockServer::start().await;
        let client = PixVaultClient::new(
            mock_config(&server).with_request_timeout(Duration::from_millis(100)),
        )
        .unwrap();
        assert_local_slug_used(
            &server,
            &client,
            ResponseTemplate::new(200)
                .set_body_json(json!({"slug": "too-late"}))
                .set_delay(Duration::from_millis(500)),
        )
        .await;
    }

    #[tokio::test]
    async fn test_generate_submit_error_propagates() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/url/recommend"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"slug": "fox"})))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/content/generate"))
            .respond_with(
                ResponseTemplate::new(402).set_body_json(json!({"message": "out of credits"})),
            )
            .mount(&server)
            .await;

        let client = setup_client(&server);
        let err = client
            .images()
            .generate(GenerationRequest::new("zoo", "fox"))
            .await
            .unwrap_err();
        match err {
            PixVaultError::ApiError { status, message } => {
                assert_eq!(status, 402);
                assert_eq!(message, "out of credits");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_generate_without_smart_url_polls_directly() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/content/request-json/zoo/red-fox_640x480.png"))
            .respond_with(ResponseTemplate::new(202))
            .up_to_n_times(1)
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/content/request-json/zoo/red-fox_640x480.png"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": PNG_DATA_URI})))
            .expect(1)
            .mount(&server)
            .await;

        let client = setup_client(&server);
        let result = client
            .images()
            .generate(
                GenerationRequest::new("zoo", "Red fox")
                    .with_size(640, 480)
                    .with_smart_url(false),
            )
            .await
            .unwrap();

        assert_eq!(result.content_path.as_str(), "zoo/red-fox_640x480.png");
        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 2);
        assert!(requests.iter().all(|r| r.method.as_str() == "GET"));
    }
}
