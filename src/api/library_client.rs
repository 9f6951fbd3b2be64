use reqwest::Method;

use crate::{
    error::Result,
    models::{
        ContentRecord, DeleteResult, ListQuery, ListResponse, RenameBody, SearchQuery,
        SearchResponse, TagCount, TagsBody, UploadRequest, UploadResult,
    },
    slug::slugify_filename,
    transport::Transport,
};

/// Upload, tagging, search and housekeeping for stored content.
#[derive(Clone)]
pub struct LibraryClient {
    transport: Transport,
}

impl LibraryClient {
    pub fn new(transport: Transport) -> Self {
        Self { transport }
    }

    /// Upload an image. Title, description and tags that are not given are
    /// left out of the form so the server fills them in itself.
    pub async fn upload(&self, request: UploadRequest) -> Result<UploadResult> {
        let slug = request
            .slug
            .clone()
            .unwrap_or_else(|| slugify_filename(&request.file.filename()));

        let fields = vec![
            ("project", Some(request.project.clone())),
            ("slug", Some(slug)),
            ("title", request.title.clone()),
            ("description", request.description.clone()),
            ("tags", request.tags.as_ref().map(|tags| tags.join(","))),
            ("collectionId", request.collection_id.clone()),
        ];

        log::info!("Uploading {} to project {}", request.file.filename(), request.project);
        self.transport
            .form_call("content/upload", fields, &request.file)
            .await
    }

    pub async fn list_tags(&self, project: &str) -> Result<Vec<TagCount>> {
        self.transport
            .json_call::<(), _>(Method::GET, "tags", &[("project", project.to_string())], None)
            .await
    }

    pub async fn add_tags(&self, content_id: &str, tags: &[String]) -> Result<ContentRecord> {
        self.transport
            .json_call(
                Method::POST,
                &format!("content/{}/tags", content_id),
                &[],
                Some(&TagsBody { tags }),
            )
            .await
    }

    pub async fn remove_tags(&self, content_id: &str, tags: &[String]) -> Result<ContentRecord> {
        self.transport
            .json_call(
                Method::DELETE,
                &format!("content/{}/tags", content_id),
                &[],
                Some(&TagsBody { tags }),
            )
            .await
    }

    pub async fn search(&self, query: SearchQuery) -> Result<SearchResponse> {
        self.transport
            .json_call(Method::POST, "content/search", &[], Some(&query))
            .await
    }

    pub async fn list(&self, query: ListQuery) -> Result<ListResponse> {
        self.transport
            .json_call::<(), _>(Method::GET, "content", &query.to_params(), None)
            .await
    }

    pub async fn delete(&self, content_id: &str) -> Result<DeleteResult> {
        log::info!("Deleting content {}", content_id);
        let body: Option<DeleteResult> = self
            .transport
            .json_call::<(), _>(Method::DELETE, &format!("content/{}", content_id), &[], None)
            .await?;
        Ok(DeleteResult::from_body(body))
    }

    pub async fn rename(&self, content_id: &str, new_slug: &str) -> Result<ContentRecord> {
        self.transport
            .json_call(
                Method::POST,
                &format!("content/{}/rename", content_id),
                &[],
                Some(&RenameBody { slug: new_slug }),
            )
            .await
    }
}
