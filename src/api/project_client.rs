use reqwest::Method;

use crate::{
    error::Result,
    models::{CreateProjectBody, DeleteResult, Project, UpdateProjectBody},
    transport::Transport,
};

#[derive(Clone)]
pub struct ProjectClient {
    transport: Transport,
}

impl ProjectClient {
    pub fn new(transport: Transport) -> Self {
        Self { transport }
    }

    pub async fn list(&self) -> Result<Vec<Project>> {
        self.transport
            .json_call::<(), _>(Method::GET, "projects", &[], None)
            .await
    }

    pub async fn create(&self, name: &str, description: Option<&str>) -> Result<Project> {
        log::info!("Creating project {}", name);
        self.transport
            .json_call(
                Method::POST,
                "projects",
                &[],
                Some(&CreateProjectBody { name, description }),
            )
            .await
    }

    pub async fn update(&self, name: &str, description: &str) -> Result<Project> {
        self.transport
            .json_call(
                Method::PUT,
                &format!("projects/{}", name),
                &[],
                Some(&UpdateProjectBody { description }),
            )
            .await
    }

    /// Removes the project namespace. What happens to its images is up to
    /// the server.
    pub async fn delete(&self, name: &str) -> Result<DeleteResult> {
        log::info!("Deleting project {}", name);
        let body: Option<DeleteResult> = self
            .transport
            .json_call::<(), _>(Method::DELETE, &format!("projects/{}", name), &[], None)
            .await?;
        Ok(DeleteResult::from_body(body))
    }
}
