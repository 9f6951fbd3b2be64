//! # pixvault
//!
//! Async client for the PixVault image API: uploads, tagging, search,
//! project namespaces, and AI generation/edits that are polled until the
//! image is ready.
//!
//! ```no_run
//! use pixvault::{ClientConfig, EditRequest, GenerationRequest, PixVaultClient};
//!
//! # async fn example() -> pixvault::Result<()> {
//! let client = PixVaultClient::new(ClientConfig::from_env())?;
//!
//! let fox = client
//!     .generate(GenerationRequest::new("zoo", "a red fox in the snow").with_size(800, 600))
//!     .await?;
//! println!("{} ({} bytes)", fox.url, fox.data.len());
//!
//! // edits are nested under the source image's path
//! let sunset = client
//!     .edit(EditRequest::from_url(&fox.url, "make it sunset"))
//!     .await?;
//! println!("{}", sunset.content_path);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod logger;
pub mod models;
pub mod slug;
pub mod transport;

pub use api::{ImageClient, LibraryClient, PixVaultClient, ProjectClient};
pub use config::ClientConfig;
pub use error::{PixVaultError, Result};
pub use models::*;
pub use slug::{slugify, slugify_filename};
