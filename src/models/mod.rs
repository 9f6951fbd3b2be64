pub mod common;
pub mod image;
pub mod library;
pub mod project;
pub mod upload;

pub use common::*;
pub use image::*;
pub use library::*;
pub use project::*;
pub use upload::*;
