use crate::error::Result;
use serde::Deserialize;
use std::path::Path;

pub mod acquire;
pub mod client;
pub mod metadata;

pub use acquire::Acquirer;
pub use client::CanvasClient;

/// LMS ids arrive as numbers from Canvas but as strings from some proxies
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum LmsId {
    Number(u64),
    Text(String),
}

impl std::fmt::Display for LmsId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LmsId::Number(n) => write!(f, "{}", n),
            LmsId::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Entry of `GET /courses/{id}/modules`
#[derive(Debug, Clone, Deserialize)]
pub struct CourseModule {
    pub id: Option<LmsId>,
    pub name: Option<String>,
}

/// Entry of `GET /courses/{id}/modules/{module_id}/items`
#[derive(Debug, Clone, Deserialize)]
pub struct ModuleItem {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub content_id: Option<LmsId>,
    pub title: Option<String>,
}

impl ModuleItem {
    pub fn is_file(&self) -> bool {
        self.kind.as_deref() == Some("File")
    }
}

/// Body of `GET /courses/{id}/files/{file_id}`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileDetails {
    pub url: Option<String>,
    pub display_name: Option<String>,
}

/// Read side of the LMS REST API
#[allow(async_fn_in_trait)]
pub trait LmsApi {
    async fn list_modules(&self, course_id: &str) -> Result<Vec<CourseModule>>;

    async fn list_module_items(&self, course_id: &str, module_id: &str)
        -> Result<Vec<ModuleItem>>;

    /// Resolve a file-detail URL built by [`LmsApi::file_url`]
    async fn file_details(&self, file_url: &str) -> Result<FileDetails>;

    fn file_url(&self, course_id: &str, file_id: &str) -> String;
}

/// Fetches a resolved download URL to a local path
#[allow(async_fn_in_trait)]
pub trait VideoDownloader {
    async fn download(&self, url: &str, dest: &Path) -> Result<()>;
}
