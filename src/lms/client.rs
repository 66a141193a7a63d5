use crate::config::settings::LmsConfig;
use crate::error::{LecternError, Result};
use crate::lms::{CourseModule, FileDetails, LmsApi, ModuleItem, VideoDownloader};
use reqwest::header::LINK;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Bearer-authenticated Canvas REST client
pub struct CanvasClient {
    client: reqwest::Client,
    base_url: String,
    access_token: String,
}

impl CanvasClient {
    pub fn new(base_url: &str, access_token: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token: access_token.to_string(),
        }
    }

    pub fn from_config(config: &LmsConfig) -> Result<Self> {
        Ok(Self::new(
            config.require_base_url()?,
            config.require_access_token()?,
        ))
    }

    async fn get_page<T: DeserializeOwned>(&self, url: &str) -> Result<(T, Option<String>)> {
        tracing::debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            tracing::debug!("Response body from {}: {}", url, body);
            return Err(LecternError::LmsStatus {
                url: url.to_string(),
                status,
            });
        }

        let next = response
            .headers()
            .get(LINK)
            .and_then(|v| v.to_str().ok())
            .and_then(next_page_url);

        let body = response.json::<T>().await?;
        Ok((body, next))
    }

    /// Follow `Link: rel="next"` until the listing is exhausted
    async fn get_all<T: DeserializeOwned>(&self, url: &str) -> Result<Vec<T>> {
        let mut results = Vec::new();
        let mut next = Some(url.to_string());

        while let Some(page_url) = next {
            let (page, following): (Vec<T>, _) = self.get_page(&page_url).await?;
            results.extend(page);
            next = following;
        }

        Ok(results)
    }
}

impl LmsApi for CanvasClient {
    async fn list_modules(&self, course_id: &str) -> Result<Vec<CourseModule>> {
        let url = format!("{}/courses/{}/modules", self.base_url, course_id);
        self.get_all(&url).await
    }

    async fn list_module_items(
        &self,
        course_id: &str,
        module_id: &str,
    ) -> Result<Vec<ModuleItem>> {
        let url = format!(
            "{}/courses/{}/modules/{}/items",
            self.base_url, course_id, module_id
        );
        self.get_all(&url).await
    }

    async fn file_details(&self, file_url: &str) -> Result<FileDetails> {
        let (details, _) = self.get_page(file_url).await?;
        Ok(details)
    }

    fn file_url(&self, course_id: &str, file_id: &str) -> String {
        format!("{}/courses/{}/files/{}", self.base_url, course_id, file_id)
    }
}

impl VideoDownloader for CanvasClient {
    /// Streams the body to `{dest}.part` and renames it into place once complete.
    async fn download(&self, url: &str, dest: &Path) -> Result<()> {
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut response = self
            .client
            .get(url)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| LecternError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(LecternError::DownloadFailed {
                url: url.to_string(),
                reason: format!("HTTP {}", response.status()),
            });
        }

        let mut partial = dest.as_os_str().to_owned();
        partial.push(".part");
        let partial = PathBuf::from(partial);

        let mut file = tokio::fs::File::create(&partial).await?;
        let written = match stream_to_file(&mut response, &mut file).await {
            Ok(n) => n,
            Err(e) => {
                drop(file);
                let _ = tokio::fs::remove_file(&partial).await;
                return Err(LecternError::DownloadFailed {
                    url: url.to_string(),
                    reason: e.to_string(),
                });
            }
        };

        tokio::fs::rename(&partial, dest).await?;
        tracing::info!("Downloaded {} ({} bytes)", dest.display(), written);
        Ok(())
    }
}

async fn stream_to_file(response: &mut reqwest::Response, file: &mut tokio::fs::File) -> Result<u64> {
    let mut written: u64 = 0;
    while let Some(chunk) = response.chunk().await? {
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    Ok(written)
}

/// Extract the `rel="next"` target from an RFC 8288 `Link` header
fn next_page_url(header: &str) -> Option<String> {
    header.split(',').find_map(|part| {
        let mut pieces = part.split(';');
        let target = pieces.next()?.trim();
        let is_next = pieces.any(|p| {
            let p = p.trim();
            p == "rel=\"next\"" || p == "rel=next"
        });
        if !is_next {
            return None;
        }
        target
            .strip_prefix('<')
            .and_then(|t| t.strip_suffix('>'))
            .map(|t| t.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls_match_canvas_layout() {
        let client = CanvasClient::new("https://canvas.test/api/v1/", "token");
        assert_eq!(
            client.file_url("11203383", "42"),
            "https://canvas.test/api/v1/courses/11203383/files/42"
        );
    }

    #[test]
    fn test_from_config_requires_credentials() {
        let mut config = LmsConfig {
            base_url: Some("https://canvas.test/api/v1".to_string()),
            ..Default::default()
        };
        assert!(CanvasClient::from_config(&config).is_err());

        config.access_token = Some("token".to_string());
        assert!(CanvasClient::from_config(&config).is_ok());
    }

    #[test]
    fn test_next_page_url() {
        let header = r#"<https://canvas.test/api/v1/courses/1/modules?page=1&per_page=10>; rel="current", <https://canvas.test/api/v1/courses/1/modules?page=2&per_page=10>; rel="next", <https://canvas.test/api/v1/courses/1/modules?page=1&per_page=10>; rel="first""#;
        assert_eq!(
            next_page_url(header).as_deref(),
            Some("https://canvas.test/api/v1/courses/1/modules?page=2&per_page=10")
        );
    }

    #[test]
    fn test_no_next_page() {
        let header = r#"<https://canvas.test/x?page=1>; rel="current", <https://canvas.test/x?page=1>; rel="last""#;
        assert!(next_page_url(header).is_none());
    }

    fn client_at(base_url: String) -> CanvasClient {
        CanvasClient {
            client: crate::test_support::direct_client(),
            base_url,
            access_token: "token".to_string(),
        }
    }

    #[tokio::test]
    async fn test_non_ok_status_maps_to_lms_status() {
        let base = crate::test_support::serve_once(
            b"HTTP/1.1 404 Not Found\r\nContent-Length: 9\r\nConnection: close\r\n\r\nnot found",
        )
        .await;
        let client = client_at(base.clone());

        let err = client.list_module_items("c1", "7").await.unwrap_err();

        match err {
            LecternError::LmsStatus { url, status } => {
                assert_eq!(status, 404);
                assert_eq!(url, format!("{}/courses/c1/modules/7/items", base));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_listing_parses_json_body() {
        let base = crate::test_support::serve_once(
            b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 27\r\nConnection: close\r\n\r\n[{\"id\":3,\"name\":\"Week 1\"}]\n",
        )
        .await;

        let modules = client_at(base).list_modules("c1").await.unwrap();
        assert_eq!(modules.len(), 1);
        assert_eq!(modules[0].name.as_deref(), Some("Week 1"));
    }

    #[tokio::test]
    async fn test_truncated_download_leaves_no_files() {
        let base = crate::test_support::serve_once(
            b"HTTP/1.1 200 OK\r\nContent-Length: 1000\r\nConnection: close\r\n\r\npartial",
        )
        .await;
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("videos").join("lec1.mp4");

        let err = client_at(base.clone())
            .download(&format!("{}/download/1", base), &dest)
            .await
            .unwrap_err();

        assert!(matches!(err, LecternError::DownloadFailed { .. }));
        assert!(!dest.exists());
        assert!(!dir.path().join("videos").join("lec1.mp4.part").exists());
    }

    #[tokio::test]
    async fn test_failed_status_download_creates_nothing() {
        let base = crate::test_support::serve_once(
            b"HTTP/1.1 500 Internal Server Error\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        )
        .await;
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("lec1.mp4");

        let err = client_at(base.clone())
            .download(&format!("{}/download/1", base), &dest)
            .await
            .unwrap_err();

        assert!(matches!(err, LecternError::DownloadFailed { .. }));
        assert!(!dest.exists());
        assert!(!dir.path().join("lec1.mp4.part").exists());
    }

    #[tokio::test]
    async fn test_download_renames_into_place() {
        let base = crate::test_support::serve_once(
            b"HTTP/1.1 200 OK\r\nContent-Length: 5\r\nConnection: close\r\n\r\nvideo",
        )
        .await;
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("lec1.mp4");

        client_at(base.clone())
            .download(&format!("{}/download/1", base), &dest)
            .await
            .unwrap();

        assert_eq!(std::fs::read(&dest).unwrap(), b"video");
        assert!(!dir.path().join("lec1.mp4.part").exists());
    }
}
