use crate::error::{LecternError, Result};
use crate::lms::metadata::save_video_metadata;
use crate::lms::{LmsApi, VideoDownloader};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

const UNNAMED_MODULE: &str = "Unnamed Module";
const VIDEO_EXTENSION: &str = ".mp4";

/// Module name -> downloaded videos, in module item order
pub type ModuleVideos = BTreeMap<String, Vec<PathBuf>>;

/// A file resolved from its detail URL, ready to download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFile {
    pub file_name: String,
    pub download_url: String,
}

/// Walks a course's modules and downloads every file item into `video_dir`
pub struct Acquirer<'a, A, D> {
    api: &'a A,
    downloader: &'a D,
    video_dir: PathBuf,
    metadata_path: PathBuf,
}

impl<'a, A: LmsApi, D: VideoDownloader> Acquirer<'a, A, D> {
    pub fn new(api: &'a A, downloader: &'a D, video_dir: PathBuf, metadata_path: PathBuf) -> Self {
        Self {
            api,
            downloader,
            video_dir,
            metadata_path,
        }
    }

    /// Failures are scoped: a failed module listing skips the module, a failed
    /// resolution or download skips the file. Only a failed module index yields nothing.
    pub async fn acquire(&self, course_id: &str) -> ModuleVideos {
        let mut result = ModuleVideos::new();
        let mut owners = HashMap::new();

        let modules = match self.api.list_modules(course_id).await {
            Ok(modules) => modules,
            Err(e) => {
                tracing::error!("Failed to fetch modules for course {}: {}", course_id, e);
                return result;
            }
        };
        tracing::info!("Course {} has {} modules", course_id, modules.len());

        for module in modules {
            let module_name = module
                .name
                .clone()
                .unwrap_or_else(|| UNNAMED_MODULE.to_string());
            let Some(module_id) = module.id.as_ref().map(|id| id.to_string()) else {
                tracing::warn!("Skipping module {:?} without an id", module_name);
                continue;
            };

            let file_urls = match self.module_file_urls(course_id, &module_id).await {
                Ok(urls) => urls,
                Err(e) => {
                    tracing::error!("Failed to fetch items for module {}: {}", module_name, e);
                    continue;
                }
            };

            let mut videos = Vec::new();
            for file_url in &file_urls {
                if let Some(path) = self.fetch_file(file_url).await {
                    record_owner(&mut owners, &path, &module_name);
                    videos.push(path);
                }
            }

            tracing::info!(
                "Module {}: {}/{} videos downloaded",
                module_name,
                videos.len(),
                file_urls.len()
            );
            if !videos.is_empty() {
                result.entry(module_name).or_default().extend(videos);
            }
        }

        result
    }

    /// File-detail URLs for every `File` item of a module
    pub async fn module_file_urls(&self, course_id: &str, module_id: &str) -> Result<Vec<String>> {
        let items = self.api.list_module_items(course_id, module_id).await?;
        let mut urls = Vec::new();

        for item in &items {
            let title = item.title.as_deref().unwrap_or("untitled");
            match (&item.content_id, item.is_file()) {
                (Some(file_id), true) => {
                    urls.push(self.api.file_url(course_id, &file_id.to_string()));
                }
                (None, true) => tracing::warn!("File item {:?} has no content id", title),
                (_, false) => tracing::debug!(
                    "Skipping {} item {:?}",
                    item.kind.as_deref().unwrap_or("unknown"),
                    title
                ),
            }
        }

        Ok(urls)
    }

    pub async fn resolve_file(&self, file_url: &str) -> Result<ResolvedFile> {
        let details = self.api.file_details(file_url).await?;

        let download_url = details
            .url
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| LecternError::Lms(format!("No download URL in {}", file_url)))?;

        let file_name = match details.display_name.filter(|n| !n.trim().is_empty()) {
            Some(name) => ensure_mp4(&sanitize_file_name(&name)),
            None => synthesize_file_name(file_url),
        };

        Ok(ResolvedFile {
            file_name,
            download_url,
        })
    }

    /// Resolve, record metadata, download. `None` when the file was skipped.
    async fn fetch_file(&self, file_url: &str) -> Option<PathBuf> {
        let resolved = match self.resolve_file(file_url).await {
            Ok(resolved) => resolved,
            Err(e) => {
                tracing::error!("Failed to resolve {}: {}", file_url, e);
                return None;
            }
        };

        // Recorded whether or not the download below succeeds
        if let Err(e) = save_video_metadata(
            &self.metadata_path,
            &resolved.file_name,
            &resolved.download_url,
        ) {
            tracing::error!("Failed to save metadata for {}: {}", resolved.file_name, e);
        }

        let dest = self.video_dir.join(&resolved.file_name);
        match self.downloader.download(&resolved.download_url, &dest).await {
            Ok(()) => Some(dest),
            Err(e) => {
                tracing::error!("Failed to download {}: {}", resolved.file_name, e);
                None
            }
        }
    }
}

/// Remember which module downloaded `path`. Returns `false` when an earlier module in
/// the same run already wrote that file, which this download has now replaced.
fn record_owner(owners: &mut HashMap<PathBuf, String>, path: &Path, module_name: &str) -> bool {
    match owners.insert(path.to_path_buf(), module_name.to_string()) {
        Some(previous) if previous != module_name => {
            tracing::warn!(
                "{} from module {} overwrote the copy downloaded for module {}",
                path.display(),
                module_name,
                previous
            );
            false
        }
        Some(_) => {
            tracing::warn!("{} listed twice in module {}", path.display(), module_name);
            false
        }
        None => true,
    }
}

/// `.../files/42` -> `42.mp4`
pub fn synthesize_file_name(file_url: &str) -> String {
    let trimmed = file_url.split(|c: char| c == '?' || c == '#').next().unwrap_or(file_url);
    let last = trimmed
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or("video");
    format!("{}{}", sanitize_file_name(last), VIDEO_EXTENSION)
}

pub fn ensure_mp4(file_name: &str) -> String {
    if file_name.ends_with(VIDEO_EXTENSION) {
        file_name.to_string()
    } else {
        format!("{}{}", file_name, VIDEO_EXTENSION)
    }
}

/// Display names may contain path separators; keep downloads inside the video dir
fn sanitize_file_name(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '_',
            c => c,
        })
        .collect()
}
