use crate::error::{LecternError, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Filename -> source URL, shared across every download
pub type VideoMetadata = BTreeMap<String, String>;

/// Load the metadata file; a missing file is an empty mapping.
pub fn load_video_metadata(path: &Path) -> Result<VideoMetadata> {
    if !path.exists() {
        return Ok(VideoMetadata::new());
    }

    let content = fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(VideoMetadata::new());
    }
    Ok(serde_json::from_str(&content)?)
}

/// Record `file_name -> url`, replacing any earlier URL for the same file name.
///
/// This is a plain read-modify-write of the whole file and assumes a single writer.
pub fn save_video_metadata(path: &Path, file_name: &str, url: &str) -> Result<()> {
    if file_name.trim().is_empty() || url.trim().is_empty() {
        return Err(LecternError::Storage(
            "Invalid file data: URL or filename is missing".to_string(),
        ));
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut metadata = load_video_metadata(path)?;
    metadata.insert(file_name.to_string(), url.to_string());

    fs::write(path, serde_json::to_string_pretty(&metadata)?)?;
    tracing::info!("Metadata saved for file: {}", file_name);
    Ok(())
}
