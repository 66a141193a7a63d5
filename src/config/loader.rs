use crate::config::settings::LecternConfig;
use crate::error::{LecternError, Result};
use directories::ProjectDirs;
use std::fs;
use std::path::PathBuf;

/// Get XDG-compliant config directory
pub fn config_dir() -> Result<PathBuf> {
    ProjectDirs::from("", "", "lectern")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or_else(|| LecternError::Config("Could not determine config directory".to_string()))
}

/// Get XDG-compliant data directory
pub fn data_dir() -> Result<PathBuf> {
    ProjectDirs::from("", "", "lectern")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| LecternError::Config("Could not determine data directory".to_string()))
}

/// Get config file path
pub fn config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

/// Directory downloaded videos are written to
pub fn video_dir(config: &LecternConfig) -> Result<PathBuf> {
    match &config.storage.video_dir {
        Some(dir) => Ok(dir.clone()),
        None => Ok(data_dir()?.join("videos")),
    }
}

/// Directory for extracted audio tracks and their chunk folders
pub fn audio_dir(config: &LecternConfig) -> Result<PathBuf> {
    match &config.storage.audio_dir {
        Some(dir) => Ok(dir.clone()),
        None => Ok(data_dir()?.join("audio")),
    }
}

/// Directory for generated MCQ batches
pub fn mcq_dir(config: &LecternConfig) -> Result<PathBuf> {
    match &config.storage.mcq_dir {
        Some(dir) => Ok(dir.clone()),
        None => Ok(data_dir()?.join("mcq")),
    }
}

/// Shared filename -> URL metadata file
pub fn metadata_path(config: &LecternConfig) -> Result<PathBuf> {
    match &config.storage.metadata_path {
        Some(path) => Ok(path.clone()),
        None => Ok(data_dir()?.join("video_metadata.json")),
    }
}

/// Load config from file, creating default if not exists
pub fn load_config() -> Result<LecternConfig> {
    let path = config_path()?;

    if !path.exists() {
        let config = LecternConfig::default();
        save_config(&config)?;
        return Ok(config);
    }

    let content = fs::read_to_string(&path)?;
    let config: LecternConfig = toml::from_str(&content)?;
    Ok(config)
}

/// Save config to file
pub fn save_config(config: &LecternConfig) -> Result<()> {
    let path = config_path()?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let content = toml::to_string_pretty(config)?;
    fs::write(&path, content)?;
    Ok(())
}

/// Ensure all data directories exist
pub fn ensure_directories(config: &LecternConfig) -> Result<()> {
    fs::create_dir_all(config_dir()?)?;
    fs::create_dir_all(data_dir()?)?;
    fs::create_dir_all(video_dir(config)?)?;
    fs::create_dir_all(audio_dir(config)?)?;
    fs::create_dir_all(mcq_dir(config)?)?;
    Ok(())
}

/// Load the config file and layer environment variables on top. Called once at startup.
pub fn load_config_with_env() -> Result<LecternConfig> {
    let mut config = load_config()?;
    apply_env_overrides(&mut config, |name| std::env::var(name).ok());
    Ok(config)
}

pub fn apply_env_overrides<F>(config: &mut LecternConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = lookup("CANVAS_BASE_URL") {
        config.lms.base_url = Some(url);
    }
    if let Some(token) = lookup("CANVAS_ACCESS_TOKEN") {
        config.lms.access_token = Some(token);
    }
    if let Some(course) = lookup("CANVAS_COURSE_ID") {
        config.lms.course_id = Some(course);
    }
    if let Some(key) = lookup("OPENAI_API_KEY") {
        config.transcription.openai_api_key = Some(key.clone());
        config.llm.api_key = Some(key);
    }
    if let Some(conn) = lookup("LECTERN_CONNECTION_STRING").or_else(|| lookup("connection_string")) {
        config.storage.connection_string = Some(conn);
    }
    if let Some(raw) = lookup("LECTERN_CHUNK_MINUTES") {
        match raw.trim().parse() {
            Ok(minutes) => config.media.chunk_duration_minutes = minutes,
            Err(e) => tracing::warn!(
                "Ignoring LECTERN_CHUNK_MINUTES={:?} ({}), keeping {} min",
                raw,
                e,
                config.media.chunk_duration_minutes
            ),
        }
    }
}
