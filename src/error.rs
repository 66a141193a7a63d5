use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LecternError {
    #[error("Media error: {0}")]
    Media(String),

    #[error("Video file not found: {0}")]
    VideoNotFound(PathBuf),

    #[error("Transcription error: {0}")]
    Transcription(String),

    #[error("LMS error: {0}")]
    Lms(String),

    #[error("LMS request to {url} failed with status {status}")]
    LmsStatus { url: String, status: u16 },

    #[error("Download failed for {url}: {reason}")]
    DownloadFailed { url: String, reason: String },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Missing configuration: {key} (set {env_var} or add it to config.toml)")]
    MissingConfig { key: String, env_var: String },

    #[error("API error: {0}")]
    Api(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Transcript not found: {0}")]
    TranscriptNotFound(String),
}

impl LecternError {
    /// Configuration failures abort startup; everything else is scoped to one unit of work.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            LecternError::MissingConfig { .. }
                | LecternError::Config(_)
                | LecternError::TomlParse(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, LecternError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config_is_fatal() {
        let err = LecternError::MissingConfig {
            key: "storage.connection_string".to_string(),
            env_var: "LECTERN_CONNECTION_STRING".to_string(),
        };
        assert!(err.is_fatal());
        assert!(err.to_string().contains("LECTERN_CONNECTION_STRING"));
    }

    #[test]
    fn test_unit_failures_are_recoverable() {
        assert!(!LecternError::Media("ffmpeg exited".into()).is_fatal());
        assert!(!LecternError::LmsStatus {
            url: "https://lms/x".into(),
            status: 404
        }
        .is_fatal());
    }
}
