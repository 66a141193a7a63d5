use crate::error::{LecternError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration struct
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LecternConfig {
    #[serde(default)]
    pub lms: LmsConfig,

    #[serde(default)]
    pub transcription: TranscriptionConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub media: MediaConfig,
}

impl LecternConfig {
    /// Connection string for the transcript store. Its absence is fatal.
    pub fn require_connection_string(&self) -> Result<&str> {
        require(
            self.storage.connection_string.as_deref(),
            "storage.connection_string",
            "LECTERN_CONNECTION_STRING",
        )
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LmsConfig {
    /// API root, e.g. https://canvas.example.edu/api/v1
    pub base_url: Option<String>,
    /// Bearer token for the LMS API
    pub access_token: Option<String>,
    /// Default course when none is given on the command line
    pub course_id: Option<String>,
}

impl LmsConfig {
    pub fn require_base_url(&self) -> Result<&str> {
        require(self.base_url.as_deref(), "lms.base_url", "CANVAS_BASE_URL")
    }

    pub fn require_access_token(&self) -> Result<&str> {
        require(
            self.access_token.as_deref(),
            "lms.access_token",
            "CANVAS_ACCESS_TOKEN",
        )
    }

    /// Course id from the command line, falling back to the configured one.
    pub fn resolve_course_id(&self, cli_value: Option<String>) -> Result<String> {
        cli_value
            .or_else(|| self.course_id.clone())
            .ok_or_else(|| LecternError::MissingConfig {
                key: "lms.course_id".to_string(),
                env_var: "CANVAS_COURSE_ID".to_string(),
            })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionConfig {
    pub openai_api_key: Option<String>,
    /// Hosted speech-to-text model
    #[serde(default = "default_transcription_model")]
    pub model: String,
    #[serde(default = "default_transcription_url")]
    pub api_url: String,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            model: default_transcription_model(),
            api_url: default_transcription_url(),
        }
    }
}

impl TranscriptionConfig {
    pub fn require_api_key(&self) -> Result<&str> {
        require(
            self.openai_api_key.as_deref(),
            "transcription.openai_api_key",
            "OPENAI_API_KEY",
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Provider: "openai", "openrouter", "moonshot"
    #[serde(default = "default_llm_provider")]
    pub provider: String,
    pub api_key: Option<String>,
    #[serde(default = "default_llm_model")]
    pub model: String,
    /// Overrides the provider's base URL (any OpenAI-compatible endpoint)
    pub base_url: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_llm_provider(),
            api_key: None,
            model: default_llm_model(),
            base_url: None,
        }
    }
}

impl LlmConfig {
    pub fn require_api_key(&self) -> Result<&str> {
        require(self.api_key.as_deref(), "llm.api_key", "OPENAI_API_KEY")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// SQLite path or ":memory:"
    pub connection_string: Option<String>,
    /// Directory for downloaded videos
    pub video_dir: Option<PathBuf>,
    /// Directory for extracted audio and chunk folders
    pub audio_dir: Option<PathBuf>,
    /// Directory for generated MCQ batches
    pub mcq_dir: Option<PathBuf>,
    /// Path of the filename -> URL metadata file
    pub metadata_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    #[serde(default = "default_chunk_minutes")]
    pub chunk_duration_minutes: u64,
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg_path: String,
    #[serde(default = "default_ffprobe")]
    pub ffprobe_path: String,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            chunk_duration_minutes: default_chunk_minutes(),
            ffmpeg_path: default_ffmpeg(),
            ffprobe_path: default_ffprobe(),
        }
    }
}

fn require<'a>(value: Option<&'a str>, key: &str, env_var: &str) -> Result<&'a str> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(LecternError::MissingConfig {
            key: key.to_string(),
            env_var: env_var.to_string(),
        }),
    }
}

fn default_transcription_model() -> String {
    "whisper-1".to_string()
}

fn default_transcription_url() -> String {
    "https://api.openai.com/v1/audio/transcriptions".to_string()
}

fn default_llm_provider() -> String {
    "openai".to_string()
}

fn default_llm_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_chunk_minutes() -> u64 {
    5
}

fn default_ffmpeg() -> String {
    "ffmpeg".to_string()
}

fn default_ffprobe() -> String {
    "ffprobe".to_string()
}
