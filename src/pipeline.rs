use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::config::{loader, LecternConfig};
use crate::error::{LecternError, Result};
use crate::llm::{ChatClient, StructuredLlm};
use crate::lms::acquire::ModuleVideos;
use crate::lms::{Acquirer, CanvasClient};
use crate::media::Segmenter;
use crate::quiz;
use crate::storage::{TranscriptDb, TranscriptId};
use crate::transcription::{transcribe_segments, OpenAiTranscriber, SpeechToText};

/// A transcript that made it into the store
#[derive(Debug, Clone)]
pub struct StoredTranscript {
    pub id: TranscriptId,
    pub file_name: String,
    pub text: String,
}

/// Video -> chunks -> text -> store, one video at a time
pub struct TranscriptPipeline<'a, S> {
    config: &'a LecternConfig,
    segmenter: Segmenter,
    service: &'a S,
}

impl<'a, S: SpeechToText> TranscriptPipeline<'a, S> {
    pub fn new(config: &'a LecternConfig, segmenter: Segmenter, service: &'a S) -> Self {
        Self {
            config,
            segmenter,
            service,
        }
    }

    /// Full pipeline for one video. `Ok(None)` means the video produced no usable
    /// transcript; `Err` is reserved for the store being unreachable.
    pub async fn transcribe_video(
        &self,
        video: &Path,
        course_name: &str,
    ) -> Result<Option<StoredTranscript>> {
        tracing::info!("Processing {}", video.display());

        let chunks = self
            .segmenter
            .segment(video, self.config.media.chunk_duration_minutes)
            .await;
        let text = transcribe_segments(self.service, &chunks).await;

        let file_name = video
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| video.display().to_string());

        self.persist(&text, &file_name, course_name)
    }

    /// Store stage: one connection per call, closed before returning.
    pub fn persist(
        &self,
        text: &str,
        file_name: &str,
        course_name: &str,
    ) -> Result<Option<StoredTranscript>> {
        let db = TranscriptDb::connect(self.config.require_connection_string()?)?;
        let id = db.insert(text, file_name, course_name);
        db.close()?;

        Ok(id.map(|id| StoredTranscript {
            id,
            file_name: file_name.to_string(),
            text: text.to_string(),
        }))
    }

    /// Transcribe every acquired video, module by module. Unit failures are logged and
    /// skipped; only fatal configuration errors stop the run.
    pub async fn transcribe_modules(
        &self,
        modules: &ModuleVideos,
    ) -> Result<BTreeMap<String, Vec<StoredTranscript>>> {
        let mut stored = BTreeMap::new();

        for (module_name, videos) in modules {
            let mut module_transcripts = Vec::new();
            for video in videos {
                match self.transcribe_video(video, module_name).await {
                    Ok(Some(transcript)) => module_transcripts.push(transcript),
                    Ok(None) => tracing::warn!("No transcript stored for {}", video.display()),
                    Err(e) if e.is_fatal() => return Err(e),
                    Err(e) => tracing::error!("Failed to store {}: {}", video.display(), e),
                }
            }
            stored.insert(module_name.clone(), module_transcripts);
        }

        Ok(stored)
    }
}

/// One MCQ batch per module, from the module's transcripts joined in video order
pub async fn quiz_modules<L: StructuredLlm>(
    llm: &L,
    transcripts: &BTreeMap<String, Vec<StoredTranscript>>,
    out_dir: &Path,
) -> Vec<PathBuf> {
    let mut artifacts = Vec::new();

    for (module_name, module_transcripts) in transcripts {
        if module_transcripts.is_empty() {
            continue;
        }
        let combined = module_transcripts
            .iter()
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        if let Some(path) = quiz::synthesize(llm, &combined, module_name, out_dir).await {
            artifacts.push(path);
        }
    }

    artifacts
}

#[derive(Debug, Default)]
pub struct RunSummary {
    pub modules: usize,
    pub videos: usize,
    pub stored: usize,
    pub quizzes: Vec<PathBuf>,
}

fn chat_client(config: &LecternConfig) -> Result<ChatClient> {
    config.llm.require_api_key()?;
    ChatClient::from_config(&config.llm).map_err(|e| LecternError::Config(format!("{:#}", e)))
}

fn build_segmenter(config: &LecternConfig) -> Result<Segmenter> {
    Ok(Segmenter::new(&config.media, loader::audio_dir(config)?))
}

/// Transcribe and store a single local video
pub async fn transcribe_file(
    config: &LecternConfig,
    video: &Path,
    course_name: &str,
) -> Result<Option<StoredTranscript>> {
    config.require_connection_string()?;
    let service = OpenAiTranscriber::new(&config.transcription)?;
    let pipeline = TranscriptPipeline::new(config, build_segmenter(config)?, &service);
    pipeline.transcribe_video(video, course_name).await
}

/// Acquire a course's lecture videos, transcribe each into the store and optionally
/// generate one MCQ batch per module. Missing configuration fails before any work.
pub async fn run_course(config: &LecternConfig, course_id: &str, quiz: bool) -> Result<RunSummary> {
    config.require_connection_string()?;
    let canvas = CanvasClient::from_config(&config.lms)?;
    let service = OpenAiTranscriber::new(&config.transcription)?;
    let llm = if quiz { Some(chat_client(config)?) } else { None };

    let acquirer = Acquirer::new(
        &canvas,
        &canvas,
        loader::video_dir(config)?,
        loader::metadata_path(config)?,
    );
    let modules = acquirer.acquire(course_id).await;

    let pipeline = TranscriptPipeline::new(config, build_segmenter(config)?, &service);
    let transcripts = pipeline.transcribe_modules(&modules).await?;

    let mut summary = RunSummary {
        modules: modules.len(),
        videos: modules.values().map(Vec::len).sum(),
        stored: transcripts.values().map(Vec::len).sum(),
        quizzes: Vec::new(),
    };

    if let Some(llm) = llm {
        tracing::info!("Generating MCQs with {}", llm.model());
        summary.quizzes = quiz_modules(&llm, &transcripts, &loader::mcq_dir(config)?).await;
    }

    tracing::info!(
        "Course {}: {} modules, {} videos, {} transcripts stored",
        course_id,
        summary.modules,
        summary.videos,
        summary.stored
    );
    Ok(summary)
}

/// Generate MCQs from a transcript already in the store
pub async fn quiz_from_record(
    config: &LecternConfig,
    id: &str,
    label: Option<&str>,
) -> Result<Option<PathBuf>> {
    let llm = chat_client(config)?;

    let db = TranscriptDb::connect(config.require_connection_string()?)?;
    let record = db.get_by_id(id);
    db.close()?;
    let record = record.ok_or_else(|| LecternError::TranscriptNotFound(id.to_string()))?;

    let label = label.unwrap_or(&record.course_name);
    Ok(quiz::synthesize(&llm, &record.transcript, label, &loader::mcq_dir(config)?).await)
}
