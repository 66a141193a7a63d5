use crate::config::settings::MediaConfig;
use crate::error::{LecternError, Result};
use crate::media::{base_name, plan_segments, segment_stem, SegmentSpan};
use std::path::{Path, PathBuf};
use tokio::process::Command;

const MINUTE_MS: u64 = 60 * 1000;

/// Extracts a video's audio track and cuts it into fixed-length mp3 chunks
pub struct Segmenter {
    ffmpeg: String,
    ffprobe: String,
    work_dir: PathBuf,
}

impl Segmenter {
    pub fn new(config: &MediaConfig, work_dir: PathBuf) -> Self {
        Self {
            ffmpeg: config.ffmpeg_path.clone(),
            ffprobe: config.ffprobe_path.clone(),
            work_dir,
        }
    }

    /// Chunk files for `video_path`, in ascending index order.
    ///
    /// Any failure is logged and yields an empty list; no partial chunk set survives.
    pub async fn segment(&self, video_path: &Path, chunk_duration_minutes: u64) -> Vec<PathBuf> {
        let Some(base) = base_name(video_path) else {
            tracing::error!("Invalid video filename: {}", video_path.display());
            return Vec::new();
        };
        let chunk_dir = self.chunk_dir(&base);

        match self
            .try_segment(video_path, &base, &chunk_dir, chunk_duration_minutes)
            .await
        {
            Ok(chunks) => chunks,
            Err(e) => {
                tracing::error!("Segmenting {} failed: {}", video_path.display(), e);
                if chunk_dir.exists() {
                    if let Err(e) = tokio::fs::remove_dir_all(&chunk_dir).await {
                        tracing::warn!("Could not remove {}: {}", chunk_dir.display(), e);
                    }
                }
                Vec::new()
            }
        }
    }

    /// Intermediate audio track for a video base name
    pub fn audio_path(&self, base: &str) -> PathBuf {
        self.work_dir.join(format!("{}.mp3", base))
    }

    pub fn chunk_dir(&self, base: &str) -> PathBuf {
        self.work_dir.join(format!("{}_chunks", base))
    }

    async fn try_segment(
        &self,
        video_path: &Path,
        base: &str,
        chunk_dir: &Path,
        chunk_duration_minutes: u64,
    ) -> Result<Vec<PathBuf>> {
        if !video_path.exists() {
            return Err(LecternError::VideoNotFound(video_path.to_path_buf()));
        }
        if chunk_duration_minutes == 0 {
            return Err(LecternError::Media(
                "Chunk duration must be at least one minute".to_string(),
            ));
        }
        let chunk_ms = chunk_duration_minutes
            .checked_mul(MINUTE_MS)
            .ok_or_else(|| {
                LecternError::Media(format!(
                    "Chunk duration of {} minutes is too large",
                    chunk_duration_minutes
                ))
            })?;

        tokio::fs::create_dir_all(&self.work_dir).await?;
        let audio_path = self.audio_path(base);
        self.extract_audio(video_path, &audio_path).await?;
        tracing::info!("Audio extracted to {}", audio_path.display());

        let total_ms = self.probe_duration_ms(&audio_path).await?;
        let spans = plan_segments(total_ms, chunk_ms);
        if spans.is_empty() {
            return Err(LecternError::Media(format!(
                "Audio track {} is empty",
                audio_path.display()
            )));
        }

        // Stale chunks from an earlier run would otherwise be picked up
        if chunk_dir.exists() {
            tokio::fs::remove_dir_all(chunk_dir).await?;
        }
        tokio::fs::create_dir_all(chunk_dir).await?;

        let mut chunks = Vec::with_capacity(spans.len());
        for span in &spans {
            let chunk_path = chunk_dir.join(format!("{}.mp3", segment_stem(base, span.index)));
            self.export_chunk(&audio_path, span, &chunk_path).await?;
            chunks.push(chunk_path);
        }

        tracing::info!(
            "Created {} chunks of {} min from {}",
            chunks.len(),
            chunk_duration_minutes,
            video_path.display()
        );
        Ok(chunks)
    }

    async fn extract_audio(&self, video_path: &Path, audio_path: &Path) -> Result<()> {
        let output = Command::new(&self.ffmpeg)
            .arg("-y")
            .arg("-i")
            .arg(video_path)
            .arg("-vn")
            .arg("-acodec")
            .arg("libmp3lame")
            .arg("-q:a")
            .arg("4")
            .arg(audio_path)
            .output()
            .await
            .map_err(|e| LecternError::Media(format!("Failed to run {}: {}", self.ffmpeg, e)))?;

        if !output.status.success() {
            return Err(LecternError::Media(format!(
                "Audio extraction failed for {}: {}",
                video_path.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(())
    }

    async fn probe_duration_ms(&self, audio_path: &Path) -> Result<u64> {
        let output = Command::new(&self.ffprobe)
            .arg("-v")
            .arg("error")
            .arg("-show_entries")
            .arg("format=duration")
            .arg("-of")
            .arg("default=noprint_wrappers=1:nokey=1")
            .arg(audio_path)
            .output()
            .await
            .map_err(|e| LecternError::Media(format!("Failed to run {}: {}", self.ffprobe, e)))?;

        if !output.status.success() {
            return Err(LecternError::Media(format!(
                "ffprobe failed for {}: {}",
                audio_path.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        parse_duration_ms(&String::from_utf8_lossy(&output.stdout))
    }

    async fn export_chunk(&self, audio_path: &Path, span: &SegmentSpan, out: &Path) -> Result<()> {
        let output = Command::new(&self.ffmpeg)
            .arg("-y")
            .arg("-ss")
            .arg(format_seconds(span.start_ms))
            .arg("-t")
            .arg(format_seconds(span.duration_ms()))
            .arg("-i")
            .arg(audio_path)
            .arg("-acodec")
            .arg("libmp3lame")
            .arg("-q:a")
            .arg("4")
            .arg(out)
            .output()
            .await
            .map_err(|e| LecternError::Media(format!("Failed to run {}: {}", self.ffmpeg, e)))?;

        if !output.status.success() {
            return Err(LecternError::Media(format!(
                "Exporting chunk {} failed: {}",
                span.index,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(())
    }
}

/// ffprobe prints the container duration in fractional seconds
fn parse_duration_ms(stdout: &str) -> Result<u64> {
    let seconds: f64 = stdout
        .trim()
        .parse()
        .map_err(|_| LecternError::Media(format!("Unparsable duration: {:?}", stdout.trim())))?;

    if !seconds.is_finite() || seconds < 0.0 {
        return Err(LecternError::Media(format!("Invalid duration: {}", seconds)));
    }

    Ok((seconds * 1000.0).round() as u64)
}

fn format_seconds(ms: u64) -> String {
    format!("{}.{:03}", ms / 1000, ms % 1000)
}
