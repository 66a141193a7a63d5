use crate::error::Result;
use crate::media::segment_index;
use std::path::{Path, PathBuf};

pub mod openai;

pub use openai::OpenAiTranscriber;

/// A hosted or local speech-to-text backend that turns one audio file into text
#[allow(async_fn_in_trait)]
pub trait SpeechToText {
    async fn transcribe_file(&self, audio_path: &Path) -> Result<String>;
}

/// Sort chunk files by the numeric index in their name, so `x_2` precedes `x_10`.
/// Files without an index go last, ordered by path.
pub fn order_segments(segments: &[PathBuf]) -> Vec<PathBuf> {
    let mut ordered = segments.to_vec();
    ordered.sort_by(|a, b| match (segment_index(a), segment_index(b)) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.cmp(b),
    });
    ordered
}

/// Transcribe every chunk in index order and join the fragments with single spaces.
///
/// Returns an empty string when there is nothing to transcribe or when any chunk
/// fails; a partial transcript is never returned.
pub async fn transcribe_segments<S: SpeechToText>(service: &S, segments: &[PathBuf]) -> String {
    if segments.is_empty() {
        tracing::warn!("No audio chunks to transcribe");
        return String::new();
    }

    let ordered = order_segments(segments);
    let mut fragments = Vec::with_capacity(ordered.len());

    for (i, chunk) in ordered.iter().enumerate() {
        tracing::info!(
            "Transcribing chunk {}/{}: {}",
            i + 1,
            ordered.len(),
            chunk.display()
        );
        match service.transcribe_file(chunk).await {
            Ok(text) => fragments.push(text.trim().to_string()),
            Err(e) => {
                tracing::error!("Error transcribing {}: {}", chunk.display(), e);
                return String::new();
            }
        }
    }

    let full = fragments.join(" ");
    tracing::info!("Full transcription done ({} chars)", full.len());
    full
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LecternError;
    use std::cell::RefCell;

    /// Echoes the chunk stem; fails on the configured stem
    struct FakeService {
        calls: RefCell<Vec<String>>,
        fail_on: Option<String>,
    }

    impl FakeService {
        fn new(fail_on: Option<&str>) -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
                fail_on: fail_on.map(|s| s.to_string()),
            }
        }
    }

    impl SpeechToText for FakeService {
        async fn transcribe_file(&self, audio_path: &Path) -> Result<String> {
            let stem = audio_path.file_stem().unwrap().to_string_lossy().to_string();
            self.calls.borrow_mut().push(stem.clone());
            if self.fail_on.as_deref() == Some(stem.as_str()) {
                return Err(LecternError::Transcription("service unavailable".into()));
            }
            Ok(format!(" {} ", stem))
        }
    }

    fn chunk_paths(count: usize) -> Vec<PathBuf> {
        (0..count)
            .map(|i| PathBuf::from(format!("/work/lec_chunks/lec_{}.mp3", i)))
            .collect()
    }

    #[test]
    fn test_order_is_numeric_not_lexicographic() {
        let mut paths = chunk_paths(12);
        paths.sort();
        assert!(paths[2].ends_with("lec_10.mp3"));

        let ordered = order_segments(&paths);
        let indices: Vec<usize> = ordered.iter().map(|p| segment_index(p).unwrap()).collect();
        assert_eq!(indices, (0..12).collect::<Vec<_>>());
    }

    #[test]
    fn test_unindexed_files_sort_last() {
        let paths = vec![
            PathBuf::from("lec_notes.mp3"),
            PathBuf::from("lec_1.mp3"),
            PathBuf::from("lec_0.mp3"),
        ];
        let ordered = order_segments(&paths);
        assert_eq!(ordered[0], PathBuf::from("lec_0.mp3"));
        assert_eq!(ordered[2], PathBuf::from("lec_notes.mp3"));
    }

    #[tokio::test]
    async fn test_fragments_joined_in_order() {
        let service = FakeService::new(None);
        let mut paths = chunk_paths(11);
        paths.reverse();

        let text = transcribe_segments(&service, &paths).await;

        let expected: Vec<String> = (0..11).map(|i| format!("lec_{}", i)).collect();
        assert_eq!(text, expected.join(" "));
        assert_eq!(*service.calls.borrow(), expected);
    }

    #[tokio::test]
    async fn test_first_failure_discards_transcript() {
        let service = FakeService::new(Some("lec_1"));
        let text = transcribe_segments(&service, &chunk_paths(4)).await;

        assert!(text.is_empty());
        assert_eq!(*service.calls.borrow(), vec!["lec_0", "lec_1"]);
    }

    #[tokio::test]
    async fn test_no_segments_yields_empty() {
        let service = FakeService::new(None);
        assert!(transcribe_segments(&service, &[]).await.is_empty());
        assert!(service.calls.borrow().is_empty());
    }
}
