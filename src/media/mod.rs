use std::path::Path;

pub mod segmenter;

pub use segmenter::Segmenter;

/// A half-open `[start_ms, end_ms)` slice of an audio track
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentSpan {
    pub index: usize,
    pub start_ms: u64,
    pub end_ms: u64,
}

impl SegmentSpan {
    pub fn duration_ms(&self) -> u64 {
        self.end_ms - self.start_ms
    }
}

/// Split `[0, total_ms)` into `ceil(total_ms / chunk_ms)` contiguous spans.
/// Every span is `chunk_ms` long except possibly the last one.
pub fn plan_segments(total_ms: u64, chunk_ms: u64) -> Vec<SegmentSpan> {
    if chunk_ms == 0 || total_ms == 0 {
        return Vec::new();
    }

    let count = total_ms.div_ceil(chunk_ms);
    (0..count)
        .map(|i| SegmentSpan {
            index: i as usize,
            start_ms: i * chunk_ms,
            end_ms: (i + 1).saturating_mul(chunk_ms).min(total_ms),
        })
        .collect()
}

/// Chunk file stem for segment `index` of a track: `{base}_{index}`
pub fn segment_stem(base_name: &str, index: usize) -> String {
    format!("{}_{}", base_name, index)
}

/// Numeric index embedded in a chunk file name (`lecture_12.mp3` -> 12)
pub fn segment_index(path: &Path) -> Option<usize> {
    let stem = path.file_stem()?.to_str()?;
    let (_, index) = stem.rsplit_once('_')?;
    index.parse().ok()
}

/// Video base name without extension, used for every derived artifact
pub fn base_name(video_path: &Path) -> Option<String> {
    video_path
        .file_stem()
        .and_then(|s| s.to_str())
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const MINUTE_MS: u64 = 60 * 1000;

    #[test]
    fn test_twelve_minutes_in_five_minute_chunks() {
        let spans = plan_segments(12 * MINUTE_MS, 5 * MINUTE_MS);
        assert_eq!(spans.len(), 3);
        assert_eq!((spans[0].start_ms, spans[0].end_ms), (0, 5 * MINUTE_MS));
        assert_eq!(
            (spans[1].start_ms, spans[1].end_ms),
            (5 * MINUTE_MS, 10 * MINUTE_MS)
        );
        assert_eq!(
            (spans[2].start_ms, spans[2].end_ms),
            (10 * MINUTE_MS, 12 * MINUTE_MS)
        );
    }

    #[test]
    fn test_spans_partition_the_track() {
        for (total, chunk) in [(1, 1), (999, 1000), (1000, 1000), (1001, 1000), (3_723_456, 300_000)] {
            let spans = plan_segments(total, chunk);
            assert_eq!(spans.len() as u64, total.div_ceil(chunk));
            assert_eq!(spans.first().unwrap().start_ms, 0);
            assert_eq!(spans.last().unwrap().end_ms, total);
            for pair in spans.windows(2) {
                assert_eq!(pair[0].end_ms, pair[1].start_ms);
                assert_eq!(pair[0].duration_ms(), chunk);
            }
            for (i, span) in spans.iter().enumerate() {
                assert_eq!(span.index, i);
                assert!(span.duration_ms() > 0);
            }
        }
    }

    #[test]
    fn test_exact_multiple_has_no_empty_tail() {
        let spans = plan_segments(10 * MINUTE_MS, 5 * MINUTE_MS);
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[1].end_ms, 10 * MINUTE_MS);
    }

    #[test]
    fn test_degenerate_inputs() {
        assert!(plan_segments(0, 5 * MINUTE_MS).is_empty());
        assert!(plan_segments(12 * MINUTE_MS, 0).is_empty());
    }

    #[test]
    fn test_oversized_chunk_is_one_span() {
        let spans = plan_segments(12 * MINUTE_MS, u64::MAX);
        assert_eq!(spans.len(), 1);
        assert_eq!((spans[0].start_ms, spans[0].end_ms), (0, 12 * MINUTE_MS));
    }

    #[test]
    fn test_segment_naming() {
        assert_eq!(segment_stem("lecture", 3), "lecture_3");
        assert_eq!(segment_index(&PathBuf::from("/a/lecture_3.mp3")), Some(3));
        assert_eq!(segment_index(&PathBuf::from("week_1_intro_12.mp3")), Some(12));
        assert_eq!(segment_index(&PathBuf::from("lecture.mp3")), None);
        assert_eq!(segment_index(&PathBuf::from("lecture_final.mp3")), None);
    }

    #[test]
    fn test_base_name() {
        assert_eq!(
            base_name(&PathBuf::from("/videos/Week 1.mp4")).as_deref(),
            Some("Week 1")
        );
    }
}
