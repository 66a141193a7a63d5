use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::llm::StructuredLlm;

pub mod prompts;

/// One generated question; the correct option is not marked
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McqItem {
    pub q: String,
    pub options: Vec<String>,
}

/// The persisted unit: every question generated for one label
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct McqBatch {
    pub mcqs: Vec<McqItem>,
}

/// `{out_dir}/{label}.json`, with path separators in the label neutralised
pub fn artifact_path(out_dir: &Path, label: &str) -> PathBuf {
    let safe: String = label
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '_',
            c => c,
        })
        .collect();
    let safe = if safe.is_empty() { "untitled".to_string() } else { safe };
    out_dir.join(format!("{}.json", safe))
}

/// Generate an MCQ batch for `transcript` and write the model's raw JSON to the
/// label's artifact. Errors are logged and leave any earlier artifact untouched.
pub async fn synthesize<L: StructuredLlm>(
    llm: &L,
    transcript: &str,
    label: &str,
    out_dir: &Path,
) -> Option<PathBuf> {
    if transcript.trim().is_empty() {
        tracing::warn!("Transcript for {} is empty, skipping MCQ generation", label);
        return None;
    }

    let prompt = prompts::mcq_prompt(transcript, label);
    let schema = prompts::mcq_schema();

    let raw = match llm
        .complete_json(prompts::MCQ_INSTRUCTIONS, &prompt, prompts::SCHEMA_NAME, &schema)
        .await
    {
        Ok(raw) => raw,
        Err(e) => {
            tracing::error!("Error generating MCQs for {}: {:#}", label, e);
            return None;
        }
    };

    let path = artifact_path(out_dir, label);
    if let Err(e) = write_artifact(out_dir, &path, &raw).await {
        tracing::error!("Error saving MCQs to {}: {}", path.display(), e);
        return None;
    }

    match serde_json::from_str::<McqBatch>(&raw) {
        Ok(batch) => tracing::info!("Saved {} MCQs to {}", batch.mcqs.len(), path.display()),
        Err(_) => tracing::info!("Saved MCQs to {}", path.display()),
    }
    Some(path)
}

async fn write_artifact(out_dir: &Path, path: &Path, raw: &str) -> std::io::Result<()> {
    tokio::fs::create_dir_all(out_dir).await?;
    tokio::fs::write(path, raw.as_bytes()).await
}

/// Read back a persisted batch
pub fn load_batch(path: &Path) -> crate::error::Result<McqBatch> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}
