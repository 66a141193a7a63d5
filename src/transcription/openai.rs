use crate::config::settings::TranscriptionConfig;
use crate::error::{LecternError, Result};
use crate::transcription::SpeechToText;
use reqwest::multipart;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    text: String,
}

/// OpenAI audio transcription endpoint (Whisper)
pub struct OpenAiTranscriber {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl OpenAiTranscriber {
    pub fn new(config: &TranscriptionConfig) -> Result<Self> {
        let api_key = config.require_api_key()?.to_string();
        Ok(Self {
            client: reqwest::Client::new(),
            api_url: config.api_url.clone(),
            api_key,
            model: config.model.clone(),
        })
    }

    /// Transcribe audio bytes via OpenAI Whisper API
    pub async fn transcribe_bytes(&self, audio_data: Vec<u8>, filename: &str) -> Result<String> {
        let file_part = multipart::Part::bytes(audio_data)
            .file_name(filename.to_string())
            .mime_str(mime_for(filename))
            .map_err(|e| LecternError::Api(format!("Failed to create multipart: {}", e)))?;

        let form = multipart::Form::new()
            .text("model", self.model.clone())
            .text("response_format", "json")
            .part("file", file_part);

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| LecternError::Api(format!("OpenAI request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(LecternError::Transcription(format!(
                "{} rejected {}: {} {}",
                self.api_url, filename, status, body
            )));
        }

        let result: OpenAIResponse = response
            .json()
            .await
            .map_err(|e| {
                LecternError::Transcription(format!("Unreadable reply for {}: {}", filename, e))
            })?;

        Ok(result.text)
    }
}

impl SpeechToText for OpenAiTranscriber {
    async fn transcribe_file(&self, audio_path: &Path) -> Result<String> {
        let audio_data = tokio::fs::read(audio_path).await?;
        let filename = audio_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("audio.mp3")
            .to_string();

        self.transcribe_bytes(audio_data, &filename).await
    }
}

fn mime_for(filename: &str) -> &'static str {
    match filename.rsplit('.').next().map(|e| e.to_ascii_lowercase()) {
        Some(ext) if ext == "wav" => "audio/wav",
        Some(ext) if ext == "m4a" => "audio/mp4",
        _ => "audio/mpeg",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_url() {
        assert!(TranscriptionConfig::default()
            .api_url
            .starts_with("https://"));
    }

    #[test]
    fn test_requires_api_key() {
        assert!(OpenAiTranscriber::new(&TranscriptionConfig::default()).is_err());

        let config = TranscriptionConfig {
            openai_api_key: Some("sk-test".to_string()),
            ..Default::default()
        };
        let transcriber = OpenAiTranscriber::new(&config).unwrap();
        assert_eq!(transcriber.model, "whisper-1");
    }

    #[test]
    fn test_mime_for() {
        assert_eq!(mime_for("lec_0.mp3"), "audio/mpeg");
        assert_eq!(mime_for("clip.WAV"), "audio/wav");
    }

    #[test]
    fn test_response_parsing() {
        let parsed: OpenAIResponse = serde_json::from_str(r#"{"text":"hello world"}"#).unwrap();
        assert_eq!(parsed.text, "hello world");
    }

    fn transcriber_at(api_url: String) -> OpenAiTranscriber {
        OpenAiTranscriber {
            client: crate::test_support::direct_client(),
            api_url,
            api_key: "sk-test".to_string(),
            model: "whisper-1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_rejected_request_is_transcription_error() {
        let url = crate::test_support::serve_once(
            b"HTTP/1.1 503 Service Unavailable\r\nContent-Length: 4\r\nConnection: close\r\n\r\nbusy",
        )
        .await;

        let err = transcriber_at(url)
            .transcribe_bytes(b"audio".to_vec(), "lec_0.mp3")
            .await
            .unwrap_err();

        match err {
            LecternError::Transcription(msg) => {
                assert!(msg.contains("lec_0.mp3"));
                assert!(msg.contains("503"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_successful_reply_returns_text() {
        let url = crate::test_support::serve_once(
            b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 24\r\nConnection: close\r\n\r\n{\"text\":\"entropy rises\"}",
        )
        .await;

        let text = transcriber_at(url)
            .transcribe_bytes(b"audio".to_vec(), "lec_0.mp3")
            .await
            .unwrap();
        assert_eq!(text, "entropy rises");
    }
}
