use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use log::debug;
use reqwest::Client;
use url::Url;

use crate::app_config::NarrationConfig;
use crate::errors::EngineError;
use crate::media;
use crate::narration::{NarrationEngine, RenderedAudio};

/// Hosted TTS limit per request; longer texts get cut off server-side.
const MAX_CHARS_PER_REQUEST: usize = 500;

/// StreamElements TTS client
///
/// A single GET with the voice and the text returns the rendered mp3
/// bytes. The duration is probed from the written file; the service does
/// not report it.
#[derive(Debug)]
pub struct StreamElementsEngine {
    /// Base URL of the speech endpoint
    endpoint: String,
    /// Voice identifier, e.g. "Brian"
    voice: String,
    /// HTTP client for making requests
    client: Client,
}

impl StreamElementsEngine {
    /// Build an engine from the narration configuration.
    pub fn new(config: &NarrationConfig) -> Result<Self, EngineError> {
        Url::parse(&config.endpoint).map_err(|e| {
            EngineError::RequestFailed(format!(
                "Invalid narration endpoint '{}': {}",
                config.endpoint, e
            ))
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| EngineError::RequestFailed(format!("Failed to build HTTP client: {}", e)))?;

        Ok(StreamElementsEngine {
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            voice: config.voice.clone(),
            client,
        })
    }

    async fn fetch_speech(&self, text: &str) -> Result<Bytes, EngineError> {
        let response = self
            .client
            .get(format!("{}/speech", self.endpoint))
            .query(&[("voice", self.voice.as_str()), ("text", text)])
            .send()
            .await
            .map_err(|e| EngineError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(EngineError::ApiError {
                status_code: status.as_u16(),
                message,
            });
        }

        response
            .bytes()
            .await
            .map_err(|e| EngineError::RequestFailed(e.to_string()))
    }
}

#[async_trait]
impl NarrationEngine for StreamElementsEngine {
    async fn render(&self, text: &str, out_path: &Path) -> Result<RenderedAudio, EngineError> {
        if text.trim().is_empty() {
            return Err(EngineError::EmptyText);
        }

        let audio = self.fetch_speech(text).await?;
        if audio.is_empty() {
            return Err(EngineError::Asset("engine returned an empty payload".into()));
        }

        tokio::fs::write(out_path, &audio)
            .await
            .map_err(|e| EngineError::Asset(format!("Failed to write {:?}: {}", out_path, e)))?;

        let duration_secs = media::probe_duration(out_path)
            .await
            .map_err(|e| EngineError::Asset(e.to_string()))?;

        debug!(
            "Rendered {} chars to {:?} ({:.2}s)",
            text.chars().count(),
            out_path,
            duration_secs
        );
        Ok(RenderedAudio {
            path: out_path.to_path_buf(),
            duration_secs,
        })
    }

    fn max_chars(&self) -> usize {
        MAX_CHARS_PER_REQUEST
    }

    fn name(&self) -> &'static str {
        "streamelements"
    }
}
