use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, error};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::app_config::NarrationConfig;
use crate::errors::EngineError;
use crate::media;
use crate::narration::{NarrationEngine, RenderedAudio};

/// Piper reads whole lines; anything longer than this is better split
/// upstream so single renders stay fast.
const MAX_CHARS_PER_REQUEST: usize = 1000;

/// Local Piper TTS engine
///
/// Shells out to the `piper` binary with a voice model, streaming the text
/// on stdin and collecting a wav at the requested output path.
#[derive(Debug)]
pub struct PiperEngine {
    /// Path of the onnx voice model
    model_path: PathBuf,
    /// Render deadline in seconds
    timeout_secs: u64,
}

impl PiperEngine {
    /// Build an engine from the narration configuration.
    pub fn new(config: &NarrationConfig) -> Result<Self, EngineError> {
        let model_path = PathBuf::from(&config.model_path);
        if config.model_path.trim().is_empty() {
            return Err(EngineError::RequestFailed(
                "Piper engine requires narration.model_path".into(),
            ));
        }
        Ok(PiperEngine {
            model_path,
            timeout_secs: config.timeout_secs,
        })
    }
}

#[async_trait]
impl NarrationEngine for PiperEngine {
    async fn render(&self, text: &str, out_path: &Path) -> Result<RenderedAudio, EngineError> {
        if text.trim().is_empty() {
            return Err(EngineError::EmptyText);
        }

        let mut child = Command::new("piper")
            .args([
                "--model",
                self.model_path.to_str().unwrap_or_default(),
                "--output_file",
                out_path.to_str().unwrap_or_default(),
            ])
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| EngineError::RequestFailed(format!("Failed to launch piper: {}", e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(text.as_bytes())
                .await
                .map_err(|e| EngineError::RequestFailed(format!("Failed to feed piper: {}", e)))?;
            // Close stdin so piper knows the text is complete
            drop(stdin);
        }

        let deadline = Duration::from_secs(self.timeout_secs);
        let output = tokio::select! {
            result = child.wait_with_output() => {
                result.map_err(|e| EngineError::RequestFailed(format!("piper failed: {}", e)))?
            },
            _ = tokio::time::sleep(deadline) => {
                return Err(EngineError::Timeout(self.timeout_secs));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            error!("piper exited with {}: {}", output.status, stderr);
            return Err(EngineError::RequestFailed(format!(
                "piper exited with {}",
                output.status
            )));
        }

        let duration_secs = media::probe_duration(out_path)
            .await
            .map_err(|e| EngineError::Asset(e.to_string()))?;

        debug!(
            "Piper rendered {} chars to {:?} ({:.2}s)",
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
        "piper"
    }
}
