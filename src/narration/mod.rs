/*!
 * Narration engine implementations.
 *
 * This module contains client implementations for narration engines:
 * - StreamElements: hosted TTS over HTTP
 * - Piper: local neural TTS through an external process
 * - Mock: deterministic engine for tests
 */

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use std::fmt::Debug;

use crate::errors::EngineError;

/// A rendered narration asset with its measured duration
#[derive(Debug, Clone)]
pub struct RenderedAudio {
    /// Path of the audio file on disk
    pub path: PathBuf,
    /// Measured duration in seconds, straight from the container
    pub duration_secs: f64,
}

/// Common trait for all narration engines
///
/// An engine turns one narration-sized piece of text into an audio asset
/// and reports the asset's real duration. Text handed to `render` must not
/// exceed `max_chars`; the segmenter's character limit is clamped to it.
#[async_trait]
pub trait NarrationEngine: Send + Sync + Debug {
    /// Render text to an audio file at `out_path`
    async fn render(&self, text: &str, out_path: &Path) -> Result<RenderedAudio, EngineError>;

    /// Engine-declared maximum text length per call
    fn max_chars(&self) -> usize;

    /// Engine name for logs
    fn name(&self) -> &'static str;
}

pub mod mock;
pub mod piper;
pub mod streamelements;
