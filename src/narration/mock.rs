/*!
 * Mock narration engine for testing.
 *
 * Behaviors:
 * - `MockEngine::working()` - always succeeds; the duration is a fixed
 *   per-word rate, so timing assertions stay exact
 * - `MockEngine::intermittent(n)` - fails every nth request
 * - `MockEngine::failing()` - always fails with an error
 */

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::errors::EngineError;
use crate::narration::{NarrationEngine, RenderedAudio};

/// Behavior mode for the mock engine
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds with a synthetic duration
    Working,
    /// Fails intermittently (every nth request)
    Intermittent { fail_every: usize },
    /// Always fails with an error
    Failing,
}

/// Mock narration engine with configurable behavior
#[derive(Debug)]
pub struct MockEngine {
    /// Behavior mode
    behavior: MockBehavior,
    /// Synthetic seconds of audio per word
    secs_per_word: f64,
    /// Request counter for intermittent failures
    request_count: Arc<AtomicUsize>,
    /// Whether rendered files are actually written to disk
    write_files: bool,
}

impl MockEngine {
    /// Create a new mock engine with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        MockEngine {
            behavior,
            secs_per_word: 0.5,
            request_count: Arc::new(AtomicUsize::new(0)),
            write_files: true,
        }
    }

    /// Create a working mock engine that always succeeds
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    /// Create an intermittently failing mock engine
    pub fn intermittent(fail_every: usize) -> Self {
        Self::new(MockBehavior::Intermittent { fail_every })
    }

    /// Create a failing mock engine that always errors
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Override the synthetic per-word rate
    pub fn with_rate(mut self, secs_per_word: f64) -> Self {
        self.secs_per_word = secs_per_word;
        self
    }

    /// Skip writing placeholder files (for tests without a temp dir)
    pub fn without_files(mut self) -> Self {
        self.write_files = false;
        self
    }

    /// Number of render calls made so far
    pub fn render_calls(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NarrationEngine for MockEngine {
    async fn render(&self, text: &str, out_path: &Path) -> Result<RenderedAudio, EngineError> {
        let call = self.request_count.fetch_add(1, Ordering::SeqCst) + 1;

        if text.trim().is_empty() {
            return Err(EngineError::EmptyText);
        }

        match self.behavior {
            MockBehavior::Failing => {
                return Err(EngineError::RequestFailed("mock engine failure".into()));
            }
            MockBehavior::Intermittent { fail_every } if fail_every > 0 && call % fail_every == 0 => {
                return Err(EngineError::RequestFailed(format!(
                    "mock engine failure on call {}",
                    call
                )));
            }
            _ => {}
        }

        if self.write_files {
            tokio::fs::write(out_path, b"mock-audio")
                .await
                .map_err(|e| EngineError::Asset(format!("Failed to write {:?}: {}", out_path, e)))?;
        }

        let words = text.split_whitespace().count().max(1) as f64;
        Ok(RenderedAudio {
            path: out_path.to_path_buf(),
            duration_secs: words * self.secs_per_word,
        })
    }

    fn max_chars(&self) -> usize {
        250
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
