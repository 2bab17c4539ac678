use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use std::fmt::Debug;

use crate::app_config::CaptionStyle;
use crate::errors::EngineError;
use crate::media;

// @module: Caption image rendering

/// Common trait for caption renderers
///
/// A renderer turns one caption chunk into an image asset the compositor
/// can overlay. Styling is fixed per run.
#[async_trait]
pub trait CaptionRenderer: Send + Sync + Debug {
    /// Render the caption text to an image at `out_path`
    async fn render(&self, text: &str, out_path: &Path) -> Result<PathBuf, EngineError>;
}

/// ffmpeg drawtext-based caption renderer
///
/// Renders white-on-transparent caption cards sized to the output video so
/// the compositor can center them without rescaling.
#[derive(Debug)]
pub struct DrawtextRenderer {
    style: CaptionStyle,
    canvas_width: u32,
    canvas_height: u32,
}

impl DrawtextRenderer {
    pub fn new(style: CaptionStyle, canvas_width: u32, canvas_height: u32) -> Self {
        DrawtextRenderer {
            style,
            canvas_width,
            canvas_height,
        }
    }

    fn drawtext_filter(&self, text: &str) -> String {
        let mut filter = format!(
            "drawtext=text='{}':fontcolor={}:fontsize={}:borderw={}:bordercolor={}:x=(w-text_w)/2:y=(h-text_h)/2",
            escape_drawtext(text),
            self.style.font_color,
            self.style.font_size,
            self.style.border_width,
            self.style.border_color,
        );
        if !self.style.font_file.is_empty() {
            filter.push_str(&format!(":fontfile={}", self.style.font_file));
        }
        filter
    }
}

#[async_trait]
impl CaptionRenderer for DrawtextRenderer {
    async fn render(&self, text: &str, out_path: &Path) -> Result<PathBuf, EngineError> {
        if text.trim().is_empty() {
            return Err(EngineError::EmptyText);
        }

        let args = vec![
            "-y".to_string(),
            "-f".to_string(),
            "lavfi".to_string(),
            "-i".to_string(),
            format!(
                "color=c=black@0.0:s={}x{},format=rgba",
                self.canvas_width, self.canvas_height
            ),
            "-vf".to_string(),
            self.drawtext_filter(text),
            "-frames:v".to_string(),
            "1".to_string(),
            out_path.to_string_lossy().to_string(),
        ];

        media::run_ffmpeg(&args, Duration::from_secs(30))
            .await
            .map_err(|e| EngineError::Asset(e.to_string()))?;
        Ok(out_path.to_path_buf())
    }
}

/// Mock caption renderer writing placeholder files
#[derive(Debug, Default)]
pub struct MockCaptionRenderer;

#[async_trait]
impl CaptionRenderer for MockCaptionRenderer {
    async fn render(&self, text: &str, out_path: &Path) -> Result<PathBuf, EngineError> {
        if text.trim().is_empty() {
            return Err(EngineError::EmptyText);
        }
        tokio::fs::write(out_path, b"mock-image")
            .await
            .map_err(|e| EngineError::Asset(format!("Failed to write {:?}: {}", out_path, e)))?;
        Ok(out_path.to_path_buf())
    }
}

// drawtext treats these as syntax; escape them so caption text passes
// through verbatim.
fn escape_drawtext(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('\'', "\\\\\\'")
        .replace(':', "\\:")
        .replace('%', "\\%")
}
