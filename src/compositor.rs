use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use log::{info, warn};

use crate::app_config::VideoConfig;
use crate::media;
use crate::timeline::TimelineEntry;

// @module: Final video assembly

/// One caption image bound to its display window
#[derive(Debug, Clone)]
pub struct OverlaySpec {
    /// Rendered caption image
    pub image: PathBuf,
    /// Window start in seconds
    pub start_secs: f64,
    /// Window end in seconds
    pub end_secs: f64,
}

impl OverlaySpec {
    pub fn from_entry(entry: &TimelineEntry, image: PathBuf) -> Self {
        OverlaySpec {
            image,
            start_secs: entry.start_secs,
            end_secs: entry.end_secs,
        }
    }
}

/// ffmpeg-based video compositor
///
/// Loops the background under the narration track, overlays each caption
/// image for exactly its timeline window, and encodes the finished video.
#[derive(Debug)]
pub struct Compositor {
    width: u32,
    height: u32,
    mix_background_audio: bool,
    background_audio_volume: f64,
    timeout: Duration,
}

impl Compositor {
    pub fn new(config: &VideoConfig) -> Self {
        Compositor {
            width: config.width,
            height: config.height,
            mix_background_audio: config.mix_background_audio,
            background_audio_volume: config.background_audio_volume,
            timeout: Duration::from_secs(config.compose_timeout_secs),
        }
    }

    /// Concatenate narration parts into a single audio track, in order.
    ///
    /// Order is a correctness requirement: the caption timeline was built
    /// against durations in unit order, so the audio must match it.
    pub async fn concat_audio(&self, parts: &[PathBuf], out_path: &Path) -> Result<PathBuf> {
        if parts.is_empty() {
            return Err(anyhow!("No narration parts to concatenate"));
        }

        let list_path = out_path.with_extension("txt");
        let mut listing = String::new();
        for part in parts {
            let canonical = part
                .canonicalize()
                .with_context(|| format!("Missing narration part {:?}", part))?;
            listing.push_str(&format!("file '{}'\n", canonical.display()));
        }
        std::fs::write(&list_path, listing)
            .with_context(|| format!("Failed to write concat list {:?}", list_path))?;

        let args = vec![
            "-y".to_string(),
            "-f".to_string(),
            "concat".to_string(),
            "-safe".to_string(),
            "0".to_string(),
            "-i".to_string(),
            list_path.to_string_lossy().to_string(),
            "-c".to_string(),
            "copy".to_string(),
            out_path.to_string_lossy().to_string(),
        ];
        media::run_ffmpeg(&args, self.timeout).await?;

        let _ = std::fs::remove_file(&list_path);
        Ok(out_path.to_path_buf())
    }

    /// Assemble the final video.
    ///
    /// Overlays whose image file is missing are skipped with a warning but
    /// their window still elapses: the clock was already fixed when the
    /// timeline was built, and shifting later captions to paper over a
    /// missing image would desynchronize everything after it.
    pub async fn compose(
        &self,
        background: &Path,
        audio_track: &Path,
        overlays: &[OverlaySpec],
        total_duration_secs: f64,
        out_path: &Path,
    ) -> Result<PathBuf> {
        if !background.exists() {
            return Err(anyhow!("Background video not found: {:?}", background));
        }
        if !audio_track.exists() {
            return Err(anyhow!("Narration track not found: {:?}", audio_track));
        }

        let mut args: Vec<String> = vec![
            "-y".to_string(),
            "-stream_loop".to_string(),
            "-1".to_string(),
            "-i".to_string(),
            background.to_string_lossy().to_string(),
            "-i".to_string(),
            audio_track.to_string_lossy().to_string(),
        ];

        // Only overlays whose image actually rendered become inputs
        let mut present: Vec<&OverlaySpec> = Vec::new();
        for overlay in overlays {
            if overlay.image.exists() {
                args.push("-i".to_string());
                args.push(overlay.image.to_string_lossy().to_string());
                present.push(overlay);
            } else {
                warn!(
                    "Caption image missing for window [{:.2}, {:.2}]; skipping overlay",
                    overlay.start_secs, overlay.end_secs
                );
            }
        }

        let mut filter = format!(
            "[0:v]scale={w}:{h}:force_original_aspect_ratio=increase,crop={w}:{h}[bg]",
            w = self.width,
            h = self.height
        );
        let mut last_label = "bg".to_string();
        for (i, overlay) in present.iter().enumerate() {
            // Inputs 0 and 1 are background and narration
            let input_index = i + 2;
            let out_label = format!("v{}", i);
            filter.push_str(&format!(
                ";[{last}][{input}:v]overlay=(W-w)/2:(H-h)/2:enable='between(t,{start:.3},{end:.3})'[{out}]",
                last = last_label,
                input = input_index,
                start = overlay.start_secs,
                end = overlay.end_secs,
                out = out_label
            ));
            last_label = out_label;
        }

        let audio_map = if self.mix_background_audio {
            filter.push_str(&format!(
                ";[0:a]volume={:.2}[bga];[1:a][bga]amix=inputs=2:duration=first[aout]",
                self.background_audio_volume
            ));
            "[aout]".to_string()
        } else {
            "1:a".to_string()
        };

        args.extend([
            "-filter_complex".to_string(),
            filter,
            "-map".to_string(),
            format!("[{}]", last_label),
            "-map".to_string(),
            audio_map,
            "-t".to_string(),
            format!("{:.3}", total_duration_secs),
            "-c:v".to_string(),
            "libx264".to_string(),
            "-pix_fmt".to_string(),
            "yuv420p".to_string(),
            "-c:a".to_string(),
            "aac".to_string(),
            out_path.to_string_lossy().to_string(),
        ]);

        info!(
            "Composing {:.1}s video with {} caption overlays",
            total_duration_secs,
            present.len()
        );
        media::run_ffmpeg(&args, self.timeout).await?;
        Ok(out_path.to_path_buf())
    }
}
