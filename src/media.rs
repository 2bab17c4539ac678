use std::path::Path;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use log::{debug, error};
use serde_json::Value;
use tokio::process::Command;

// @module: ffmpeg/ffprobe process plumbing

/// Measure the duration of an audio or video asset in seconds.
///
/// Durations drive the caption timeline, so this reads the real container
/// metadata rather than estimating from text length.
pub async fn probe_duration<P: AsRef<Path>>(path: P) -> Result<f64> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(anyhow!("Cannot probe missing asset: {:?}", path));
    }

    let output = run_with_timeout(
        Command::new("ffprobe").args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "json",
            path.to_str().unwrap_or_default(),
        ]),
        Duration::from_secs(30),
        "ffprobe",
    )
    .await?;

    let payload: Value =
        serde_json::from_slice(&output).context("Failed to parse ffprobe output")?;
    let duration = payload
        .pointer("/format/duration")
        .and_then(Value::as_str)
        .and_then(|raw| raw.parse::<f64>().ok())
        .ok_or_else(|| anyhow!("ffprobe reported no duration for {:?}", path))?;

    if duration <= 0.0 {
        return Err(anyhow!(
            "ffprobe reported non-positive duration {} for {:?}",
            duration,
            path
        ));
    }
    debug!("Probed {:?}: {:.3}s", path, duration);
    Ok(duration)
}

/// Run an ffmpeg invocation to completion under a timeout.
pub async fn run_ffmpeg(args: &[String], timeout: Duration) -> Result<()> {
    debug!("ffmpeg {}", args.join(" "));
    run_with_timeout(Command::new("ffmpeg").args(args), timeout, "ffmpeg").await?;
    Ok(())
}

// Spawn, race against the deadline, and surface a filtered stderr on
// failure. A hung external process must not hang the run with it.
async fn run_with_timeout(
    command: &mut Command,
    timeout: Duration,
    tool: &str,
) -> Result<Vec<u8>> {
    let future = command.output();

    let output = tokio::select! {
        result = future => {
            result.map_err(|e| anyhow!("Failed to execute {} command: {}", tool, e))?
        },
        _ = tokio::time::sleep(timeout) => {
            return Err(anyhow!("{} command timed out after {:?}", tool, timeout));
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let filtered = filter_tool_stderr(&stderr);
        error!("{} failed: {}", tool, filtered);
        return Err(anyhow!("{} failed: {}", tool, filtered));
    }
    Ok(output.stdout)
}

// ffmpeg prints banners and progress noise on stderr; keep only the lines
// that say what went wrong.
fn filter_tool_stderr(stderr: &str) -> String {
    let meaningful: Vec<&str> = stderr
        .lines()
        .filter(|line| {
            let lower = line.to_lowercase();
            lower.contains("error") || lower.contains("invalid") || lower.contains("no such")
        })
        .collect();
    if meaningful.is_empty() {
        stderr.lines().rev().take(3).collect::<Vec<_>>().join("; ")
    } else {
        meaningful.join("; ")
    }
}
