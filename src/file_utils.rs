use anyhow::{Context, Result};
use chrono::Local;
use log::{debug, warn};
use std::fs;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

// @module: File and directory utilities

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_file()
    }

    // @checks: Directory existence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_dir()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            fs::create_dir_all(path)?;
        }
        Ok(())
    }

    /// Read a file to a string
    pub fn read_to_string<P: AsRef<Path>>(path: P) -> Result<String> {
        fs::read_to_string(&path)
            .with_context(|| format!("Failed to read file: {:?}", path.as_ref()))
    }

    /// Write a string to a file
    pub fn write_to_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        // Ensure the parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            Self::ensure_dir(parent)?;
        }

        fs::write(&path, content)
            .with_context(|| format!("Failed to write to file: {:?}", path.as_ref()))?;
        Ok(())
    }

    // @generates: Output path for a finished video
    // @params: output_dir, thread title, thread id
    pub fn video_output_path<P: AsRef<Path>>(output_dir: P, title: &str, thread_id: &str) -> PathBuf {
        let stem = Self::sanitize_filename(title);
        let mut filename = if stem.is_empty() {
            thread_id.to_string()
        } else {
            format!("{}-{}", stem, thread_id)
        };
        filename.push_str(".mp4");
        output_dir.as_ref().join(filename)
    }

    /// Reduce arbitrary text to a safe filename stem
    pub fn sanitize_filename(text: &str) -> String {
        let mut stem: String = text
            .chars()
            .map(|c| {
                if c.is_alphanumeric() {
                    c
                } else if c.is_whitespace() || c == '-' || c == '_' {
                    '-'
                } else {
                    '\0'
                }
            })
            .filter(|c| *c != '\0')
            .collect();

        while stem.contains("--") {
            stem = stem.replace("--", "-");
        }
        stem.trim_matches('-').chars().take(80).collect()
    }

    /// Remove a finished run's working directory
    pub fn cleanup_run_dir<P: AsRef<Path>>(path: P) {
        let path = path.as_ref();
        if let Err(e) = fs::remove_dir_all(path) {
            warn!("Failed to remove run directory {:?}: {}", path, e);
        } else {
            debug!("Removed run directory {:?}", path);
        }
    }

    /// Remove working directories left behind by crashed runs.
    ///
    /// Partial assets are worthless once their run aborted: the ledger was
    /// not updated, so the next run re-derives everything from scratch.
    pub fn sweep_stale_runs<P: AsRef<Path>>(temp_root: P) {
        let temp_root = temp_root.as_ref();
        if !temp_root.exists() {
            return;
        }

        let stale: Vec<PathBuf> = WalkDir::new(temp_root)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_dir())
            .map(|entry| entry.path().to_path_buf())
            .collect();

        for dir in stale {
            warn!("Sweeping stale run directory {:?}", dir);
            Self::cleanup_run_dir(&dir);
        }
    }

    /// Append content to a log file with timestamp
    pub fn append_to_log_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        // Get current timestamp
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();

        // Ensure the parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            Self::ensure_dir(parent)?;
        }

        // Open file in append mode, create if it doesn't exist
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open log file: {:?}", path.as_ref()))?;

        // Write content with timestamp
        writeln!(file, "[{}] {}", timestamp, content)
            .with_context(|| format!("Failed to write to log file: {:?}", path.as_ref()))?;

        Ok(())
    }
}
