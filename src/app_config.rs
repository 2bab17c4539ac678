use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::path::{Path, PathBuf};

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Content source settings
    #[serde(default)]
    pub source: SourceConfig,

    /// Candidate selection settings
    #[serde(default)]
    pub selection: SelectionConfig,

    /// Segmentation settings
    #[serde(default)]
    pub segmenter: SegmenterConfig,

    /// Narration engine settings
    #[serde(default)]
    pub narration: NarrationConfig,

    /// Video output settings
    #[serde(default)]
    pub video: VideoConfig,

    /// Persistent storage settings
    #[serde(default)]
    pub storage: StorageConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Narration provider type
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum NarrationProvider {
    // @provider: StreamElements hosted TTS
    #[default]
    StreamElements,
    // @provider: Piper local TTS
    Piper,
    // @provider: In-memory mock (tests and dry runs)
    Mock,
}

impl NarrationProvider {
    // @returns: Capitalized provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::StreamElements => "StreamElements",
            Self::Piper => "Piper",
            Self::Mock => "Mock",
        }
    }

    // @returns: Lowercase provider identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::StreamElements => "streamelements".to_string(),
            Self::Piper => "piper".to_string(),
            Self::Mock => "mock".to_string(),
        }
    }
}

// Implement Display trait for NarrationProvider
impl std::fmt::Display for NarrationProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

// Implement FromStr trait for NarrationProvider
impl std::str::FromStr for NarrationProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "streamelements" => Ok(Self::StreamElements),
            "piper" => Ok(Self::Piper),
            "mock" => Ok(Self::Mock),
            _ => Err(anyhow!("Invalid provider type: {}", s)),
        }
    }
}

/// How the unit of text to narrate is chosen
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    /// Narrate the thread's own self-text body
    #[default]
    Story,
    /// Narrate the first suitable comment found in the reply tree
    Comment,
}

/// Content source configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SourceConfig {
    /// Subreddit the listings are read from
    #[serde(default = "default_subreddit")]
    pub subreddit: String,

    /// Base URL of the source API
    #[serde(default = "default_source_endpoint")]
    pub endpoint: String,

    /// User-Agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Thread id to use instead of scanning listings
    #[serde(default)]
    pub thread_id: Option<String>,

    /// Keywords a candidate thread must mention; empty disables the gate
    #[serde(default)]
    pub search_keywords: Vec<String>,

    /// Number of threads requested per listing
    #[serde(default = "default_listing_limit")]
    pub listing_limit: u32,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retry count for transient failures
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Base backoff in milliseconds, doubled on each retry
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            subreddit: default_subreddit(),
            endpoint: default_source_endpoint(),
            user_agent: default_user_agent(),
            thread_id: None,
            search_keywords: Vec::new(),
            listing_limit: default_listing_limit(),
            timeout_secs: default_timeout_secs(),
            retry_count: default_retry_count(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

/// Candidate selection configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SelectionConfig {
    /// Story or comment selection
    #[serde(default)]
    pub mode: SelectionMode,

    /// Inclusive minimum comment length in characters
    #[serde(default = "default_min_text_length")]
    pub min_text_length: usize,

    /// Inclusive maximum comment length in characters
    #[serde(default = "default_max_text_length")]
    pub max_text_length: usize,

    /// Minimum reply count for a thread in comment mode
    #[serde(default = "default_min_replies")]
    pub min_replies: u64,

    /// Whether NSFW-flagged threads may be used
    #[serde(default)]
    pub allow_nsfw: bool,

    /// JSON file with the blocked-term list
    #[serde(default = "default_blocked_terms_path")]
    pub blocked_terms_path: String,

    /// Cap on units run through the suitability predicate per thread
    #[serde(default = "default_max_units_to_scan")]
    pub max_units_to_scan: usize,

    /// Inclusive minimum self-text length for story mode
    #[serde(default = "default_story_min_length")]
    pub story_min_length: usize,

    /// Inclusive maximum self-text length for story mode
    #[serde(default = "default_story_max_length")]
    pub story_max_length: usize,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            mode: SelectionMode::default(),
            min_text_length: default_min_text_length(),
            max_text_length: default_max_text_length(),
            min_replies: default_min_replies(),
            allow_nsfw: false,
            blocked_terms_path: default_blocked_terms_path(),
            max_units_to_scan: default_max_units_to_scan(),
            story_min_length: default_story_min_length(),
            story_max_length: default_story_max_length(),
        }
    }
}

/// Segmentation configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SegmenterConfig {
    /// Maximum characters per narration piece; clamped to the engine's
    /// declared maximum at startup
    #[serde(default = "default_narration_char_limit")]
    pub narration_char_limit: usize,

    /// Maximum words per caption chunk; 0 keeps a piece as one chunk
    #[serde(default = "default_caption_word_limit")]
    pub caption_word_limit: usize,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            narration_char_limit: default_narration_char_limit(),
            caption_word_limit: default_caption_word_limit(),
        }
    }
}

/// Narration engine configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NarrationConfig {
    /// Narration provider to use
    #[serde(default)]
    pub provider: NarrationProvider,

    /// Service URL (HTTP providers)
    #[serde(default = "default_narration_endpoint")]
    pub endpoint: String,

    /// Voice identifier (HTTP providers)
    #[serde(default = "default_voice")]
    pub voice: String,

    /// Voice model path (local providers)
    #[serde(default = "String::new")]
    pub model_path: String,

    /// Render timeout in seconds
    #[serde(default = "default_render_timeout_secs")]
    pub timeout_secs: u64,

    /// Max concurrent render requests
    #[serde(default = "default_concurrent_renders")]
    pub concurrent_renders: usize,
}

impl Default for NarrationConfig {
    fn default() -> Self {
        Self {
            provider: NarrationProvider::default(),
            endpoint: default_narration_endpoint(),
            voice: default_voice(),
            model_path: String::new(),
            timeout_secs: default_render_timeout_secs(),
            concurrent_renders: default_concurrent_renders(),
        }
    }
}

/// Caption styling
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CaptionStyle {
    /// Font file path; empty uses the ffmpeg default font
    #[serde(default = "String::new")]
    pub font_file: String,

    /// Text color
    #[serde(default = "default_font_color")]
    pub font_color: String,

    /// Font size in pixels
    #[serde(default = "default_font_size")]
    pub font_size: u32,

    /// Outline width in pixels
    #[serde(default = "default_border_width")]
    pub border_width: u32,

    /// Outline color
    #[serde(default = "default_border_color")]
    pub border_color: String,
}

impl Default for CaptionStyle {
    fn default() -> Self {
        Self {
            font_file: String::new(),
            font_color: default_font_color(),
            font_size: default_font_size(),
            border_width: default_border_width(),
            border_color: default_border_color(),
        }
    }
}

/// Video output configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct VideoConfig {
    /// Background video looped under the narration
    #[serde(default = "default_background_path")]
    pub background_path: String,

    /// Output frame width
    #[serde(default = "default_video_width")]
    pub width: u32,

    /// Output frame height
    #[serde(default = "default_video_height")]
    pub height: u32,

    /// Whether the background's own audio is mixed in
    #[serde(default)]
    pub mix_background_audio: bool,

    /// Background audio volume when mixed (0.0 - 1.0)
    #[serde(default = "default_background_audio_volume")]
    pub background_audio_volume: f64,

    /// Directory finished videos are written to
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Composition timeout in seconds
    #[serde(default = "default_compose_timeout_secs")]
    pub compose_timeout_secs: u64,

    /// Caption styling
    #[serde(default)]
    pub caption: CaptionStyle,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            background_path: default_background_path(),
            width: default_video_width(),
            height: default_video_height(),
            mix_background_audio: false,
            background_audio_volume: default_background_audio_volume(),
            output_dir: default_output_dir(),
            compose_timeout_secs: default_compose_timeout_secs(),
            caption: CaptionStyle::default(),
        }
    }
}

/// Persistent storage configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct StorageConfig {
    /// Data directory; empty uses the platform data dir
    #[serde(default = "String::new")]
    pub data_dir: String,
}

impl StorageConfig {
    /// Resolved data directory
    pub fn data_dir(&self) -> PathBuf {
        if !self.data_dir.is_empty() {
            return PathBuf::from(&self.data_dir);
        }
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("storycast")
    }

    /// Path of the consumed-unit / unsuitable-source store
    pub fn dedup_ledger_path(&self) -> PathBuf {
        self.data_dir().join("used_units.json")
    }

    /// Path of the already-produced store
    pub fn produced_ledger_path(&self) -> PathBuf {
        self.data_dir().join("produced.json")
    }

    /// Root for per-run working directories
    pub fn temp_root(&self) -> PathBuf {
        self.data_dir().join("tmp")
    }

    /// Path of the plain-text production log
    pub fn production_log_path(&self) -> PathBuf {
        self.data_dir().join("production.log")
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    // @returns: log crate level filter
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_subreddit() -> String {
    "AskReddit".to_string()
}

fn default_source_endpoint() -> String {
    "https://www.reddit.com".to_string()
}

fn default_user_agent() -> String {
    format!("storycast/{}", env!("CARGO_PKG_VERSION"))
}

fn default_listing_limit() -> u32 {
    25
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_retry_count() -> u32 {
    3 // Default to 3 retries
}

fn default_retry_backoff_ms() -> u64 {
    1000 // 1 second base backoff time, doubled on each retry
}

fn default_min_text_length() -> usize {
    80
}

fn default_max_text_length() -> usize {
    2000
}

fn default_min_replies() -> u64 {
    10
}

fn default_blocked_terms_path() -> String {
    "blocked_terms.json".to_string()
}

fn default_max_units_to_scan() -> usize {
    500
}

fn default_story_min_length() -> usize {
    30
}

fn default_story_max_length() -> usize {
    2000
}

fn default_narration_char_limit() -> usize {
    250
}

fn default_caption_word_limit() -> usize {
    3
}

fn default_narration_endpoint() -> String {
    "https://api.streamelements.com/kappa/v2".to_string()
}

fn default_voice() -> String {
    "Brian".to_string()
}

fn default_render_timeout_secs() -> u64 {
    60
}

fn default_concurrent_renders() -> usize {
    4
}

fn default_font_color() -> String {
    "white".to_string()
}

fn default_font_size() -> u32 {
    56
}

fn default_border_width() -> u32 {
    3
}

fn default_border_color() -> String {
    "black".to_string()
}

fn default_background_path() -> String {
    "assets/background.mp4".to_string()
}

fn default_video_width() -> u32 {
    1080
}

fn default_video_height() -> u32 {
    1920
}

fn default_background_audio_volume() -> f64 {
    0.15
}

fn default_output_dir() -> String {
    "output".to_string()
}

fn default_compose_timeout_secs() -> u64 {
    600
}

impl Config {
    /// Load a configuration file, or fall back to defaults when the file
    /// does not exist yet.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Config::default());
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Write a default configuration file for the user to edit.
    pub fn create_default_file<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        let payload = serde_json::to_string_pretty(&Config::default())
            .context("Failed to encode default config")?;
        std::fs::write(path, payload)
            .with_context(|| format!("Failed to write config file {}", path.display()))?;
        Ok(())
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if self.source.subreddit.trim().is_empty() {
            return Err(anyhow!("source.subreddit must not be empty"));
        }
        url::Url::parse(&self.source.endpoint)
            .map_err(|e| anyhow!("source.endpoint is not a valid URL: {}", e))?;

        if self.selection.min_text_length > self.selection.max_text_length {
            return Err(anyhow!(
                "selection.min_text_length {} exceeds max_text_length {}",
                self.selection.min_text_length,
                self.selection.max_text_length
            ));
        }
        if self.selection.story_min_length > self.selection.story_max_length {
            return Err(anyhow!(
                "selection.story_min_length {} exceeds story_max_length {}",
                self.selection.story_min_length,
                self.selection.story_max_length
            ));
        }
        if self.selection.max_units_to_scan == 0 {
            return Err(anyhow!("selection.max_units_to_scan must be at least 1"));
        }

        if self.segmenter.narration_char_limit == 0 {
            return Err(anyhow!("segmenter.narration_char_limit must be at least 1"));
        }

        if self.narration.concurrent_renders == 0 {
            return Err(anyhow!("narration.concurrent_renders must be at least 1"));
        }
        match self.narration.provider {
            NarrationProvider::Piper => {
                if self.narration.model_path.trim().is_empty() {
                    return Err(anyhow!(
                        "narration.model_path is required for the Piper provider"
                    ));
                }
            }
            NarrationProvider::StreamElements => {
                url::Url::parse(&self.narration.endpoint)
                    .map_err(|e| anyhow!("narration.endpoint is not a valid URL: {}", e))?;
            }
            NarrationProvider::Mock => {}
        }

        if self.video.width == 0 || self.video.height == 0 {
            return Err(anyhow!("video dimensions must be non-zero"));
        }

        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            source: SourceConfig::default(),
            selection: SelectionConfig::default(),
            segmenter: SegmenterConfig::default(),
            narration: NarrationConfig::default(),
            video: VideoConfig::default(),
            storage: StorageConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
