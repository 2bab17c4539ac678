/*!
 * # storycast - Story Narration Video Generator
 *
 * A Rust library for turning long-form social-media text into narrated,
 * caption-synchronized videos.
 *
 * ## Features
 *
 * - Pick one suitable unit of text (a self-text post or a single comment)
 *   from a thread, with dedup memory across runs
 * - Sentence-aware segmentation under narration and caption size limits
 * - Caption timeline built from measured narration audio durations
 * - Narration through hosted or local TTS engines
 * - Final video assembly over a looping background
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `content`: Content units, candidate trees and listings
 * - `selection`: Candidate selection:
 *   - `selection::rules`: The pure suitability predicate
 *   - `selection::ledger`: Persisted dedup and produced ledgers
 *   - `selection::selector`: Bounded BFS and widening listing walk
 * - `segmenter`: Dual-granularity text segmentation
 * - `timeline`: Caption display-window synchronization
 * - `sources`: Content source clients:
 *   - `sources::reddit`: Public JSON API client
 * - `narration`: Narration engine clients:
 *   - `narration::streamelements`: Hosted TTS client
 *   - `narration::piper`: Local TTS engine
 * - `captions`: Caption image rendering
 * - `compositor`: Final video assembly
 * - `app_controller`: Main application controller
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod captions;
pub mod compositor;
pub mod content;
pub mod errors;
pub mod file_utils;
pub mod media;
pub mod narration;
pub mod sanitize;
pub mod segmenter;
pub mod selection;
pub mod sources;
pub mod timeline;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::{Controller, RunOutcome};
pub use content::{CandidateNode, CandidateTree, ContentUnit, Thread};
pub use errors::{AppError, EngineError, LedgerError, SourceError};
pub use segmenter::{segment, NarrationUnit};
pub use selection::{SelectionOutcome, SelectionRules, Selector};
pub use timeline::{build_timeline, TimelineEntry};
