use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use uuid::Uuid;

use crate::app_config::{Config, NarrationProvider};
use crate::captions::{CaptionRenderer, DrawtextRenderer, MockCaptionRenderer};
use crate::compositor::{Compositor, OverlaySpec};
use crate::errors::EngineError;
use crate::file_utils::FileManager;
use crate::narration::mock::MockEngine;
use crate::narration::piper::PiperEngine;
use crate::narration::streamelements::StreamElementsEngine;
use crate::narration::{NarrationEngine, RenderedAudio};
use crate::sanitize::{clean_title, prepare_body};
use crate::segmenter::{segment, NarrationUnit};
use crate::selection::{
    DedupLedger, ProducedLedger, ProducedRecord, ScanLimits, SelectedStory, SelectionOutcome,
    SelectionRules, Selector, StoryKind,
};
use crate::sources::reddit::RedditSource;
use crate::timeline::{build_timeline, total_duration, TimedUnit};

// @module: Application controller for video production

/// Terminal result of one production run
#[derive(Debug)]
pub enum RunOutcome {
    /// A finished video was written to this path
    Produced(PathBuf),
    /// No suitable candidate existed; nothing was produced
    NothingToDo,
}

/// Main application controller for story video production
pub struct Controller {
    // @field: App configuration
    config: Config,
}

impl Controller {
    /// Create a new controller for test purposes with default configuration
    pub fn new_for_test() -> Result<Self> {
        Self::with_config(Config::default())
    }

    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        Ok(Self { config })
    }

    /// Check if the controller is properly initialized with configuration
    pub fn is_initialized(&self) -> bool {
        !self.config.source.subreddit.is_empty()
    }

    /// Run one production pass: select a unit of text, narrate it, build
    /// the caption timeline and compose the final video.
    ///
    /// `thread_id` overrides both the configured thread id and the listing
    /// scan; `force` re-produces a thread that already has a video.
    pub async fn run(&self, thread_id: Option<String>, force: bool) -> Result<RunOutcome> {
        let storage = &self.config.storage;
        FileManager::ensure_dir(storage.data_dir())?;
        FileManager::sweep_stale_runs(storage.temp_root());

        let rules = SelectionRules::from_terms_file(
            self.config.selection.min_text_length,
            self.config.selection.max_text_length,
            &self.config.selection.blocked_terms_path,
        )?;
        let dedup = DedupLedger::open(storage.dedup_ledger_path());
        let produced = ProducedLedger::open(storage.produced_ledger_path());

        let source = RedditSource::new(&self.config.source)?;
        let selector = Selector {
            source: &source,
            rules: &rules,
            dedup: &dedup,
            produced: &produced,
            mode: self.config.selection.mode,
            allow_nsfw: self.config.selection.allow_nsfw,
            min_replies: self.config.selection.min_replies,
            story_length_range: (
                self.config.selection.story_min_length,
                self.config.selection.story_max_length,
            ),
            search_keywords: &self.config.source.search_keywords,
            limits: ScanLimits::from_unit_cap(self.config.selection.max_units_to_scan),
        };

        let explicit = thread_id.or_else(|| self.config.source.thread_id.clone());
        let story = match selector.select(explicit.as_deref(), force).await? {
            SelectionOutcome::Found(story) => story,
            SelectionOutcome::Exhausted => {
                info!("No suitable candidate found; skipping this run");
                return Ok(RunOutcome::NothingToDo);
            }
        };

        info!(
            "Selected {} unit {} from thread {} (\"{}\")",
            match story.kind {
                StoryKind::SelfPost => "self-post",
                StoryKind::Comment => "comment",
            },
            story.unit.id,
            story.thread_id,
            story.title
        );

        self.produce(&story, &dedup, &produced).await
    }

    // Turn a selected story into a finished video and update the ledgers.
    async fn produce(
        &self,
        story: &SelectedStory,
        dedup: &DedupLedger,
        produced: &ProducedLedger,
    ) -> Result<RunOutcome> {
        let engine = self.build_engine()?;
        let title = clean_title(&story.title);
        let prepared = prepare_body(&story.unit.text);

        // The engine's declared maximum wins over the configured limit
        let char_limit = self
            .config
            .segmenter
            .narration_char_limit
            .min(engine.max_chars());
        let units = segment(
            &prepared,
            char_limit,
            self.config.segmenter.caption_word_limit,
        );

        if units.is_empty() {
            // Permanently unusable: the text will still be empty next run,
            // so record it now to stop the retry loop.
            warn!(
                "Unit {} produced no narration units; recording as unusable",
                story.unit.id
            );
            match story.kind {
                StoryKind::Comment => dedup.record(&story.thread_id, &[story.unit.id.as_str()]),
                StoryKind::SelfPost => dedup.mark_source_unsuitable(&story.thread_id),
            }
            return Ok(RunOutcome::NothingToDo);
        }
        info!("Segmented into {} narration units", units.len());

        let run_dir = self
            .config
            .storage
            .temp_root()
            .join(Uuid::new_v4().to_string());
        FileManager::ensure_dir(&run_dir)?;

        let result = self
            .assemble(story, &title, &units, engine.as_ref(), &run_dir)
            .await;

        match result {
            Ok(output_path) => {
                let filename = output_path
                    .file_name()
                    .map(|name| name.to_string_lossy().to_string())
                    .unwrap_or_else(|| output_path.to_string_lossy().to_string());
                produced.append(ProducedRecord::now(&story.thread_id, &title, &filename));
                if story.kind == StoryKind::Comment {
                    dedup.record(&story.thread_id, &[story.unit.id.as_str()]);
                }
                if let Err(e) = FileManager::append_to_log_file(
                    self.config.storage.production_log_path(),
                    &format!("{} -> {}", story.thread_id, filename),
                ) {
                    warn!("Could not append to production log: {}", e);
                }

                FileManager::cleanup_run_dir(&run_dir);
                info!("Finished video written to {:?}", output_path);
                Ok(RunOutcome::Produced(output_path))
            }
            Err(e) => {
                // Render failures abort this unit only. The dedup ledger is
                // not updated, so the unit stays retryable - except when the
                // engine proved the text permanently unrenderable.
                if let Some(EngineError::EmptyText) = e.downcast_ref::<EngineError>() {
                    warn!(
                        "Unit {} is permanently unrenderable; recording it",
                        story.unit.id
                    );
                    match story.kind {
                        StoryKind::Comment => {
                            dedup.record(&story.thread_id, &[story.unit.id.as_str()]);
                        }
                        StoryKind::SelfPost => dedup.mark_source_unsuitable(&story.thread_id),
                    }
                }
                FileManager::cleanup_run_dir(&run_dir);
                Err(e)
            }
        }
    }

    // Everything between segmentation and the finished file. All assets
    // live in the run directory; only the final video leaves it.
    async fn assemble(
        &self,
        story: &SelectedStory,
        title: &str,
        units: &[NarrationUnit],
        engine: &dyn NarrationEngine,
        run_dir: &Path,
    ) -> Result<PathBuf> {
        let ext = audio_extension(engine);

        // Title narration is the timeline's fixed lead-in
        let title_text = prepare_body(title);
        let title_audio = engine
            .render(&title_text, &run_dir.join(format!("title.{}", ext)))
            .await
            .map_err(|e| anyhow::Error::new(e).context("Title narration failed"))?;

        let rendered = self
            .render_narration(engine, units, run_dir, ext)
            .await?;

        let timed: Vec<TimedUnit> = units
            .iter()
            .zip(rendered.iter())
            .map(|(unit, audio)| TimedUnit::new(unit.clone(), audio.duration_secs))
            .collect();
        let timeline = build_timeline(&timed, title_audio.duration_secs)?;
        let total_secs = total_duration(&timed, title_audio.duration_secs);
        info!(
            "Timeline: {} caption windows over {:.1}s",
            timeline.len(),
            total_secs
        );

        // Caption images: the title card plus one image per window
        let renderer = self.build_caption_renderer();
        let title_card = run_dir.join("title.png");
        renderer
            .render(title, &title_card)
            .await
            .map_err(|e| anyhow::Error::new(e).context("Title card render failed"))?;

        let mut overlays = vec![OverlaySpec {
            image: title_card,
            start_secs: 0.0,
            end_secs: title_audio.duration_secs,
        }];
        for (i, entry) in timeline.iter().enumerate() {
            let image = run_dir.join(format!("caption-{:04}.png", i));
            renderer
                .render(&entry.caption, &image)
                .await
                .map_err(|e| {
                    anyhow::Error::new(e).context(format!("Caption render failed for window {}", i))
                })?;
            overlays.push(OverlaySpec::from_entry(entry, image));
        }

        // Narration parts concatenate in unit order behind the title
        let compositor = Compositor::new(&self.config.video);
        let mut parts = vec![title_audio.path.clone()];
        parts.extend(rendered.iter().map(|audio| audio.path.clone()));
        let narration_track = compositor
            .concat_audio(&parts, &run_dir.join(format!("narration.{}", ext)))
            .await?;

        let output_dir = PathBuf::from(&self.config.video.output_dir);
        FileManager::ensure_dir(&output_dir)?;
        let output_path =
            FileManager::video_output_path(&output_dir, title, &story.thread_id);

        compositor
            .compose(
                Path::new(&self.config.video.background_path),
                &narration_track,
                &overlays,
                total_secs,
                &output_path,
            )
            .await
            .context("Video composition failed")
    }

    // Bounded-parallel narration rendering. The pool is a pure throughput
    // optimization; results are re-sorted into unit order before they
    // reach the synchronizer, because order is a correctness requirement.
    async fn render_narration(
        &self,
        engine: &dyn NarrationEngine,
        units: &[NarrationUnit],
        run_dir: &Path,
        ext: &str,
    ) -> Result<Vec<RenderedAudio>> {
        let max_concurrent = self.config.narration.concurrent_renders;
        let semaphore = Arc::new(Semaphore::new(max_concurrent));

        let progress = ProgressBar::new(units.len() as u64);
        progress.set_style(
            ProgressStyle::with_template("{spinner} [{bar:40}] {pos}/{len} narration")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );

        let results = stream::iter(units.iter())
            .map(|unit| {
                let semaphore = semaphore.clone();
                let progress = progress.clone();
                let path = run_dir.join(format!("unit-{:04}.{}", unit.index, ext));
                let text = unit.text.clone();
                let index = unit.index;
                async move {
                    // Acquire a permit from the semaphore
                    let _permit = semaphore
                        .acquire()
                        .await
                        .expect("Semaphore should not be closed");
                    let result = engine.render(&text, &path).await;
                    progress.inc(1);
                    (index, result)
                }
            })
            .buffer_unordered(max_concurrent)
            .collect::<Vec<_>>()
            .await;
        progress.finish_and_clear();

        // Restore original unit order before the synchronizer sees them
        let mut sorted = results;
        sorted.sort_by_key(|(index, _)| *index);

        let mut rendered = Vec::with_capacity(sorted.len());
        for (index, result) in sorted {
            let audio = result.map_err(|e| {
                anyhow::Error::new(e)
                    .context(format!("Narration render failed for unit {}", index))
            })?;
            rendered.push(audio);
        }
        Ok(rendered)
    }

    // @returns: The configured narration engine
    fn build_engine(&self) -> Result<Arc<dyn NarrationEngine>> {
        let engine: Arc<dyn NarrationEngine> = match self.config.narration.provider {
            NarrationProvider::StreamElements => {
                Arc::new(StreamElementsEngine::new(&self.config.narration)?)
            }
            NarrationProvider::Piper => Arc::new(PiperEngine::new(&self.config.narration)?),
            NarrationProvider::Mock => Arc::new(MockEngine::working()),
        };
        info!("Using {} narration engine", engine.name());
        Ok(engine)
    }

    // @returns: The caption renderer matching the narration provider
    fn build_caption_renderer(&self) -> Arc<dyn CaptionRenderer> {
        if self.config.narration.provider == NarrationProvider::Mock {
            return Arc::new(MockCaptionRenderer);
        }
        Arc::new(DrawtextRenderer::new(
            self.config.video.caption.clone(),
            self.config.video.width,
            self.config.video.height,
        ))
    }
}

fn audio_extension(engine: &dyn NarrationEngine) -> &'static str {
    match engine.name() {
        "piper" => "wav",
        _ => "mp3",
    }
}
