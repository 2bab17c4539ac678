/*!
 * End-to-end pipeline tests over the in-memory collaborators: selection,
 * preparation, segmentation, narration rendering and timeline assembly.
 */

use futures::stream::{self, StreamExt};

use storycast::app_config::SelectionMode;
use storycast::narration::mock::MockEngine;
use storycast::narration::NarrationEngine;
use storycast::sanitize::{clean_title, prepare_body};
use storycast::segmenter::segment;
use storycast::selection::{
    DedupLedger, ProducedLedger, ScanLimits, SelectionOutcome, Selector,
};
use storycast::sources::mock::MockSource;
use storycast::timeline::{build_timeline, total_duration, TimedUnit};

use crate::common;

const EPSILON: f64 = 1e-9;

fn story_thread() -> storycast::content::Thread {
    let body = "I found a wallet on the train yesterday. It had three hundred dollars \
                inside and no identification at all. After a week of asking around, \
                the owner finally turned up at the station office.";
    common::thread("t1", "[found] The wallet story", body, vec![])
}

/// Test the whole pipeline from selection to a synchronized timeline
#[tokio::test]
async fn test_pipeline_withMockCollaborators_shouldBuildSynchronizedTimeline() {
    common::init_logging();
    let dir = tempfile::tempdir().expect("tempdir");
    let dedup = DedupLedger::open(dir.path().join("used_units.json"));
    let produced = ProducedLedger::open(dir.path().join("produced.json"));
    let rules = common::open_rules();

    let source = MockSource::new().with_thread(story_thread());
    let selector = Selector {
        source: &source,
        rules: &rules,
        dedup: &dedup,
        produced: &produced,
        mode: SelectionMode::Story,
        allow_nsfw: false,
        min_replies: 0,
        story_length_range: (30, 5000),
        search_keywords: &[],
        limits: ScanLimits::from_unit_cap(100),
    };

    // Selection
    let story = match selector.select(Some("t1"), false).await.expect("select") {
        SelectionOutcome::Found(story) => story,
        SelectionOutcome::Exhausted => panic!("expected a selection"),
    };
    let title = clean_title(&story.title);
    assert_eq!(title, "The wallet story");

    // Segmentation
    let prepared = prepare_body(&story.unit.text);
    let units = segment(&prepared, 250, 3);
    assert!(units.len() >= 3, "three sentences expected");

    // Narration rendering, title first
    let engine = MockEngine::working().with_rate(0.5);
    let title_audio = engine
        .render(&prepare_body(&title), &dir.path().join("title.mp3"))
        .await
        .expect("title render");

    let mut rendered = Vec::new();
    for unit in &units {
        let path = dir.path().join(format!("unit-{:04}.mp3", unit.index));
        let audio = engine.render(&unit.text, &path).await.expect("unit render");
        assert!(path.exists(), "narration asset should be on disk");
        rendered.push(audio);
    }

    // Timeline
    let timed: Vec<TimedUnit> = units
        .iter()
        .zip(rendered.iter())
        .map(|(unit, audio)| TimedUnit::new(unit.clone(), audio.duration_secs))
        .collect();
    let timeline = build_timeline(&timed, title_audio.duration_secs).expect("timeline");

    let expected_entries: usize = units.iter().map(|u| u.caption_chunks.len()).sum();
    assert_eq!(timeline.len(), expected_entries);

    // Starts after the title lead-in and stays contiguous throughout
    assert!((timeline[0].start_secs - title_audio.duration_secs).abs() < EPSILON);
    for pair in timeline.windows(2) {
        assert!((pair[1].start_secs - pair[0].end_secs).abs() < EPSILON);
    }

    // The last window ends exactly at the total narration duration
    let total = total_duration(&timed, title_audio.duration_secs);
    assert!((timeline.last().expect("entries").end_secs - total).abs() < EPSILON);
}

/// Test parallel rendering reassembles results into unit order
#[tokio::test]
async fn test_pipeline_withConcurrentRenders_shouldRestoreUnitOrder() {
    let dir = tempfile::tempdir().expect("tempdir");
    let text = "Alpha one two. Bravo three four. Charlie five six. Delta seven eight. \
                Echo nine ten.";
    let units = segment(text, 250, 0);
    assert_eq!(units.len(), 5);

    let engine = MockEngine::working().with_rate(0.25);
    let results = stream::iter(units.iter())
        .map(|unit| {
            let path = dir.path().join(format!("unit-{:04}.mp3", unit.index));
            let engine = &engine;
            let text = unit.text.clone();
            let index = unit.index;
            async move { (index, engine.render(&text, &path).await) }
        })
        .buffer_unordered(4)
        .collect::<Vec<_>>()
        .await;

    let mut sorted = results;
    sorted.sort_by_key(|(index, _)| *index);

    for (position, (index, result)) in sorted.iter().enumerate() {
        assert_eq!(position, *index);
        let audio = result.as_ref().expect("render should succeed");
        let words = units[*index].text.split_whitespace().count() as f64;
        assert!((audio.duration_secs - words * 0.25).abs() < EPSILON);
    }
    assert_eq!(engine.render_calls(), 5);
}

/// Test a failing render is an error for the whole unit, not a silent skip
#[tokio::test]
async fn test_pipeline_withFailingRender_shouldAbortBeforeTimeline() {
    let dir = tempfile::tempdir().expect("tempdir");
    let units = segment("One sentence here. Another sentence there. And a third one.", 250, 0);
    assert_eq!(units.len(), 3);

    let engine = MockEngine::intermittent(2);
    let mut rendered = Vec::new();
    let mut failed = false;
    for unit in &units {
        let path = dir.path().join(format!("unit-{:04}.mp3", unit.index));
        match engine.render(&unit.text, &path).await {
            Ok(audio) => rendered.push(TimedUnit::new(unit.clone(), audio.duration_secs)),
            Err(_) => {
                failed = true;
                break;
            }
        }
    }

    assert!(failed, "the second render should fail");
    // The pipeline contract: no timeline is built from a partial render set
    assert!(rendered.len() < units.len());
}

/// Test an exhausted source is a clean skip, not an error
#[tokio::test]
async fn test_pipeline_withEmptySource_shouldSkipCleanly() {
    let dir = tempfile::tempdir().expect("tempdir");
    let dedup = DedupLedger::open(dir.path().join("used_units.json"));
    let produced = ProducedLedger::open(dir.path().join("produced.json"));
    let rules = common::open_rules();
    let source = MockSource::new();

    let selector = Selector {
        source: &source,
        rules: &rules,
        dedup: &dedup,
        produced: &produced,
        mode: SelectionMode::Comment,
        allow_nsfw: false,
        min_replies: 0,
        story_length_range: (30, 5000),
        search_keywords: &[],
        limits: ScanLimits::from_unit_cap(100),
    };

    let outcome = selector.select(None, false).await.expect("select");
    assert!(matches!(outcome, SelectionOutcome::Exhausted));
}

/// Test comment-mode selection feeds the same downstream pipeline
#[tokio::test]
async fn test_pipeline_withCommentMode_shouldNarrateTheComment() {
    let dir = tempfile::tempdir().expect("tempdir");
    let dedup = DedupLedger::open(dir.path().join("used_units.json"));
    let produced = ProducedLedger::open(dir.path().join("produced.json"));
    let rules = common::open_rules();

    let source = MockSource::new().with_thread(common::thread(
        "t1",
        "A question for everyone",
        "the post body",
        vec![common::leaf("c1", &common::long_body())],
    ));

    let selector = Selector {
        source: &source,
        rules: &rules,
        dedup: &dedup,
        produced: &produced,
        mode: SelectionMode::Comment,
        allow_nsfw: false,
        min_replies: 0,
        story_length_range: (30, 5000),
        search_keywords: &[],
        limits: ScanLimits::from_unit_cap(100),
    };

    let story = match selector.select(Some("t1"), false).await.expect("select") {
        SelectionOutcome::Found(story) => story,
        SelectionOutcome::Exhausted => panic!("expected the comment"),
    };
    assert_eq!(story.unit.id, "c1");

    let units = segment(&prepare_body(&story.unit.text), 250, 4);
    assert!(!units.is_empty());

    // Word-content round trip through chunking
    for unit in &units {
        let chunk_words: Vec<&str> = unit
            .caption_chunks
            .iter()
            .flat_map(|c| c.split_whitespace())
            .collect();
        let unit_words: Vec<&str> = unit.text.split_whitespace().collect();
        assert_eq!(chunk_words, unit_words);
        for chunk in &unit.caption_chunks {
            assert!(chunk.split_whitespace().count() <= 4);
        }
    }

    // After production the comment id would be recorded; the next
    // selection must then skip it
    dedup.record("t1", &[story.unit.id.as_str()]);
    let second = selector.select(Some("t1"), false).await.expect("select");
    assert!(matches!(second, SelectionOutcome::Exhausted));
}
