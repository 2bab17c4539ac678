/*!
 * Tests for caption timeline synchronization
 */

use storycast::segmenter::NarrationUnit;
use storycast::timeline::{build_timeline, total_duration, TimedUnit, TimelineEntry};

const EPSILON: f64 = 1e-9;

fn unit_with_chunks(index: usize, chunks: &[&str]) -> NarrationUnit {
    NarrationUnit::new(
        index,
        chunks.join(" "),
        chunks.iter().map(|c| c.to_string()).collect(),
    )
}

/// Test the canonical scenario: 2.0s over 2 chunks, then 4.0s over 4
#[test]
fn test_build_timeline_withTwoUnits_shouldEmitSixContiguousWindows() {
    let units = vec![
        TimedUnit::new(unit_with_chunks(0, &["one two", "three four"]), 2.0),
        TimedUnit::new(unit_with_chunks(1, &["a", "b", "c", "d"]), 4.0),
    ];
    let timeline = build_timeline(&units, 0.0).expect("timeline should build");

    assert_eq!(timeline.len(), 6);
    let expected = [
        (0.0, 1.0),
        (1.0, 2.0),
        (2.0, 3.0),
        (3.0, 4.0),
        (4.0, 5.0),
        (5.0, 6.0),
    ];
    for (entry, (start, end)) in timeline.iter().zip(expected.iter()) {
        assert!((entry.start_secs - start).abs() < EPSILON);
        assert!((entry.end_secs - end).abs() < EPSILON);
    }

    let total: f64 = timeline.iter().map(TimelineEntry::duration_secs).sum();
    assert!((total - 6.0).abs() < EPSILON);
}

/// Test the lead-in shifts the whole timeline without stretching it
#[test]
fn test_build_timeline_withLeadIn_shouldStartAfterIt() {
    let units = vec![TimedUnit::new(unit_with_chunks(0, &["x", "y"]), 3.0)];
    let timeline = build_timeline(&units, 1.5).expect("timeline should build");

    assert!((timeline[0].start_secs - 1.5).abs() < EPSILON);
    assert!((timeline[1].end_secs - 4.5).abs() < EPSILON);
}

/// Test per-unit windows are contiguous and sum to the measured duration
#[test]
fn test_build_timeline_withUnevenChunks_shouldCoverEachUnitExactly() {
    let units = vec![
        TimedUnit::new(unit_with_chunks(0, &["a", "b", "c"]), 1.0),
        TimedUnit::new(unit_with_chunks(1, &["d"]), 0.7),
        TimedUnit::new(unit_with_chunks(2, &["e", "f", "g", "h", "i"]), 2.3),
    ];
    let timeline = build_timeline(&units, 0.25).expect("timeline should build");
    assert_eq!(timeline.len(), 9);

    // Globally contiguous: every window starts where the previous ended
    for pair in timeline.windows(2) {
        assert!(
            (pair[1].start_secs - pair[0].end_secs).abs() < EPSILON,
            "gap between {} and {}",
            pair[0],
            pair[1]
        );
    }

    // Per-unit coverage
    let first_unit: f64 = timeline[0..3].iter().map(TimelineEntry::duration_secs).sum();
    assert!((first_unit - 1.0).abs() < EPSILON);
    let last_unit: f64 = timeline[4..9].iter().map(TimelineEntry::duration_secs).sum();
    assert!((last_unit - 2.3).abs() < EPSILON);

    // Unit boundaries land exactly on the running clock
    assert!((timeline[3].start_secs - 1.25).abs() < EPSILON);
    assert!((timeline[4].start_secs - 1.95).abs() < EPSILON);
}

/// Test chunk texts appear in unit order
#[test]
fn test_build_timeline_withChunkedUnits_shouldPreserveTextOrder() {
    let units = vec![
        TimedUnit::new(unit_with_chunks(0, &["first", "second"]), 1.0),
        TimedUnit::new(unit_with_chunks(1, &["third"]), 1.0),
    ];
    let timeline = build_timeline(&units, 0.0).expect("timeline should build");
    let captions: Vec<&str> = timeline.iter().map(|e| e.caption.as_str()).collect();
    assert_eq!(captions, vec!["first", "second", "third"]);
}

/// Test invalid inputs are rejected
#[test]
fn test_build_timeline_withBadInput_shouldFail() {
    let no_chunks = vec![TimedUnit::new(
        NarrationUnit::new(0, "text".to_string(), vec![]),
        1.0,
    )];
    assert!(build_timeline(&no_chunks, 0.0).is_err());

    let zero_duration = vec![TimedUnit::new(unit_with_chunks(0, &["a"]), 0.0)];
    assert!(build_timeline(&zero_duration, 0.0).is_err());
}

/// Test entry validation rules
#[test]
fn test_timeline_entry_validation_withBadWindow_shouldFail() {
    assert!(TimelineEntry::new_validated("ok".to_string(), 0.0, 1.0).is_ok());
    assert!(TimelineEntry::new_validated("bad".to_string(), 1.0, 1.0).is_err());
    assert!(TimelineEntry::new_validated("bad".to_string(), -0.5, 1.0).is_err());
}

/// Test total duration accounting
#[test]
fn test_total_duration_withLeadIn_shouldSumEverything() {
    let units = vec![
        TimedUnit::new(unit_with_chunks(0, &["a"]), 2.0),
        TimedUnit::new(unit_with_chunks(1, &["b"]), 4.0),
    ];
    assert!((total_duration(&units, 1.5) - 7.5).abs() < EPSILON);
    assert!((total_duration(&[], 0.0)).abs() < EPSILON);
}

/// Test an empty unit list yields an empty timeline
#[test]
fn test_build_timeline_withNoUnits_shouldYieldEmpty() {
    let timeline = build_timeline(&[], 3.0).expect("empty timeline should build");
    assert!(timeline.is_empty());
}
