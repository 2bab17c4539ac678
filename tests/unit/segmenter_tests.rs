/*!
 * Tests for dual-granularity segmentation
 */

use storycast::segmenter::{segment, split_sentences, NarrationUnit};
use storycast::sanitize::sanitize_text;

/// Test the canonical two-sentence scenario with a three-word caption limit
#[test]
fn test_segment_withShortSentences_shouldChunkByWordLimit() {
    let text = "Hi. This is a test sentence that should not be split.";
    let units = segment(text, 1000, 3);

    assert_eq!(units.len(), 2);
    assert_eq!(units[0].text, "Hi.");
    assert_eq!(units[0].caption_chunks, vec!["Hi."]);

    assert_eq!(
        units[1].caption_chunks,
        vec!["This is a", "test sentence that", "should not be", "split."]
    );
}

/// Test word-content round-trip with chunking disabled
#[test]
fn test_segment_withZeroCaptionLimit_shouldReconstructWordSequence() {
    let text = "One two three. Four five six! Seven eight, nine ten?";
    let units = segment(text, 1000, 0);

    let rebuilt: Vec<String> = units
        .iter()
        .flat_map(|u| u.text.split_whitespace().map(|w| w.to_string()))
        .collect();
    let expected: Vec<String> = sanitize_text(text)
        .split_whitespace()
        .map(|w| w.to_string())
        .collect();
    assert_eq!(rebuilt, expected);

    // Zero means a whole piece is one chunk
    for unit in &units {
        assert_eq!(unit.caption_chunks.len(), 1);
        assert_eq!(unit.caption_chunks[0], unit.text);
    }
}

/// Test long-sentence splitting respects the character limit and word order
#[test]
fn test_segment_withLongSentence_shouldPackWordsUnderLimit() {
    let limit = 40;
    let text = "This particular sentence keeps going with more and more words so that \
                it cannot possibly fit inside one narration piece at all.";
    let units = segment(text, limit, 0);
    assert!(units.len() > 1);

    for unit in &units {
        assert!(
            unit.text.chars().count() <= limit,
            "piece '{}' exceeds limit",
            unit.text
        );
    }

    // No word was split or dropped across piece boundaries
    let rebuilt: Vec<&str> = units
        .iter()
        .flat_map(|u| u.text.split_whitespace())
        .collect();
    let sanitized = sanitize_text(text);
    let expected: Vec<&str> = sanitized.split_whitespace().collect();
    assert_eq!(rebuilt, expected);
}

/// Test a single word longer than the limit passes through whole
#[test]
fn test_segment_withOversizedWord_shouldEmitWordUnsplit() {
    let word = "Pneumonoultramicroscopicsilicovolcanoconiosis";
    let units = segment(word, 10, 0);

    assert_eq!(units.len(), 1);
    assert_eq!(units[0].text, word);
    assert!(units[0].text.chars().count() > 10);
}

/// Test empty and whitespace-only input yields an empty list
#[test]
fn test_segment_withEmptyInput_shouldYieldNothing() {
    assert!(segment("", 100, 3).is_empty());
    assert!(segment("   \n\n  ", 100, 3).is_empty());
}

/// Test a sentence that sanitizes to nothing is dropped
#[test]
fn test_segment_withUrlOnlySentence_shouldDropIt() {
    let text = "https://example.com/some/page. It was wild.";
    let units = segment(text, 1000, 0);

    assert_eq!(units.len(), 1);
    assert_eq!(units[0].text, "It was wild.");
}

/// Test unit indices follow original sentence order
#[test]
fn test_segment_withMultipleSentences_shouldIndexInOrder() {
    let text = "Alpha one. Bravo two. Charlie three.";
    let units = segment(text, 1000, 2);
    let indices: Vec<usize> = units.iter().map(|u| u.index).collect();
    assert_eq!(indices, vec![0, 1, 2]);
}

/// Test newlines are treated as plain whitespace before splitting
#[test]
fn test_segment_withNewlines_shouldCollapseThem() {
    let units = segment("First line.\nStill the first sentence goes on.", 1000, 0);
    assert_eq!(units.len(), 2);
    assert_eq!(units[1].text, "Still the first sentence goes on.");
}

/// Test the last caption chunk may be shorter than the limit
#[test]
fn test_segment_withUnevenWordCount_shouldAllowShortLastChunk() {
    let units = segment("Alpha bravo charlie delta echo.", 1000, 2);
    assert_eq!(units.len(), 1);
    assert_eq!(
        units[0].caption_chunks,
        vec!["Alpha bravo", "charlie delta", "echo."]
    );
}

/// Test validated construction rejects chunk/word mismatches
#[test]
fn test_narration_unit_validation_withWordMismatch_shouldFail() {
    let ok = NarrationUnit::new_validated(
        0,
        "one two three".to_string(),
        vec!["one two".to_string(), "three".to_string()],
    );
    assert!(ok.is_ok());

    let dropped_word = NarrationUnit::new_validated(
        0,
        "one two three".to_string(),
        vec!["one two".to_string()],
    );
    assert!(dropped_word.is_err());

    let empty = NarrationUnit::new_validated(1, "  ".to_string(), vec![]);
    assert!(empty.is_err());
}

/// Test sentence splitting keeps quoted endings attached
#[test]
fn test_split_sentences_withQuotedEnding_shouldKeepQuote() {
    let sentences = split_sentences("She said \"stop.\" Then she left.");
    assert_eq!(sentences.len(), 2);
    assert!(sentences[0].ends_with('"'));
}
