use std::fmt;

use anyhow::{anyhow, Result};

use crate::sanitize::sanitize_text;

// @module: Sentence-aware dual-granularity segmentation

/// Period-terminated tokens that do not end a sentence.
const ABBREVIATIONS: [&str; 13] = [
    "mr", "mrs", "ms", "dr", "prof", "sr", "jr", "st", "vs", "etc", "e.g", "i.e", "approx",
];

// @struct: One narration-engine-sized piece of text with its caption chunks
#[derive(Debug, Clone, PartialEq)]
pub struct NarrationUnit {
    // @field: Position in the original text, zero-based
    pub index: usize,

    // @field: Text handed to the narration engine
    pub text: String,

    // @field: On-screen caption chunks derived from the text
    pub caption_chunks: Vec<String>,
}

impl NarrationUnit {
    /// Creates a new narration unit - used by tests and external consumers
    #[allow(dead_code)]
    pub fn new(index: usize, text: String, caption_chunks: Vec<String>) -> Self {
        NarrationUnit {
            index,
            text,
            caption_chunks,
        }
    }

    // @creates: Validated narration unit
    // @validates: Non-empty text and chunk/word agreement
    pub fn new_validated(index: usize, text: String, caption_chunks: Vec<String>) -> Result<Self> {
        if text.trim().is_empty() {
            return Err(anyhow!("Empty narration text for unit {}", index));
        }

        let unit_words: Vec<&str> = text.split_whitespace().collect();
        let chunk_words: Vec<&str> = caption_chunks
            .iter()
            .flat_map(|c| c.split_whitespace())
            .collect();
        if unit_words != chunk_words {
            return Err(anyhow!(
                "Caption chunks of unit {} do not reconstruct its words",
                index
            ));
        }

        Ok(NarrationUnit {
            index,
            text,
            caption_chunks,
        })
    }
}

impl fmt::Display for NarrationUnit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "#{} [{} chars, {} chunks]",
            self.index,
            self.text.chars().count(),
            self.caption_chunks.len()
        )
    }
}

/// Split a block of text into narration units.
///
/// Sentences are detected first; any sentence longer than
/// `narration_char_limit` is greedily packed into pieces that never exceed
/// the limit and never split a word. Each resulting piece is then packed
/// into caption chunks of at most `caption_word_limit` words
/// (`0` keeps the whole piece as a single chunk).
///
/// Empty input yields an empty list; callers treat that as "nothing to
/// narrate", not as an error.
pub fn segment(
    text: &str,
    narration_char_limit: usize,
    caption_word_limit: usize,
) -> Vec<NarrationUnit> {
    let flattened = text.replace('\n', " ");

    let mut units = Vec::new();
    for sentence in split_sentences(&flattened) {
        let clean = sanitize_text(&sentence);
        if clean.is_empty() {
            continue;
        }

        let pieces = if clean.chars().count() > narration_char_limit {
            pack_words_by_chars(&clean, narration_char_limit)
        } else {
            vec![clean]
        };

        for piece in pieces {
            let chunks = chunk_by_words(&piece, caption_word_limit);
            if chunks.is_empty() {
                continue;
            }
            let index = units.len();
            units.push(NarrationUnit {
                index,
                text: piece,
                caption_chunks: chunks,
            });
        }
    }
    units
}

/// Greedily pack whitespace-delimited words into pieces of at most
/// `char_limit` characters. A single word longer than the limit becomes its
/// own oversized piece; truncating it would drop narration content.
fn pack_words_by_chars(text: &str, char_limit: usize) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        let sep = usize::from(current_len > 0);
        if current_len + sep + word_len > char_limit && current_len > 0 {
            pieces.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if current_len > 0 {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(word);
        current_len += word_len;
    }
    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}

/// Pack the words of a narration piece into caption chunks of at most
/// `word_limit` words each; the last chunk may be shorter. A limit of zero
/// keeps the whole piece as one chunk.
fn chunk_by_words(piece: &str, word_limit: usize) -> Vec<String> {
    if word_limit == 0 {
        return if piece.trim().is_empty() {
            Vec::new()
        } else {
            vec![piece.to_string()]
        };
    }

    let words: Vec<&str> = piece.split_whitespace().collect();
    words
        .chunks(word_limit)
        .map(|chunk| chunk.join(" "))
        .collect()
}

/// Split text into sentences.
///
/// A terminal `.`/`!`/`?` (plus any trailing quotes or closing brackets)
/// ends a sentence when followed by whitespace and an uppercase letter,
/// digit or opening quote. Periods after known abbreviations or single
/// initials do not break, and neither do decimals like "3.5" (no gap).
pub fn split_sentences(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut sentences = Vec::new();
    let mut start = 0usize;
    let mut i = 0usize;

    while i < chars.len() {
        let c = chars[i];
        if c != '.' && c != '!' && c != '?' {
            i += 1;
            continue;
        }

        // Swallow the punctuation run and any closing quote marks
        let mut end = i + 1;
        while end < chars.len()
            && matches!(chars[end], '.' | '!' | '?' | '"' | '\'' | ')' | '\u{201d}' | '\u{2019}')
        {
            end += 1;
        }

        // First non-whitespace character after the run
        let mut next = end;
        while next < chars.len() && chars[next].is_whitespace() {
            next += 1;
        }

        let has_gap = next >= chars.len() || next > end;
        let breaks = if !has_gap {
            false
        } else if c == '.' && is_non_breaking_period(&chars, i) {
            false
        } else if next >= chars.len() {
            true
        } else {
            let following = chars[next];
            c != '.' || following.is_uppercase() || following.is_ascii_digit()
                || matches!(following, '"' | '\'' | '\u{201c}' | '\u{2018}')
        };

        if breaks {
            let sentence: String = chars[start..end].iter().collect();
            let trimmed = sentence.trim();
            if !trimmed.is_empty() {
                sentences.push(trimmed.to_string());
            }
            start = next;
        }
        i = end;
    }

    if start < chars.len() {
        let sentence: String = chars[start..].iter().collect();
        let trimmed = sentence.trim();
        if !trimmed.is_empty() {
            sentences.push(trimmed.to_string());
        }
    }
    sentences
}

// A period preceded by an abbreviation or a lone initial is not a boundary.
fn is_non_breaking_period(chars: &[char], period_idx: usize) -> bool {
    let mut k = period_idx;
    while k > 0 && (chars[k - 1].is_alphanumeric() || chars[k - 1] == '.') {
        k -= 1;
    }
    let token: String = chars[k..period_idx].iter().collect();
    let token = token.trim_end_matches('.').to_lowercase();

    if token.len() == 1 && token.chars().all(|c| c.is_alphabetic()) {
        return true;
    }
    ABBREVIATIONS.contains(&token.as_str())
}
