/*!
 * Text sanitation for narration.
 *
 * Source bodies arrive full of URLs, markdown leftovers and characters that
 * trip narration engines. This module cleans a body down to speakable text,
 * prepares it for sentence splitting, and tidies thread titles for display.
 */

use once_cell::sync::Lazy;
use regex::Regex;

// @const: URL matcher, scheme optional
static URL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"((http|https)://)?[A-Za-z0-9./?:@\-_=#]+\.[A-Za-z]{2,6}([A-Za-z0-9.&/?:@\-_=#%]*)")
        .unwrap()
});

// @const: Characters the narration engines cope with
static SPEAKABLE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[^A-Za-z0-9 .,!?'"%$&/\-–:;()]"#).unwrap());

// @const: Runs of whitespace
static WHITESPACE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

// @const: Bracketed tags in titles, e.g. "[update]" or "[serious]"
static BRACKET_TAG_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[[^\]]*\]").unwrap());

/// Reduce a raw text to its speakable form.
///
/// Strips URLs, drops characters outside the narration-safe set and
/// collapses whitespace. Returns an empty string when nothing speakable
/// remains; callers treat that as "drop this text", not as an error.
pub fn sanitize_text(text: &str) -> String {
    let no_urls = URL_REGEX.replace_all(text, " ");
    let speakable = SPEAKABLE_REGEX.replace_all(&no_urls, " ");
    WHITESPACE_REGEX.replace_all(&speakable, " ").trim().to_string()
}

/// Prepare a post or comment body for segmentation.
///
/// Paragraph breaks become sentence breaks so the narration does not blend
/// them together, initialisms the engines mispronounce are spelled out, and
/// the body is guaranteed to end in terminal punctuation.
pub fn prepare_body(body: &str) -> String {
    let mut text = URL_REGEX.replace_all(body, " ").to_string();
    text = text.replace('\n', ". ");

    // Spoken as single words otherwise ("aye" / "aggy")
    static AI_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bAI\b").unwrap());
    static AGI_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bAGI\b").unwrap());
    text = AGI_REGEX.replace_all(&text, "A.G.I").to_string();
    text = AI_REGEX.replace_all(&text, "A.I").to_string();

    text = WHITESPACE_REGEX.replace_all(&text, " ").trim().to_string();

    // Collapse the stutter the newline replacement leaves behind
    while text.contains(". .") {
        text = text.replace(". .", ".");
    }
    while text.contains("..") {
        text = text.replace("..", ".");
    }

    if !text.is_empty() && !text.ends_with(['.', '!', '?']) {
        text.push('.');
    }
    text
}

/// Tidy a thread title for narration and filenames: bracketed tags such as
/// "[update]" are dropped and whitespace is collapsed.
pub fn clean_title(title: &str) -> String {
    let no_tags = BRACKET_TAG_REGEX.replace_all(title, "");
    WHITESPACE_REGEX.replace_all(&no_tags, " ").trim().to_string()
}
