/*!
 * Suitability rules for candidate content units.
 *
 * The predicate is pure: given a unit, the set of already-consumed ids and
 * an explicit rule object, it returns an accept/reject verdict with the
 * first failing reason. Identical inputs always yield identical verdicts,
 * which is what lets a crashed run re-derive the same selection later.
 */

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use log::{debug, warn};
use regex::Regex;

use crate::content::ContentUnit;
use crate::sanitize::sanitize_text;

/// Why a candidate was rejected
#[derive(Debug, Clone, PartialEq)]
pub enum RejectReason {
    /// Pinned by moderators
    Stickied,
    /// Body is a removal/deletion placeholder
    DeletedOrRemoved,
    /// Nothing speakable left after sanitation
    EmptyAfterSanitize,
    /// Body matched a blocked term; carries the term that matched
    BlockedTerm(String),
    /// Body length outside the configured range; carries the actual length
    LengthOutOfRange(usize),
    /// Author absent (anonymized or deleted account)
    NoAuthor,
    /// Unit id already recorded as consumed for this source
    AlreadyUsed,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Stickied => write!(f, "stickied"),
            Self::DeletedOrRemoved => write!(f, "deleted or removed"),
            Self::EmptyAfterSanitize => write!(f, "empty after sanitization"),
            Self::BlockedTerm(term) => write!(f, "contains blocked term '{}'", term),
            Self::LengthOutOfRange(len) => write!(f, "length {} out of range", len),
            Self::NoAuthor => write!(f, "author absent"),
            Self::AlreadyUsed => write!(f, "already used"),
        }
    }
}

/// Outcome of a suitability evaluation
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Accepted,
    Rejected(RejectReason),
}

impl Verdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accepted)
    }
}

/// Explicit rule set handed to the predicate.
///
/// Constructed once at startup from configuration and passed by reference;
/// there is no hidden module-level state to reload or to stub in tests.
#[derive(Debug)]
pub struct SelectionRules {
    /// Inclusive lower bound on raw body length
    pub min_text_length: usize,
    /// Inclusive upper bound on raw body length
    pub max_text_length: usize,
    /// Blocked terms with their word-boundary matchers
    blocked: Vec<(String, Regex)>,
}

impl SelectionRules {
    /// Build a rule set from explicit terms - used by tests and callers
    /// that do not load terms from a file.
    pub fn new(min_text_length: usize, max_text_length: usize, terms: &[String]) -> Result<Self> {
        let mut blocked = Vec::with_capacity(terms.len());
        for term in terms {
            let term = term.trim().to_lowercase();
            if term.is_empty() {
                continue;
            }
            let pattern = format!(r"(?i)\b{}\b", regex::escape(&term));
            let re = Regex::new(&pattern)
                .with_context(|| format!("Invalid blocked term '{}'", term))?;
            blocked.push((term, re));
        }
        Ok(SelectionRules {
            min_text_length,
            max_text_length,
            blocked,
        })
    }

    /// Load the blocked-term list from a JSON array file.
    ///
    /// A missing or malformed file disables the term filter with a warning;
    /// it never aborts a run.
    pub fn from_terms_file<P: AsRef<Path>>(
        min_text_length: usize,
        max_text_length: usize,
        path: P,
    ) -> Result<Self> {
        let path = path.as_ref();
        let terms: Vec<String> = if path.exists() {
            match std::fs::read_to_string(path)
                .map_err(anyhow::Error::from)
                .and_then(|raw| serde_json::from_str(&raw).map_err(anyhow::Error::from))
            {
                Ok(terms) => terms,
                Err(e) => {
                    warn!(
                        "Could not load blocked terms from {}: {}. Term filter disabled.",
                        path.display(),
                        e
                    );
                    Vec::new()
                }
            }
        } else {
            warn!(
                "Blocked-term file {} not found. Term filter disabled.",
                path.display()
            );
            Vec::new()
        };
        Self::new(min_text_length, max_text_length, &terms)
    }

    /// First blocked term appearing in the text as a whole word, if any.
    pub fn blocked_term_in(&self, text: &str) -> Option<&str> {
        self.blocked
            .iter()
            .find(|(_, re)| re.is_match(text))
            .map(|(term, _)| term.as_str())
    }

    /// Number of loaded blocked terms
    pub fn blocked_term_count(&self) -> usize {
        self.blocked.len()
    }
}

/// Evaluate one content unit against the rules.
///
/// Checks run in a fixed order and short-circuit on the first failure; the
/// order exists for diagnostics, the result would be a rejection either way.
pub fn evaluate(
    unit: &ContentUnit,
    consumed: &HashSet<String>,
    rules: &SelectionRules,
) -> Verdict {
    if unit.stickied {
        return reject(unit, RejectReason::Stickied);
    }
    if unit.removed || ContentUnit::is_removal_placeholder(&unit.text) {
        return reject(unit, RejectReason::DeletedOrRemoved);
    }

    if sanitize_text(&unit.text).is_empty() {
        return reject(unit, RejectReason::EmptyAfterSanitize);
    }

    if let Some(term) = rules.blocked_term_in(&unit.text) {
        return reject(unit, RejectReason::BlockedTerm(term.to_string()));
    }

    let len = unit.text.chars().count();
    if len < rules.min_text_length || len > rules.max_text_length {
        return reject(unit, RejectReason::LengthOutOfRange(len));
    }

    if unit.author.is_none() {
        return reject(unit, RejectReason::NoAuthor);
    }
    if consumed.contains(&unit.id) {
        return reject(unit, RejectReason::AlreadyUsed);
    }

    Verdict::Accepted
}

fn reject(unit: &ContentUnit, reason: RejectReason) -> Verdict {
    debug!("Unit {} rejected: {}", unit.id, reason);
    Verdict::Rejected(reason)
}
