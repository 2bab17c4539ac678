/*!
 * Candidate selection.
 *
 * Picks exactly one unit of text to narrate: either a thread's self-text
 * body (story mode) or the first suitable comment found by a bounded
 * breadth-first scan of the reply tree (comment mode). Thread candidates
 * come from a flat listing that is widened through a fixed schedule of
 * scopes when nothing qualifies. The outcome is a tagged result; there is
 * no sentinel value threading through call layers.
 */

use std::collections::{HashSet, VecDeque};

use anyhow::Result;
use log::{debug, info, warn};

use crate::app_config::SelectionMode;
use crate::content::{CandidateNode, ContentUnit, ListingScope, Thread, TimeFilter};
use crate::sanitize::sanitize_text;
use crate::selection::ledger::{DedupLedger, ProducedLedger};
use crate::selection::rules::{evaluate, RejectReason, SelectionRules, Verdict};
use crate::sources::ContentSource;

/// Listing scopes tried in order when nothing in the current listing
/// qualifies. The schedule length bounds the widening attempts.
pub const WIDENING_SCHEDULE: [ListingScope; 6] = [
    ListingScope::Hot,
    ListingScope::Top(TimeFilter::Day),
    ListingScope::Top(TimeFilter::Week),
    ListingScope::Top(TimeFilter::Month),
    ListingScope::Top(TimeFilter::Year),
    ListingScope::Top(TimeFilter::All),
];

// @struct: Caps on tree traversal work
#[derive(Debug, Clone, Copy)]
pub struct ScanLimits {
    // @field: Maximum units run through the suitability predicate
    pub max_units_evaluated: usize,

    // @field: Maximum tree nodes popped (markers count here, not above)
    pub max_tree_nodes: usize,
}

impl ScanLimits {
    /// Derive both caps from the configured unit cap; pagination markers
    /// and deep reply chains make the node count run well ahead of the
    /// evaluation count.
    pub fn from_unit_cap(cap: usize) -> Self {
        ScanLimits {
            max_units_evaluated: cap,
            max_tree_nodes: cap.saturating_mul(3),
        }
    }
}

/// What kind of text a selection produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoryKind {
    /// The thread's own self-text body
    SelfPost,
    /// A single comment read as the story
    Comment,
}

/// A successful selection
#[derive(Debug, Clone)]
pub struct SelectedStory {
    /// Identifier of the thread the unit came from
    pub thread_id: String,
    /// Cleaned-up thread title
    pub title: String,
    /// The selected unit
    pub unit: ContentUnit,
    /// Which mode produced the selection
    pub kind: StoryKind,
}

/// Terminal result of a selection attempt
#[derive(Debug)]
pub enum SelectionOutcome {
    /// First acceptable unit in traversal order; no scoring among
    /// multiple acceptable units.
    Found(SelectedStory),
    /// Every candidate was rejected or the scan caps were reached
    Exhausted,
}

// Traversal accounting; decides whether an exhausted tree is permanently
// unsuitable or just not exhausted yet.
#[derive(Debug, Default)]
struct BfsStats {
    units_evaluated: usize,
    nodes_processed: usize,
    rejected_already_used: usize,
    hit_unit_cap: bool,
    hit_node_cap: bool,
}

impl BfsStats {
    // A fruitless scan proves the source unsuitable only when the whole
    // tree was seen and no rejection depended on the dedup set.
    fn proves_source_unsuitable(&self) -> bool {
        !self.hit_unit_cap && !self.hit_node_cap && self.rejected_already_used == 0
    }
}

/// One-shot candidate selector over a content source
pub struct Selector<'a> {
    /// Source collaborator used for listings, threads and pagination
    pub source: &'a dyn ContentSource,
    /// Suitability rules for comment evaluation
    pub rules: &'a SelectionRules,
    /// Consumed-unit / unsuitable-source memory
    pub dedup: &'a DedupLedger,
    /// Already-produced memory
    pub produced: &'a ProducedLedger,
    /// Story or comment selection
    pub mode: SelectionMode,
    /// Whether NSFW-flagged threads may be used
    pub allow_nsfw: bool,
    /// Minimum reply count for comment mode
    pub min_replies: u64,
    /// Story-mode body length bounds, inclusive
    pub story_length_range: (usize, usize),
    /// Keyword gate; empty means no gating
    pub search_keywords: &'a [String],
    /// Traversal caps
    pub limits: ScanLimits,
}

impl Selector<'_> {
    /// Select one unit of text to narrate.
    ///
    /// With an explicit thread id the listing walk is skipped; otherwise
    /// listings are scanned through the widening schedule. Source errors
    /// propagate; "nothing qualified" is the `Exhausted` outcome, not an
    /// error.
    pub async fn select(
        &self,
        explicit_thread_id: Option<&str>,
        force: bool,
    ) -> Result<SelectionOutcome> {
        if let Some(thread_id) = explicit_thread_id {
            if self.produced.contains(thread_id) && !force {
                info!(
                    "Thread {} already has a produced video (use --force to redo it)",
                    thread_id
                );
                return Ok(SelectionOutcome::Exhausted);
            }
            let thread = self.source.fetch_thread(thread_id).await?;
            return match self.try_thread(&thread).await? {
                Some(story) => Ok(SelectionOutcome::Found(story)),
                None => Ok(SelectionOutcome::Exhausted),
            };
        }

        for scope in &WIDENING_SCHEDULE {
            debug!("Scanning {} listing", scope);
            let candidates = self.source.fetch_listing(scope).await?;
            for candidate in &candidates {
                if !self.thread_qualifies(candidate, force) {
                    continue;
                }
                let thread = self.source.fetch_thread(&candidate.id).await?;
                if let Some(story) = self.try_thread(&thread).await? {
                    return Ok(SelectionOutcome::Found(story));
                }
            }
            info!("No suitable thread in {} listing, widening scope", scope);
        }

        info!("Widening schedule exhausted without a suitable thread");
        Ok(SelectionOutcome::Exhausted)
    }

    // Listing-level filter. Cheap checks only; rejected threads are not
    // fetched in full.
    fn thread_qualifies(&self, candidate: &ContentUnit, force: bool) -> bool {
        if self.produced.contains(&candidate.id) && !force {
            debug!("Thread {} skipped: already produced", candidate.id);
            return false;
        }
        if self.dedup.is_source_unsuitable(&candidate.id) {
            debug!("Thread {} skipped: marked unsuitable", candidate.id);
            return false;
        }
        if candidate.nsfw && !self.allow_nsfw {
            debug!("Thread {} skipped: NSFW", candidate.id);
            return false;
        }
        if candidate.stickied {
            debug!("Thread {} skipped: stickied", candidate.id);
            return false;
        }

        match self.mode {
            SelectionMode::Comment => {
                if candidate.reply_count < self.min_replies {
                    debug!(
                        "Thread {} skipped: {} replies (< {})",
                        candidate.id, candidate.reply_count, self.min_replies
                    );
                    // Reply counts only grow, but a thread this quiet will
                    // not be worth rescanning on every run.
                    self.dedup.mark_source_unsuitable(&candidate.id);
                    return false;
                }
            }
            SelectionMode::Story => {
                let len = candidate.text.chars().count();
                let (min, max) = self.story_length_range;
                if len < min || len > max {
                    debug!("Thread {} skipped: body length {} out of range", candidate.id, len);
                    return false;
                }
            }
        }
        true
    }

    // Thread-level selection once the full thread is fetched.
    async fn try_thread(&self, thread: &Thread) -> Result<Option<SelectedStory>> {
        if !self.passes_keyword_gate(thread).await {
            info!(
                "Thread {} skipped: keywords {:?} not present",
                thread.post.id, self.search_keywords
            );
            self.dedup.mark_source_unsuitable(&thread.post.id);
            return Ok(None);
        }

        match self.mode {
            SelectionMode::Story => Ok(self.select_self_post(thread)),
            SelectionMode::Comment => self.select_comment(thread).await,
        }
    }

    // Story mode: the thread body itself is the unit.
    fn select_self_post(&self, thread: &Thread) -> Option<SelectedStory> {
        let post = &thread.post;
        if post.removed || ContentUnit::is_removal_placeholder(&post.text) {
            debug!("Thread {} skipped: body removed", post.id);
            return None;
        }
        if sanitize_text(&post.text).is_empty() {
            debug!("Thread {} skipped: body empty after sanitization", post.id);
            return None;
        }
        if let Some(term) = self
            .rules
            .blocked_term_in(&thread.title)
            .or_else(|| self.rules.blocked_term_in(&post.text))
        {
            info!("Thread {} skipped: blocked term '{}'", post.id, term);
            self.dedup.mark_source_unsuitable(&post.id);
            return None;
        }

        Some(SelectedStory {
            thread_id: post.id.clone(),
            title: thread.title.clone(),
            unit: post.clone(),
            kind: StoryKind::SelfPost,
        })
    }

    // Comment mode: bounded BFS for the first suitable comment.
    async fn select_comment(&self, thread: &Thread) -> Result<Option<SelectedStory>> {
        if thread.post.reply_count == 0 && thread.replies.is_empty() {
            info!("Thread {} has no replies; marking unsuitable", thread.post.id);
            self.dedup.mark_source_unsuitable(&thread.post.id);
            return Ok(None);
        }
        if let Some(term) = self.rules.blocked_term_in(&thread.title) {
            info!(
                "Thread {} skipped: title contains blocked term '{}'",
                thread.post.id, term
            );
            self.dedup.mark_source_unsuitable(&thread.post.id);
            return Ok(None);
        }

        let consumed = self.dedup.consumed_for(&thread.post.id);
        let mut stats = BfsStats::default();
        let found = self
            .bfs_first_suitable(thread.replies.clone(), &consumed, &mut stats)
            .await;

        debug!(
            "BFS over thread {}: {} units evaluated, {} nodes processed",
            thread.post.id, stats.units_evaluated, stats.nodes_processed
        );

        match found {
            Some(unit) => Ok(Some(SelectedStory {
                thread_id: thread.post.id.clone(),
                title: thread.title.clone(),
                unit,
                kind: StoryKind::Comment,
            })),
            None => {
                if stats.proves_source_unsuitable() {
                    info!(
                        "Thread {} has no qualifying comments; marking unsuitable",
                        thread.post.id
                    );
                    self.dedup.mark_source_unsuitable(&thread.post.id);
                }
                Ok(None)
            }
        }
    }

    // Bounded breadth-first traversal. First accepted unit wins; rejected
    // units have their children enqueued; pagination markers are expanded
    // through the source and count toward the node cap only.
    async fn bfs_first_suitable(
        &self,
        seeds: Vec<CandidateNode>,
        consumed: &HashSet<String>,
        stats: &mut BfsStats,
    ) -> Option<ContentUnit> {
        let mut queue: VecDeque<CandidateNode> = seeds.into();

        while let Some(node) = queue.pop_front() {
            if stats.units_evaluated >= self.limits.max_units_evaluated {
                stats.hit_unit_cap = true;
                break;
            }
            if stats.nodes_processed >= self.limits.max_tree_nodes {
                stats.hit_node_cap = true;
                break;
            }
            stats.nodes_processed += 1;

            match node {
                CandidateNode::Unit(tree) => {
                    stats.units_evaluated += 1;
                    match evaluate(&tree.unit, consumed, self.rules) {
                        Verdict::Accepted => {
                            debug!(
                                "Accepted unit {} after evaluating {} units",
                                tree.unit.id, stats.units_evaluated
                            );
                            return Some(tree.unit);
                        }
                        Verdict::Rejected(RejectReason::AlreadyUsed) => {
                            stats.rejected_already_used += 1;
                        }
                        Verdict::Rejected(_) => {}
                    }
                    self.enqueue_children(&mut queue, tree.children, stats);
                }
                CandidateNode::More(marker) => match self.source.expand_more(&marker).await {
                    Ok(children) => self.enqueue_children(&mut queue, children, stats),
                    Err(e) => {
                        warn!("Failed to expand pagination marker {}: {}", marker.id, e);
                    }
                },
            }

            if stats.nodes_processed > 0 && stats.nodes_processed % 200 == 0 {
                debug!(
                    "BFS progress: {} nodes processed, {} units evaluated",
                    stats.nodes_processed, stats.units_evaluated
                );
            }
        }

        if stats.hit_unit_cap {
            info!(
                "BFS stopped: evaluation cap of {} reached",
                self.limits.max_units_evaluated
            );
        } else if stats.hit_node_cap {
            info!(
                "BFS stopped: node cap of {} reached",
                self.limits.max_tree_nodes
            );
        }
        None
    }

    fn enqueue_children(
        &self,
        queue: &mut VecDeque<CandidateNode>,
        children: Vec<CandidateNode>,
        stats: &BfsStats,
    ) {
        for child in children {
            if stats.nodes_processed + queue.len() >= self.limits.max_tree_nodes {
                break;
            }
            queue.push_back(child);
        }
    }

    // The keyword gate is a single predicate applied once per candidate
    // thread: a title hit qualifies; in comment mode a hit anywhere in the
    // scanned replies also qualifies.
    async fn passes_keyword_gate(&self, thread: &Thread) -> bool {
        if self.search_keywords.is_empty() {
            return true;
        }
        let title = thread.title.to_lowercase();
        let body = thread.post.text.to_lowercase();
        if self
            .search_keywords
            .iter()
            .any(|kw| title.contains(&kw.to_lowercase()) || body.contains(&kw.to_lowercase()))
        {
            return true;
        }
        if self.mode == SelectionMode::Comment {
            return self.keyword_in_replies(thread).await;
        }
        false
    }

    // Bounded scan of the reply tree for any keyword occurrence.
    async fn keyword_in_replies(&self, thread: &Thread) -> bool {
        let needles: Vec<String> = self
            .search_keywords
            .iter()
            .map(|kw| kw.to_lowercase())
            .collect();

        let mut queue: VecDeque<CandidateNode> = thread.replies.clone().into();
        let mut nodes_processed = 0usize;

        while let Some(node) = queue.pop_front() {
            if nodes_processed >= self.limits.max_tree_nodes {
                break;
            }
            nodes_processed += 1;

            match node {
                CandidateNode::Unit(tree) => {
                    let body = tree.unit.text.to_lowercase();
                    if needles.iter().any(|kw| body.contains(kw)) {
                        return true;
                    }
                    for child in tree.children {
                        if nodes_processed + queue.len() >= self.limits.max_tree_nodes {
                            break;
                        }
                        queue.push_back(child);
                    }
                }
                CandidateNode::More(marker) => match self.source.expand_more(&marker).await {
                    Ok(children) => {
                        for child in children {
                            if nodes_processed + queue.len() >= self.limits.max_tree_nodes {
                                break;
                            }
                            queue.push_back(child);
                        }
                    }
                    Err(e) => {
                        warn!("Failed to expand pagination marker {}: {}", marker.id, e);
                    }
                },
            }
        }
        false
    }
}
