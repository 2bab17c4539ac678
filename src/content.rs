use std::fmt;

// @module: Content units and candidate trees fetched from a source

/// Bodies the source substitutes when a unit has been taken down.
const REMOVAL_PLACEHOLDERS: [&str; 2] = ["[removed]", "[deleted]"];

// @struct: One discrete piece of source text (post body or comment)
#[derive(Debug, Clone)]
pub struct ContentUnit {
    // @field: Identifier, unique within a source
    pub id: String,

    // @field: Raw text body
    pub text: String,

    // @field: Author name; absent means anonymized or deleted
    pub author: Option<String>,

    // @field: Pinned by moderators
    pub stickied: bool,

    // @field: Body is a removal/deletion placeholder
    pub removed: bool,

    // @field: Marked not-safe-for-work at the source
    pub nsfw: bool,

    // @field: Number of direct replies reported by the source
    pub reply_count: u64,

    // @field: Canonical URL of the unit, when the source provides one
    pub permalink: Option<String>,
}

impl ContentUnit {
    /// Create a minimal unit; the remaining flags default to off.
    pub fn new(id: impl Into<String>, text: impl Into<String>, author: Option<String>) -> Self {
        let text = text.into();
        let removed = Self::is_removal_placeholder(&text);
        ContentUnit {
            id: id.into(),
            text,
            author,
            stickied: false,
            removed,
            nsfw: false,
            reply_count: 0,
            permalink: None,
        }
    }

    /// Whether a body is one of the source's removal placeholders.
    pub fn is_removal_placeholder(body: &str) -> bool {
        REMOVAL_PLACEHOLDERS.contains(&body.trim())
    }
}

impl fmt::Display for ContentUnit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ({} chars)", self.id, self.text.len())
    }
}

/// Lazy "more children" marker left in a reply tree by pagination
#[derive(Debug, Clone)]
pub struct PaginationMarker {
    /// Marker identifier
    pub id: String,
    /// Thread the marker belongs to; expansion requests need it
    pub thread_id: String,
    /// Identifiers of the children hidden behind the marker
    pub child_ids: Vec<String>,
}

/// One node of a candidate reply tree.
///
/// Everything downstream branches on this enum and never on runtime shape:
/// a node is either a concrete unit with its subtree, or a pagination
/// marker that the source can expand into more nodes.
#[derive(Debug, Clone)]
pub enum CandidateNode {
    /// A concrete unit plus its replies
    Unit(CandidateTree),
    /// A pagination marker to be expanded through the source
    More(PaginationMarker),
}

/// A content unit together with its (possibly paginated) replies
#[derive(Debug, Clone)]
pub struct CandidateTree {
    /// The unit at this node
    pub unit: ContentUnit,
    /// Child nodes, in source order
    pub children: Vec<CandidateNode>,
}

impl CandidateTree {
    /// Leaf tree with no replies
    pub fn leaf(unit: ContentUnit) -> Self {
        CandidateTree {
            unit,
            children: Vec::new(),
        }
    }
}

/// A fetched thread: the top-level post plus its reply tree
#[derive(Debug, Clone)]
pub struct Thread {
    /// Thread title, as the source reports it
    pub title: String,
    /// The post itself as a content unit (`text` is the self-text body)
    pub post: ContentUnit,
    /// Top-level replies
    pub replies: Vec<CandidateNode>,
}

/// Time window for a "top" listing request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeFilter {
    Day,
    Week,
    Month,
    Year,
    All,
}

impl TimeFilter {
    // @returns: Source API query value
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
            Self::All => "all",
        }
    }
}

/// Which listing of candidate threads to request from the source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingScope {
    /// Currently trending threads
    Hot,
    /// Top threads within a time window
    Top(TimeFilter),
}

impl fmt::Display for ListingScope {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Hot => write!(f, "hot"),
            Self::Top(t) => write!(f, "top/{}", t.as_str()),
        }
    }
}
