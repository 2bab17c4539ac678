use anyhow::{anyhow, Result};
use log::{debug, warn};
use rand::Rng;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use url::Url;

use async_trait::async_trait;

use crate::app_config::SourceConfig;
use crate::content::{
    CandidateNode, CandidateTree, ContentUnit, ListingScope, PaginationMarker, Thread,
};
use crate::errors::SourceError;
use crate::sources::ContentSource;

/// Reddit client over the public JSON API
///
/// Read-only access: listings, full threads with reply trees, and
/// morechildren expansion. No OAuth; the endpoint serves unauthenticated
/// JSON as long as a distinctive User-Agent is sent.
#[derive(Debug)]
pub struct RedditSource {
    /// Base URL of the API
    base_url: String,
    /// Subreddit the listings are read from
    subreddit: String,
    /// HTTP client for making requests
    client: Client,
    /// User-Agent header value
    user_agent: String,
    /// Maximum number of retry attempts for transient failures
    max_retries: u32,
    /// Base backoff time in milliseconds for exponential backoff
    backoff_base_ms: u64,
    /// Number of threads requested per listing
    listing_limit: u32,
}

/// Author name the source substitutes for deleted accounts.
const DELETED_AUTHOR: &str = "[deleted]";

// Listing response shapes; only the fields the selector needs.
#[derive(Debug, Deserialize)]
struct ThreadData {
    id: String,
    title: String,
    #[serde(default)]
    selftext: String,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    stickied: bool,
    #[serde(default)]
    over_18: bool,
    #[serde(default)]
    num_comments: u64,
    #[serde(default)]
    permalink: Option<String>,
}

impl RedditSource {
    /// Build a client from the source configuration.
    pub fn new(config: &SourceConfig) -> Result<Self> {
        Url::parse(&config.endpoint)
            .map_err(|e| anyhow!("Invalid source endpoint '{}': {}", config.endpoint, e))?;
        if config.subreddit.trim().is_empty() {
            return Err(anyhow!("Source subreddit must not be empty"));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| anyhow!("Failed to build HTTP client: {}", e))?;

        Ok(RedditSource {
            base_url: config.endpoint.trim_end_matches('/').to_string(),
            subreddit: normalize_subreddit(&config.subreddit),
            client,
            user_agent: config.user_agent.clone(),
            max_retries: config.retry_count,
            backoff_base_ms: config.retry_backoff_ms,
            listing_limit: config.listing_limit,
        })
    }

    // GET with bounded retries. 4xx auth/not-found failures are final;
    // connection errors, 429 and 5xx retry with exponential backoff plus
    // a little jitter so parallel runs do not retry in lockstep.
    async fn get_json(&self, url: &str) -> Result<Value, SourceError> {
        let mut last_failure = String::new();

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let backoff = self.backoff_base_ms * (1 << (attempt - 1)) as u64;
                let jitter = rand::rng().random_range(0..250);
                tokio::time::sleep(Duration::from_millis(backoff + jitter)).await;
                debug!("Retrying {} (attempt {})", url, attempt + 1);
            }

            let response = match self
                .client
                .get(url)
                .header(reqwest::header::USER_AGENT, &self.user_agent)
                .send()
                .await
            {
                Ok(response) => response,
                Err(e) => {
                    last_failure = format!("request error: {}", e);
                    continue;
                }
            };

            let status = response.status();
            if status.is_success() {
                return response
                    .json::<Value>()
                    .await
                    .map_err(|e| SourceError::Parse(e.to_string()));
            }

            match status.as_u16() {
                401 | 403 => {
                    return Err(SourceError::Unauthorized(format!(
                        "{} answered {}",
                        url, status
                    )));
                }
                404 => {
                    return Err(SourceError::NotFound(url.to_string()));
                }
                code if code == 429 || status.is_server_error() => {
                    last_failure = format!("status {}", status);
                    continue;
                }
                _ => {
                    return Err(SourceError::Transient(format!(
                        "{} answered unexpected status {}",
                        url, status
                    )));
                }
            }
        }

        Err(SourceError::Transient(format!(
            "{} failed after {} attempts: {}",
            url,
            self.max_retries + 1,
            last_failure
        )))
    }
}

#[async_trait]
impl ContentSource for RedditSource {
    async fn fetch_thread(&self, thread_id: &str) -> Result<Thread, SourceError> {
        let url = format!(
            "{}/comments/{}.json?limit=500&raw_json=1",
            self.base_url, thread_id
        );
        let payload = self.get_json(&url).await?;
        parse_thread(&payload, thread_id)
    }

    async fn fetch_listing(
        &self,
        scope: &ListingScope,
    ) -> Result<Vec<ContentUnit>, SourceError> {
        let url = match scope {
            ListingScope::Hot => format!(
                "{}/r/{}/hot.json?limit={}&raw_json=1",
                self.base_url, self.subreddit, self.listing_limit
            ),
            ListingScope::Top(filter) => format!(
                "{}/r/{}/top.json?t={}&limit={}&raw_json=1",
                self.base_url,
                self.subreddit,
                filter.as_str(),
                self.listing_limit
            ),
        };
        let payload = self.get_json(&url).await?;
        parse_listing(&payload)
    }

    async fn expand_more(
        &self,
        marker: &PaginationMarker,
    ) -> Result<Vec<CandidateNode>, SourceError> {
        if marker.child_ids.is_empty() {
            return Ok(Vec::new());
        }
        // The endpoint takes at most 100 ids per call; markers beyond that
        // carry their own continuation marker in the response.
        let children = marker
            .child_ids
            .iter()
            .take(100)
            .cloned()
            .collect::<Vec<_>>()
            .join(",");
        let url = format!(
            "{}/api/morechildren.json?api_type=json&link_id=t3_{}&children={}&raw_json=1",
            self.base_url, marker.thread_id, children
        );
        let payload = self.get_json(&url).await?;

        let things = payload
            .pointer("/json/data/things")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                SourceError::Parse("morechildren response missing json.data.things".into())
            })?;

        let mut nodes = Vec::new();
        for thing in things {
            if let Some(node) = parse_thing(thing, &marker.thread_id) {
                nodes.push(node);
            }
        }
        Ok(nodes)
    }
}

fn normalize_subreddit(raw: &str) -> String {
    let trimmed = raw.trim();
    trimmed
        .strip_prefix("r/")
        .or_else(|| trimmed.strip_prefix("/r/"))
        .unwrap_or(trimmed)
        .to_string()
}

fn parse_listing(payload: &Value) -> Result<Vec<ContentUnit>, SourceError> {
    let children = payload
        .pointer("/data/children")
        .and_then(Value::as_array)
        .ok_or_else(|| SourceError::Parse("listing response missing data.children".into()))?;

    let mut units = Vec::new();
    for child in children {
        if child.get("kind").and_then(Value::as_str) != Some("t3") {
            continue;
        }
        let Some(data) = child.get("data") else {
            continue;
        };
        match serde_json::from_value::<ThreadData>(data.clone()) {
            Ok(thread) => units.push(thread_unit(thread)),
            Err(e) => warn!("Skipping unreadable listing entry: {}", e),
        }
    }
    Ok(units)
}

// The comments endpoint answers with a two-element array: the post's own
// listing, then the reply tree.
fn parse_thread(payload: &Value, thread_id: &str) -> Result<Thread, SourceError> {
    let parts = payload
        .as_array()
        .filter(|parts| parts.len() >= 2)
        .ok_or_else(|| SourceError::Parse("thread response is not a two-part listing".into()))?;

    let post_data = parts[0]
        .pointer("/data/children/0/data")
        .ok_or_else(|| SourceError::Parse("thread response missing post data".into()))?;
    let post: ThreadData = serde_json::from_value(post_data.clone())
        .map_err(|e| SourceError::Parse(format!("unreadable post data: {}", e)))?;

    let title = post.title.clone();
    let unit = thread_unit(post);

    let mut replies = Vec::new();
    if let Some(children) = parts[1].pointer("/data/children").and_then(Value::as_array) {
        for child in children {
            if let Some(node) = parse_thing(child, thread_id) {
                replies.push(node);
            }
        }
    }

    Ok(Thread {
        title,
        post: unit,
        replies,
    })
}

// One `kind`-tagged thing from a reply tree: a comment becomes a unit
// node with its subtree, a "more" stub becomes a pagination marker.
fn parse_thing(thing: &Value, thread_id: &str) -> Option<CandidateNode> {
    let kind = thing.get("kind").and_then(Value::as_str)?;
    let data = thing.get("data")?;

    match kind {
        "t1" => {
            let id = data.get("id").and_then(Value::as_str)?.to_string();
            let body = data
                .get("body")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            let author = data
                .get("author")
                .and_then(Value::as_str)
                .filter(|a| !a.is_empty() && *a != DELETED_AUTHOR)
                .map(str::to_string);
            let stickied = data
                .get("stickied")
                .and_then(Value::as_bool)
                .unwrap_or(false);
            let permalink = data
                .get("permalink")
                .and_then(Value::as_str)
                .map(str::to_string);

            let mut children = Vec::new();
            // `replies` is an empty string on leaves, a listing otherwise
            if let Some(grandchildren) = data
                .pointer("/replies/data/children")
                .and_then(Value::as_array)
            {
                for grandchild in grandchildren {
                    if let Some(node) = parse_thing(grandchild, thread_id) {
                        children.push(node);
                    }
                }
            }

            let removed = ContentUnit::is_removal_placeholder(&body);
            let reply_count = children.len() as u64;
            Some(CandidateNode::Unit(CandidateTree {
                unit: ContentUnit {
                    id,
                    text: body,
                    author,
                    stickied,
                    removed,
                    nsfw: false,
                    reply_count,
                    permalink,
                },
                children,
            }))
        }
        "more" => {
            let id = data
                .get("id")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            let child_ids = data
                .get("children")
                .and_then(Value::as_array)
                .map(|ids| {
                    ids.iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default();
            Some(CandidateNode::More(PaginationMarker {
                id,
                thread_id: thread_id.to_string(),
                child_ids,
            }))
        }
        other => {
            debug!("Ignoring unknown thing kind '{}'", other);
            None
        }
    }
}

fn thread_unit(data: ThreadData) -> ContentUnit {
    let author = data
        .author
        .filter(|a| !a.is_empty() && a != DELETED_AUTHOR);
    let removed = ContentUnit::is_removal_placeholder(&data.selftext);
    ContentUnit {
        id: data.id,
        text: data.selftext,
        author,
        stickied: data.stickied,
        removed,
        nsfw: data.over_18,
        reply_count: data.num_comments,
        permalink: data.permalink,
    }
}
