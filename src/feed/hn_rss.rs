// src/feed/hn_rss.rs
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use metrics::counter;
use quick_xml::de::from_str;
use serde::Deserialize;
use time::{format_description::well_known::Rfc2822, OffsetDateTime};

use crate::error::{BotError, BotResult};
use crate::feed::points::extract_points;
use crate::feed::types::{CandidateItem, FeedSource};

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    comments: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
}

/// An entry that failed validation, kept for logging and run accounting.
#[derive(Debug)]
pub struct RejectedEntry {
    /// Position in the feed (0-based).
    pub index: usize,
    pub title: Option<String>,
    pub error: BotError,
}

#[derive(Debug, Default)]
pub struct FeedParseOutcome {
    /// Valid entries, in feed order.
    pub items: Vec<CandidateItem>,
    pub rejected: Vec<RejectedEntry>,
}

/// Parse an RSS document into scored candidates.
///
/// Malformed entries are skipped and reported in `rejected`; the batch goes on.
/// A document that is not RSS at all fails with `FeedUnavailable`.
pub fn parse_feed(xml: &str, now: i64) -> BotResult<FeedParseOutcome> {
    let xml_clean = scrub_html_entities_for_xml(xml);
    let rss: Rss = from_str(&xml_clean).map_err(|e| BotError::FeedUnavailable {
        reason: format!("parsing rss xml: {e}"),
    })?;

    let mut out = FeedParseOutcome::default();
    for (index, it) in rss.channel.item.into_iter().enumerate() {
        let title = it.title.clone();
        match candidate_from_item(it, now) {
            Ok(c) => out.items.push(c),
            Err(error) => out.rejected.push(RejectedEntry {
                index,
                title,
                error,
            }),
        }
    }

    counter!("bot_feed_entries_total").increment((out.items.len() + out.rejected.len()) as u64);
    counter!("bot_feed_malformed_total").increment(out.rejected.len() as u64);
    Ok(out)
}

fn candidate_from_item(it: Item, now: i64) -> BotResult<CandidateItem> {
    let title = it
        .title
        .as_deref()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| BotError::malformed("missing title"))?;

    let article_url = required(it.link, "link")?;
    let discussion_url = required(it.comments, "comments")?;
    let points = extract_points(it.description.as_deref().unwrap_or_default())?;
    let published_at = it
        .pub_date
        .as_deref()
        .ok_or_else(|| BotError::malformed("missing pubDate"))
        .and_then(parse_rfc2822_to_unix)?;

    Ok(CandidateItem::new(
        title,
        article_url,
        discussion_url,
        points,
        published_at,
        now,
    ))
}

fn required(field: Option<String>, name: &str) -> BotResult<String> {
    field
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| BotError::malformed(format!("missing {name}")))
}

/// RFC-2822 to unix seconds. `time` is strict about obsolete zone names
/// (`GMT`, `EST`, ...), so those fall back to chrono's parser.
pub fn parse_rfc2822_to_unix(ts: &str) -> BotResult<i64> {
    let ts = ts.trim();
    if let Ok(dt) = OffsetDateTime::parse(ts, &Rfc2822) {
        return Ok(dt.unix_timestamp());
    }
    chrono::DateTime::parse_from_rfc2822(ts)
        .map(|dt| dt.timestamp())
        .map_err(|e| BotError::malformed(format!("unparseable pubDate {ts:?}: {e}")))
}

pub struct HnRssSource {
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http { url: String, client: reqwest::Client },
}

impl HnRssSource {
    pub fn from_fixture(s: &str) -> Self {
        Self {
            mode: Mode::Fixture(s.to_string()),
        }
    }

    pub fn from_url(url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(crate::USER_AGENT)
            .build()
            .context("building feed http client")?;
        Ok(Self {
            mode: Mode::Http {
                url: url.into(),
                client,
            },
        })
    }
}

#[async_trait]
impl FeedSource for HnRssSource {
    async fn fetch_raw(&self) -> BotResult<String> {
        match &self.mode {
            Mode::Fixture(s) => Ok(s.clone()),
            Mode::Http { url, client } => get_text(client, url).await.map_err(|e| {
                tracing::warn!(error = ?e, source = self.name(), "feed fetch error");
                BotError::FeedUnavailable {
                    reason: format!("{e:#}"),
                }
            }),
        }
    }

    fn name(&self) -> &'static str {
        "hnrss"
    }
}

async fn get_text(client: &reqwest::Client, url: &str) -> anyhow::Result<String> {
    client
        .get(url)
        .send()
        .await
        .context("feed http get()")?
        .error_for_status()
        .context("feed non-2xx")?
        .text()
        .await
        .context("feed http .text()")
}

/// HTML named entities seen in feed text that XML does not predefine.
const HTML_ENTITIES: &[(&str, &str)] = &[
    ("&nbsp;", "&#160;"),
    ("&ndash;", "&#8211;"),
    ("&mdash;", "&#8212;"),
    ("&hellip;", "&#8230;"),
    ("&lsquo;", "&#8216;"),
    ("&rsquo;", "&#8217;"),
    ("&ldquo;", "&#8220;"),
    ("&rdquo;", "&#8221;"),
];

/// Rewrite HTML-only entities as numeric references so the XML reader accepts
/// them. CDATA sections are copied through untouched.
fn scrub_html_entities_for_xml(s: &str) -> String {
    const OPEN: &str = "<![CDATA[";
    const CLOSE: &str = "]]>";

    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find(OPEN) {
        out.push_str(&numeric_entities(&rest[..start]));
        let body = &rest[start..];
        match body.find(CLOSE) {
            Some(end) => {
                out.push_str(&body[..end + CLOSE.len()]);
                rest = &body[end + CLOSE.len()..];
            }
            // Unterminated; let the XML reader report it.
            None => {
                out.push_str(body);
                return out;
            }
        }
    }
    out.push_str(&numeric_entities(rest));
    out
}

fn numeric_entities(text: &str) -> String {
    HTML_ENTITIES
        .iter()
        .fold(text.to_string(), |acc, (named, numeric)| acc.replace(named, numeric))
}
