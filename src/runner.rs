//! # Run Orchestrator
//! One sequential pass: login → recent posts → feed → rank → dedup → compose
//! and publish. Each publish is awaited before the next starts.
//!
//! Failure policy:
//! - malformed feed entries are skipped and counted,
//! - a missing thumbnail never blocks a post,
//! - anything else aborts the run; nothing after a failed publish is attempted.

use metrics::{counter, gauge};
use serde::Serialize;
use tracing::{info, warn};

use crate::compose::compose;
use crate::config::{BotConfig, PublishOrder};
use crate::dedup::{filter_already_posted, PostedUrls};
use crate::error::BotResult;
use crate::feed::{parse_feed, CandidateItem, FeedSource};
use crate::platform::{BlobRef, Platform, PostRef};
use crate::rank::rank_top;
use crate::secrets::Credentials;
use crate::telemetry::ensure_metrics_described;
use crate::thumbnail::ThumbnailSource;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Feed entries seen (valid + malformed).
    pub fetched: usize,
    pub malformed: usize,
    /// Candidates left after truncation to `top_n`.
    pub ranked: usize,
    pub already_posted: usize,
    /// Posts created (or composed, on a dry run).
    pub published: Vec<String>,
    pub thumbnails_missing: usize,
}

pub struct Runner<'a> {
    cfg: &'a BotConfig,
    feed: &'a dyn FeedSource,
    platform: &'a dyn Platform,
    thumbnails: &'a dyn ThumbnailSource,
}

impl<'a> Runner<'a> {
    pub fn new(
        cfg: &'a BotConfig,
        feed: &'a dyn FeedSource,
        platform: &'a dyn Platform,
        thumbnails: &'a dyn ThumbnailSource,
    ) -> Self {
        Self {
            cfg,
            feed,
            platform,
            thumbnails,
        }
    }

    /// `now` is unix seconds, used for every hotness score in this run.
    pub async fn run_once(&self, creds: &Credentials, now: i64) -> BotResult<RunReport> {
        ensure_metrics_described();
        let mut report = RunReport::default();

        self.platform.login(creds).await?;

        let actor = self.cfg.actor.as_deref().unwrap_or(&creds.handle);
        let recent = self
            .platform
            .author_feed(actor, self.cfg.history_limit())
            .await?;
        let posted = PostedUrls::from_recent(&recent);
        info!(actor, recent = recent.len(), with_links = posted.len(), "post history loaded");

        let raw = self.feed.fetch_raw().await?;
        let parsed = parse_feed(&raw, now)?;
        for r in &parsed.rejected {
            warn!(
                source = self.feed.name(),
                index = r.index,
                title = r.title.as_deref().unwrap_or_default(),
                error = %r.error,
                "skipping feed entry"
            );
        }
        report.fetched = parsed.items.len() + parsed.rejected.len();
        report.malformed = parsed.rejected.len();

        let ranked = rank_top(parsed.items, self.cfg.top_n);
        report.ranked = ranked.len();

        let (mut todo, removed) = filter_already_posted(ranked, &posted);
        report.already_posted = removed;
        counter!("bot_dedup_skipped_total").increment(removed as u64);

        if self.cfg.publish_order == PublishOrder::Reversed {
            todo.reverse();
        }
        info!(
            fetched = report.fetched,
            malformed = report.malformed,
            ranked = report.ranked,
            already_posted = removed,
            to_publish = todo.len(),
            "candidates selected"
        );

        for item in &todo {
            let thumb = if self.cfg.dry_run {
                None
            } else {
                self.thumbnail_for(item).await
            };
            if thumb.is_none() && !self.cfg.dry_run {
                report.thumbnails_missing += 1;
            }

            let draft = compose(item, thumb);
            if self.cfg.dry_run {
                info!(text = %draft.text, url = %item.article_url, hotness = item.hotness(), "dry run: not publishing");
                report.published.push(item.article_url.clone());
                continue;
            }

            let PostRef { uri, .. } = self.platform.publish(&draft).await?;
            counter!("bot_posts_published_total").increment(1);
            info!(uri = %uri, url = %item.article_url, hotness = item.hotness(), "published");
            report.published.push(item.article_url.clone());
        }

        gauge!("bot_last_run_ts").set(chrono::Utc::now().timestamp() as f64);
        Ok(report)
    }

    /// Resolve and upload the preview image. Never fails the post.
    async fn thumbnail_for(&self, item: &CandidateItem) -> Option<BlobRef> {
        let res = match self.thumbnails.resolve(&item.article_url).await {
            Ok(t) => self.platform.upload_blob(t.bytes, &t.mime).await,
            Err(e) => Err(e),
        };
        match res {
            Ok(blob) => Some(blob),
            Err(e) => {
                warn!(url = %item.article_url, error = %e, "posting without preview image");
                counter!("bot_thumbnail_unavailable_total").increment(1);
                None
            }
        }
    }
}
