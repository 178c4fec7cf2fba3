// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod compose;
pub mod config;
pub mod dedup;
pub mod error;
pub mod feed;
pub mod platform;
pub mod rank;
pub mod runner;
pub mod secrets;
pub mod telemetry;
pub mod thumbnail;

pub use crate::config::BotConfig;
pub use crate::error::{BotError, BotResult};
pub use crate::runner::{RunReport, Runner};

use anyhow::Context;
use tracing::info;

pub const USER_AGENT: &str = concat!("hn-bsky-bot/", env!("CARGO_PKG_VERSION"));

/// Scheduler entry point: one full run. Both arguments are accepted for
/// compatibility with event-driven hosts and ignored.
pub async fn handle_invocation(
    _event: Option<serde_json::Value>,
    _context: Option<serde_json::Value>,
) -> anyhow::Result<RunReport> {
    let cfg = BotConfig::load().context("loading bot config")?;
    let creds = secrets::load_credentials(&cfg.secret_id).await?;

    let feed = feed::HnRssSource::from_url(cfg.feed_url.clone(), cfg.http_timeout())?;
    let platform = platform::BskyClient::new(&cfg.service_url, cfg.http_timeout())?;
    let thumbnails = thumbnail::HttpThumbnailSource::new(cfg.http_timeout(), cfg.max_thumb_bytes)?;

    let now = chrono::Utc::now().timestamp();
    let report = Runner::new(&cfg, &feed, &platform, &thumbnails)
        .run_once(&creds, now)
        .await?;

    info!(
        published = report.published.len(),
        already_posted = report.already_posted,
        malformed = report.malformed,
        dry_run = cfg.dry_run,
        "run finished"
    );
    Ok(report)
}
