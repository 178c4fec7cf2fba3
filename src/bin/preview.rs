//! Prints what the next run would pick, without credentials or posting.
//!
//! Usage: `preview [FEED_FILE]` — reads the configured feed URL when no file is given.

use anyhow::Context;
use hn_bsky_bot::compose::compose;
use hn_bsky_bot::feed::{parse_feed, FeedSource, HnRssSource};
use hn_bsky_bot::rank::rank_top;
use hn_bsky_bot::BotConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    hn_bsky_bot::telemetry::init();
    let cfg = BotConfig::load()?;

    let source = match std::env::args().nth(1) {
        Some(path) => {
            let xml = std::fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
            HnRssSource::from_fixture(&xml)
        }
        None => HnRssSource::from_url(cfg.feed_url.clone(), cfg.http_timeout())?,
    };

    let now = chrono::Utc::now().timestamp();
    let parsed = parse_feed(&source.fetch_raw().await?, now)?;
    for r in &parsed.rejected {
        println!("skip #{:<3} {}", r.index, r.error);
    }
    for (i, item) in rank_top(parsed.items, cfg.top_n).iter().enumerate() {
        let draft = compose(item, None);
        println!("{:>2}. {:>7.3}  {:>5} pts  {}", i + 1, item.hotness(), item.points, draft.text);
    }
    Ok(())
}
