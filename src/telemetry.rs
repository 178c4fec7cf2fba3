// src/telemetry.rs
use metrics::{describe_counter, describe_gauge};
use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_FILTER: &str = "hn_bsky_bot=info,warn";

/// Install the global subscriber. `RUST_LOG` overrides the default filter;
/// `HNBOT_LOG_FORMAT=json` switches to JSON lines for the host's log collector.
/// Safe to call more than once.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let json = std::env::var("HNBOT_LOG_FORMAT")
        .ok()
        .is_some_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    let res = if json {
        registry.with(fmt::layer().json().with_current_span(false)).try_init()
    } else {
        registry.with(fmt::layer().compact()).try_init()
    };
    if res.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

/// One-time metrics registration so series carry descriptions.
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("bot_feed_entries_total", "Feed entries seen.");
        describe_counter!("bot_feed_malformed_total", "Feed entries skipped as malformed.");
        describe_counter!("bot_dedup_skipped_total", "Candidates dropped as already posted.");
        describe_counter!(
            "bot_thumbnail_unavailable_total",
            "Posts published without a preview image."
        );
        describe_counter!("bot_posts_published_total", "Posts published.");
        describe_gauge!("bot_last_run_ts", "Unix ts when the last run finished.");
    });
}
