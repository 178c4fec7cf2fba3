//! hn-bsky-bot — binary entrypoint.
//! Performs exactly one run and exits; an external scheduler fires it hourly.

use tracing::error;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when the file is absent.
    let _ = dotenvy::dotenv();
    hn_bsky_bot::telemetry::init();

    if let Err(e) = hn_bsky_bot::handle_invocation(None, None).await {
        error!(error = %format!("{e:#}"), "run failed");
        return Err(e);
    }
    Ok(())
}
