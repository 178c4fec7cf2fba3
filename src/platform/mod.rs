// src/platform/mod.rs
pub mod bsky;
pub mod types;

use async_trait::async_trait;

use crate::error::BotResult;
use crate::secrets::Credentials;

pub use bsky::BskyClient;
pub use types::{BlobRef, ExternalEmbed, LinkFacet, PostDraft, PostRef, RecentPost};

/// Social platform the bot publishes to. Calls other than `login` require a
/// prior successful `login`.
#[async_trait]
pub trait Platform: Send + Sync {
    async fn login(&self, creds: &Credentials) -> BotResult<()>;

    /// Latest posts by `actor`, newest first, at most `limit`.
    async fn author_feed(&self, actor: &str, limit: usize) -> BotResult<Vec<RecentPost>>;

    async fn upload_blob(&self, bytes: Vec<u8>, mime: &str) -> BotResult<BlobRef>;

    async fn publish(&self, draft: &PostDraft) -> BotResult<PostRef>;
}
