// src/error.rs
//! Error taxonomy for one bot run.
//!
//! Only `MalformedFeedItem` and `ThumbnailUnavailable` are recovered inside the
//! run; every other variant aborts it and surfaces to the host.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BotError {
    /// A feed entry lacks a required field or the field does not parse.
    #[error("malformed feed item: {reason}")]
    MalformedFeedItem { reason: String },

    /// Any failure while resolving, fetching or uploading a preview image.
    #[error("thumbnail unavailable: {reason}")]
    ThumbnailUnavailable { reason: String },

    /// The platform rejected the supplied credentials.
    #[error("authentication failed: {reason}")]
    AuthenticationFailure { reason: String },

    /// The platform rejected a single publish call.
    #[error("publish failed for {article_url}: {reason}")]
    PublishFailure { article_url: String, reason: String },

    /// Secret store lookup failed or returned an incomplete bundle.
    #[error("secret unavailable: {reason}")]
    SecretUnavailable { reason: String },

    /// The feed document could not be fetched or is not a readable RSS document.
    #[error("feed unavailable: {reason}")]
    FeedUnavailable { reason: String },

    /// Recent post history could not be queried.
    #[error("post history unavailable: {reason}")]
    HistoryUnavailable { reason: String },
}

impl BotError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedFeedItem {
            reason: reason.into(),
        }
    }

    pub fn thumbnail(reason: impl std::fmt::Display) -> Self {
        Self::ThumbnailUnavailable {
            reason: reason.to_string(),
        }
    }

    pub fn secret(reason: impl std::fmt::Display) -> Self {
        Self::SecretUnavailable {
            reason: reason.to_string(),
        }
    }
}

pub type BotResult<T> = std::result::Result<T, BotError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_carries_reason() {
        let e = BotError::PublishFailure {
            article_url: "https://example.com/a".into(),
            reason: "HTTP 500".into(),
        };
        assert_eq!(
            e.to_string(),
            "publish failed for https://example.com/a: HTTP 500"
        );
    }
}
