// src/platform/types.rs
use serde::{Deserialize, Serialize};

/// One of the account's recent posts, reduced to what dedup needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentPost {
    pub uri: String,
    /// Link-card URL embedded in the post, if any.
    pub external_uri: Option<String>,
}

/// Opaque handle returned by a blob upload. Passed back verbatim when the
/// blob is attached to a post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlobRef(pub serde_json::Value);

/// Clickable byte range in the post text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkFacet {
    pub byte_start: usize,
    pub byte_end: usize,
    pub uri: String,
}

/// Link preview card.
#[derive(Debug, Clone, PartialEq)]
pub struct ExternalEmbed {
    pub title: String,
    pub description: String,
    pub uri: String,
    pub thumb: Option<BlobRef>,
}

/// Everything needed for one publish call.
#[derive(Debug, Clone, PartialEq)]
pub struct PostDraft {
    pub text: String,
    pub facets: Vec<LinkFacet>,
    pub embed: Option<ExternalEmbed>,
}

/// Identifiers of a published post.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PostRef {
    pub uri: String,
    pub cid: String,
}
