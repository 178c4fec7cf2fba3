//! Post Composer: text, link facet and link card for one candidate.
//!
//! Facet offsets are UTF-8 byte offsets into the post text, which is what the
//! rich-text protocol counts in. `str::len` is already a byte length.

use crate::feed::CandidateItem;
use crate::platform::{BlobRef, ExternalEmbed, LinkFacet, PostDraft};

pub const DISCUSSION_LABEL: &str = "[Discussion]";

/// `"{title} [Discussion]"` with the label linked to the discussion thread
/// and the article attached as a link card.
pub fn compose(item: &CandidateItem, thumb: Option<BlobRef>) -> PostDraft {
    let text = format!("{} {}", item.title, DISCUSSION_LABEL);
    let byte_start = item.title.len() + 1;
    let byte_end = byte_start + DISCUSSION_LABEL.len();

    PostDraft {
        text,
        facets: vec![LinkFacet {
            byte_start,
            byte_end,
            uri: item.discussion_url.clone(),
        }],
        embed: Some(ExternalEmbed {
            title: item.title.clone(),
            description: item.title.clone(),
            uri: item.article_url.clone(),
            thumb,
        }),
    }
}
