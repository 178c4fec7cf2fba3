//! Already-posted filter. The platform's own recent posts are the only record
//! of what was published; there is no local database.

use std::collections::HashSet;

use crate::feed::CandidateItem;
use crate::platform::RecentPost;

/// External URLs embedded in the account's recent posts.
#[derive(Debug, Clone, Default)]
pub struct PostedUrls {
    urls: HashSet<String>,
}

impl PostedUrls {
    pub fn from_recent(posts: &[RecentPost]) -> Self {
        Self {
            urls: posts
                .iter()
                .filter_map(|p| p.external_uri.clone())
                .collect(),
        }
    }

    /// Exact string match; no scheme, slash or query normalization.
    pub fn contains(&self, url: &str) -> bool {
        self.urls.contains(url)
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

/// Drop candidates already posted. Keeps input order.
/// Returns (kept, removed_count).
pub fn filter_already_posted(
    ranked: Vec<CandidateItem>,
    posted: &PostedUrls,
) -> (Vec<CandidateItem>, usize) {
    let before = ranked.len();
    let kept: Vec<_> = ranked
        .into_iter()
        .filter(|c| !posted.contains(&c.article_url))
        .collect();
    let removed = before - kept.len();
    (kept, removed)
}
