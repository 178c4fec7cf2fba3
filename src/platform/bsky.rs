// src/platform/bsky.rs
//! Minimal AT-Protocol XRPC client: session, author feed, blob upload, post.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use reqwest::{header, Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

use super::types::{BlobRef, PostDraft, PostRef, RecentPost};
use super::Platform;
use crate::error::{BotError, BotResult};
use crate::secrets::Credentials;

pub const DEFAULT_SERVICE_URL: &str = "https://bsky.social";
const POST_COLLECTION: &str = "app.bsky.feed.post";
const MAX_FEED_LIMIT: usize = 100;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Session {
    access_jwt: String,
    did: String,
    handle: String,
}

pub struct BskyClient {
    client: Client,
    base_url: Url,
    session: RwLock<Option<Session>>,
}

impl BskyClient {
    pub fn new(service_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(crate::USER_AGENT)
            .build()
            .context("failed to build bsky HTTP client")?;
        let mut base_url = Url::parse(service_url).context("invalid bsky service URL")?;
        if !base_url.path().ends_with('/') {
            let p = format!("{}/", base_url.path());
            base_url.set_path(&p);
        }
        Ok(Self {
            client,
            base_url,
            session: RwLock::new(None),
        })
    }

    fn xrpc(&self, method: &str) -> Result<Url> {
        self.base_url
            .join(&format!("xrpc/{method}"))
            .with_context(|| format!("building xrpc URL for {method}"))
    }

    async fn session(&self) -> Result<Session> {
        self.session
            .read()
            .await
            .clone()
            .ok_or_else(|| anyhow!("not logged in"))
    }

    /// Pages through the author feed with `cursor` until `limit` posts are
    /// collected or the feed runs out. A single request is capped at 100.
    async fn fetch_author_feed(&self, actor: &str, limit: usize) -> Result<Vec<RecentPost>> {
        let session = self.session().await?;
        let mut posts: Vec<RecentPost> = Vec::with_capacity(limit);
        let mut cursor: Option<String> = None;

        while posts.len() < limit {
            let page_size = (limit - posts.len()).min(MAX_FEED_LIMIT);
            let mut url = self.xrpc("app.bsky.feed.getAuthorFeed")?;
            {
                let mut q = url.query_pairs_mut();
                q.append_pair("actor", actor)
                    .append_pair("limit", &page_size.to_string());
                if let Some(c) = cursor.as_deref() {
                    q.append_pair("cursor", c);
                }
            }

            let rsp: AuthorFeedResponse = self
                .client
                .get(url)
                .bearer_auth(&session.access_jwt)
                .send()
                .await
                .context("getAuthorFeed request failed")?
                .error_for_status()
                .context("getAuthorFeed non-2xx")?
                .json()
                .await
                .context("getAuthorFeed body")?;

            let got = rsp.feed.len();
            posts.extend(rsp.feed.into_iter().map(|item| RecentPost::from(item.post)));
            debug!(page_size, got, total = posts.len(), "author feed page");

            match rsp.cursor {
                Some(next) if got > 0 => cursor = Some(next),
                _ => break,
            }
        }

        posts.truncate(limit);
        Ok(posts)
    }

    async fn do_upload(&self, bytes: Vec<u8>, mime: &str) -> Result<BlobRef> {
        let session = self.session().await?;
        let rsp: UploadBlobResponse = self
            .client
            .post(self.xrpc("com.atproto.repo.uploadBlob")?)
            .bearer_auth(&session.access_jwt)
            .header(header::CONTENT_TYPE, mime)
            .body(bytes)
            .send()
            .await
            .context("uploadBlob request failed")?
            .error_for_status()
            .context("uploadBlob non-2xx")?
            .json()
            .await
            .context("uploadBlob body")?;
        Ok(rsp.blob)
    }

    async fn do_publish(&self, draft: &PostDraft) -> Result<PostRef> {
        let session = self.session().await?;
        let body = CreateRecord {
            repo: &session.did,
            collection: POST_COLLECTION,
            record: PostRecord::from_draft(draft, Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
        };
        let rsp = self
            .client
            .post(self.xrpc("com.atproto.repo.createRecord")?)
            .bearer_auth(&session.access_jwt)
            .json(&body)
            .send()
            .await
            .context("createRecord request failed")?;

        let status = rsp.status();
        if !status.is_success() {
            let text = rsp.text().await.unwrap_or_default();
            return Err(anyhow!("createRecord HTTP {status}: {text}"));
        }
        rsp.json().await.context("createRecord body")
    }
}

#[async_trait]
impl Platform for BskyClient {
    async fn login(&self, creds: &Credentials) -> BotResult<()> {
        let auth_err = |reason: String| BotError::AuthenticationFailure { reason };

        let url = self
            .xrpc("com.atproto.server.createSession")
            .map_err(|e| auth_err(format!("{e:#}")))?;
        let rsp = self
            .client
            .post(url)
            .json(&serde_json::json!({
                "identifier": creds.handle,
                "password": creds.password,
            }))
            .send()
            .await
            .map_err(|e| auth_err(format!("createSession request failed: {e}")))?;

        match rsp.status() {
            s if s.is_success() => {}
            StatusCode::UNAUTHORIZED | StatusCode::BAD_REQUEST => {
                let text = rsp.text().await.unwrap_or_default();
                return Err(auth_err(format!("credentials rejected: {text}")));
            }
            s => return Err(auth_err(format!("createSession HTTP {s}"))),
        }

        let session: Session = rsp
            .json()
            .await
            .map_err(|e| auth_err(format!("createSession body: {e}")))?;
        debug!(did = %session.did, handle = %session.handle, "bsky session created");
        *self.session.write().await = Some(session);
        Ok(())
    }

    async fn author_feed(&self, actor: &str, limit: usize) -> BotResult<Vec<RecentPost>> {
        self.fetch_author_feed(actor, limit)
            .await
            .map_err(|e| BotError::HistoryUnavailable {
                reason: format!("{e:#}"),
            })
    }

    async fn upload_blob(&self, bytes: Vec<u8>, mime: &str) -> BotResult<BlobRef> {
        self.do_upload(bytes, mime)
            .await
            .map_err(|e| BotError::thumbnail(format!("{e:#}")))
    }

    async fn publish(&self, draft: &PostDraft) -> BotResult<PostRef> {
        self.do_publish(draft)
            .await
            .map_err(|e| BotError::PublishFailure {
                article_url: draft
                    .embed
                    .as_ref()
                    .map(|emb| emb.uri.clone())
                    .unwrap_or_default(),
                reason: format!("{e:#}"),
            })
    }
}

// ---- wire shapes ----

#[derive(Deserialize)]
struct AuthorFeedResponse {
    #[serde(default)]
    feed: Vec<FeedViewPost>,
    cursor: Option<String>,
}

#[derive(Deserialize)]
struct FeedViewPost {
    post: PostView,
}

#[derive(Deserialize)]
struct PostView {
    uri: String,
    embed: Option<EmbedView>,
    record: Option<RecordView>,
}

#[derive(Deserialize)]
struct RecordView {
    embed: Option<EmbedView>,
}

/// Covers `app.bsky.embed.external` and `app.bsky.embed.recordWithMedia`
/// (both record and `#view` forms).
#[derive(Deserialize)]
struct EmbedView {
    external: Option<ExternalView>,
    media: Option<Box<EmbedView>>,
}

#[derive(Deserialize)]
struct ExternalView {
    uri: String,
}

impl EmbedView {
    fn external_uri(&self) -> Option<String> {
        self.external
            .as_ref()
            .map(|e| e.uri.clone())
            .or_else(|| self.media.as_ref().and_then(|m| m.external_uri()))
    }
}

impl From<PostView> for RecentPost {
    fn from(p: PostView) -> Self {
        let external_uri = p
            .embed
            .as_ref()
            .and_then(EmbedView::external_uri)
            .or_else(|| {
                p.record
                    .as_ref()
                    .and_then(|r| r.embed.as_ref())
                    .and_then(EmbedView::external_uri)
            });
        RecentPost {
            uri: p.uri,
            external_uri,
        }
    }
}

#[derive(Deserialize)]
struct UploadBlobResponse {
    blob: BlobRef,
}

#[derive(Serialize)]
struct CreateRecord<'a> {
    repo: &'a str,
    collection: &'a str,
    record: PostRecord<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PostRecord<'a> {
    #[serde(rename = "$type")]
    kind: &'static str,
    text: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    facets: Vec<FacetRecord<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    embed: Option<EmbedRecord<'a>>,
    created_at: String,
}

#[derive(Serialize)]
struct FacetRecord<'a> {
    index: ByteSlice,
    features: Vec<LinkFeature<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ByteSlice {
    byte_start: usize,
    byte_end: usize,
}

#[derive(Serialize)]
struct LinkFeature<'a> {
    #[serde(rename = "$type")]
    kind: &'static str,
    uri: &'a str,
}

#[derive(Serialize)]
struct EmbedRecord<'a> {
    #[serde(rename = "$type")]
    kind: &'static str,
    external: ExternalRecord<'a>,
}

#[derive(Serialize)]
struct ExternalRecord<'a> {
    uri: &'a str,
    title: &'a str,
    description: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    thumb: Option<&'a BlobRef>,
}

impl<'a> PostRecord<'a> {
    fn from_draft(d: &'a PostDraft, created_at: String) -> Self {
        Self {
            kind: POST_COLLECTION,
            text: &d.text,
            facets: d
                .facets
                .iter()
                .map(|f| FacetRecord {
                    index: ByteSlice {
                        byte_start: f.byte_start,
                        byte_end: f.byte_end,
                    },
                    features: vec![LinkFeature {
                        kind: "app.bsky.richtext.facet#link",
                        uri: &f.uri,
                    }],
                })
                .collect(),
            embed: d.embed.as_ref().map(|e| EmbedRecord {
                kind: "app.bsky.embed.external",
                external: ExternalRecord {
                    uri: &e.uri,
                    title: &e.title,
                    description: &e.description,
                    thumb: e.thumb.as_ref(),
                },
            }),
            created_at,
        }
    }
}
