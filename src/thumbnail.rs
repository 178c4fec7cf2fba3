// src/thumbnail.rs
//! Preview image lookup via the article's `og:image` meta tag.
//! Every failure maps to `ThumbnailUnavailable`; callers post without an image.

use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use reqwest::{header, Client, Url};
use scraper::{Html, Selector};

use crate::error::{BotError, BotResult};

const DEFAULT_MIME: &str = "image/jpeg";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thumbnail {
    pub bytes: Vec<u8>,
    pub mime: String,
}

#[async_trait]
pub trait ThumbnailSource: Send + Sync {
    async fn resolve(&self, article_url: &str) -> BotResult<Thumbnail>;
}

/// Absolute `og:image` URL of a page, resolved against `page_url`.
pub fn find_og_image(html: &str, page_url: &str) -> Option<Url> {
    let doc = Html::parse_document(html);
    let sel = Selector::parse(r#"meta[property="og:image"]"#).ok()?;
    let content = doc
        .select(&sel)
        .filter_map(|el| el.value().attr("content"))
        .map(str::trim)
        .find(|c| !c.is_empty())?;

    Url::parse(page_url)
        .and_then(|base| base.join(content))
        .or_else(|_| Url::parse(content))
        .ok()
}

pub struct HttpThumbnailSource {
    client: Client,
    max_bytes: usize,
}

impl HttpThumbnailSource {
    pub fn new(timeout: Duration, max_bytes: usize) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(crate::USER_AGENT)
            .build()
            .context("building thumbnail http client")?;
        Ok(Self { client, max_bytes })
    }

    async fn fetch(&self, article_url: &str) -> Result<Thumbnail> {
        let html = self
            .client
            .get(article_url)
            .send()
            .await
            .context("article request failed")?
            .error_for_status()
            .context("article non-2xx")?
            .text()
            .await
            .context("article body")?;

        // `Html` is not Send; keep it out of scope across the next await.
        let img_url = find_og_image(&html, article_url).ok_or_else(|| anyhow!("no og:image tag"))?;
        tracing::debug!(article = article_url, image = %img_url, "og:image found");

        let rsp = self
            .client
            .get(img_url)
            .send()
            .await
            .context("image request failed")?
            .error_for_status()
            .context("image non-2xx")?;

        let mime = rsp
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or(v).trim().to_ascii_lowercase())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_MIME.to_string());
        // Link cards only accept image blobs; a login wall or soft 404 must not get through.
        if !mime.starts_with("image/") {
            bail!("og:image target is {mime}, not an image");
        }

        let bytes = rsp.bytes().await.context("image body")?;
        if bytes.is_empty() {
            bail!("image body is empty");
        }
        if bytes.len() > self.max_bytes {
            bail!("image is {} bytes, limit {}", bytes.len(), self.max_bytes);
        }

        Ok(Thumbnail {
            bytes: bytes.to_vec(),
            mime,
        })
    }
}

#[async_trait]
impl ThumbnailSource for HttpThumbnailSource {
    async fn resolve(&self, article_url: &str) -> BotResult<Thumbnail> {
        self.fetch(article_url)
            .await
            .map_err(|e| BotError::thumbnail(format!("{e:#}")))
    }
}
