// src/secrets.rs
//! Credential lookup. The bundle is read once per run and only kept in memory.

use std::fmt;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{BotError, BotResult};

pub const DEFAULT_SECRET_ID: &str = "HNBOT_SECRET";

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub handle: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("handle", &self.handle)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Deserialize)]
struct SecretBundle {
    #[serde(rename = "BSKY_HANDLE")]
    handle: Option<String>,
    #[serde(rename = "BSKY_PASSWORD")]
    password: Option<String>,
}

/// Parse the JSON bundle `{"BSKY_HANDLE": "...", "BSKY_PASSWORD": "..."}`.
pub fn parse_bundle(json: &str) -> BotResult<Credentials> {
    let b: SecretBundle =
        serde_json::from_str(json).map_err(|e| BotError::secret(format!("bundle is not valid JSON: {e}")))?;
    let handle = non_empty(b.handle, "BSKY_HANDLE")?;
    let password = non_empty(b.password, "BSKY_PASSWORD")?;
    Ok(Credentials { handle, password })
}

fn non_empty(v: Option<String>, key: &str) -> BotResult<String> {
    v.map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| BotError::secret(format!("bundle is missing {key}")))
}

#[async_trait]
pub trait SecretStore: Send + Sync {
    async fn fetch(&self, id: &str) -> BotResult<Credentials>;
}

/// `id` names an environment variable holding the JSON bundle.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvSecretStore;

#[async_trait]
impl SecretStore for EnvSecretStore {
    async fn fetch(&self, id: &str) -> BotResult<Credentials> {
        let raw = std::env::var(id).map_err(|_| BotError::secret(format!("env var {id} is not set")))?;
        parse_bundle(&raw)
    }
}

/// `id` is a path to a file holding the JSON bundle.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileSecretStore;

#[async_trait]
impl SecretStore for FileSecretStore {
    async fn fetch(&self, id: &str) -> BotResult<Credentials> {
        let raw = tokio::fs::read_to_string(id)
            .await
            .map_err(|e| BotError::secret(format!("reading {id}: {e}")))?;
        parse_bundle(&raw)
    }
}

/// File store when `id` points at an existing file, env store otherwise.
pub fn store_for(id: &str) -> Box<dyn SecretStore> {
    if PathBuf::from(id).is_file() {
        Box::new(FileSecretStore)
    } else {
        Box::new(EnvSecretStore)
    }
}

/// Convenience used by the entrypoint.
pub async fn load_credentials(id: &str) -> BotResult<Credentials> {
    let store = store_for(id);
    let creds = store.fetch(id).await?;
    tracing::info!(handle = %creds.handle, from_file = Path::new(id).is_file(), "credentials loaded");
    Ok(creds)
}
