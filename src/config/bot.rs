// src/config/bot.rs
use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::platform::bsky::DEFAULT_SERVICE_URL;
use crate::rank::DEFAULT_TOP_N;
use crate::secrets::DEFAULT_SECRET_ID;

pub const ENV_CONFIG_PATH: &str = "HNBOT_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/bot.toml";
pub const DEFAULT_FEED_URL: &str = "https://hnrss.org/frontpage";

/// Platform blob upload cap.
pub const DEFAULT_MAX_THUMB_BYTES: usize = 1_000_000;

fn default_feed_url() -> String {
    DEFAULT_FEED_URL.to_string()
}
fn default_top_n() -> usize {
    DEFAULT_TOP_N
}
fn default_history_factor() -> usize {
    2
}
fn default_service_url() -> String {
    DEFAULT_SERVICE_URL.to_string()
}
fn default_secret_id() -> String {
    DEFAULT_SECRET_ID.to_string()
}
fn default_http_timeout_secs() -> u64 {
    10
}
fn default_max_thumb_bytes() -> usize {
    DEFAULT_MAX_THUMB_BYTES
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublishOrder {
    /// Hottest first.
    #[default]
    Ranked,
    /// Hottest last, so it ends up on top of the account timeline.
    Reversed,
}

impl FromStr for PublishOrder {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ranked" => Ok(Self::Ranked),
            "reversed" => Ok(Self::Reversed),
            other => Err(anyhow!("unknown publish order {other:?} (expected ranked|reversed)")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    #[serde(default = "default_feed_url")]
    pub feed_url: String,
    /// Candidates kept after ranking.
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    /// Recent posts queried for dedup = `history_factor * top_n`. At least 2.
    #[serde(default = "default_history_factor")]
    pub history_factor: usize,
    #[serde(default = "default_service_url")]
    pub service_url: String,
    /// Whose author feed is checked for already-posted links. Defaults to the
    /// logged-in handle.
    #[serde(default)]
    pub actor: Option<String>,
    #[serde(default = "default_secret_id")]
    pub secret_id: String,
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
    #[serde(default = "default_max_thumb_bytes")]
    pub max_thumb_bytes: usize,
    #[serde(default)]
    pub publish_order: PublishOrder,
    /// Compose and log, but never upload or publish.
    #[serde(default)]
    pub dry_run: bool,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            feed_url: default_feed_url(),
            top_n: default_top_n(),
            history_factor: default_history_factor(),
            service_url: default_service_url(),
            actor: None,
            secret_id: default_secret_id(),
            http_timeout_secs: default_http_timeout_secs(),
            max_thumb_bytes: default_max_thumb_bytes(),
            publish_order: PublishOrder::default(),
            dry_run: false,
        }
    }
}

impl BotConfig {
    /// Defaults, then the TOML file (`$HNBOT_CONFIG_PATH`, else
    /// `config/bot.toml` if present), then `HNBOT_*` env overrides.
    pub fn load() -> Result<Self> {
        let mut cfg = match std::env::var(ENV_CONFIG_PATH) {
            Ok(p) => {
                let pb = PathBuf::from(p);
                if !pb.exists() {
                    bail!("{ENV_CONFIG_PATH} points to non-existent path {}", pb.display());
                }
                Self::from_file(&pb)?
            }
            Err(_) => {
                let pb = PathBuf::from(DEFAULT_CONFIG_PATH);
                if pb.exists() {
                    Self::from_file(&pb)?
                } else {
                    Self::default()
                }
            }
        };
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading bot config from {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn from_toml(s: &str) -> Result<Self> {
        let cfg: BotConfig = toml::from_str(s)?;
        Ok(cfg)
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Some(v) = env_nonempty("HNBOT_FEED_URL") {
            self.feed_url = v;
        }
        if let Some(v) = env_nonempty("HNBOT_TOP_N") {
            self.top_n = v.parse().with_context(|| format!("HNBOT_TOP_N={v:?}"))?;
        }
        if let Some(v) = env_nonempty("HNBOT_SERVICE_URL") {
            self.service_url = v;
        }
        if let Some(v) = env_nonempty("HNBOT_ACTOR") {
            self.actor = Some(v);
        }
        if let Some(v) = env_nonempty("HNBOT_SECRET_ID") {
            self.secret_id = v;
        }
        if let Some(v) = env_nonempty("HNBOT_PUBLISH_ORDER") {
            self.publish_order = v.parse()?;
        }
        if let Some(v) = env_nonempty("HNBOT_DRY_RUN") {
            self.dry_run = matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes");
        }
        Ok(())
    }

    fn validate(&mut self) -> Result<()> {
        if self.top_n == 0 {
            bail!("top_n must be at least 1");
        }
        if self.history_factor < 2 {
            tracing::warn!(history_factor = self.history_factor, "history_factor raised to 2");
            self.history_factor = 2;
        }
        if self.http_timeout_secs == 0 {
            self.http_timeout_secs = default_http_timeout_secs();
        }
        Ok(())
    }

    /// How many recent posts to check for already-posted links.
    pub fn history_limit(&self) -> usize {
        self.top_n.saturating_mul(self.history_factor)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

fn env_nonempty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{env, fs};

    const ENV_KEYS: &[&str] = &[
        ENV_CONFIG_PATH,
        "HNBOT_FEED_URL",
        "HNBOT_TOP_N",
        "HNBOT_SERVICE_URL",
        "HNBOT_ACTOR",
        "HNBOT_SECRET_ID",
        "HNBOT_PUBLISH_ORDER",
        "HNBOT_DRY_RUN",
    ];

    fn clear_env() {
        for k in ENV_KEYS {
            env::remove_var(k);
        }
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let cfg = BotConfig::from_toml("top_n = 5\npublish_order = \"reversed\"").unwrap();
        assert_eq!(cfg.top_n, 5);
        assert_eq!(cfg.publish_order, PublishOrder::Reversed);
        assert_eq!(cfg.feed_url, DEFAULT_FEED_URL);
        assert_eq!(cfg.history_limit(), 10);
    }

    #[test]
    fn publish_order_parses_case_insensitively() {
        assert_eq!("Ranked".parse::<PublishOrder>().unwrap(), PublishOrder::Ranked);
        assert!("sideways".parse::<PublishOrder>().is_err());
    }

    #[serial_test::serial]
    #[test]
    fn load_uses_file_then_env_overrides() {
        clear_env();
        let tmp = tempfile::tempdir().unwrap();
        let p = tmp.path().join("bot.toml");
        fs::write(&p, "top_n = 3\nhistory_factor = 1\nfeed_url = \"https://file.example/rss\"").unwrap();
        env::set_var(ENV_CONFIG_PATH, p.display().to_string());
        env::set_var("HNBOT_FEED_URL", "https://env.example/rss");
        env::set_var("HNBOT_DRY_RUN", "true");

        let cfg = BotConfig::load().unwrap();
        assert_eq!(cfg.top_n, 3);
        assert_eq!(cfg.history_factor, 2);
        assert_eq!(cfg.history_limit(), 6);
        assert_eq!(cfg.feed_url, "https://env.example/rss");
        assert!(cfg.dry_run);
        clear_env();
    }

    #[serial_test::serial]
    #[test]
    fn zero_top_n_is_rejected() {
        clear_env();
        env::set_var(ENV_CONFIG_PATH, "/definitely/not/here.toml");
        assert!(BotConfig::load().is_err());
        env::remove_var(ENV_CONFIG_PATH);

        env::set_var("HNBOT_TOP_N", "0");
        assert!(BotConfig::load().is_err());
        clear_env();
    }
}
