//! Config - プロセス全体の設定
//!
//! - 起動時に一度だけ構築して `validate()` する
//! - 以降は `Arc<Config>` として read-only で共有

use std::fmt;
use std::path::PathBuf;

use crate::domain::ConfigError;
use crate::impls::{github, openai};

pub const DEFAULT_BRANCH: &str = "main";
pub const DEFAULT_WORKERS: usize = 4;
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;
/// 添付は data URI でボディに埋め込まれるので axum の既定 (2 MiB) では足りない
pub const DEFAULT_MAX_BODY_BYTES: usize = 32 * 1024 * 1024;

#[derive(Clone)]
pub struct TextGenerationConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
}

impl TextGenerationConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: openai::DEFAULT_MODEL.to_string(),
            base_url: openai::DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl fmt::Debug for TextGenerationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextGenerationConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[derive(Clone)]
pub struct Config {
    /// Shared secret every inbound request must carry.
    pub secret: String,
    /// Owner identity on the hosting provider.
    pub owner: String,
    /// Access credential for the hosting provider.
    pub token: String,
    /// Workspaces are created under this directory.
    pub base_dir: PathBuf,
    pub branch: String,
    pub workers: usize,
    pub queue_capacity: usize,
    /// Upper bound on an inbound task body.
    pub max_body_bytes: usize,
    pub github_api_base: String,
    /// `None` なら text-generation の content strategy は無効
    pub text_generation: Option<TextGenerationConfig>,
}

impl Config {
    pub fn new(
        secret: impl Into<String>,
        owner: impl Into<String>,
        token: impl Into<String>,
        base_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            secret: secret.into(),
            owner: owner.into(),
            token: token.into(),
            base_dir: base_dir.into(),
            branch: DEFAULT_BRANCH.to_string(),
            workers: DEFAULT_WORKERS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            github_api_base: github::DEFAULT_API_BASE.to_string(),
            text_generation: None,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.secret.is_empty() {
            return Err(ConfigError::Empty("secret"));
        }
        if self.owner.trim().is_empty() {
            return Err(ConfigError::Empty("owner"));
        }
        if self.branch.trim().is_empty() {
            return Err(ConfigError::Empty("branch"));
        }
        if self.workers == 0 {
            return Err(ConfigError::Zero("workers"));
        }
        if self.queue_capacity == 0 {
            return Err(ConfigError::Zero("queue_capacity"));
        }
        if self.max_body_bytes == 0 {
            return Err(ConfigError::Zero("max_body_bytes"));
        }
        Ok(())
    }

    /// 受信した secret と設定値を比較する。
    /// 最初の不一致バイトで抜けない（比較時間を内容に依存させない）
    pub fn secret_matches(&self, candidate: &str) -> bool {
        let expected = self.secret.as_bytes();
        let given = candidate.as_bytes();
        if expected.len() != given.len() {
            return false;
        }
        expected
            .iter()
            .zip(given)
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("secret", &"<redacted>")
            .field("owner", &self.owner)
            .field("token", &"<redacted>")
            .field("base_dir", &self.base_dir)
            .field("branch", &self.branch)
            .field("workers", &self.workers)
            .field("queue_capacity", &self.queue_capacity)
            .field("max_body_bytes", &self.max_body_bytes)
            .field("github_api_base", &self.github_api_base)
            .field("text_generation", &self.text_generation)
            .finish()
    }
}
