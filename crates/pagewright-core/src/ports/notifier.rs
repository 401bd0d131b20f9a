//! Notifier port - 呼び出し元 URL への JSON POST（best-effort）
//!
//! `notify` は決してエラーを返さない。結果は `NotifyOutcome` で表現し、
//! ログに残すかどうかは呼び出し側が決める。

use async_trait::async_trait;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyOutcome {
    /// 2xx response.
    Delivered { status: u16 },
    /// Non-2xx response.
    Rejected { status: u16, body: String },
    /// Connection, TLS, or request-building failure.
    Transport(String),
}

impl NotifyOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, NotifyOutcome::Delivered { .. })
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, url: &str, payload: &serde_json::Value) -> NotifyOutcome;
}
