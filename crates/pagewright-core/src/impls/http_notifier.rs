//! HttpNotifier - reqwest による Notifier 実装
//!
//! リトライなし・タイムアウトの上書きなし（クライアントのデフォルトのまま）。

use async_trait::async_trait;
use tracing::{info, warn};

use crate::ports::{Notifier, NotifyOutcome};

pub struct HttpNotifier {
    client: reqwest::Client,
}

impl HttpNotifier {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn notify(&self, url: &str, payload: &serde_json::Value) -> NotifyOutcome {
        let resp = match self.client.post(url).json(payload).send().await {
            Ok(resp) => resp,
            Err(err) => {
                warn!(%url, error = %err, "callback transport error");
                return NotifyOutcome::Transport(err.to_string());
            }
        };

        let status = resp.status().as_u16();
        if resp.status().is_success() {
            info!(%url, status, "callback delivered");
            NotifyOutcome::Delivered { status }
        } else {
            let body = resp.text().await.unwrap_or_default();
            warn!(%url, status, %body, "callback rejected");
            NotifyOutcome::Rejected { status, body }
        }
    }
}
