//! Observability - ヘルスチェックで返す状態のスナップショット

use serde::{Deserialize, Serialize};

/// Snapshot of the task queue, exposed on the health endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueCounts {
    pub queued: usize,
    pub running: usize,
    pub succeeded: usize,
    pub failed: usize,
}
