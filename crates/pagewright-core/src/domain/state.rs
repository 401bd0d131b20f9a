//! State - パイプライン 1 回分の状態
//!
//! 分岐もリトライもない一直線の状態機械:
//! `Received → WorkspaceReady → AttachmentsSaved → ContentGenerated →
//!  MetadataWritten → Published → Notified → (TriggeredNextRound | Done)`
//!
//! どの状態で失敗しても残りは実行しない。

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PipelineState {
    Received,
    WorkspaceReady,
    AttachmentsSaved,
    ContentGenerated,
    MetadataWritten,
    Published,
    Notified,
    TriggeredNextRound,
    Done,
}

impl PipelineState {
    pub fn as_str(self) -> &'static str {
        match self {
            PipelineState::Received => "RECEIVED",
            PipelineState::WorkspaceReady => "WORKSPACE_READY",
            PipelineState::AttachmentsSaved => "ATTACHMENTS_SAVED",
            PipelineState::ContentGenerated => "CONTENT_GENERATED",
            PipelineState::MetadataWritten => "METADATA_WRITTEN",
            PipelineState::Published => "PUBLISHED",
            PipelineState::Notified => "NOTIFIED",
            PipelineState::TriggeredNextRound => "TRIGGERED_NEXT_ROUND",
            PipelineState::Done => "DONE",
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
