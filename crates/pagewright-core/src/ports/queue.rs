//! TaskQueue port - ingress と worker をつなぐ配送キュー
//!
//! # 設計原則
//! - ingress は enqueue するだけ（重い処理はしない）
//! - worker は lease → 実行 → ack/fail
//! - リトライはしない（失敗は記録して終わり）

use async_trait::async_trait;

use crate::domain::{AcceptedTask, QueueError};
use crate::observability::QueueCounts;

/// A leased task for processing.
/// The worker owns this lease and must either `ack` or `fail`.
#[async_trait]
pub trait TaskLease: Send {
    fn task(&self) -> &AcceptedTask;

    /// Mark success.
    async fn ack(self: Box<Self>);

    /// Mark failure. The task is not re-queued.
    async fn fail(self: Box<Self>, error: String);
}

#[async_trait]
pub trait TaskQueue: Send + Sync {
    /// Enqueue a task; fails when the queue is full or closed.
    async fn enqueue(&self, task: AcceptedTask) -> Result<(), QueueError>;

    /// Lease one task (waits until available, or returns None once closed
    /// and drained).
    async fn lease(&self) -> Option<Box<dyn TaskLease>>;

    /// Stop accepting new tasks and wake idle workers.
    async fn close(&self);

    async fn counts(&self) -> QueueCounts;
}
