//! InMemoryTaskQueue - プロセス内の有界キュー
//!
//! # 実装詳細
//! - `tokio::sync::Mutex<VecDeque<AcceptedTask>>` で ready キューを管理
//! - `Notify` で push 時に待機中の worker を起こす
//! - 容量を超えた enqueue は `QueueError::Full`
//! - 再起動をまたいだ永続化はしない

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};
use tracing::warn;

use crate::domain::{AcceptedTask, QueueError};
use crate::observability::QueueCounts;
use crate::ports::{TaskLease, TaskQueue};

struct QueueState {
    ready: VecDeque<AcceptedTask>,
    running: usize,
    succeeded: usize,
    failed: usize,
    closed: bool,
}

pub struct InMemoryTaskQueue {
    state: Arc<Mutex<QueueState>>,
    notify: Arc<Notify>,
    capacity: usize,
}

impl InMemoryTaskQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(QueueState {
                ready: VecDeque::new(),
                running: 0,
                succeeded: 0,
                failed: 0,
                closed: false,
            })),
            notify: Arc::new(Notify::new()),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[async_trait]
impl TaskQueue for InMemoryTaskQueue {
    async fn enqueue(&self, task: AcceptedTask) -> Result<(), QueueError> {
        let mut state = self.state.lock().await;
        if state.closed {
            return Err(QueueError::Closed);
        }
        if state.ready.len() >= self.capacity {
            return Err(QueueError::Full(self.capacity));
        }
        state.ready.push_back(task);

        // ロックを外してから通知する
        drop(state);
        self.notify.notify_one();
        Ok(())
    }

    async fn lease(&self) -> Option<Box<dyn TaskLease>> {
        loop {
            // 状態を見る前に waiter として登録しておく（close の notify_waiters を取りこぼさない）
            let mut notified = std::pin::pin!(self.notify.notified());
            notified.as_mut().enable();
            {
                let mut state = self.state.lock().await;
                if let Some(task) = state.ready.pop_front() {
                    state.running += 1;
                    let more = !state.ready.is_empty();
                    drop(state);
                    // notify_one は 1 件分しか permit を残さないので、残りがあれば次の worker も起こす
                    if more {
                        self.notify.notify_one();
                    }
                    return Some(Box::new(InMemoryLease {
                        task,
                        state: Arc::clone(&self.state),
                    }));
                }
                if state.closed {
                    return None;
                }
            }
            notified.await;
        }
    }

    async fn close(&self) {
        self.state.lock().await.closed = true;
        self.notify.notify_waiters();
    }

    async fn counts(&self) -> QueueCounts {
        let state = self.state.lock().await;
        QueueCounts {
            queued: state.ready.len(),
            running: state.running,
            succeeded: state.succeeded,
            failed: state.failed,
        }
    }
}

/// Lease implementation for InMemoryTaskQueue.
struct InMemoryLease {
    task: AcceptedTask,
    state: Arc<Mutex<QueueState>>,
}

#[async_trait]
impl TaskLease for InMemoryLease {
    fn task(&self) -> &AcceptedTask {
        &self.task
    }

    async fn ack(self: Box<Self>) {
        let mut state = self.state.lock().await;
        state.running = state.running.saturating_sub(1);
        state.succeeded += 1;
    }

    async fn fail(self: Box<Self>, error: String) {
        let mut state = self.state.lock().await;
        state.running = state.running.saturating_sub(1);
        state.failed += 1;
        warn!(
            task = %self.task.name,
            nonce = %self.task.nonce,
            error = %error,
            "task run recorded as failed"
        );
    }
}
