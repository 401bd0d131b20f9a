//! WorkerGroup - キューから lease してパイプラインを回すワーカー群
//!
//! - `shutdown_and_join` で新しい lease の取得を止め、実行中の run は最後まで待つ
//! - 失敗した run は `fail` で記録するだけで再投入しない（リトライなし）
//! - handler の panic も 1 回分の失敗として扱う（ワーカー自体は生き残る）

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::ports::{TaskHandler, TaskQueue};

pub struct WorkerGroup {
    shutdown_tx: watch::Sender<bool>,
    queue: Arc<dyn TaskQueue>,
    joins: Vec<JoinHandle<()>>,
}

impl WorkerGroup {
    /// Spawn `n` workers.
    pub fn spawn(n: usize, queue: Arc<dyn TaskQueue>, handler: Arc<dyn TaskHandler>) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let mut joins = Vec::with_capacity(n);
        for worker_id in 0..n {
            let q = Arc::clone(&queue);
            let h = Arc::clone(&handler);
            let mut rx = shutdown_rx.clone();

            joins.push(tokio::spawn(async move {
                worker_loop(worker_id, q, h, &mut rx).await;
            }));
        }
        info!(workers = n, "worker group started");

        Self {
            shutdown_tx,
            queue,
            joins,
        }
    }

    /// Stop taking new leases. In-flight runs are not cancelled.
    pub fn request_shutdown(&self) {
        // receivers may already be gone
        let _ = self.shutdown_tx.send(true);
    }

    /// Close the queue, stop the workers and wait for in-flight runs.
    pub async fn shutdown_and_join(self) {
        self.queue.close().await;
        self.request_shutdown();
        for join in self.joins {
            let _ = join.await;
        }
        info!("worker group stopped");
    }
}

async fn worker_loop(
    worker_id: usize,
    queue: Arc<dyn TaskQueue>,
    handler: Arc<dyn TaskHandler>,
    shutdown_rx: &mut watch::Receiver<bool>,
) {
    loop {
        if *shutdown_rx.borrow() {
            break;
        }

        // lease は待つので shutdown と競合させる
        let lease = tokio::select! {
            changed = shutdown_rx.changed() => {
                // sender が drop されたら止まる
                if changed.is_err() {
                    break;
                }
                continue;
            }
            lease = queue.lease() => lease,
        };

        // None は close 済みかつ空
        let Some(lease) = lease else {
            break;
        };

        let task = lease.task().clone();
        debug!(worker_id, task = %task.name, nonce = %task.nonce, "leased task");

        // 別タスクで実行して panic を JoinError として受け取る
        let run = tokio::spawn({
            let handler = Arc::clone(&handler);
            async move { handler.handle(task).await }
        });

        match run.await {
            Ok(Ok(())) => lease.ack().await,
            Ok(Err(err)) => lease.fail(err.to_string()).await,
            Err(join_err) => {
                error!(worker_id, error = %join_err, "task run panicked");
                lease.fail(join_err.to_string()).await;
            }
        }
    }
    debug!(worker_id, "worker stopped");
}
