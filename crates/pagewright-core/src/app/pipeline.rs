//! TaskPipeline - 1 タスク分の処理を直列に実行する
//!
//! # 状態遷移
//! `RECEIVED → WORKSPACE_READY → ATTACHMENTS_SAVED → CONTENT_GENERATED →
//!  METADATA_WRITTEN → PUBLISHED → NOTIFIED → (TRIGGERED_NEXT_ROUND | DONE)`
//!
//! - どこかで失敗したら残りは実行しない（ロールバックもリトライもしない）
//! - 結果は呼び出し元には返らない。ログと callback POST でのみ観測できる
//! - evaluation_url がなければ通知も round 2 トリガーもせず PUBLISHED → DONE

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{Instrument, debug, error, info, info_span};

use super::attachments::AttachmentMaterializer;
use super::config::Config;
use super::content::ContentGenerator;
use super::metadata::MetadataStamper;
use super::publisher::ArtifactPublisher;
use super::workspace::Workspace;
use crate::domain::{
    AcceptedTask, CompletionNotice, PipelineError, PipelineState, PublishedArtifact, TaskRequest,
};
use crate::ports::{NonceGenerator, Notifier, NotifyOutcome, TaskHandler};

/// What one run did. Only used for logging and tests.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub state: PipelineState,
    pub workspace: PathBuf,
    pub attachments: Vec<PathBuf>,
    pub artifact: PublishedArtifact,
    /// `None` when no evaluation_url was supplied.
    pub notification: Option<NotifyOutcome>,
    /// `None` unless round 1 with an evaluation_url.
    pub trigger: Option<NotifyOutcome>,
}

pub struct TaskPipeline {
    config: Arc<Config>,
    materializer: AttachmentMaterializer,
    content: ContentGenerator,
    metadata: MetadataStamper,
    publisher: ArtifactPublisher,
    notifier: Arc<dyn Notifier>,
    nonces: Arc<dyn NonceGenerator>,
}

fn enter(reached: &mut PipelineState, state: PipelineState) {
    *reached = state;
    info!(state = %state, "pipeline state");
}

impl TaskPipeline {
    pub fn new(
        config: Arc<Config>,
        content: ContentGenerator,
        metadata: MetadataStamper,
        publisher: ArtifactPublisher,
        notifier: Arc<dyn Notifier>,
        nonces: Arc<dyn NonceGenerator>,
    ) -> Self {
        Self {
            config,
            materializer: AttachmentMaterializer::new(),
            content,
            metadata,
            publisher,
            notifier,
            nonces,
        }
    }

    /// Run every step for `task`. The caller has already checked the secret.
    pub async fn process(&self, task: AcceptedTask) -> Result<PipelineReport, PipelineError> {
        let span = info_span!(
            "pipeline",
            task = %task.name,
            nonce = %task.nonce,
            round = %task.round
        );
        let mut reached = PipelineState::Received;
        let result = self.run(&task, &mut reached).instrument(span.clone()).await;
        if let Err(err) = &result {
            error!(parent: &span, state = %reached, error = %err, "pipeline aborted");
        }
        result
    }

    async fn run(
        &self,
        task: &AcceptedTask,
        reached: &mut PipelineState,
    ) -> Result<PipelineReport, PipelineError> {
        enter(reached, PipelineState::Received);

        let workspace = Workspace::prepare(&self.config.base_dir, &task.workspace_key()).await?;
        let dir = workspace.path();
        enter(reached, PipelineState::WorkspaceReady);

        let attachments = self.materializer.materialize(dir, &task.attachments).await?;
        enter(reached, PipelineState::AttachmentsSaved);

        self.content.write_index(dir, &task.brief, &attachments).await?;
        enter(reached, PipelineState::ContentGenerated);

        let pages_url = self.publisher.pages_url(&task.name);
        self.metadata
            .stamp(dir, &task.name, &task.brief, &pages_url)
            .await?;
        enter(reached, PipelineState::MetadataWritten);

        let artifact = self.publisher.publish(&task.name, dir, task.round).await?;
        info!(
            revision = artifact.revision_or_na(),
            repo_url = %artifact.repo_url,
            pages_url = %artifact.pages_url,
            "artifact published"
        );
        enter(reached, PipelineState::Published);

        let mut report = PipelineReport {
            state: PipelineState::Published,
            workspace: dir.to_path_buf(),
            attachments,
            artifact,
            notification: None,
            trigger: None,
        };

        let Some(callback) = task.evaluation_url.as_deref() else {
            info!("no evaluation_url, skipping notification");
            enter(reached, PipelineState::Done);
            report.state = *reached;
            return Ok(report);
        };

        let notice = CompletionNotice::new(task, &report.artifact);
        report.notification = Some(self.post("completion", callback, &notice).await);
        enter(reached, PipelineState::Notified);

        if task.round.is_initial() {
            let next = TaskRequest::round_two(task, &self.config.secret, &self.nonces.generate());
            report.trigger = Some(self.post("round-2 trigger", callback, &next).await);
            enter(reached, PipelineState::TriggeredNextRound);
        } else {
            enter(reached, PipelineState::Done);
        }
        report.state = *reached;
        Ok(report)
    }

    async fn post<T: Serialize>(&self, kind: &'static str, url: &str, body: &T) -> NotifyOutcome {
        let outcome = match serde_json::to_value(body) {
            Ok(payload) => self.notifier.notify(url, &payload).await,
            Err(err) => NotifyOutcome::Transport(err.to_string()),
        };
        debug!(kind, delivered = outcome.is_delivered(), "callback attempted");
        outcome
    }
}

#[async_trait]
impl TaskHandler for TaskPipeline {
    async fn handle(&self, task: AcceptedTask) -> Result<(), PipelineError> {
        self.process(task).await.map(|_| ())
    }
}
