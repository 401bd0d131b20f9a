//! Errors - コンポーネントごとのエラー型
//!
//! # 分類
//! - `IngressError`: 認可・リクエスト形式・キュー満杯（副作用の前に返す）
//! - `PublishError` / `VcsError`: publish の致命的な失敗
//! - `PipelineError`: 1 回の実行を中断させる失敗（ログのみ、呼び出し元には返らない）
//!
//! 通知の失敗はエラー型を持たない（`NotifyOutcome` で表現する）。

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngressError {
    #[error("invalid secret")]
    Unauthorized,

    #[error("malformed request: {0}")]
    Malformed(String),

    #[error("task queue is full")]
    QueueFull,

    #[error("task queue is closed")]
    QueueClosed,
}

impl From<QueueError> for IngressError {
    fn from(err: QueueError) -> Self {
        match err {
            QueueError::Full(_) => IngressError::QueueFull,
            QueueError::Closed => IngressError::QueueClosed,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueueError {
    #[error("queue is full (capacity={0})")]
    Full(usize),

    #[error("queue is closed")]
    Closed,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

#[derive(Debug, Error)]
pub enum AttachmentError {
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("attachment name {0:?} is not a usable file name")]
    InvalidName(String),

    #[error("attachment {0:?} has a malformed data uri")]
    MalformedDataUri(String),

    #[error("attachment {name:?} could not be decoded: {source}")]
    Decode {
        name: String,
        #[source]
        source: base64::DecodeError,
    },
}

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("text generation request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("text generation failed: {0}")]
    Generation(String),
}

#[derive(Debug, Error)]
pub enum VcsError {
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` failed: {stderr}")]
    Failed { command: String, stderr: String },

    #[error("version control task aborted: {0}")]
    Join(String),
}

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("project provisioning failed: {status} {body}")]
    Provision { status: u16, body: String },

    #[error("hosting provider request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Vcs(#[from] VcsError),

    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("workspace {path} could not be prepared: {source}")]
    Workspace {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Attachments(#[from] AttachmentError),

    #[error(transparent)]
    Content(#[from] ContentError),

    #[error("metadata file {path} could not be written: {source}")]
    Metadata {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("publish failed: {0}")]
    Publish(#[from] PublishError),
}
