//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **InMemoryTaskQueue**: プロセス内の有界キュー
//! - **GitCli**: `git` サブプロセスによる VersionControl
//! - **GitHubProvider**: GitHub REST API による HostingProvider
//! - **HttpNotifier**: reqwest による Notifier
//! - **OpenAiTextGenerator**: chat completions API による TextGenerator
//! - **strategies**: 組み込みのコンテンツ戦略

pub mod git;
pub mod github;
pub mod http_notifier;
pub mod inmem_queue;
pub mod openai;
pub mod strategies;

pub use self::git::{CommitIdentity, GitCli};
pub use self::github::GitHubProvider;
pub use self::http_notifier::HttpNotifier;
pub use self::inmem_queue::InMemoryTaskQueue;
pub use self::openai::OpenAiTextGenerator;
