//! pagewright-core
//!
//! Webhook で受け取ったタスクから静的 Web アプリを生成し、ホスティング先に
//! 公開して callback URL に結果を返すためのコア。
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（request, ids, state, artifact, policy, errors）
//! - **ports**: 外部境界の trait（HostingProvider, VersionControl, Notifier, TaskQueue, ...）
//! - **impls**: ports の実装（GitHub REST, git CLI, reqwest, in-memory queue, content strategies）
//! - **app**: アプリケーション層（pipeline, publisher, ingress, worker group, builder）
//! - **observability**: 外部に見せる状態のスナップショット

pub mod app;
pub mod domain;
pub mod impls;
pub mod observability;
pub mod ports;
