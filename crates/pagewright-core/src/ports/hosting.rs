//! HostingProvider port - リポジトリのホスティング + 公開ページ（REST control plane）
//!
//! git の push/clone は `VersionControl` 側。ここはプロジェクトの作成と
//! ページ公開、そして URL の組み立てだけを担当する。

use async_trait::async_trait;

use crate::domain::{PublishError, TaskName};

/// Result of a create-project call that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provisioned {
    Created,
    AlreadyExists,
}

#[async_trait]
pub trait HostingProvider: Send + Sync {
    /// Create a public project owned by the configured identity.
    ///
    /// "Already exists" is reported as `Ok(Provisioned::AlreadyExists)`.
    async fn create_project(&self, name: &TaskName) -> Result<Provisioned, PublishError>;

    /// Ask the provider to serve `branch` as a public page.
    async fn enable_pages(&self, name: &TaskName, branch: &str) -> Result<(), PublishError>;

    /// Authenticated remote used for push/clone. May embed credentials.
    fn remote_url(&self, name: &TaskName) -> String;

    /// Browser URL of the project.
    fn repo_url(&self, name: &TaskName) -> String;

    /// Public page URL. Deterministic; computed without a network call.
    fn pages_url(&self, name: &TaskName) -> String;
}
