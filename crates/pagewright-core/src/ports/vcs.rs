//! VersionControl port - ローカルの版管理操作
//!
//! すべて `dir` を作業ディレクトリとして実行する。失敗したときに
//! 致命的か許容かを決めるのは呼び出し側（publisher）の `StepPolicy`。

use std::path::Path;

use async_trait::async_trait;

use crate::domain::VcsError;

#[async_trait]
pub trait VersionControl: Send + Sync {
    /// Initialize a repository whose unborn branch is `branch`.
    async fn init(&self, dir: &Path, branch: &str) -> Result<(), VcsError>;

    /// Stage every file in the working tree.
    async fn add_all(&self, dir: &Path) -> Result<(), VcsError>;

    /// Record a revision. Fails when there is nothing to commit.
    async fn commit(&self, dir: &Path, message: &str) -> Result<(), VcsError>;

    async fn add_remote(&self, dir: &Path, name: &str, url: &str) -> Result<(), VcsError>;

    async fn push(&self, dir: &Path, remote: &str, branch: &str) -> Result<(), VcsError>;

    /// Clone `url` into `dest` (which must not exist or be empty).
    async fn clone_repo(&self, url: &str, dest: &Path) -> Result<(), VcsError>;

    /// Fetch and rebase local commits onto the remote branch.
    async fn pull_rebase(&self, dir: &Path, remote: &str, branch: &str) -> Result<(), VcsError>;

    /// Full id of the current head revision.
    async fn head_revision(&self, dir: &Path) -> Result<String, VcsError>;
}
