//! ArtifactPublisher - workspace をホスティング先に公開する
//!
//! # ラウンドごとの動作
//! - Round 1 (`PublishMode::Create`): project 作成 → init → add → commit → remote 追加 → push
//!   までが Fatal。ページ公開だけ Tolerated。
//! - Round 2 以降 (`PublishMode::Update`): 既存 project を一時ディレクトリに clone し、
//!   workspace のファイルを上書きコピーしてから commit / pull --rebase / push（いずれも Tolerated）。
//!   revision は clone 側から読む（実際に push された内容を報告する）。

use std::io;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::domain::{
    PublishError, PublishMode, PublishedArtifact, Round, StepOutcome, StepPolicy, TaskName,
};
use crate::ports::{HostingProvider, VersionControl};

pub const REMOTE_NAME: &str = "origin";
pub const INITIAL_COMMIT_MESSAGE: &str = "Initial commit";

pub struct ArtifactPublisher {
    hosting: Arc<dyn HostingProvider>,
    vcs: Arc<dyn VersionControl>,
    branch: String,
}

impl ArtifactPublisher {
    pub fn new(
        hosting: Arc<dyn HostingProvider>,
        vcs: Arc<dyn VersionControl>,
        branch: impl Into<String>,
    ) -> Self {
        Self {
            hosting,
            vcs,
            branch: branch.into(),
        }
    }

    pub fn pages_url(&self, name: &TaskName) -> String {
        self.hosting.pages_url(name)
    }

    pub async fn publish(
        &self,
        name: &TaskName,
        dir: &Path,
        round: Round,
    ) -> Result<PublishedArtifact, PublishError> {
        match round.mode() {
            PublishMode::Create => self.create(name, dir).await,
            PublishMode::Update => self.update(name, dir, round).await,
        }
    }

    async fn create(&self, name: &TaskName, dir: &Path) -> Result<PublishedArtifact, PublishError> {
        let fatal = StepPolicy::Fatal;

        let provisioned = self.hosting.create_project(name).await?;
        debug!(project = %name, ?provisioned, "project provisioned");

        let remote = self.hosting.remote_url(name);
        fatal.apply("init", self.vcs.init(dir, &self.branch).await)?;
        fatal.apply("add", self.vcs.add_all(dir).await)?;
        fatal.apply("commit", self.vcs.commit(dir, INITIAL_COMMIT_MESSAGE).await)?;
        fatal.apply("add_remote", self.vcs.add_remote(dir, REMOTE_NAME, &remote).await)?;
        fatal.apply("push", self.vcs.push(dir, REMOTE_NAME, &self.branch).await)?;

        StepPolicy::Tolerated.apply(
            "enable_pages",
            self.hosting.enable_pages(name, &self.branch).await,
        )?;

        let revision = self.read_revision(dir).await;
        Ok(self.artifact(name, revision))
    }

    async fn update(
        &self,
        name: &TaskName,
        dir: &Path,
        round: Round,
    ) -> Result<PublishedArtifact, PublishError> {
        let checkout = tempfile::Builder::new()
            .prefix(&format!("{name}-round{round}-"))
            .tempdir()
            .map_err(|source| PublishError::Io {
                path: std::env::temp_dir(),
                source,
            })?;
        let clone_dir = checkout.path().join(name.as_str());

        let remote = self.hosting.remote_url(name);
        StepPolicy::Fatal.apply("clone", self.vcs.clone_repo(&remote, &clone_dir).await)?;

        superimpose(dir, &clone_dir).await?;

        let tolerated = StepPolicy::Tolerated;
        let message = format!("Round {round} update");
        tolerated.apply("add", self.vcs.add_all(&clone_dir).await)?;
        let committed = tolerated.apply("commit", self.vcs.commit(&clone_dir, &message).await)?;
        tolerated.apply(
            "pull_rebase",
            self.vcs.pull_rebase(&clone_dir, REMOTE_NAME, &self.branch).await,
        )?;
        let pushed = tolerated.apply(
            "push",
            self.vcs.push(&clone_dir, REMOTE_NAME, &self.branch).await,
        )?;
        if !committed.is_done() || !pushed.is_done() {
            warn!(project = %name, %round, "update was not fully pushed");
        }

        let revision = self.read_revision(&clone_dir).await;
        Ok(self.artifact(name, revision))
    }

    async fn read_revision(&self, dir: &Path) -> Option<String> {
        StepPolicy::Tolerated
            .apply("head_revision", self.vcs.head_revision(dir).await)
            .ok()
            .and_then(StepOutcome::done)
    }

    fn artifact(&self, name: &TaskName, revision: Option<String>) -> PublishedArtifact {
        PublishedArtifact {
            name: name.clone(),
            revision,
            repo_url: self.hosting.repo_url(name),
            pages_url: self.hosting.pages_url(name),
        }
    }
}

/// Copy the workspace over a checkout. `.git` is skipped, directories are
/// replaced wholesale, and files only present in the checkout are kept.
async fn superimpose(src: &Path, dest: &Path) -> Result<(), PublishError> {
    let src = src.to_path_buf();
    let dest = dest.to_path_buf();
    let err_path = dest.clone();
    tokio::task::spawn_blocking(move || superimpose_blocking(&src, &dest))
        .await
        .map_err(io::Error::other)
        .and_then(|res| res)
        .map_err(|source| PublishError::Io {
            path: err_path,
            source,
        })
}

fn superimpose_blocking(src: &Path, dest: &Path) -> io::Result<()> {
    let entries = WalkDir::new(src)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.file_name() != ".git");

    for entry in entries {
        let entry = entry.map_err(io::Error::from)?;
        let relative = entry.path().strip_prefix(src).map_err(io::Error::other)?;
        let to = dest.join(relative);
        let file_type = entry.file_type();
        // 置き換えはトップレベルだけ。その下は空のディレクトリに書く
        let top_level = entry.depth() == 1;

        if file_type.is_dir() {
            if top_level {
                remove_existing(&to)?;
            }
            std::fs::create_dir_all(&to)?;
        } else if file_type.is_file() {
            if top_level && to.is_dir() {
                std::fs::remove_dir_all(&to)?;
            }
            std::fs::copy(entry.path(), &to)?;
        }
    }
    Ok(())
}

fn remove_existing(path: &Path) -> io::Result<()> {
    match std::fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => std::fs::remove_dir_all(path),
        Ok(_) => std::fs::remove_file(path),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{FakeHosting, FakeVcs};
    use super::*;
    use crate::impls::{CommitIdentity, GitCli};
    use std::path::PathBuf;
    use std::process::Command;

    fn name() -> TaskName {
        TaskName::new("t1").unwrap()
    }

    fn round(n: u32) -> Round {
        Round::new(n).unwrap()
    }

    #[tokio::test]
    async fn round_one_runs_every_step_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let hosting = Arc::new(FakeHosting::new("remote"));
        let vcs = Arc::new(FakeVcs::default());
        let publisher = ArtifactPublisher::new(hosting.clone(), vcs.clone(), "main");

        let artifact = publisher.publish(&name(), dir.path(), round(1)).await.unwrap();

        assert_eq!(hosting.calls(), vec!["create t1", "pages t1 main"]);
        assert_eq!(
            vcs.calls(),
            vec!["init", "add", "commit", "add_remote", "push", "head"]
        );
        assert_eq!(artifact.repo_url, "https://github.com/me/t1");
        assert_eq!(artifact.pages_url, "https://me.github.io/t1/");
        assert_eq!(artifact.revision.as_deref().map(str::len), Some(40));
    }

    #[tokio::test]
    async fn existing_project_is_still_pushed() {
        let dir = tempfile::tempdir().unwrap();
        let mut hosting = FakeHosting::new("remote");
        hosting.already_exists = true;
        let vcs = Arc::new(FakeVcs::default());
        let publisher = ArtifactPublisher::new(Arc::new(hosting), vcs.clone(), "main");

        publisher.publish(&name(), dir.path(), round(1)).await.unwrap();
        assert!(vcs.calls().contains(&"push".to_string()));
    }

    #[tokio::test]
    async fn failed_create_aborts_before_any_git_command() {
        let dir = tempfile::tempdir().unwrap();
        let hosting = FakeHosting::new("remote");
        *hosting.create.lock().unwrap() = Some(PublishError::Provision {
            status: 401,
            body: "Bad credentials".to_string(),
        });
        let vcs = Arc::new(FakeVcs::default());
        let publisher = ArtifactPublisher::new(Arc::new(hosting), vcs.clone(), "main");

        let err = publisher.publish(&name(), dir.path(), round(1)).await.unwrap_err();
        assert!(matches!(err, PublishError::Provision { status: 401, .. }));
        assert!(vcs.calls().is_empty());
    }

    #[tokio::test]
    async fn round_one_push_failure_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let vcs = Arc::new(FakeVcs::failing(&["push"]));
        let publisher =
            ArtifactPublisher::new(Arc::new(FakeHosting::new("remote")), vcs.clone(), "main");

        let err = publisher.publish(&name(), dir.path(), round(1)).await.unwrap_err();
        assert!(matches!(err, PublishError::Vcs(_)));
        assert!(!vcs.calls().contains(&"head".to_string()));
    }

    #[tokio::test]
    async fn page_activation_failure_is_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        let mut hosting = FakeHosting::new("remote");
        hosting.pages_fail = true;
        let publisher =
            ArtifactPublisher::new(Arc::new(hosting), Arc::new(FakeVcs::default()), "main");

        let artifact = publisher.publish(&name(), dir.path(), round(1)).await.unwrap();
        assert!(artifact.revision.is_some());
    }

    #[tokio::test]
    async fn update_never_creates_and_tolerates_git_failures() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "v2").unwrap();
        let hosting = Arc::new(FakeHosting::new("remote"));
        let vcs = Arc::new(FakeVcs::failing(&["commit", "pull_rebase", "push"]));
        let publisher = ArtifactPublisher::new(hosting.clone(), vcs.clone(), "main");

        let artifact = publisher.publish(&name(), dir.path(), round(2)).await.unwrap();

        assert!(hosting.calls().is_empty());
        assert_eq!(
            vcs.calls(),
            vec!["clone", "add", "commit", "pull_rebase", "push", "head"]
        );
        // revision comes from the clone, not the workspace
        let dirs = vcs.dirs.lock().unwrap().clone();
        assert_ne!(dirs.last().unwrap(), dir.path());
        assert!(artifact.revision.is_some());
    }

    #[tokio::test]
    async fn update_without_clone_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let vcs = Arc::new(FakeVcs::failing(&["clone"]));
        let publisher =
            ArtifactPublisher::new(Arc::new(FakeHosting::new("remote")), vcs.clone(), "main");

        let err = publisher.publish(&name(), dir.path(), round(2)).await.unwrap_err();
        assert!(matches!(err, PublishError::Vcs(_)));
        assert_eq!(vcs.calls(), vec!["clone"]);
    }

    #[tokio::test]
    async fn superimposition_keeps_remote_only_files() {
        let src = tempfile::tempdir().unwrap();
        let dest = tempfile::tempdir().unwrap();

        std::fs::write(src.path().join("index.html"), "new").unwrap();
        std::fs::create_dir_all(src.path().join("assets")).unwrap();
        std::fs::write(src.path().join("assets/app.js"), "js").unwrap();
        std::fs::create_dir_all(src.path().join(".git")).unwrap();
        std::fs::write(src.path().join(".git/HEAD"), "workspace").unwrap();

        std::fs::write(dest.path().join("index.html"), "old").unwrap();
        std::fs::write(dest.path().join("remote-only.txt"), "keep").unwrap();
        std::fs::create_dir_all(dest.path().join("assets")).unwrap();
        std::fs::write(dest.path().join("assets/stale.js"), "stale").unwrap();
        std::fs::create_dir_all(dest.path().join(".git")).unwrap();
        std::fs::write(dest.path().join(".git/HEAD"), "checkout").unwrap();

        superimpose(src.path(), dest.path()).await.unwrap();

        let read = |p: &str| std::fs::read_to_string(dest.path().join(p)).unwrap();
        assert_eq!(read("index.html"), "new");
        assert_eq!(read("remote-only.txt"), "keep");
        assert_eq!(read("assets/app.js"), "js");
        assert!(!dest.path().join("assets/stale.js").exists());
        assert_eq!(read(".git/HEAD"), "checkout");
    }

    #[tokio::test]
    async fn superimposition_copies_nested_trees() {
        let src = tempfile::tempdir().unwrap();
        let dest = tempfile::tempdir().unwrap();

        std::fs::create_dir_all(src.path().join("assets/img/icons")).unwrap();
        std::fs::write(src.path().join("assets/img/icons/a.svg"), "svg").unwrap();
        std::fs::write(src.path().join("assets/img/logo.png"), "png").unwrap();
        std::fs::create_dir_all(src.path().join("vendor/lib/.git")).unwrap();
        std::fs::write(src.path().join("vendor/lib/.git/HEAD"), "nested").unwrap();
        std::fs::write(src.path().join("vendor/lib/x.js"), "x").unwrap();
        std::fs::create_dir_all(src.path().join("docs")).unwrap();
        std::fs::write(src.path().join("docs/index.md"), "# docs").unwrap();

        // checkout 側で docs はファイル、data.csv はディレクトリ
        std::fs::write(dest.path().join("docs"), "was a file").unwrap();
        std::fs::write(src.path().join("data.csv"), "sales\n1\n").unwrap();
        std::fs::create_dir_all(dest.path().join("data.csv")).unwrap();

        superimpose(src.path(), dest.path()).await.unwrap();

        let read = |p: &str| std::fs::read_to_string(dest.path().join(p)).unwrap();
        assert_eq!(read("assets/img/icons/a.svg"), "svg");
        assert_eq!(read("assets/img/logo.png"), "png");
        assert_eq!(read("vendor/lib/x.js"), "x");
        assert!(!dest.path().join("vendor/lib/.git").exists());
        assert_eq!(read("docs/index.md"), "# docs");
        assert_eq!(read("data.csv"), "sales\n1\n");
    }

    fn bare_remote(base: &Path) -> PathBuf {
        let remote = base.join("remote.git");
        let status = Command::new("git")
            .args(["init", "--bare"])
            .arg(&remote)
            .status()
            .unwrap();
        assert!(status.success());
        let status = Command::new("git")
            .args(["symbolic-ref", "HEAD", "refs/heads/main"])
            .current_dir(&remote)
            .status()
            .unwrap();
        assert!(status.success());
        remote
    }

    #[tokio::test]
    async fn git_backed_rounds_produce_distinct_revisions() {
        let base = tempfile::tempdir().unwrap();
        let remote = bare_remote(base.path());
        let hosting = Arc::new(FakeHosting::new(remote.to_string_lossy()));
        let git = Arc::new(GitCli::new(CommitIdentity::for_owner("tester")));
        let publisher = ArtifactPublisher::new(hosting.clone(), git, "main");

        let round_one = base.path().join("t1_n1_app");
        std::fs::create_dir_all(&round_one).unwrap();
        std::fs::write(round_one.join("index.html"), "<p>one</p>").unwrap();
        std::fs::write(round_one.join("LICENSE"), "MIT").unwrap();
        let first = publisher.publish(&name(), &round_one, round(1)).await.unwrap();

        let round_two = base.path().join("t1_n2_app");
        std::fs::create_dir_all(&round_two).unwrap();
        std::fs::write(round_two.join("index.html"), "<p>two</p>").unwrap();
        let second = publisher.publish(&name(), &round_two, round(2)).await.unwrap();

        assert_eq!(hosting.calls().iter().filter(|c| c.starts_with("create")).count(), 1);
        assert!(first.revision.is_some());
        assert!(second.revision.is_some());
        assert_ne!(first.revision, second.revision);

        // the remote head is what round 2 reported, and round-1-only files survive
        let head = Command::new("git")
            .args(["rev-parse", "refs/heads/main"])
            .current_dir(&remote)
            .output()
            .unwrap();
        assert_eq!(
            String::from_utf8_lossy(&head.stdout).trim(),
            second.revision.as_deref().unwrap()
        );
        let license = Command::new("git")
            .args(["show", "main:LICENSE"])
            .current_dir(&remote)
            .output()
            .unwrap();
        assert!(license.status.success());
    }
}
