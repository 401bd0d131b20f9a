//! GitCli - `git` サブプロセスによる VersionControl 実装
//!
//! `std::process::Command` はブロッキングなので、各コマンドは
//! `spawn_blocking` でワーカースレッドに逃がす（スケジューラを止めない）。

use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::process::Command;

use async_trait::async_trait;
use tracing::debug;
use url::Url;

use crate::domain::VcsError;
use crate::ports::VersionControl;

fn is_delimiter(c: char) -> bool {
    c.is_whitespace() || c == '\'' || c == '"'
}

/// Userinfo of a single URL token replaced with `***`. Anything that does not
/// parse as a URL with credentials is returned unchanged.
fn redact_url(token: &str) -> Cow<'_, str> {
    match Url::parse(token) {
        Ok(mut url) if !url.username().is_empty() || url.password().is_some() => {
            // set_* は cannot-be-a-base の URL でだけ失敗する（userinfo があるなら起きない）
            let _ = url.set_password(None);
            let _ = url.set_username("***");
            Cow::Owned(url.into())
        }
        _ => Cow::Borrowed(token),
    }
}

/// Replace `user:token@` in any URL inside `text` with `***@`.
pub fn redact_credentials(text: &str) -> String {
    text.split_inclusive(is_delimiter)
        .map(|piece| {
            let token = piece.trim_end_matches(is_delimiter);
            let tail = &piece[token.len()..];
            format!("{}{tail}", redact_url(token))
        })
        .collect()
}

/// Commit author used for every revision.
#[derive(Debug, Clone)]
pub struct CommitIdentity {
    pub name: String,
    pub email: String,
}

impl CommitIdentity {
    /// Identity derived from the hosting owner (`<owner>@users.noreply.github.com`).
    pub fn for_owner(owner: &str) -> Self {
        Self {
            name: owner.to_string(),
            email: format!("{owner}@users.noreply.github.com"),
        }
    }
}

pub struct GitCli {
    program: PathBuf,
    identity: CommitIdentity,
}

impl GitCli {
    pub fn new(identity: CommitIdentity) -> Self {
        Self {
            program: PathBuf::from("git"),
            identity,
        }
    }

    /// Run git with `args` in `dir` and return trimmed stdout.
    async fn run(&self, dir: &Path, args: Vec<String>) -> Result<String, VcsError> {
        let program = self.program.clone();
        let dir = dir.to_path_buf();
        let command = redact_credentials(&format!("git {}", args.join(" ")));
        debug!(%command, dir = %dir.display(), "running git");

        tokio::task::spawn_blocking(move || {
            let output = Command::new(&program)
                .args(&args)
                .current_dir(&dir)
                .env("GIT_TERMINAL_PROMPT", "0")
                .output()
                .map_err(|source| VcsError::Spawn {
                    command: command.clone(),
                    source,
                })?;

            if !output.status.success() {
                let stderr = String::from_utf8_lossy(&output.stderr);
                let stdout = String::from_utf8_lossy(&output.stdout);
                // "nothing to commit" は stdout に出る
                let detail = if stderr.trim().is_empty() {
                    stdout.trim().to_string()
                } else {
                    stderr.trim().to_string()
                };
                return Err(VcsError::Failed {
                    command,
                    stderr: redact_credentials(&detail),
                });
            }

            Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
        })
        .await
        .map_err(|e| VcsError::Join(e.to_string()))?
    }

    fn identity_args(&self) -> Vec<String> {
        vec![
            "-c".to_string(),
            format!("user.name={}", self.identity.name),
            "-c".to_string(),
            format!("user.email={}", self.identity.email),
        ]
    }
}

fn args(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[async_trait]
impl VersionControl for GitCli {
    async fn init(&self, dir: &Path, branch: &str) -> Result<(), VcsError> {
        self.run(dir, args(&["init"])).await?;
        // `init -b` は古い git にないので HEAD を直接向ける
        self.run(
            dir,
            args(&["symbolic-ref", "HEAD", &format!("refs/heads/{branch}")]),
        )
        .await?;
        Ok(())
    }

    async fn add_all(&self, dir: &Path) -> Result<(), VcsError> {
        self.run(dir, args(&["add", "-A"])).await.map(|_| ())
    }

    async fn commit(&self, dir: &Path, message: &str) -> Result<(), VcsError> {
        let mut list = self.identity_args();
        list.extend(args(&["commit", "-m", message]));
        self.run(dir, list).await.map(|_| ())
    }

    async fn add_remote(&self, dir: &Path, name: &str, url: &str) -> Result<(), VcsError> {
        self.run(dir, args(&["remote", "add", name, url]))
            .await
            .map(|_| ())
    }

    async fn push(&self, dir: &Path, remote: &str, branch: &str) -> Result<(), VcsError> {
        self.run(dir, args(&["push", "-u", remote, branch]))
            .await
            .map(|_| ())
    }

    async fn clone_repo(&self, url: &str, dest: &Path) -> Result<(), VcsError> {
        let parent = dest.parent().unwrap_or(dest);
        let dest = dest.to_string_lossy().into_owned();
        self.run(parent, args(&["clone", url, &dest])).await.map(|_| ())
    }

    async fn pull_rebase(&self, dir: &Path, remote: &str, branch: &str) -> Result<(), VcsError> {
        let mut list = self.identity_args();
        list.extend(args(&["pull", "--rebase", remote, branch]));
        self.run(dir, list).await.map(|_| ())
    }

    async fn head_revision(&self, dir: &Path) -> Result<String, VcsError> {
        self.run(dir, args(&["rev-parse", "HEAD"])).await
    }
}
