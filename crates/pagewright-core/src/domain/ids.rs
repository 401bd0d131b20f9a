//! Domain identifiers.
//!
//! タスク名と nonce はどちらもリクエストから渡される生の文字列なので、
//! ディレクトリ名やリポジトリ名として使う前にここで正規化する。
//!
//! - `TaskName`: プロジェクト名 + パスセグメントとして安全な task id
//! - `Nonce`: 実行ごとの識別子（未指定なら ULID から生成）
//! - `WorkspaceKey`: `(TaskName, Nonce)` の組。ワークスペースの一意キー

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use ulid::Ulid;

/// Hosting providers cap repository names at 100 characters.
const MAX_SEGMENT_LEN: usize = 100;

/// Hex digits of the digest appended to rewritten segments.
const DIGEST_SUFFIX_LEN: usize = 8;

/// Reduce an arbitrary string to `[A-Za-z0-9._-]`, usable both as a single
/// path component and as a repository name.
///
/// 変換が入った場合は元の文字列の SHA-256 先頭 8 桁を `-` 付きで末尾に足す。
/// `a/b` と `a-b` のように同じ形に潰れる入力を別のセグメントに保つため。
///
/// Returns `None` when nothing usable is left (empty input, only dots, ...).
fn sanitize_segment(raw: &str) -> Option<String> {
    let mapped: String = raw
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '-'
            }
        })
        .collect();

    // 先頭の '.' は隠しファイル / ".." になるので落とす
    let trimmed = mapped.trim_start_matches('.');
    if trimmed.is_empty() || trimmed.chars().all(|c| c == '-') {
        return None;
    }

    if trimmed == raw && trimmed.len() <= MAX_SEGMENT_LEN {
        return Some(trimmed.to_owned());
    }

    let digest = hex::encode(Sha256::digest(raw.as_bytes()));
    let keep = MAX_SEGMENT_LEN - DIGEST_SUFFIX_LEN - 1;
    let head: String = trimmed.chars().take(keep).collect();
    Some(format!("{head}-{}", &digest[..DIGEST_SUFFIX_LEN]))
}

/// Sanitized task identifier. Used as the hosted project name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskName(String);

impl TaskName {
    pub fn new(raw: &str) -> Option<Self> {
        sanitize_segment(raw).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Per-run disambiguator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Nonce(String);

impl Nonce {
    pub fn new(raw: &str) -> Option<Self> {
        sanitize_segment(raw).map(Self)
    }

    /// Lowercase ULID text; always a valid path segment.
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self(ulid.to_string().to_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Unique key of one task workspace.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WorkspaceKey {
    pub task: TaskName,
    pub nonce: Nonce,
}

impl WorkspaceKey {
    pub fn new(task: TaskName, nonce: Nonce) -> Self {
        Self { task, nonce }
    }

    /// Directory name under the configured base path.
    pub fn dir_name(&self) -> String {
        format!("{}_{}_app", self.task, self.nonce)
    }
}
