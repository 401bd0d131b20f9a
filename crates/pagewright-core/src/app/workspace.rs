//! Per-run scratch directory.

use std::path::{Path, PathBuf};

use crate::domain::{PipelineError, WorkspaceKey};

/// A workspace exclusively owned by one pipeline run. Left on disk after the
/// run completes.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    /// Create `base/<task>_<nonce>_app` fresh, replacing any stale directory
    /// with the same name.
    pub async fn prepare(base: &Path, key: &WorkspaceKey) -> Result<Self, PipelineError> {
        let root = base.join(key.dir_name());
        let err = |source| PipelineError::Workspace {
            path: root.clone(),
            source,
        };

        if tokio::fs::try_exists(&root).await.map_err(err)? {
            tokio::fs::remove_dir_all(&root).await.map_err(err)?;
        }
        tokio::fs::create_dir_all(&root).await.map_err(err)?;
        Ok(Self { root })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }
}
