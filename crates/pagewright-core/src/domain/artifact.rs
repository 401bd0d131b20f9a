use serde::{Deserialize, Serialize};

use super::ids::TaskName;

/// A hosted, publicly addressable project produced by one publish call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedArtifact {
    pub name: TaskName,

    /// Latest revision id of the pushed content, or `None` when it could not
    /// be read.
    pub revision: Option<String>,

    pub repo_url: String,
    pub pages_url: String,
}

impl PublishedArtifact {
    /// Revision as reported to callers ("N/A" when unknown).
    pub fn revision_or_na(&self) -> &str {
        self.revision.as_deref().unwrap_or("N/A")
    }
}
