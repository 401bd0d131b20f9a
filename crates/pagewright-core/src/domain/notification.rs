use serde::{Deserialize, Serialize};

use super::artifact::PublishedArtifact;
use super::request::AcceptedTask;

/// Body of the completion callback POST.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionNotice {
    pub email: String,
    pub task: String,
    pub round: u32,
    pub nonce: String,
    pub repo_url: String,
    pub commit_sha: String,
    pub pages_url: String,
}

impl CompletionNotice {
    pub fn new(task: &AcceptedTask, artifact: &PublishedArtifact) -> Self {
        Self {
            email: task.email.clone(),
            task: task.task.clone(),
            round: task.round.get(),
            nonce: task.nonce.as_str().to_string(),
            repo_url: artifact.repo_url.clone(),
            commit_sha: artifact.revision_or_na().to_string(),
            pages_url: artifact.pages_url.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Nonce, TaskName, TaskRequest};

    #[test]
    fn notice_carries_task_and_artifact_fields() {
        let task = serde_json::from_value::<TaskRequest>(serde_json::json!({
            "email": "s@example.com",
            "task": "t1",
            "nonce": "n1"
        }))
        .unwrap()
        .into_accepted(|| Nonce::new("unused").unwrap())
        .unwrap();
        let artifact = PublishedArtifact {
            name: TaskName::new("t1").unwrap(),
            revision: None,
            repo_url: "https://github.com/me/t1".to_string(),
            pages_url: "https://me.github.io/t1/".to_string(),
        };

        let value = serde_json::to_value(CompletionNotice::new(&task, &artifact)).unwrap();
        assert_eq!(value["round"], 1);
        assert_eq!(value["nonce"], "n1");
        assert_eq!(value["commit_sha"], "N/A");
        assert_eq!(value["pages_url"], "https://me.github.io/t1/");
    }
}
