//! Task request model: the inbound wire shape and its validated form.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::errors::IngressError;
use super::ids::{Nonce, TaskName, WorkspaceKey};

/// Brief used for the synthetic round-2 request when the original is empty.
pub const ROUND_TWO_PLACEHOLDER_BRIEF: &str = "Instructor round 2 task";

/// Round number of a task. Round 1 creates, later rounds update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Round(u32);

impl Round {
    pub const INITIAL: Round = Round(1);

    pub fn new(value: u32) -> Option<Self> {
        (value >= 1).then_some(Self(value))
    }

    pub fn get(self) -> u32 {
        self.0
    }

    pub fn is_initial(self) -> bool {
        self.0 == 1
    }

    pub fn mode(self) -> PublishMode {
        if self.is_initial() {
            PublishMode::Create
        } else {
            PublishMode::Update
        }
    }
}

impl fmt::Display for Round {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// What the publisher does for a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishMode {
    Create,
    Update,
}

/// A file attached to a task. `url` is either an inline `data:` URI or a
/// remote URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    pub url: String,
}

impl Attachment {
    pub fn source(&self) -> AttachmentSource<'_> {
        AttachmentSource::parse(&self.url)
    }
}

/// Parsed content reference of an attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachmentSource<'a> {
    Inline(DataUri<'a>),
    Remote(&'a str),
    /// Starts with `data:` but has no `,` separator.
    MalformedInline,
}

/// RFC 2397 data URI: `data:[<mediatype>][;base64],<data>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri<'a> {
    pub media_type: &'a str,
    pub base64: bool,
    pub data: &'a str,
}

impl<'a> AttachmentSource<'a> {
    pub fn parse(url: &'a str) -> Self {
        let Some(rest) = url.strip_prefix("data:") else {
            return AttachmentSource::Remote(url);
        };
        let Some((header, data)) = rest.split_once(',') else {
            return AttachmentSource::MalformedInline;
        };
        let (media_type, base64) = match header.strip_suffix(";base64") {
            Some(media_type) => (media_type, true),
            None => (header, false),
        };
        AttachmentSource::Inline(DataUri {
            media_type,
            base64,
            data,
        })
    }
}

fn default_round() -> u32 {
    1
}

/// Inbound request body, as sent by the grader (and by our own round-2
/// trigger).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRequest {
    #[serde(default)]
    pub email: String,

    /// Missing secret deserializes to "" and fails the secret check.
    #[serde(default)]
    pub secret: String,

    pub task: String,

    #[serde(default = "default_round")]
    pub round: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,

    #[serde(default)]
    pub brief: Option<String>,

    #[serde(default)]
    pub checks: Vec<serde_json::Value>,

    #[serde(default)]
    pub evaluation_url: Option<String>,

    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

impl TaskRequest {
    /// Build the synthetic round-2 request that stands in for the instructor.
    pub fn round_two(task: &AcceptedTask, secret: &str, nonce: &Nonce) -> Self {
        let brief = if task.brief.trim().is_empty() {
            ROUND_TWO_PLACEHOLDER_BRIEF.to_string()
        } else {
            format!("Round 2 update: {}", task.brief)
        };
        Self {
            email: task.email.clone(),
            secret: secret.to_string(),
            task: task.task.clone(),
            round: 2,
            nonce: Some(nonce.as_str().to_string()),
            brief: Some(brief),
            checks: Vec::new(),
            evaluation_url: task.evaluation_url.clone(),
            attachments: Vec::new(),
        }
    }

    /// Validate the shape of the request (not the secret) and assign a nonce
    /// when the caller did not send one.
    pub fn into_accepted(
        self,
        fresh_nonce: impl FnOnce() -> Nonce,
    ) -> Result<AcceptedTask, IngressError> {
        let name = TaskName::new(&self.task).ok_or_else(|| {
            IngressError::Malformed(format!("unusable task id: {:?}", self.task))
        })?;
        let round = Round::new(self.round)
            .ok_or_else(|| IngressError::Malformed("round must be >= 1".to_string()))?;
        let nonce = match self.nonce.as_deref() {
            Some(raw) => Nonce::new(raw)
                .ok_or_else(|| IngressError::Malformed(format!("unusable nonce: {raw:?}")))?,
            None => fresh_nonce(),
        };
        let evaluation_url = self
            .evaluation_url
            .filter(|url| !url.trim().is_empty());

        Ok(AcceptedTask {
            email: self.email,
            task: self.task,
            name,
            round,
            nonce,
            brief: self.brief.unwrap_or_default(),
            evaluation_url,
            attachments: self.attachments,
        })
    }
}

/// A request that passed the secret check and shape validation.
#[derive(Debug, Clone, PartialEq)]
pub struct AcceptedTask {
    pub email: String,
    /// Task id as sent by the caller; echoed back in notifications.
    pub task: String,
    pub name: TaskName,
    pub round: Round,
    pub nonce: Nonce,
    pub brief: String,
    pub evaluation_url: Option<String>,
    pub attachments: Vec<Attachment>,
}

impl AcceptedTask {
    pub fn workspace_key(&self) -> WorkspaceKey {
        WorkspaceKey::new(self.name.clone(), self.nonce.clone())
    }
}
