//! Domain model (requests, ids, states, artifacts, errors, ...).
//!
//! ここは I/O を持たない。外部とのやり取りは `ports` の trait 越しに行う。

pub mod artifact;
pub mod errors;
pub mod ids;
pub mod notification;
pub mod policy;
pub mod request;
pub mod state;

pub use artifact::PublishedArtifact;
pub use errors::{
    AttachmentError, ConfigError, ContentError, IngressError, PipelineError, PublishError,
    QueueError, VcsError,
};
pub use ids::{Nonce, TaskName, WorkspaceKey};
pub use notification::CompletionNotice;
pub use policy::{StepOutcome, StepPolicy};
pub use request::{
    AcceptedTask, Attachment, AttachmentSource, DataUri, PublishMode, Round, TaskRequest,
    ROUND_TWO_PLACEHOLDER_BRIEF,
};
pub use state::PipelineState;
