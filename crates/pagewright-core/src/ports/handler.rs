use async_trait::async_trait;

use crate::domain::{AcceptedTask, PipelineError};

/// Executes one accepted task. The worker group drives this.
#[async_trait]
pub trait TaskHandler: Send + Sync {
    async fn handle(&self, task: AcceptedTask) -> Result<(), PipelineError>;
}
