use async_trait::async_trait;
use thiserror::Error;

use crate::models::instance::{WorkflowInstanceInfo, WorkflowInstanceRef};

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("workflow instance `{0}` not found")]
    NotFound(String),
    #[error("engine API request failed: {0}")]
    Transport(String),
    #[error("engine API returned an unreadable document: {0}")]
    Decode(String),
    /// A newer render cycle superseded the one this result belongs to; the
    /// caller must discard it.
    #[error("result belongs to a superseded render cycle")]
    Stale,
}

/// Read-only access to the engine's recorded instances. The correlation core
/// is written against this trait so it can be exercised with a stub instead
/// of a live engine.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InstanceRepository: Send + Sync {
    /// Instances ordered newest first, starting after `after` when given.
    async fn list_instances(
        &self,
        after: Option<String>,
        count: usize,
    ) -> Result<Vec<WorkflowInstanceRef>, FetchError>;

    /// Full snapshot for one instance, including its history.
    async fn get_instance(&self, instance_id: &str) -> Result<WorkflowInstanceInfo, FetchError>;
}
