use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::models::history_event::HistoryEvent;

/// Identity of one workflow execution. Child instances are referenced by id
/// only; their history is never embedded in the parent document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowInstance {
    pub instance_id: String,
    pub execution_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_instance: Option<ParentReference>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentReference {
    pub instance_id: String,
    pub execution_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorkflowInstanceState {
    Pending,
    Running,
    Finished,
    Failed,
    ContinuedAsNew,
    Terminated,
}

impl WorkflowInstanceState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            WorkflowInstanceState::Finished
                | WorkflowInstanceState::Failed
                | WorkflowInstanceState::ContinuedAsNew
                | WorkflowInstanceState::Terminated
        )
    }
}

/// Full point-in-time snapshot for one instance, as served by the engine's
/// diagnostics API. A new fetch produces an entirely new snapshot; nothing
/// here is updated incrementally.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowInstanceInfo {
    pub instance: WorkflowInstance,
    pub state: WorkflowInstanceState,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub completed_at: Option<OffsetDateTime>,
    pub history: Vec<HistoryEvent>,
}

/// Summary row without history, used by the instance listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowInstanceRef {
    pub instance: WorkflowInstance,
    pub state: WorkflowInstanceState,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub completed_at: Option<OffsetDateTime>,
}
