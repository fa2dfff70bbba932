use serde::Serialize;

use crate::models::history_event::{EventAttributes, HistoryEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Schedule,
    Completion,
    Lifecycle,
    Informational,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub kind: EventKind,
    pub correlates_with: Option<u64>,
    pub is_lifecycle_boundary: bool,
}

pub fn classify(event: &HistoryEvent) -> Classification {
    let kind = match &event.attributes {
        EventAttributes::ActivityScheduled { .. }
        | EventAttributes::TimerScheduled { .. }
        | EventAttributes::SubWorkflowScheduled { .. } => EventKind::Schedule,
        EventAttributes::ActivityCompleted { .. }
        | EventAttributes::ActivityFailed { .. }
        | EventAttributes::TimerFired { .. }
        | EventAttributes::TimerCanceled {}
        | EventAttributes::SubWorkflowCompleted { .. }
        | EventAttributes::SubWorkflowFailed { .. } => EventKind::Completion,
        EventAttributes::ExecutionStarted { .. }
        | EventAttributes::ExecutionFinished { .. }
        | EventAttributes::ExecutionContinuedAsNew { .. }
        | EventAttributes::ExecutionCanceled {} => EventKind::Lifecycle,
        EventAttributes::SignalReceived { .. } | EventAttributes::SideEffectResult { .. } => {
            EventKind::Informational
        }
        EventAttributes::Unknown { .. } => EventKind::Unknown,
    };

    let is_lifecycle_boundary = matches!(
        &event.attributes,
        EventAttributes::ExecutionStarted { .. } | EventAttributes::ExecutionFinished { .. }
    );

    Classification {
        kind,
        correlates_with: event.schedule_event_id,
        is_lifecycle_boundary,
    }
}
