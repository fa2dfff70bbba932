use serde::{Deserialize, Deserializer};
use serde_json::Value;
use time::OffsetDateTime;

/// Opaque engine-encoded value carried in event attributes. By convention this
/// is base64-wrapped JSON, but the encoding is owned by the engine and decoded
/// on a best-effort basis only.
pub type Payload = String;

/// One immutable record in an instance's append-only event log.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEvent {
    pub id: u64,
    pub sequence_id: u64,
    pub timestamp: OffsetDateTime,
    /// For delayed events (timers, retries): when the event becomes
    /// actionable. Must be >= `timestamp` in a well-formed snapshot.
    pub visible_at: Option<OffsetDateTime>,
    /// Back-reference to the event that scheduled the work this event
    /// completes. Present on completion-type events only.
    pub schedule_event_id: Option<u64>,
    pub attributes: EventAttributes,
}

/// Attribute payload keyed by the event's `type` tag. One variant per event
/// kind the engine records; type strings the viewer does not recognize land in
/// `Unknown` with the raw document preserved, so a newer engine never breaks
/// deserialization.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", content = "attributes")]
pub enum EventAttributes {
    #[serde(rename = "WorkflowExecutionStarted")]
    ExecutionStarted {
        name: String,
        #[serde(default)]
        inputs: Option<Vec<Payload>>,
    },
    #[serde(rename = "WorkflowExecutionFinished")]
    ExecutionFinished {
        #[serde(default)]
        result: Option<Payload>,
        #[serde(default)]
        error: Option<String>,
    },
    #[serde(rename = "WorkflowExecutionContinuedAsNew")]
    ExecutionContinuedAsNew {
        #[serde(default)]
        result: Option<Payload>,
        continued_execution_id: String,
    },
    #[serde(rename = "WorkflowExecutionCanceled")]
    ExecutionCanceled {},
    ActivityScheduled {
        name: String,
        #[serde(default)]
        inputs: Option<Vec<Payload>>,
    },
    ActivityCompleted {
        #[serde(default)]
        result: Option<Payload>,
    },
    ActivityFailed {
        error: String,
    },
    TimerScheduled {
        #[serde(with = "time::serde::rfc3339")]
        at: OffsetDateTime,
    },
    TimerFired {
        #[serde(with = "time::serde::rfc3339")]
        at: OffsetDateTime,
    },
    TimerCanceled {},
    SignalReceived {
        name: String,
        #[serde(default)]
        arg: Option<Payload>,
    },
    SideEffectResult {
        #[serde(default)]
        result: Option<Payload>,
    },
    SubWorkflowScheduled {
        name: String,
        sub_workflow_instance_id: String,
        #[serde(default)]
        inputs: Option<Vec<Payload>>,
    },
    SubWorkflowCompleted {
        #[serde(default)]
        result: Option<Payload>,
    },
    SubWorkflowFailed {
        error: String,
    },
    #[serde(skip)]
    Unknown { event_type: String, attributes: Value },
}

impl EventAttributes {
    /// The engine's `type` tag for this event.
    pub fn type_name(&self) -> &str {
        match self {
            EventAttributes::ExecutionStarted { .. } => "WorkflowExecutionStarted",
            EventAttributes::ExecutionFinished { .. } => "WorkflowExecutionFinished",
            EventAttributes::ExecutionContinuedAsNew { .. } => "WorkflowExecutionContinuedAsNew",
            EventAttributes::ExecutionCanceled {} => "WorkflowExecutionCanceled",
            EventAttributes::ActivityScheduled { .. } => "ActivityScheduled",
            EventAttributes::ActivityCompleted { .. } => "ActivityCompleted",
            EventAttributes::ActivityFailed { .. } => "ActivityFailed",
            EventAttributes::TimerScheduled { .. } => "TimerScheduled",
            EventAttributes::TimerFired { .. } => "TimerFired",
            EventAttributes::TimerCanceled {} => "TimerCanceled",
            EventAttributes::SignalReceived { .. } => "SignalReceived",
            EventAttributes::SideEffectResult { .. } => "SideEffectResult",
            EventAttributes::SubWorkflowScheduled { .. } => "SubWorkflowScheduled",
            EventAttributes::SubWorkflowCompleted { .. } => "SubWorkflowCompleted",
            EventAttributes::SubWorkflowFailed { .. } => "SubWorkflowFailed",
            EventAttributes::Unknown { event_type, .. } => event_type,
        }
    }

    /// Display name carried by schedule/signal events, if any.
    pub fn name(&self) -> Option<&str> {
        match self {
            EventAttributes::ExecutionStarted { name, .. }
            | EventAttributes::ActivityScheduled { name, .. }
            | EventAttributes::SignalReceived { name, .. }
            | EventAttributes::SubWorkflowScheduled { name, .. } => Some(name),
            _ => None,
        }
    }
}

/// Wire shape of a history event as the engine serializes it: the `type` tag
/// sits beside the other fields, and `attributes` is the type-specific bag.
#[derive(Deserialize)]
struct RawEvent {
    id: u64,
    sequence_id: u64,
    #[serde(rename = "type")]
    event_type: String,
    #[serde(with = "time::serde::rfc3339")]
    timestamp: OffsetDateTime,
    #[serde(default, with = "time::serde::rfc3339::option")]
    visible_at: Option<OffsetDateTime>,
    #[serde(default)]
    schedule_event_id: Option<u64>,
    #[serde(default)]
    attributes: Value,
}

impl<'de> Deserialize<'de> for HistoryEvent {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = RawEvent::deserialize(deserializer)?;

        let tagged = serde_json::json!({
            "type": raw.event_type.clone(),
            "attributes": raw.attributes.clone(),
        });
        let attributes = match serde_json::from_value::<EventAttributes>(tagged) {
            Ok(attributes) => attributes,
            // Unrecognized type tag or an attribute shape we cannot parse:
            // keep the raw document instead of failing the whole history.
            Err(_) => EventAttributes::Unknown {
                event_type: raw.event_type,
                attributes: raw.attributes,
            },
        };

        Ok(HistoryEvent {
            id: raw.id,
            sequence_id: raw.sequence_id,
            timestamp: raw.timestamp,
            visible_at: raw.visible_at,
            schedule_event_id: raw.schedule_event_id,
            attributes,
        })
    }
}
