use serde::Serialize;
use thiserror::Error;

use crate::history::payload::{decode_payload, DisplayValue};
use crate::models::history_event::{EventAttributes, HistoryEvent};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SnapshotAnomaly {
    ResultAndErrorBothSet { event_id: u64 },
    ResultAndErrorBothAbsent { event_id: u64 },
    DuplicateLifecycleEvent { event_id: u64, event_type: String },
    VisibleAtBeforeTimestamp { event_id: u64 },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SnapshotError {
    #[error("history contains no WorkflowExecutionStarted event")]
    MissingStartedEvent,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outcome {
    pub workflow_name: String,
    pub inputs: Option<Vec<DisplayValue>>,
    pub result: Option<DisplayValue>,
    pub error: Option<String>,
    pub is_finished: bool,
    pub anomalies: Vec<SnapshotAnomaly>,
}

fn non_empty(value: &Option<String>) -> Option<&String> {
    value.as_ref().filter(|s| !s.is_empty())
}

/// Read the terminal outcome from the start and finish events. Only a missing
/// started event is a hard error; other irregularities become anomalies.
pub fn resolve(history: &[HistoryEvent]) -> Result<Outcome, SnapshotError> {
    let mut started: Option<(&str, &Option<Vec<String>>)> = None;
    let mut finished: Option<(u64, &Option<String>, &Option<String>)> = None;
    let mut anomalies = Vec::new();

    for event in history {
        match &event.attributes {
            EventAttributes::ExecutionStarted { name, inputs } => {
                if started.is_some() {
                    anomalies.push(SnapshotAnomaly::DuplicateLifecycleEvent {
                        event_id: event.id,
                        event_type: event.attributes.type_name().to_string(),
                    });
                } else {
                    started = Some((name, inputs));
                }
            }
            EventAttributes::ExecutionFinished { result, error } => {
                if finished.is_some() {
                    anomalies.push(SnapshotAnomaly::DuplicateLifecycleEvent {
                        event_id: event.id,
                        event_type: event.attributes.type_name().to_string(),
                    });
                } else {
                    finished = Some((event.id, result, error));
                }
            }
            _ => {}
        }
    }

    let (name, inputs) = started.ok_or(SnapshotError::MissingStartedEvent)?;
    let workflow_name = name.to_string();
    let decoded_inputs = inputs
        .as_ref()
        .map(|inputs| inputs.iter().map(|p| decode_payload(p)).collect());

    let mut result = None;
    let mut error = None;
    let is_finished = finished.is_some();

    if let Some((event_id, raw_result, raw_error)) = finished {
        // Surface exactly what the snapshot holds; the exclusivity contract
        // is checked but never "repaired".
        result = non_empty(raw_result).map(|p| decode_payload(p));
        error = non_empty(raw_error).cloned();

        match (&result, &error) {
            (Some(_), Some(_)) => {
                anomalies.push(SnapshotAnomaly::ResultAndErrorBothSet { event_id })
            }
            (None, None) => {
                anomalies.push(SnapshotAnomaly::ResultAndErrorBothAbsent { event_id })
            }
            _ => {}
        }
    }

    Ok(Outcome {
        workflow_name,
        inputs: decoded_inputs,
        result,
        error,
        is_finished,
        anomalies,
    })
}
