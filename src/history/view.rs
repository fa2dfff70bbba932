use serde::Serialize;
use serde_json::Value;
use time::OffsetDateTime;

use crate::history::classifier::{classify, EventKind};
use crate::history::outcome::{self, Outcome, SnapshotAnomaly, SnapshotError};
use crate::history::payload::decode_attribute_payloads;
use crate::models::instance::{WorkflowInstance, WorkflowInstanceInfo, WorkflowInstanceState};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventView {
    pub id: u64,
    pub sequence_id: u64,
    #[serde(rename = "type")]
    pub event_type: String,
    pub kind: EventKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub visible_at: Option<OffsetDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule_event_id: Option<u64>,
    pub attributes: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct InstanceView {
    pub instance: WorkflowInstance,
    pub state: WorkflowInstanceState,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub completed_at: Option<OffsetDateTime>,
    // Absent when the snapshot has no started event; `anomalies` explains.
    pub outcome: Option<Outcome>,
    pub anomalies: Vec<String>,
    pub events: Vec<EventView>,
}

/// Assemble the display model from one fetched snapshot. Malformed data
/// degrades to anomaly markers instead of failing.
pub fn instance_view(info: &WorkflowInstanceInfo) -> InstanceView {
    let mut anomalies = Vec::new();

    let outcome = match outcome::resolve(&info.history) {
        Ok(outcome) => {
            anomalies.extend(outcome.anomalies.iter().map(describe_anomaly));
            Some(outcome)
        }
        Err(SnapshotError::MissingStartedEvent) => {
            anomalies.push(SnapshotError::MissingStartedEvent.to_string());
            None
        }
    };

    let mut events = Vec::with_capacity(info.history.len());
    for event in &info.history {
        if let Some(visible_at) = event.visible_at {
            if visible_at < event.timestamp {
                anomalies.push(describe_anomaly(
                    &SnapshotAnomaly::VisibleAtBeforeTimestamp { event_id: event.id },
                ));
            }
        }

        let classification = classify(event);
        events.push(EventView {
            id: event.id,
            sequence_id: event.sequence_id,
            event_type: event.attributes.type_name().to_string(),
            kind: classification.kind,
            name: event.attributes.name().map(str::to_string),
            timestamp: event.timestamp,
            visible_at: event.visible_at,
            schedule_event_id: event.schedule_event_id,
            attributes: decode_attribute_payloads(&event.attributes),
        });
    }
    events.sort_by_key(|e| e.sequence_id);

    InstanceView {
        instance: info.instance.clone(),
        state: info.state,
        created_at: info.created_at,
        completed_at: info.completed_at,
        outcome,
        anomalies,
        events,
    }
}

fn describe_anomaly(anomaly: &SnapshotAnomaly) -> String {
    match anomaly {
        SnapshotAnomaly::ResultAndErrorBothSet { event_id } => {
            format!("finished event {event_id} carries both a result and an error")
        }
        SnapshotAnomaly::ResultAndErrorBothAbsent { event_id } => {
            format!("finished event {event_id} carries neither a result nor an error")
        }
        SnapshotAnomaly::DuplicateLifecycleEvent {
            event_id,
            event_type,
        } => format!("duplicate {event_type} event {event_id}"),
        SnapshotAnomaly::VisibleAtBeforeTimestamp { event_id } => {
            format!("event {event_id} becomes visible before it was recorded")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::history_event::{EventAttributes, HistoryEvent};
    use serde_json::json;
    use time::OffsetDateTime;

    // base64("{\"total\":42}")
    const PAYLOAD: &str = "eyJ0b3RhbCI6NDJ9";

    fn event(id: u64, schedule_event_id: Option<u64>, attributes: EventAttributes) -> HistoryEvent {
        HistoryEvent {
            id,
            sequence_id: id,
            timestamp: OffsetDateTime::now_utc(),
            visible_at: None,
            schedule_event_id,
            attributes,
        }
    }

    fn snapshot(history: Vec<HistoryEvent>) -> WorkflowInstanceInfo {
        WorkflowInstanceInfo {
            instance: WorkflowInstance {
                instance_id: "order-1".to_string(),
                execution_id: "exec-1".to_string(),
                parent_instance: None,
            },
            state: WorkflowInstanceState::Running,
            created_at: OffsetDateTime::now_utc(),
            completed_at: None,
            history,
        }
    }

    #[test]
    fn view_decodes_attributes_and_orders_by_sequence() {
        let info = snapshot(vec![
            event(
                3,
                Some(2),
                EventAttributes::ActivityCompleted {
                    result: Some(PAYLOAD.to_string()),
                },
            ),
            event(
                1,
                None,
                EventAttributes::ExecutionStarted {
                    name: "order-flow".to_string(),
                    inputs: Some(vec![PAYLOAD.to_string()]),
                },
            ),
            event(
                2,
                None,
                EventAttributes::ActivityScheduled {
                    name: "charge-card".to_string(),
                    inputs: None,
                },
            ),
        ]);

        let view = instance_view(&info);
        assert_eq!(
            view.events.iter().map(|e| e.sequence_id).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert_eq!(view.events[2].attributes["result"], json!({ "total": 42 }));
        assert_eq!(view.events[2].schedule_event_id, Some(2));
        assert_eq!(view.events[1].name.as_deref(), Some("charge-card"));
        assert_eq!(
            view.outcome.as_ref().map(|o| o.workflow_name.as_str()),
            Some("order-flow")
        );
        assert!(view.anomalies.is_empty());
    }

    #[test]
    fn missing_started_event_becomes_an_anomaly_marker() {
        let info = snapshot(vec![event(
            2,
            None,
            EventAttributes::ActivityScheduled {
                name: "charge-card".to_string(),
                inputs: None,
            },
        )]);

        let view = instance_view(&info);
        assert!(view.outcome.is_none());
        assert_eq!(view.anomalies.len(), 1);
        // The event list still renders.
        assert_eq!(view.events.len(), 1);
    }

    #[test]
    fn early_visible_at_is_flagged() {
        let now = OffsetDateTime::now_utc();
        let mut timer = event(
            2,
            None,
            EventAttributes::TimerScheduled {
                at: now - time::Duration::minutes(5),
            },
        );
        timer.visible_at = Some(now - time::Duration::minutes(5));
        let info = snapshot(vec![
            event(
                1,
                None,
                EventAttributes::ExecutionStarted {
                    name: "order-flow".to_string(),
                    inputs: None,
                },
            ),
            timer,
        ]);

        let view = instance_view(&info);
        assert!(view
            .anomalies
            .iter()
            .any(|a| a.contains("becomes visible before")));
    }
}
