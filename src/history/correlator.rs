use std::collections::HashMap;

use serde::Serialize;

use crate::history::classifier::{classify, EventKind};
use crate::models::history_event::HistoryEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeStatus {
    Resolved,
    Pending,
    Orphaned,
    // A second completion for an already-resolved schedule. The first
    // resolution is kept.
    Duplicate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CorrelationEdge {
    // For orphaned and duplicate edges this is the id the completion
    // referenced, not an event in this history.
    pub schedule_event_id: u64,
    pub completion_event_id: Option<u64>,
    pub status: EdgeStatus,
}

/// Pair schedule events with their completions.
pub fn correlate(history: &[HistoryEvent]) -> Vec<CorrelationEdge> {
    let mut edges = Vec::new();
    // schedule event id -> resolved yet
    let mut pending: HashMap<u64, bool> = HashMap::new();

    for event in history {
        let classification = classify(event);

        if classification.kind == EventKind::Schedule {
            pending.entry(event.id).or_insert(false);
        }

        if let Some(schedule_id) = classification.correlates_with {
            match pending.get_mut(&schedule_id) {
                Some(resolved) if !*resolved => {
                    *resolved = true;
                    edges.push(CorrelationEdge {
                        schedule_event_id: schedule_id,
                        completion_event_id: Some(event.id),
                        status: EdgeStatus::Resolved,
                    });
                }
                Some(_) => {
                    edges.push(CorrelationEdge {
                        schedule_event_id: schedule_id,
                        completion_event_id: Some(event.id),
                        status: EdgeStatus::Duplicate,
                    });
                }
                None => {
                    edges.push(CorrelationEdge {
                        schedule_event_id: schedule_id,
                        completion_event_id: Some(event.id),
                        status: EdgeStatus::Orphaned,
                    });
                }
            }
        }
    }

    // Second walk keeps pending edges in display order rather than map order.
    for event in history {
        if pending.get(&event.id) == Some(&false) {
            edges.push(CorrelationEdge {
                schedule_event_id: event.id,
                completion_event_id: None,
                status: EdgeStatus::Pending,
            });
        }
    }

    edges
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::history_event::EventAttributes;
    use time::OffsetDateTime;

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

    fn scheduled(id: u64) -> HistoryEvent {
        event(
            id,
            None,
            EventAttributes::ActivityScheduled {
                name: format!("activity-{id}"),
                inputs: None,
            },
        )
    }

    fn completed(id: u64, schedule_id: u64) -> HistoryEvent {
        event(
            id,
            Some(schedule_id),
            EventAttributes::ActivityCompleted { result: None },
        )
    }

    #[test]
    fn schedule_and_completion_resolve_to_one_edge() {
        let history = vec![scheduled(2), completed(3, 2)];
        let edges = correlate(&history);
        assert_eq!(
            edges,
            vec![CorrelationEdge {
                schedule_event_id: 2,
                completion_event_id: Some(3),
                status: EdgeStatus::Resolved,
            }]
        );
    }

    #[test]
    fn unmatched_schedules_surface_as_pending_in_order() {
        let history = vec![scheduled(2), scheduled(4), completed(5, 4), scheduled(6)];
        let edges = correlate(&history);
        assert_eq!(edges.len(), 3);
        assert_eq!(edges[0].status, EdgeStatus::Resolved);
        assert_eq!(
            edges[1],
            CorrelationEdge {
                schedule_event_id: 2,
                completion_event_id: None,
                status: EdgeStatus::Pending,
            }
        );
        assert_eq!(edges[2].schedule_event_id, 6);
        assert_eq!(edges[2].status, EdgeStatus::Pending);
    }

    #[test]
    fn dangling_reference_becomes_orphan_edge() {
        let history = vec![completed(7, 99)];
        let edges = correlate(&history);
        assert_eq!(
            edges,
            vec![CorrelationEdge {
                schedule_event_id: 99,
                completion_event_id: Some(7),
                status: EdgeStatus::Orphaned,
            }]
        );
    }

    #[test]
    fn second_completion_is_flagged_without_overwriting_the_first() {
        let history = vec![scheduled(2), completed(3, 2), completed(4, 2)];
        let edges = correlate(&history);
        assert_eq!(edges.len(), 2);
        assert_eq!(
            edges[0],
            CorrelationEdge {
                schedule_event_id: 2,
                completion_event_id: Some(3),
                status: EdgeStatus::Resolved,
            }
        );
        assert_eq!(
            edges[1],
            CorrelationEdge {
                schedule_event_id: 2,
                completion_event_id: Some(4),
                status: EdgeStatus::Duplicate,
            }
        );
    }

    #[test]
    fn timers_and_sub_workflows_correlate_like_activities() {
        let history = vec![
            event(
                2,
                None,
                EventAttributes::TimerScheduled {
                    at: OffsetDateTime::now_utc(),
                },
            ),
            event(
                3,
                None,
                EventAttributes::SubWorkflowScheduled {
                    name: "child-flow".to_string(),
                    sub_workflow_instance_id: "child-1".to_string(),
                    inputs: None,
                },
            ),
            event(
                4,
                Some(2),
                EventAttributes::TimerFired {
                    at: OffsetDateTime::now_utc(),
                },
            ),
            event(
                5,
                Some(3),
                EventAttributes::SubWorkflowCompleted { result: None },
            ),
        ];
        let edges = correlate(&history);
        assert!(edges
            .iter()
            .all(|edge| edge.status == EdgeStatus::Resolved));
        assert_eq!(edges.len(), 2);
    }

    #[test]
    fn empty_history_yields_no_edges() {
        assert!(correlate(&[]).is_empty());
    }
}
