use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::task::JoinSet;
use tracing::{error, warn};

use crate::client::instance_repository::{FetchError, InstanceRepository};
use crate::history::correlator::{correlate, CorrelationEdge};
use crate::history::outcome;
use crate::models::history_event::EventAttributes;
use crate::models::instance::{WorkflowInstanceInfo, WorkflowInstanceState};

// Hard cap on parent/child nesting; expansion stops with a marker past it.
const MAX_TREE_DEPTH: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum NodeStatus {
    Expanded,
    // The instance id is already an ancestor on the traversal path.
    CycleTruncated,
    DepthTruncated,
    Unavailable { error: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstanceNode {
    pub instance_id: String,
    pub workflow_name: Option<String>,
    pub state: Option<WorkflowInstanceState>,
    #[serde(flatten)]
    pub status: NodeStatus,
    pub edges: Vec<CorrelationEdge>,
    pub children: Vec<InstanceNode>,
}

impl InstanceNode {
    fn stub(instance_id: String, status: NodeStatus) -> Self {
        InstanceNode {
            instance_id,
            workflow_name: None,
            state: None,
            status,
            edges: Vec::new(),
            children: Vec::new(),
        }
    }
}

/// Recursively expands sub-workflow references through the injected
/// repository.
pub struct InstanceTreeBuilder {
    repo: Arc<dyn InstanceRepository>,
}

impl InstanceTreeBuilder {
    pub fn new(repo: Arc<dyn InstanceRepository>) -> Self {
        InstanceTreeBuilder { repo }
    }

    /// Only a failure to fetch the root aborts; child failures become
    /// `Unavailable` nodes.
    pub async fn build(&self, root_instance_id: &str) -> Result<InstanceNode, FetchError> {
        let info = self.repo.get_instance(root_instance_id).await?;
        let mut path = HashSet::new();
        path.insert(root_instance_id.to_string());
        Ok(expand_fetched(self.repo.clone(), info, Arc::new(path), 0).await)
    }

    /// Like [`build`](Self::build), but the result is discarded as
    /// [`FetchError::Stale`] if `current` moved past `generation` meanwhile.
    pub async fn build_generation(
        &self,
        root_instance_id: &str,
        generation: u64,
        current: &AtomicU64,
    ) -> Result<InstanceNode, FetchError> {
        let tree = self.build(root_instance_id).await?;
        if current.load(Ordering::SeqCst) != generation {
            warn!(
                instance_id = %root_instance_id,
                generation,
                "discarding tree built for a superseded render cycle"
            );
            return Err(FetchError::Stale);
        }
        Ok(tree)
    }
}

fn expand(
    repo: Arc<dyn InstanceRepository>,
    instance_id: String,
    path: Arc<HashSet<String>>,
    depth: usize,
) -> Pin<Box<dyn Future<Output = InstanceNode> + Send>> {
    Box::pin(async move {
        if path.contains(&instance_id) {
            return InstanceNode::stub(instance_id, NodeStatus::CycleTruncated);
        }
        if depth >= MAX_TREE_DEPTH {
            return InstanceNode::stub(instance_id, NodeStatus::DepthTruncated);
        }

        match repo.get_instance(&instance_id).await {
            Ok(info) => {
                let mut path = (*path).clone();
                path.insert(instance_id);
                expand_fetched(repo, info, Arc::new(path), depth).await
            }
            Err(err) => {
                warn!(instance_id = %instance_id, error = %err, "child instance unavailable, continuing tree build");
                InstanceNode::stub(
                    instance_id,
                    NodeStatus::Unavailable {
                        error: err.to_string(),
                    },
                )
            }
        }
    })
}

async fn expand_fetched(
    repo: Arc<dyn InstanceRepository>,
    info: WorkflowInstanceInfo,
    path: Arc<HashSet<String>>,
    depth: usize,
) -> InstanceNode {
    let edges = correlate(&info.history);
    let workflow_name = outcome::resolve(&info.history)
        .ok()
        .map(|o| o.workflow_name);

    let child_ids: Vec<String> = info
        .history
        .iter()
        .filter_map(|event| match &event.attributes {
            EventAttributes::SubWorkflowScheduled {
                sub_workflow_instance_id,
                ..
            } => Some(sub_workflow_instance_id.clone()),
            _ => None,
        })
        .collect();

    // Children are independent of each other: fan the fetches out and join
    // before the node is considered complete.
    let mut tasks = JoinSet::new();
    for (idx, child_id) in child_ids.into_iter().enumerate() {
        let repo = repo.clone();
        let path = path.clone();
        tasks.spawn(async move { (idx, expand(repo, child_id, path, depth + 1).await) });
    }

    let mut children = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(indexed) => children.push(indexed),
            Err(err) => error!(%err, "child expansion task failed"),
        }
    }
    // Join order is completion order; restore schedule order for display.
    children.sort_by_key(|(idx, _)| *idx);

    InstanceNode {
        instance_id: info.instance.instance_id,
        workflow_name,
        state: Some(info.state),
        status: NodeStatus::Expanded,
        edges,
        children: children.into_iter().map(|(_, node)| node).collect(),
    }
}
