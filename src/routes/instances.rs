use std::sync::atomic::Ordering;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;

use crate::client::instance_repository::FetchError;
use crate::history::tree::InstanceTreeBuilder;
use crate::history::view::instance_view;
use crate::responses::JsonResponse;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ListInstancesQuery {
    pub after: Option<String>,
    pub count: Option<usize>,
}

pub async fn list_instances(
    State(state): State<AppState>,
    Query(params): Query<ListInstancesQuery>,
) -> Response {
    let count = params.count.unwrap_or(50).clamp(1, 200);

    match state.instances.list_instances(params.after, count).await {
        Ok(instances) => (
            StatusCode::OK,
            Json(json!({ "success": true, "instances": instances })),
        )
            .into_response(),
        Err(err) => {
            eprintln!("Engine error listing instances: {:?}", err);
            JsonResponse::server_error("Failed to list workflow instances").into_response()
        }
    }
}

pub async fn get_instance(
    State(state): State<AppState>,
    Path(instance_id): Path<String>,
) -> Response {
    match state.instances.get_instance(&instance_id).await {
        Ok(info) => {
            let view = instance_view(&info);
            (
                StatusCode::OK,
                Json(json!({ "success": true, "instance": view })),
            )
                .into_response()
        }
        Err(FetchError::NotFound(_)) => JsonResponse::not_found(&format!(
            "Workflow instance with id `{instance_id}` not found"
        ))
        .into_response(),
        Err(err) => {
            eprintln!("Engine error fetching instance {instance_id}: {:?}", err);
            JsonResponse::server_error("Failed to fetch workflow instance").into_response()
        }
    }
}

pub async fn get_instance_tree(
    State(state): State<AppState>,
    Path(instance_id): Path<String>,
) -> Response {
    // Claim a new render cycle; any in-flight build for an older request will
    // discard its result when it sees the counter has moved.
    let generation = state.tree_generation.fetch_add(1, Ordering::SeqCst) + 1;
    let builder = InstanceTreeBuilder::new(state.instances.clone());

    match builder
        .build_generation(&instance_id, generation, &state.tree_generation)
        .await
    {
        Ok(tree) => (
            StatusCode::OK,
            Json(json!({ "success": true, "tree": tree })),
        )
            .into_response(),
        Err(FetchError::NotFound(_)) => JsonResponse::not_found(&format!(
            "Workflow instance with id `{instance_id}` not found"
        ))
        .into_response(),
        Err(FetchError::Stale) => {
            JsonResponse::conflict("Superseded by a newer tree request").into_response()
        }
        Err(err) => {
            eprintln!("Engine error building tree for {instance_id}: {:?}", err);
            JsonResponse::server_error("Failed to build workflow instance tree").into_response()
        }
    }
}
