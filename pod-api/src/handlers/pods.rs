use crate::error::ApiResult;
use crate::kube::{Cruder, Selectable, DEFAULT_KILL_GRACE};
use crate::state::AppState;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use common::{DeleteResponse, ListQuery};
use k8s_openapi::api::core::v1::Pod;

/// List pods in a namespace, honouring optional label/field selectors.
/// Completed pods are not returned.
pub async fn list_pods_handler(
    State(state): State<AppState>,
    Path(namespace): Path<String>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<Pod>>> {
    let mut pods = state.pods();
    if let Some(selector) = &query.label_selector {
        pods.set_label_selector(selector);
    }
    if let Some(selector) = &query.field_selector {
        pods.set_field_selector(selector);
    }

    let listed = pods.list(&namespace).await?;
    tracing::debug!("Listed {} pods in {}", listed.len(), namespace);

    Ok(Json(listed))
}

pub async fn get_pod_handler(
    State(state): State<AppState>,
    Path((namespace, name)): Path<(String, String)>,
) -> ApiResult<Json<Pod>> {
    let pod = state.pods().get(&namespace, &name).await?;
    Ok(Json(pod))
}

/// Delete a pod with the fixed short grace period
pub async fn delete_pod_handler(
    State(state): State<AppState>,
    Path((namespace, name)): Path<(String, String)>,
) -> ApiResult<(StatusCode, Json<DeleteResponse>)> {
    state.pods().delete(&namespace, &name).await?;
    tracing::info!("Deleted pod {}/{}", namespace, name);

    Ok((
        StatusCode::ACCEPTED,
        Json(DeleteResponse {
            namespace,
            pod: name,
            grace_period_seconds: DEFAULT_KILL_GRACE,
        }),
    ))
}
