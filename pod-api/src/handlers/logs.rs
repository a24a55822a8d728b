use crate::error::{ApiError, ApiResult};
use crate::kube::Loggable;
use crate::state::AppState;
use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use common::{ContainersQuery, ContainersResponse, LogQuery};

pub async fn containers_handler(
    State(state): State<AppState>,
    Path((namespace, name)): Path<(String, String)>,
    Query(query): Query<ContainersQuery>,
) -> ApiResult<Json<ContainersResponse>> {
    let containers = state
        .pods()
        .containers(&namespace, &name, query.include_init)
        .await?;

    Ok(Json(ContainersResponse {
        pod: name,
        containers,
    }))
}

/// Stream container logs
///
/// Follows the log until the client disconnects. Without an explicit
/// container the first declared one is used.
#[axum::debug_handler]
pub async fn logs_handler(
    State(state): State<AppState>,
    Path((namespace, name)): Path<(String, String)>,
    Query(query): Query<LogQuery>,
) -> ApiResult<Response> {
    let lines = query.tail_lines(state.default_tail_lines)?;
    let pods = state.pods();

    let container = match query.container {
        Some(container) => container,
        None => pods
            .containers(&namespace, &name, false)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::InvalidInput(format!("Pod {} has no containers", name)))?,
    };

    tracing::info!(
        "Streaming logs for {}/{} container {} (tail {}, previous {})",
        namespace,
        name,
        container,
        lines,
        query.previous
    );

    let stream = pods
        .logs(&namespace, &name, &container, lines, query.previous)?
        .stream()
        .await?;

    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        Body::from_stream(stream),
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kube::MockConnection;
    use axum::http::StatusCode;
    use std::sync::Arc;

    fn state_with(mock: &MockConnection) -> AppState {
        AppState::new(Arc::new(mock.clone()), 2)
    }

    #[tokio::test]
    async fn test_containers_handler_with_init() {
        let mock = MockConnection::new();
        mock.add_pod(
            "prod",
            MockConnection::pod_with_containers("web-0", "prod", &["app"], &["migrate"]),
        );

        let Json(body) = containers_handler(
            State(state_with(&mock)),
            Path(("prod".to_string(), "web-0".to_string())),
            Query(ContainersQuery { include_init: true }),
        )
        .await
        .unwrap();

        assert_eq!(body.pod, "web-0");
        assert_eq!(body.containers, vec!["app", "migrate"]);
    }

    #[tokio::test]
    async fn test_logs_handler_defaults_to_first_container() {
        let mock = MockConnection::new();
        mock.add_pod(
            "prod",
            MockConnection::pod_with_containers("web-0", "prod", &["app", "sidecar"], &[]),
        );
        mock.add_logs("prod", "web-0", "app", &["a", "b", "c"]);

        let response = logs_handler(
            State(state_with(&mock)),
            Path(("prod".to_string(), "web-0".to_string())),
            Query(LogQuery::default()),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"b\nc\n");

        let log_request = mock.requests().pop().unwrap();
        assert_eq!(log_request.query_param("container").as_deref(), Some("app"));
        assert_eq!(log_request.query_param("tailLines").as_deref(), Some("2"));
        assert_eq!(log_request.query_param("follow").as_deref(), Some("true"));
    }

    #[tokio::test]
    async fn test_logs_handler_pod_without_containers() {
        let mock = MockConnection::new();
        mock.add_pod(
            "prod",
            MockConnection::pod_with_containers("empty", "prod", &[], &[]),
        );

        let result = logs_handler(
            State(state_with(&mock)),
            Path(("prod".to_string(), "empty".to_string())),
            Query(LogQuery::default()),
        )
        .await;

        assert!(matches!(result, Err(ApiError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_logs_handler_rejects_negative_lines() {
        let mock = MockConnection::new();

        let result = logs_handler(
            State(state_with(&mock)),
            Path(("prod".to_string(), "web-0".to_string())),
            Query(LogQuery {
                container: Some("app".to_string()),
                lines: Some(-1),
                previous: false,
            }),
        )
        .await;

        assert!(matches!(result, Err(ApiError::InvalidInput(_))));
        assert!(mock.requests().is_empty());
    }
}
