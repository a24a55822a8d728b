use crate::handlers;
use crate::state::AppState;
use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

/// Build the HTTP server with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_handler))
        .route(
            "/namespaces/:namespace/pods",
            get(handlers::list_pods_handler),
        )
        .route(
            "/namespaces/:namespace/pods/:name",
            get(handlers::get_pod_handler).delete(handlers::delete_pod_handler),
        )
        .route(
            "/namespaces/:namespace/pods/:name/containers",
            get(handlers::containers_handler),
        )
        .route(
            "/namespaces/:namespace/pods/:name/logs",
            get(handlers::logs_handler),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kube::MockConnection;
    use axum::body::Body;
    use axum::http::StatusCode;
    use common::{ContainersResponse, DeleteResponse};
    use http::Request;
    use k8s_openapi::api::core::v1::Pod;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app_with(mock: &MockConnection) -> Router {
        build_router(AppState::new(Arc::new(mock.clone()), 100))
    }

    async fn send(app: Router, method: &str, uri: &str) -> (StatusCode, bytes::Bytes) {
        let response = app
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, body)
    }

    fn seeded() -> MockConnection {
        let mock = MockConnection::new();
        let mut labels = HashMap::new();
        labels.insert("app".to_string(), "web".to_string());

        mock.add_pod(
            "prod",
            MockConnection::create_test_pod("web-0", "prod", labels.clone()),
        );
        mock.add_pod(
            "prod",
            MockConnection::with_phase(
                MockConnection::create_test_pod("job-1", "prod", labels),
                "Succeeded",
            ),
        );
        mock.add_pod(
            "prod",
            MockConnection::pod_with_containers("db-0", "prod", &["postgres"], &["init-db"]),
        );
        mock
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let (status, _) = send(app_with(&MockConnection::new()), "GET", "/health").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_list_endpoint_hides_completed_pods() {
        let (status, body) = send(app_with(&seeded()), "GET", "/namespaces/prod/pods").await;
        assert_eq!(status, StatusCode::OK);

        let pods: Vec<Pod> = serde_json::from_slice(&body).unwrap();
        let names: Vec<_> = pods
            .iter()
            .map(|p| p.metadata.name.clone().unwrap())
            .collect();
        assert_eq!(names, vec!["web-0", "db-0"]);
    }

    #[tokio::test]
    async fn test_list_endpoint_with_label_selector() {
        let mock = seeded();
        let (status, body) = send(
            app_with(&mock),
            "GET",
            "/namespaces/prod/pods?labelSelector=app%3Dweb",
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let pods: Vec<Pod> = serde_json::from_slice(&body).unwrap();
        assert_eq!(pods.len(), 1);
        assert_eq!(pods[0].metadata.name.as_deref(), Some("web-0"));
        assert_eq!(
            mock.requests()[0].query_param("labelSelector").as_deref(),
            Some("app=web")
        );
    }

    #[tokio::test]
    async fn test_get_endpoint_not_found() {
        let (status, body) = send(
            app_with(&MockConnection::new()),
            "GET",
            "/namespaces/prod/pods/ghost",
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let error: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(error["error"].as_str().unwrap().contains("ghost"));
    }

    #[tokio::test]
    async fn test_delete_endpoint() {
        let mock = seeded();
        let (status, body) = send(app_with(&mock), "DELETE", "/namespaces/prod/pods/web-0").await;
        assert_eq!(status, StatusCode::ACCEPTED);

        let deleted: DeleteResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(deleted.pod, "web-0");
        assert_eq!(deleted.grace_period_seconds, 5);
        assert_eq!(mock.pod_names("prod"), vec!["job-1", "db-0"]);
    }

    #[tokio::test]
    async fn test_containers_endpoint() {
        let app = app_with(&seeded());

        let (status, body) = send(app.clone(), "GET", "/namespaces/prod/pods/db-0/containers").await;
        assert_eq!(status, StatusCode::OK);
        let resp: ContainersResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(resp.containers, vec!["postgres"]);

        let (_, body) = send(
            app,
            "GET",
            "/namespaces/prod/pods/db-0/containers?includeInit=true",
        )
        .await;
        let resp: ContainersResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(resp.containers, vec!["postgres", "init-db"]);
    }

    #[tokio::test]
    async fn test_logs_endpoint_streams_tail() {
        let mock = seeded();
        mock.add_logs("prod", "db-0", "init-db", &["creating schema", "done"]);

        let (status, body) = send(
            app_with(&mock),
            "GET",
            "/namespaces/prod/pods/db-0/logs?container=init-db&lines=1&previous=true",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(&body[..], b"done\n");

        let log_request = mock.requests().pop().unwrap();
        assert_eq!(log_request.query_param("previous").as_deref(), Some("true"));
        assert_eq!(log_request.query_param("tailLines").as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn test_cluster_unavailable_surfaces_status() {
        let mock = seeded();
        mock.set_unavailable(true);

        let (status, _) = send(app_with(&mock), "GET", "/namespaces/prod/pods").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }
}
