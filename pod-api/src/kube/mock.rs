use crate::kube::connection::{Connection, LogStream};
use crate::kube::AccessResult;
use async_trait::async_trait;
use bytes::Bytes;
use k8s_openapi::api::core::v1::{Container, Pod, PodSpec, PodStatus};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::core::ErrorResponse;
use serde_json::json;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

const PODS_PREFIX: &str = "/api/v1/namespaces/";

/// A request the mock executed, kept for assertions
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: http::Method,
    pub uri: http::Uri,
    pub body: Vec<u8>,
}

impl RecordedRequest {
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Decoded value of a query parameter
    pub fn query_param(&self, key: &str) -> Option<String> {
        let query = self.uri.query()?;
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }

    pub fn body_json(&self) -> Option<serde_json::Value> {
        serde_json::from_slice(&self.body).ok()
    }
}

/// In-memory stand-in for the cluster's Pods API
///
/// Serves list/get/delete/log on the same paths the real API uses, so
/// accessors can be exercised without a cluster. Pods are kept in
/// insertion order, which is the order list calls return them in.
#[derive(Clone)]
pub struct MockConnection {
    pods: Arc<Mutex<Vec<Pod>>>,
    logs: Arc<Mutex<HashMap<String, Vec<String>>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    unavailable: Arc<AtomicBool>,
}

enum Route {
    Collection { namespace: String },
    Item { namespace: String, name: String },
    Log { namespace: String, name: String },
}

impl MockConnection {
    /// Create a new mock with no pods
    pub fn new() -> Self {
        Self {
            pods: Arc::new(Mutex::new(Vec::new())),
            logs: Arc::new(Mutex::new(HashMap::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
            unavailable: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Add a pod to the mock store, replacing any pod with the same name
    pub fn add_pod(&self, namespace: &str, mut pod: Pod) {
        pod.metadata.namespace = Some(namespace.to_string());
        let mut pods = self.pods.lock().unwrap();
        pods.retain(|p| !Self::is(p, namespace, pod.metadata.name.as_deref().unwrap_or("")));
        pods.push(pod);
    }

    /// Register log lines for a container
    pub fn add_logs(&self, namespace: &str, name: &str, container: &str, lines: &[&str]) {
        self.logs.lock().unwrap().insert(
            format!("{}/{}/{}", namespace, name, container),
            lines.iter().map(|l| l.to_string()).collect(),
        );
    }

    /// Make every subsequent call fail as if the API server were down
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Requests executed so far, oldest first
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn pod_names(&self, namespace: &str) -> Vec<String> {
        self.pods
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.metadata.namespace.as_deref() == Some(namespace))
            .filter_map(|p| p.metadata.name.clone())
            .collect()
    }

    /// Helper to create a test pod with a single container named `app`
    pub fn create_test_pod(name: &str, namespace: &str, labels: HashMap<String, String>) -> Pod {
        let mut pod = Self::pod_with_containers(name, namespace, &["app"], &[]);
        pod.metadata.labels = Some(labels.into_iter().collect::<BTreeMap<_, _>>());
        pod
    }

    /// Helper to create a pod with the given containers and init containers
    pub fn pod_with_containers(
        name: &str,
        namespace: &str,
        containers: &[&str],
        init_containers: &[&str],
    ) -> Pod {
        let to_containers = |names: &[&str]| -> Vec<Container> {
            names
                .iter()
                .map(|n| Container {
                    name: n.to_string(),
                    image: Some("busybox:1.36".to_string()),
                    ..Default::default()
                })
                .collect()
        };

        Pod {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some(namespace.to_string()),
                resource_version: Some("1".to_string()),
                ..Default::default()
            },
            spec: Some(PodSpec {
                containers: to_containers(containers),
                init_containers: (!init_containers.is_empty())
                    .then(|| to_containers(init_containers)),
                ..Default::default()
            }),
            status: Some(PodStatus {
                phase: Some("Running".to_string()),
                ..Default::default()
            }),
        }
    }

    /// Return the pod with its status phase replaced
    pub fn with_phase(mut pod: Pod, phase: &str) -> Pod {
        pod.status.get_or_insert_with(Default::default).phase = Some(phase.to_string());
        pod
    }

    fn is(pod: &Pod, namespace: &str, name: &str) -> bool {
        pod.metadata.namespace.as_deref() == Some(namespace)
            && pod.metadata.name.as_deref() == Some(name)
    }

    fn record(&self, request: &http::Request<Vec<u8>>) -> AccessResult<RecordedRequest> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(api_error(
                503,
                "ServiceUnavailable",
                "the server is currently unable to handle the request".to_string(),
            ));
        }

        let recorded = RecordedRequest {
            method: request.method().clone(),
            uri: request.uri().clone(),
            body: request.body().clone(),
        };
        self.requests.lock().unwrap().push(recorded.clone());
        Ok(recorded)
    }

    fn route(uri: &http::Uri) -> AccessResult<Route> {
        let rest = uri
            .path()
            .strip_prefix(PODS_PREFIX)
            .ok_or_else(|| api_error(404, "NotFound", format!("no route for {}", uri.path())))?;

        let segments: Vec<&str> = rest.split('/').collect();
        match segments.as_slice() {
            [namespace, "pods"] => Ok(Route::Collection {
                namespace: namespace.to_string(),
            }),
            [namespace, "pods", name] => Ok(Route::Item {
                namespace: namespace.to_string(),
                name: name.to_string(),
            }),
            [namespace, "pods", name, "log"] => Ok(Route::Log {
                namespace: namespace.to_string(),
                name: name.to_string(),
            }),
            _ => Err(api_error(
                404,
                "NotFound",
                format!("no route for {}", uri.path()),
            )),
        }
    }

    fn find(&self, namespace: &str, name: &str) -> AccessResult<Pod> {
        self.pods
            .lock()
            .unwrap()
            .iter()
            .find(|p| Self::is(p, namespace, name))
            .cloned()
            .ok_or_else(|| not_found(name))
    }

    fn list(&self, namespace: &str, recorded: &RecordedRequest) -> AccessResult<serde_json::Value> {
        let label_selector = recorded.query_param("labelSelector").unwrap_or_default();
        let field_selector = recorded.query_param("fieldSelector").unwrap_or_default();

        let items: Vec<Pod> = self
            .pods
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.metadata.namespace.as_deref() == Some(namespace))
            .filter(|p| {
                let labels = p.metadata.labels.clone().unwrap_or_default();
                matches_selector(&label_selector, |key| labels.get(key).cloned())
            })
            .filter(|p| matches_selector(&field_selector, |key| field_value(p, key)))
            .cloned()
            .collect();

        Ok(json!({
            "apiVersion": "v1",
            "kind": "PodList",
            "metadata": { "resourceVersion": "1" },
            "items": serde_json::to_value(items).map_err(kube::Error::SerdeError)?,
        }))
    }

    fn delete(&self, namespace: &str, name: &str) -> AccessResult<serde_json::Value> {
        let mut pods = self.pods.lock().unwrap();
        let index = pods
            .iter()
            .position(|p| Self::is(p, namespace, name))
            .ok_or_else(|| not_found(name))?;

        let pod = pods.remove(index);
        serde_json::to_value(pod).map_err(kube::Error::SerdeError)
    }
}

impl Default for MockConnection {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Connection for MockConnection {
    async fn request(&self, request: http::Request<Vec<u8>>) -> AccessResult<serde_json::Value> {
        let recorded = self.record(&request)?;

        let method = recorded.method.clone();
        match Self::route(&recorded.uri)? {
            Route::Collection { namespace } if method == http::Method::GET => {
                self.list(&namespace, &recorded)
            }
            Route::Item { namespace, name } if method == http::Method::GET => {
                let pod = self.find(&namespace, &name)?;
                serde_json::to_value(pod).map_err(kube::Error::SerdeError)
            }
            Route::Item { namespace, name } if method == http::Method::DELETE => {
                self.delete(&namespace, &name)
            }
            _ => Err(api_error(
                405,
                "MethodNotAllowed",
                format!("{} is not supported on {}", method, recorded.path()),
            )),
        }
    }

    async fn request_stream(&self, request: http::Request<Vec<u8>>) -> AccessResult<LogStream> {
        let recorded = self.record(&request)?;

        let (namespace, name) = match Self::route(request.uri())? {
            Route::Log { namespace, name } => (namespace, name),
            _ => {
                return Err(api_error(
                    400,
                    "BadRequest",
                    format!("{} does not stream", request.uri().path()),
                ))
            }
        };

        let pod = self.find(&namespace, &name)?;
        let container = match recorded.query_param("container") {
            Some(container) => container,
            None => pod
                .spec
                .as_ref()
                .and_then(|spec| spec.containers.first())
                .map(|c| c.name.clone())
                .ok_or_else(|| api_error(400, "BadRequest", "pod has no containers".into()))?,
        };

        let key = format!("{}/{}/{}", namespace, name, container);
        let mut lines = self.logs.lock().unwrap().get(&key).cloned().ok_or_else(|| {
            api_error(
                400,
                "BadRequest",
                format!("container {} is not valid for pod {}", container, name),
            )
        })?;

        if let Some(tail) = recorded
            .query_param("tailLines")
            .and_then(|t| t.parse::<usize>().ok())
        {
            let skip = lines.len().saturating_sub(tail);
            lines.drain(..skip);
        }

        let chunks = lines
            .into_iter()
            .map(|line| Ok::<_, std::io::Error>(Bytes::from(format!("{}\n", line))));
        Ok(Box::pin(futures::stream::iter(chunks)))
    }
}

fn api_error(code: u16, reason: &str, message: String) -> kube::Error {
    kube::Error::Api(ErrorResponse {
        status: "Failure".to_string(),
        message,
        reason: reason.to_string(),
        code,
    })
}

fn not_found(name: &str) -> kube::Error {
    api_error(404, "NotFound", format!("pods \"{}\" not found", name))
}

fn field_value(pod: &Pod, key: &str) -> Option<String> {
    match key {
        "metadata.name" => pod.metadata.name.clone(),
        "metadata.namespace" => pod.metadata.namespace.clone(),
        "status.phase" => pod.status.as_ref().and_then(|s| s.phase.clone()),
        "spec.nodeName" => pod.spec.as_ref().and_then(|s| s.node_name.clone()),
        _ => None,
    }
}

/// Equality-based selector matching: `k=v`, `k==v`, `k!=v` and bare `k`
fn matches_selector(selector: &str, lookup: impl Fn(&str) -> Option<String>) -> bool {
    selector
        .split(',')
        .map(str::trim)
        .filter(|term| !term.is_empty())
        .all(|term| {
            if let Some((key, value)) = term.split_once("!=") {
                lookup(key.trim()).as_deref() != Some(value.trim())
            } else if let Some((key, value)) = term.split_once('=') {
                let value = value.trim_start_matches('=').trim();
                lookup(key.trim()).as_deref() == Some(value)
            } else {
                lookup(term).is_some()
            }
        })
}
