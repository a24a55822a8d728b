use crate::kube::base::Base;
use crate::kube::connection::{Connection, LogRequest};
use crate::kube::traits::{Collection, Cruder, Loggable, Selectable};
use crate::kube::AccessResult;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Pod;
use kube::api::{DeleteParams, GetParams, LogParams};
use kube::core::{ObjectList, Request};
use kube::Resource;
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// Grace period, in seconds, requested on every pod deletion
pub const DEFAULT_KILL_GRACE: u32 = 5;

const SUCCEEDED_PHASE: &str = "Succeeded";

/// Accessor for core/v1 Pods
///
/// Every operation is a single round trip through the injected
/// [`Connection`]. Errors from the cluster are returned unchanged.
#[derive(Clone)]
pub struct Pods {
    base: Base,
    connection: Arc<dyn Connection>,
}

impl Pods {
    pub fn new(connection: Arc<dyn Connection>) -> Self {
        Self {
            base: Base::new(),
            connection,
        }
    }

    fn endpoint(namespace: &str) -> Request {
        Request::new(Pod::url_path(&(), Some(namespace)))
    }

    async fn call<T: DeserializeOwned>(&self, request: http::Request<Vec<u8>>) -> AccessResult<T> {
        let value = self.connection.request(request).await?;
        serde_json::from_value(value).map_err(kube::Error::SerdeError)
    }

    fn is_completed(pod: &Pod) -> bool {
        pod.status
            .as_ref()
            .and_then(|status| status.phase.as_deref())
            == Some(SUCCEEDED_PHASE)
    }
}

impl Selectable for Pods {
    fn base(&self) -> &Base {
        &self.base
    }

    fn base_mut(&mut self) -> &mut Base {
        &mut self.base
    }
}

#[async_trait]
impl Cruder for Pods {
    type Object = Pod;

    async fn get(&self, namespace: &str, name: &str) -> AccessResult<Pod> {
        tracing::debug!("Getting pod {}/{}", namespace, name);
        let request = Self::endpoint(namespace)
            .get(name, &GetParams::default())
            .map_err(kube::Error::BuildRequest)?;
        self.call(request).await
    }

    /// Pods that ran to completion are left out; the remaining order is
    /// whatever the cluster returned.
    async fn list(&self, namespace: &str) -> AccessResult<Collection<Pod>> {
        let params = self.base.list_params();
        tracing::debug!(
            namespace,
            label_selector = ?params.label_selector,
            field_selector = ?params.field_selector,
            "Listing pods"
        );

        let request = Self::endpoint(namespace)
            .list(&params)
            .map_err(kube::Error::BuildRequest)?;
        let list: ObjectList<Pod> = self.call(request).await?;

        Ok(list
            .items
            .into_iter()
            .filter(|pod| !Self::is_completed(pod))
            .collect())
    }

    async fn delete(&self, namespace: &str, name: &str) -> AccessResult<()> {
        tracing::debug!(
            "Deleting pod {}/{} with {}s grace period",
            namespace,
            name,
            DEFAULT_KILL_GRACE
        );
        let params = DeleteParams {
            grace_period_seconds: Some(DEFAULT_KILL_GRACE),
            ..Default::default()
        };
        let request = Self::endpoint(namespace)
            .delete(name, &params)
            .map_err(kube::Error::BuildRequest)?;

        // Response is either the terminating Pod or a Status; neither is needed
        self.connection.request(request).await?;
        Ok(())
    }
}

#[async_trait]
impl Loggable for Pods {
    async fn containers(
        &self,
        namespace: &str,
        name: &str,
        include_init: bool,
    ) -> AccessResult<Vec<String>> {
        let pod = self.get(namespace, name).await?;
        let Some(spec) = pod.spec else {
            return Ok(Vec::new());
        };

        let mut names: Vec<String> = spec.containers.into_iter().map(|c| c.name).collect();
        if include_init {
            names.extend(
                spec.init_containers
                    .unwrap_or_default()
                    .into_iter()
                    .map(|c| c.name),
            );
        }

        Ok(names)
    }

    fn logs(
        &self,
        namespace: &str,
        name: &str,
        container: &str,
        lines: i64,
        previous: bool,
    ) -> AccessResult<LogRequest> {
        let params = LogParams {
            container: Some(container.to_string()),
            follow: true,
            tail_lines: Some(lines),
            previous,
            ..Default::default()
        };
        let request = Self::endpoint(namespace)
            .logs(name, &params)
            .map_err(kube::Error::BuildRequest)?;

        Ok(LogRequest::new(request, Arc::clone(&self.connection)))
    }
}
