use crate::kube::base::Base;
use crate::kube::connection::LogRequest;
use crate::kube::AccessResult;
use async_trait::async_trait;

/// Ordered records returned by a list call
pub type Collection<T> = Vec<T>;

/// Accessors that carry label/field selectors for list calls
pub trait Selectable {
    fn base(&self) -> &Base;

    fn base_mut(&mut self) -> &mut Base;

    fn set_label_selector(&mut self, selector: &str) {
        self.base_mut().set_label_selector(selector);
    }

    fn set_field_selector(&mut self, selector: &str) {
        self.base_mut().set_field_selector(selector);
    }

    fn label_selector(&self) -> Option<&str> {
        self.base().label_selector()
    }

    fn field_selector(&self) -> Option<&str> {
        self.base().field_selector()
    }

    fn has_selectors(&self) -> bool {
        self.base().has_selectors()
    }
}

/// Get, list and delete for a namespaced resource
#[async_trait]
pub trait Cruder: Selectable + Send + Sync {
    type Object: Send;

    /// Fetch a single object by name
    async fn get(&self, namespace: &str, name: &str) -> AccessResult<Self::Object>;

    /// List objects in a namespace, filtered by the configured selectors
    async fn list(&self, namespace: &str) -> AccessResult<Collection<Self::Object>>;

    async fn delete(&self, namespace: &str, name: &str) -> AccessResult<()>;
}

/// Resources whose containers produce logs
#[async_trait]
pub trait Loggable: Send + Sync {
    /// Container names in declaration order, init containers last when requested
    async fn containers(
        &self,
        namespace: &str,
        name: &str,
        include_init: bool,
    ) -> AccessResult<Vec<String>>;

    /// Prepare a follow-mode log request without sending it
    fn logs(
        &self,
        namespace: &str,
        name: &str,
        container: &str,
        lines: i64,
        previous: bool,
    ) -> AccessResult<LogRequest>;
}
