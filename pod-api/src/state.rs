use crate::kube::{Connection, Pods};
use std::sync::Arc;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub connection: Arc<dyn Connection>,
    pub default_tail_lines: i64,
}

impl AppState {
    pub fn new(connection: Arc<dyn Connection>, default_tail_lines: i64) -> Self {
        Self {
            connection,
            default_tail_lines,
        }
    }

    /// A fresh accessor with no selectors set
    pub fn pods(&self) -> Pods {
        Pods::new(Arc::clone(&self.connection))
    }
}
