// Module declarations for HTTP handlers
pub mod health;
pub mod logs;
pub mod pods;

// Re-exports
pub use health::health_handler;
pub use logs::{containers_handler, logs_handler};
pub use pods::{delete_pod_handler, get_pod_handler, list_pods_handler};
