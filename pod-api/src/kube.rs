// Module declarations for Kubernetes abstractions
pub mod base;
pub mod connection;
pub mod mock;
pub mod pod;
pub mod traits;

// Re-exports for convenience
pub use base::Base;
pub use connection::{Connection, KubeConnection, LogRequest, LogStream};
pub use mock::MockConnection;
pub use pod::{Pods, DEFAULT_KILL_GRACE};
pub use traits::{Collection, Cruder, Loggable, Selectable};

/// Outcome of a single cluster API round trip
///
/// Failures reported by the cluster are passed through as-is.
pub type AccessResult<T> = Result<T, kube::Error>;
