use crate::kube::AccessResult;
use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use kube::{config::KubeConfigOptions, Client, Config};
use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tokio_util::compat::FuturesAsyncReadCompatExt;
use tokio_util::io::ReaderStream;

/// Raw log bytes as they arrive from the cluster
pub type LogStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

/// Capability to execute prepared requests against the cluster API
///
/// Implementations own the transport: how (and when) the underlying client
/// is established is their concern, not the caller's.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Execute a request and return the decoded JSON response body
    async fn request(&self, request: http::Request<Vec<u8>>) -> AccessResult<serde_json::Value>;

    /// Execute a request and return the response body as a byte stream
    async fn request_stream(&self, request: http::Request<Vec<u8>>) -> AccessResult<LogStream>;
}

/// Connection backed by a kube-rs client, dialed on first use
pub struct KubeConnection {
    context: Option<String>,
    client: OnceCell<Client>,
}

impl KubeConnection {
    /// Create a connection for the given kubeconfig context.
    /// `None` infers the configuration (in-cluster config or ~/.kube/config).
    /// Nothing is dialed until the first request.
    pub fn new(context: Option<String>) -> Self {
        Self {
            context,
            client: OnceCell::new(),
        }
    }

    /// Wrap an already established kube::Client
    pub fn from_client(client: Client) -> Self {
        Self {
            context: None,
            client: OnceCell::new_with(Some(client)),
        }
    }

    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    pub fn is_connected(&self) -> bool {
        self.client.initialized()
    }

    /// Return the cluster client, establishing it if this is the first call.
    /// A failed attempt is not cached; the next call dials again.
    pub async fn dial(&self) -> AccessResult<&Client> {
        self.client.get_or_try_init(|| self.establish()).await
    }

    async fn establish(&self) -> AccessResult<Client> {
        let config = match &self.context {
            Some(context) => {
                let options = KubeConfigOptions {
                    context: Some(context.clone()),
                    ..Default::default()
                };
                Config::from_kubeconfig(&options)
                    .await
                    .map_err(|e| kube::Error::Service(Box::new(e)))?
            }
            None => Config::infer().await.map_err(kube::Error::InferConfig)?,
        };

        tracing::info!(
            "Connecting to Kubernetes API at {} (context: {})",
            config.cluster_url,
            self.context.as_deref().unwrap_or("inferred")
        );

        Client::try_from(config)
    }
}

#[async_trait]
impl Connection for KubeConnection {
    async fn request(&self, request: http::Request<Vec<u8>>) -> AccessResult<serde_json::Value> {
        let client = self.dial().await?;
        client.request::<serde_json::Value>(request).await
    }

    async fn request_stream(&self, request: http::Request<Vec<u8>>) -> AccessResult<LogStream> {
        let client = self.dial().await?.clone();
        let reader = client.request_stream(request).await?;
        Ok(Box::pin(ReaderStream::new(reader.compat())))
    }
}

/// A prepared log request
///
/// Building one performs no I/O. The owner decides whether and when to
/// execute it with [`LogRequest::stream`], and ends the stream by dropping it.
pub struct LogRequest {
    request: http::Request<Vec<u8>>,
    connection: Arc<dyn Connection>,
}

impl LogRequest {
    pub fn new(request: http::Request<Vec<u8>>, connection: Arc<dyn Connection>) -> Self {
        Self {
            request,
            connection,
        }
    }

    pub fn request(&self) -> &http::Request<Vec<u8>> {
        &self.request
    }

    pub fn uri(&self) -> &http::Uri {
        self.request.uri()
    }

    /// Send the request and follow the log output
    pub async fn stream(self) -> AccessResult<LogStream> {
        tracing::debug!("Streaming logs from {}", self.request.uri());
        self.connection.request_stream(self.request).await
    }
}

impl fmt::Debug for LogRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogRequest")
            .field("method", self.request.method())
            .field("uri", self.request.uri())
            .finish()
    }
}
