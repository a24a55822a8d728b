use anyhow::{Context, Result};
/// Test utilities for integration tests
/// Manages kind cluster lifecycle and pod fixtures
use k8s_openapi::api::core::v1::Pod;
use kube::{Api, Client};
use std::collections::HashMap;
use std::process::{Command, Stdio};
use std::time::Duration;

pub const CLUSTER_NAME: &str = "pod-api";
pub const TEST_NAMESPACE: &str = "pod-api-test";

const FIXTURE_IMAGE: &str = "busybox:1.36";

/// Test fixture that manages kind cluster lifecycle
pub struct KindCluster {
    cluster_name: String,
}

impl KindCluster {
    /// Get or create the test cluster
    /// Idempotent - safe to call multiple times
    pub fn setup() -> Result<Self> {
        let cluster = Self {
            cluster_name: CLUSTER_NAME.to_string(),
        };

        if !cluster.exists()? {
            println!("Creating kind cluster: {}", CLUSTER_NAME);
            cluster.create()?;
        } else {
            println!("Using existing kind cluster: {}", CLUSTER_NAME);
        }

        cluster.reset_namespace(TEST_NAMESPACE)?;

        Ok(cluster)
    }

    fn exists(&self) -> Result<bool> {
        let output = Command::new("kind")
            .args(["get", "clusters"])
            .output()
            .context("Failed to execute 'kind get clusters'")?;

        if !output.status.success() {
            return Ok(false);
        }

        let clusters = String::from_utf8_lossy(&output.stdout);
        Ok(clusters
            .lines()
            .any(|line| line.trim() == self.cluster_name))
    }

    fn create(&self) -> Result<()> {
        let status = Command::new("kind")
            .args(["create", "cluster", "--name", &self.cluster_name])
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .context("Failed to run 'kind create cluster'")?;

        if !status.success() {
            anyhow::bail!("kind create cluster failed");
        }

        self.wait_for_ready()
    }

    fn wait_for_ready(&self) -> Result<()> {
        println!("Waiting for cluster nodes to be ready...");

        let status = kubectl(&[
            "wait",
            "--for=condition=Ready",
            "nodes",
            "--all",
            "--timeout=60s",
        ])?;

        if !status.success() {
            anyhow::bail!("Nodes did not become ready in time");
        }

        Ok(())
    }

    /// Delete and recreate a namespace so each run starts empty
    fn reset_namespace(&self, name: &str) -> Result<()> {
        let _ = kubectl(&["delete", "namespace", name, "--ignore-not-found=true"]);
        let _ = kubectl(&[
            "wait",
            "--for=delete",
            &format!("namespace/{}", name),
            "--timeout=30s",
        ]);

        println!("Creating namespace: {}", name);
        let status = kubectl(&["create", "namespace", name])?;
        if !status.success() {
            anyhow::bail!("Failed to create namespace: {}", name);
        }

        Ok(())
    }

    /// Grant a service account exactly the pod verbs the accessor uses
    pub fn apply_rbac(&self) -> Result<()> {
        println!("Applying RBAC configuration...");

        let rbac_yaml = format!(
            r#"
---
apiVersion: v1
kind: ServiceAccount
metadata:
  name: pod-api-sa
  namespace: {ns}
---
apiVersion: rbac.authorization.k8s.io/v1
kind: Role
metadata:
  name: pod-api-role
  namespace: {ns}
rules:
- apiGroups: [""]
  resources: ["pods"]
  verbs: ["get", "list", "delete"]
- apiGroups: [""]
  resources: ["pods/log"]
  verbs: ["get"]
---
apiVersion: rbac.authorization.k8s.io/v1
kind: RoleBinding
metadata:
  name: pod-api-binding
  namespace: {ns}
subjects:
- kind: ServiceAccount
  name: pod-api-sa
  namespace: {ns}
roleRef:
  kind: Role
  name: pod-api-role
  apiGroup: rbac.authorization.k8s.io
"#,
            ns = TEST_NAMESPACE
        );

        let mut child = Command::new("kubectl")
            .args(["apply", "-f", "-"])
            .stdin(Stdio::piped())
            .spawn()
            .context("Failed to spawn 'kubectl apply'")?;

        if let Some(mut stdin) = child.stdin.take() {
            use std::io::Write;
            stdin
                .write_all(rbac_yaml.as_bytes())
                .context("Failed to write RBAC manifest")?;
        }

        let status = child.wait().context("Failed to apply RBAC")?;
        if !status.success() {
            anyhow::bail!("Failed to apply RBAC configuration");
        }

        Ok(())
    }

    /// Get cluster name for kubectl context
    pub fn context_name(&self) -> String {
        format!("kind-{}", self.cluster_name)
    }
}

fn kubectl(args: &[&str]) -> Result<std::process::ExitStatus> {
    Command::new("kubectl")
        .args(args)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .with_context(|| format!("Failed to run kubectl {}", args.join(" ")))
}

/// Delete the test cluster
/// Call this explicitly if you want to clean up
#[allow(dead_code)]
pub fn teardown_cluster() -> Result<()> {
    println!("Deleting kind cluster: {}", CLUSTER_NAME);

    let status = Command::new("kind")
        .args(["delete", "cluster", "--name", CLUSTER_NAME])
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .context("Failed to delete cluster")?;

    if !status.success() {
        anyhow::bail!("Failed to delete cluster");
    }

    Ok(())
}

async fn pods_api(namespace: &str) -> Result<Api<Pod>> {
    let client = Client::try_default().await?;
    Ok(Api::namespaced(client, namespace))
}

async fn create_from_json(namespace: &str, pod: serde_json::Value) -> Result<()> {
    let pods = pods_api(namespace).await?;
    pods.create(&kube::api::PostParams::default(), &serde_json::from_value(pod)?)
        .await
        .context("Failed to create test pod")?;
    Ok(())
}

/// Long-running pod that logs one numbered line per second
pub async fn create_test_pod(
    namespace: &str,
    name: &str,
    labels: HashMap<String, String>,
) -> Result<()> {
    create_from_json(
        namespace,
        serde_json::json!({
            "apiVersion": "v1",
            "kind": "Pod",
            "metadata": { "name": name, "labels": labels },
            "spec": {
                "terminationGracePeriodSeconds": 30,
                "containers": [{
                    "name": "app",
                    "image": FIXTURE_IMAGE,
                    "command": ["sh", "-c", "i=0; while true; do echo line-$i; i=$((i+1)); sleep 1; done"],
                }],
            },
        }),
    )
    .await
}

/// Pod with two containers and two init containers, declared in a known order
pub async fn create_pod_with_init(namespace: &str, name: &str) -> Result<()> {
    create_from_json(
        namespace,
        serde_json::json!({
            "apiVersion": "v1",
            "kind": "Pod",
            "metadata": { "name": name },
            "spec": {
                "initContainers": [
                    { "name": "init-a", "image": FIXTURE_IMAGE, "command": ["true"] },
                    { "name": "init-b", "image": FIXTURE_IMAGE, "command": ["true"] },
                ],
                "containers": [
                    { "name": "main", "image": FIXTURE_IMAGE, "command": ["sleep", "3600"] },
                    { "name": "sidecar", "image": FIXTURE_IMAGE, "command": ["sleep", "3600"] },
                ],
            },
        }),
    )
    .await
}

/// Pod that exits immediately and ends in the Succeeded phase
pub async fn create_completed_pod(
    namespace: &str,
    name: &str,
    labels: HashMap<String, String>,
) -> Result<()> {
    create_from_json(
        namespace,
        serde_json::json!({
            "apiVersion": "v1",
            "kind": "Pod",
            "metadata": { "name": name, "labels": labels },
            "spec": {
                "restartPolicy": "Never",
                "containers": [{
                    "name": "job",
                    "image": FIXTURE_IMAGE,
                    "command": ["echo", "finished"],
                }],
            },
        }),
    )
    .await
}

pub async fn delete_test_pod(namespace: &str, name: &str) -> Result<()> {
    let pods = pods_api(namespace).await?;
    pods.delete(name, &kube::api::DeleteParams::default())
        .await
        .context("Failed to delete pod")?;
    Ok(())
}

/// Poll until the pod reports the given phase
pub async fn wait_for_pod_phase(namespace: &str, name: &str, phase: &str) -> Result<()> {
    let pods = pods_api(namespace).await?;

    for _ in 0..60 {
        let pod = pods.get(name).await?;
        if pod.status.and_then(|s| s.phase).as_deref() == Some(phase) {
            return Ok(());
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
    }

    anyhow::bail!("Pod {} did not reach phase {} in time", name, phase)
}

/// Poll until the pod is gone
pub async fn wait_for_pod_deleted(namespace: &str, name: &str) -> Result<()> {
    let pods = pods_api(namespace).await?;

    for _ in 0..30 {
        if pods.get_opt(name).await?.is_none() {
            return Ok(());
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
    }

    anyhow::bail!("Pod {} was not deleted in time", name)
}

/// Read the grace period the API server recorded for a terminating pod
pub async fn deletion_grace_period(namespace: &str, name: &str) -> Result<Option<i64>> {
    let pods = pods_api(namespace).await?;
    Ok(pods
        .get_opt(name)
        .await?
        .and_then(|pod| pod.metadata.deletion_grace_period_seconds))
}
