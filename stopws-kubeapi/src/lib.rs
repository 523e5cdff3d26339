use std::fmt::Debug;

use async_trait::async_trait;
use kube::api;
use kube::ResourceExt as _;
use stopws_ext as k8s;

use k8s::corev1;

pub use error::ApiError;

mod error;

/// Pod operations the reclaimer needs from the cluster.
///
/// Every call is scoped to a single namespace; `list_pods` is further
/// narrowed by the label selector the implementation was built with.
#[async_trait]
pub trait PodClient: Send + Sync {
    /// Lists all pods matching the configured label selector.
    async fn list_pods(&self) -> Result<Vec<corev1::Pod>, ApiError>;

    /// Reads the current state of the named pod.
    async fn get_pod(&self, name: &str) -> Result<corev1::Pod, ApiError>;

    /// Replaces the pod, subject to its `resource_version`.
    ///
    /// A stale resource version yields [`ApiError::Conflict`].
    async fn replace_pod(&self, pod: &corev1::Pod) -> Result<corev1::Pod, ApiError>;

    /// Deletes the named pod with the given grace period.
    async fn delete_pod(&self, name: &str, grace_period_seconds: u32) -> Result<(), ApiError>;
}

pub struct KubeApi {
    namespace: String,
    list_params: api::ListParams,
    post_params: api::PostParams,
    client: kube::Client,
}

impl KubeApi {
    /// Create a KubeApi using the default Kubernetes client configuration.
    ///
    /// The client is inferred from the local kubeconfig or the in-cluster
    /// service account, in that order.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # async fn run() -> Result<(), kube::Error> {
    /// let api = stopws_kubeapi::KubeApi::new("default", "component=workspace").await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn new(namespace: impl ToString, label_selector: &str) -> kube::Result<Self> {
        let client = kube::Client::try_default().await?;
        Ok(Self::with_client(client, namespace, label_selector))
    }

    /// Create a KubeApi backed by the provided Kubernetes client.
    pub fn with_client(client: kube::Client, namespace: impl ToString, label_selector: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            list_params: api::ListParams::default().labels(label_selector),
            post_params: api::PostParams::default(),
            client,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn pods(&self) -> api::Api<corev1::Pod> {
        api::Api::namespaced(self.client.clone(), &self.namespace)
    }

    fn list_params(&self) -> &api::ListParams {
        &self.list_params
    }

    fn post_params(&self) -> &api::PostParams {
        &self.post_params
    }
}

#[async_trait]
impl PodClient for KubeApi {
    async fn list_pods(&self) -> Result<Vec<corev1::Pod>, ApiError> {
        let lp = self.list_params();
        tracing::debug!(namespace = %self.namespace, selector = ?lp.label_selector, "Listing pods");
        self.pods()
            .list(lp)
            .await
            .map(|list| list.items)
            .map_err(ApiError::Kube)
    }

    async fn get_pod(&self, name: &str) -> Result<corev1::Pod, ApiError> {
        self.pods()
            .get(name)
            .await
            .map_err(|err| ApiError::from_kube(name, err))
    }

    async fn replace_pod(&self, pod: &corev1::Pod) -> Result<corev1::Pod, ApiError> {
        let name = pod.name_any();
        let pp = self.post_params();
        self.pods()
            .replace(&name, pp, pod)
            .await
            .map_err(|err| ApiError::from_kube(&name, err))
    }

    async fn delete_pod(&self, name: &str, grace_period_seconds: u32) -> Result<(), ApiError> {
        let dp = api::DeleteParams::default().grace_period(grace_period_seconds);
        self.pods()
            .delete(name, &dp)
            .await
            .map(|_| ())
            .map_err(|err| ApiError::from_kube(name, err))
    }
}

impl Debug for KubeApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeApi")
            .field("namespace", &self.namespace)
            .field("list_params", &self.list_params)
            .field("post_params", &self.post_params)
            .field("client", &"<kube::Client>")
            .finish()
    }
}
