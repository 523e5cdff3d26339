use std::fmt;

use kube::ResourceExt as _;
use stopws_ext as k8s;
use stopws_kubeapi::KubeApi;
use stopws_kubeapi::PodClient;

use k8s::corev1;
use k8s::jiff::Timestamp;
use k8s::PodExt as _;

pub use config::{
    ReclaimConfig, ANNOTATION_PREFIX, COMPONENT_LABEL, CONTAINER_IS_GONE_ANNOTATION,
    DEFAULT_MAX_PODS_PER_RUN, DEFAULT_NAMESPACE, DISPOSAL_STATUS_ANNOTATION,
    WORKSPACE_COMPONENT, WORKSPACE_CONTAINER, WORKSPACE_LABEL_SELECTOR,
};
pub use error::ReclaimError;
pub use retry::RetryPolicy;
pub use selector::{select_candidates, Mode};

mod config;
mod error;
mod retry;
mod selector;

const FORCE_DELETE_GRACE_PERIOD_SECONDS: u32 = 0;

/// Mutation applied to each candidate of a stop pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Action {
    /// Annotate the pod so the disposal system tears it down.
    #[default]
    MarkContainerGone,
    /// Delete the pod with a zero grace period.
    ForceDelete,
}

/// Name and deletion timestamp of a pod, as shown to the operator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListedPod {
    pub name: String,
    pub deletion_timestamp: Option<Timestamp>,
}

impl ListedPod {
    fn from_pod(pod: &corev1::Pod) -> Self {
        Self {
            name: pod.name_any(),
            deletion_timestamp: pod.deleted_at().map(|ts| ts.0),
        }
    }
}

impl fmt::Display for ListedPod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.deletion_timestamp {
            Some(ts) => write!(f, "{} {ts}", self.name),
            None => write!(f, "{} <nil>", self.name),
        }
    }
}

/// Outcome of one reclamation pass.
#[derive(Debug, Default)]
pub struct PassReport {
    /// Number of candidates the selector returned, before the per-run cap.
    pub selected: usize,
    pub reclaimed: Vec<ListedPod>,
    pub failures: Vec<ReclaimError>,
}

impl PassReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Candidates left untouched because of the per-run cap.
    pub fn deferred(&self) -> usize {
        self.selected
            .saturating_sub(self.reclaimed.len() + self.failures.len())
    }

    fn record(&mut self, pod: &corev1::Pod, result: Result<(), ReclaimError>) {
        match result {
            Ok(()) => self.reclaimed.push(ListedPod::from_pod(pod)),
            Err(err) => {
                tracing::error!(name = pod.name_any(), %err, "Failed to reclaim pod");
                self.failures.push(err);
            }
        }
    }
}

#[derive(Debug)]
pub struct Reclaimer<C = KubeApi> {
    client: C,
    config: ReclaimConfig,
}

impl Reclaimer<KubeApi> {
    /// Connects to the cluster with the default kube client configuration.
    pub async fn new(config: ReclaimConfig) -> kube::Result<Self> {
        let client = KubeApi::new(&config.namespace, &config.label_selector).await?;
        Ok(Self::with_client(client, config))
    }
}

impl<C: PodClient> Reclaimer<C> {
    pub fn with_client(client: C, config: ReclaimConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &ReclaimConfig {
        &self.config
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Fetches the live pod list and selects the candidates for `mode`.
    pub async fn candidates(&self, mode: Mode) -> Result<Vec<corev1::Pod>, ReclaimError> {
        let pods = self.client.list_pods().await.map_err(ReclaimError::List)?;
        let total = pods.len();
        let candidates = select_candidates(pods, mode, &self.config, Timestamp::now());
        tracing::debug!(?mode, total, candidates = candidates.len(), "Selected candidates");
        Ok(candidates)
    }

    /// Read-only view of the current candidates.
    pub async fn list_candidates(&self, mode: Mode) -> Result<Vec<ListedPod>, ReclaimError> {
        let candidates = self.candidates(mode).await?;
        Ok(candidates.iter().map(ListedPod::from_pod).collect())
    }

    /// Sets the container-is-gone annotation, refetching and retrying on conflict.
    ///
    /// The first write uses `pod` as given. After a conflict the pod is read
    /// again and the annotation is reapplied to the fresh copy. A pod that
    /// already carries the annotation is left alone, and a pod that vanished
    /// while retrying counts as reclaimed.
    pub async fn mark_container_gone(&self, pod: &corev1::Pod) -> Result<(), ReclaimError> {
        let key = self.config.container_is_gone_annotation.as_str();
        let name = pod.name_any();
        let retry = &self.config.retry;
        let mut current = pod.clone();
        let mut attempt = 1;

        loop {
            if current.annotation(key) == Some("true") {
                tracing::debug!(name, "Pod already marked, nothing to do");
                return Ok(());
            }

            current
                .annotations_mut()
                .insert(key.to_string(), "true".to_string());

            let err = match self.client.replace_pod(&current).await {
                Ok(_) => {
                    tracing::info!(name, attempt, "Marked container as gone");
                    return Ok(());
                }
                Err(err) => err,
            };

            if !err.is_conflict() || !retry.allows_retry(attempt) {
                return Err(ReclaimError::Update {
                    name,
                    attempts: attempt,
                    source: err,
                });
            }

            let delay = retry.next_delay(attempt);
            tracing::debug!(name, attempt, ?delay, "Update conflict, refetching pod");
            tokio::time::sleep(delay).await;

            current = match self.client.get_pod(&name).await {
                Ok(pod) => pod,
                Err(err) if err.is_not_found() => {
                    tracing::info!(name, "Pod is gone");
                    return Ok(());
                }
                Err(source) => {
                    return Err(ReclaimError::Update {
                        name,
                        attempts: attempt,
                        source,
                    });
                }
            };
            attempt += 1;
        }
    }

    /// Deletes the pod immediately, skipping its graceful shutdown.
    pub async fn force_delete(&self, pod: &corev1::Pod) -> Result<(), ReclaimError> {
        let name = pod.name_any();
        self.client
            .delete_pod(&name, FORCE_DELETE_GRACE_PERIOD_SECONDS)
            .await
            .map_err(|source| ReclaimError::Delete {
                name: name.clone(),
                source,
            })?;
        tracing::info!(name, "Force deleted pod");
        Ok(())
    }

    /// Stop pass: applies `action` to at most `max_pods_per_run` unmarked candidates.
    pub async fn stop_all(&self, action: Action) -> Result<PassReport, ReclaimError> {
        self.run_pass(Mode::Stop, action).await
    }

    /// Marks the named pod regardless of its eligibility.
    pub async fn stop_single(&self, name: &str) -> Result<PassReport, ReclaimError> {
        let pod = self
            .client
            .get_pod(name)
            .await
            .map_err(|source| ReclaimError::Get {
                name: name.to_string(),
                source,
            })?;

        let mut report = PassReport {
            selected: 1,
            ..PassReport::default()
        };
        let result = self.mark_container_gone(&pod).await;
        report.record(&pod, result);
        Ok(report)
    }

    /// Prune pass: force deletes at most `max_pods_per_run` marked but stuck candidates.
    pub async fn prune(&self) -> Result<PassReport, ReclaimError> {
        self.run_pass(Mode::Prune, Action::ForceDelete).await
    }

    async fn run_pass(&self, mode: Mode, action: Action) -> Result<PassReport, ReclaimError> {
        let candidates = self.candidates(mode).await?;
        let limit = self.config.max_pods_per_run;
        let mut report = PassReport {
            selected: candidates.len(),
            ..PassReport::default()
        };

        for pod in candidates.iter().take(limit) {
            tracing::info!(
                name = pod.name_any(),
                deletion_timestamp = ?pod.deleted_at().map(|ts| ts.0),
                ?action,
                "Reclaiming pod"
            );
            let result = match action {
                Action::MarkContainerGone => self.mark_container_gone(pod).await,
                Action::ForceDelete => self.force_delete(pod).await,
            };
            report.record(pod, result);
        }

        if report.deferred() > 0 {
            tracing::info!(
                limit,
                deferred = report.deferred(),
                "Per-run limit reached, remaining pods left for the next run"
            );
        }

        Ok(report)
    }
}
