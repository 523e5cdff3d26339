pub use k8s_openapi as openapi;
pub use k8s_openapi::api::core::v1 as corev1;
pub use k8s_openapi::apimachinery::pkg::apis::meta::v1 as metav1;
pub use k8s_openapi::jiff;

pub use phase::PodPhase;
pub use time::TimeExt;

use jiff::Timestamp;

mod phase;
mod time;

pub trait PodExt {
    fn new(name: impl ToString, namespace: impl ToString) -> Self;
    fn phase(&self) -> PodPhase;
    fn deleted_at(&self) -> Option<&metav1::Time>;
    fn deleted_for_at_least(&self, now: Timestamp, age: std::time::Duration) -> bool;
    fn annotation(&self, key: &str) -> Option<&str>;
    fn has_annotation(&self, key: &str) -> bool;
    fn container_ready(&self, container: &str) -> Option<bool>;
    fn node_name(&self) -> Option<&str>;
}

impl PodExt for corev1::Pod {
    fn new(name: impl ToString, namespace: impl ToString) -> Self {
        let metadata = metav1::ObjectMeta::with_namespace(name, namespace);
        Self {
            metadata,
            ..default()
        }
    }

    fn phase(&self) -> PodPhase {
        self.status
            .as_ref()
            .and_then(|status| status.phase.as_deref())
            .map_or(PodPhase::Unknown, PodPhase::from)
    }

    fn deleted_at(&self) -> Option<&metav1::Time> {
        self.metadata.deletion_timestamp.as_ref()
    }

    /// True when a graceful delete was requested at least `age` before `now`.
    ///
    /// Pods without a deletion timestamp are never considered deleted.
    fn deleted_for_at_least(&self, now: Timestamp, age: std::time::Duration) -> bool {
        let Ok(age) = jiff::SignedDuration::try_from(age) else {
            return false;
        };
        self.deleted_at()
            .is_some_and(|deleted| now.duration_since(deleted.0) >= age)
    }

    fn annotation(&self, key: &str) -> Option<&str> {
        self.metadata
            .annotations
            .as_ref()
            .and_then(|annotations| annotations.get(key))
            .map(String::as_str)
    }

    fn has_annotation(&self, key: &str) -> bool {
        self.annotation(key).is_some()
    }

    /// Readiness of the named container, `None` if the pod reports no status for it.
    fn container_ready(&self, container: &str) -> Option<bool> {
        self.status
            .as_ref()?
            .container_statuses
            .as_ref()?
            .iter()
            .find(|status| status.name == container)
            .map(|status| status.ready)
    }

    fn node_name(&self) -> Option<&str> {
        self.spec.as_ref()?.node_name.as_deref()
    }
}

pub trait ObjectMetaExt {
    fn new(name: impl ToString) -> Self;
    fn with_namespace(name: impl ToString, namespace: impl ToString) -> Self;
    fn deleted(self, ts: impl Into<Option<metav1::Time>>) -> Self;
    fn annotate(self, key: impl ToString, value: impl ToString) -> Self;
    fn version(self, resource_version: impl ToString) -> Self;
}

impl ObjectMetaExt for metav1::ObjectMeta {
    fn new(name: impl ToString) -> Self {
        let name = Some(name.to_string());
        Self { name, ..default() }
    }

    fn with_namespace(name: impl ToString, namespace: impl ToString) -> Self {
        Self {
            namespace: Some(namespace.to_string()),
            ..Self::new(name)
        }
    }

    fn deleted(self, ts: impl Into<Option<metav1::Time>>) -> Self {
        Self {
            deletion_timestamp: ts.into(),
            ..self
        }
    }

    fn annotate(mut self, key: impl ToString, value: impl ToString) -> Self {
        self.annotations
            .get_or_insert_with(default)
            .insert(key.to_string(), value.to_string());
        self
    }

    fn version(self, resource_version: impl ToString) -> Self {
        Self {
            resource_version: Some(resource_version.to_string()),
            ..self
        }
    }
}

pub trait PodStatusExt {
    fn running() -> Self;
    fn with_phase(phase: PodPhase) -> Self;
    fn container(self, name: impl ToString, ready: bool) -> Self;
}

impl PodStatusExt for corev1::PodStatus {
    fn running() -> Self {
        Self::with_phase(PodPhase::Running)
    }

    fn with_phase(phase: PodPhase) -> Self {
        Self {
            phase: Some(phase.to_string()),
            ..default()
        }
    }

    fn container(mut self, name: impl ToString, ready: bool) -> Self {
        let status = corev1::ContainerStatus {
            name: name.to_string(),
            ready,
            ..default()
        };
        self.container_statuses
            .get_or_insert_with(default)
            .push(status);
        self
    }
}

pub fn default<T: Default>() -> T {
    T::default()
}
