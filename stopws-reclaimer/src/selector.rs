use kube::ResourceExt as _;
use stopws_ext::PodExt as _;
use stopws_ext::PodPhase;

use super::*;

/// Which annotation state a pass targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Pods that have not started their own teardown signalling.
    Stop,
    /// Pods already marked for disposal that never went away.
    Prune,
}

impl Mode {
    fn annotations_match(self, pod: &corev1::Pod, config: &ReclaimConfig) -> bool {
        let gone = pod.has_annotation(&config.container_is_gone_annotation);
        let disposal = pod.has_annotation(&config.disposal_status_annotation);
        match self {
            Self::Stop => !gone && !disposal,
            Self::Prune => gone && disposal,
        }
    }
}

/// Filters a point-in-time pod list down to the candidates for `mode`.
///
/// Source order is preserved. Pods that do not report a status for the
/// workspace container are skipped rather than acted on.
pub fn select_candidates(
    pods: Vec<corev1::Pod>,
    mode: Mode,
    config: &ReclaimConfig,
    now: Timestamp,
) -> Vec<corev1::Pod> {
    pods.into_iter()
        .filter(|pod| is_candidate(pod, mode, config, now))
        .collect()
}

fn is_candidate(pod: &corev1::Pod, mode: Mode, config: &ReclaimConfig, now: Timestamp) -> bool {
    if pod.phase() != PodPhase::Running {
        return false;
    }
    if !pod.deleted_for_at_least(now, config.min_deletion_age) {
        return false;
    }
    if !mode.annotations_match(pod, config) {
        return false;
    }

    match pod.container_ready(&config.workspace_container) {
        Some(ready) => !ready,
        None => {
            tracing::warn!(
                name = pod.name_any(),
                container = %config.workspace_container,
                deletion_timestamp = ?pod.deleted_at().map(|ts| ts.0),
                node = ?pod.node_name(),
                phase = %pod.phase(),
                "Container status not found, skipping pod"
            );
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use kube::ResourceExt as _;
    use stopws_ext::jiff::SignedDuration;
    use stopws_ext::metav1;
    use stopws_ext::{ObjectMetaExt as _, PodExt as _, PodStatusExt as _};

    use super::*;

    fn now() -> Timestamp {
        Timestamp::now()
    }

    fn workspace(name: &str, deleted_ago: Option<SignedDuration>, ready: bool) -> corev1::Pod {
        let now = now();
        let mut pod = corev1::Pod::new(name, DEFAULT_NAMESPACE);
        pod.metadata = pod
            .metadata
            .deleted(deleted_ago.map(|ago| metav1::Time(now - ago)));
        pod.status = Some(corev1::PodStatus::running().container(WORKSPACE_CONTAINER, ready));
        pod
    }

    fn stuck(name: &str) -> corev1::Pod {
        workspace(name, Some(SignedDuration::from_hours(2)), false)
    }

    fn marked(mut pod: corev1::Pod) -> corev1::Pod {
        pod.metadata = pod
            .metadata
            .annotate(CONTAINER_IS_GONE_ANNOTATION, "true")
            .annotate(DISPOSAL_STATUS_ANNOTATION, "{}");
        pod
    }

    fn names(pods: &[corev1::Pod]) -> Vec<String> {
        pods.iter().map(|pod| pod.name_any()).collect()
    }

    fn select(pods: Vec<corev1::Pod>, mode: Mode) -> Vec<String> {
        let selected = select_candidates(pods, mode, &ReclaimConfig::default(), now());
        names(&selected)
    }

    #[test]
    fn stop_selects_unmarked_stuck_pod() {
        assert_eq!(select(vec![stuck("ws-a")], Mode::Stop), ["ws-a"]);
        assert!(select(vec![stuck("ws-a")], Mode::Prune).is_empty());
    }

    #[test]
    fn prune_selects_marked_stuck_pod() {
        let pods = vec![marked(stuck("ws-b"))];

        assert_eq!(select(pods.clone(), Mode::Prune), ["ws-b"]);
        assert!(select(pods, Mode::Stop).is_empty());
    }

    #[test]
    fn recently_deleted_pod_is_excluded() {
        let recent = workspace("ws-c", Some(SignedDuration::from_mins(10)), false);

        assert!(select(vec![recent.clone()], Mode::Stop).is_empty());
        assert!(select(vec![marked(recent)], Mode::Prune).is_empty());
    }

    #[test]
    fn pod_without_deletion_timestamp_is_excluded() {
        let alive = workspace("ws-e", None, false);

        assert!(select(vec![alive.clone()], Mode::Stop).is_empty());
        assert!(select(vec![marked(alive)], Mode::Prune).is_empty());
    }

    #[test]
    fn ready_workspace_is_excluded() {
        let ready = workspace("ws-d", Some(SignedDuration::from_hours(2)), true);

        assert!(select(vec![ready.clone()], Mode::Stop).is_empty());
        assert!(select(vec![marked(ready)], Mode::Prune).is_empty());
    }

    #[test]
    fn missing_workspace_container_is_skipped() {
        let mut pod = stuck("ws-f");
        pod.status = Some(corev1::PodStatus::running().container("supervisor", false));

        assert!(select(vec![pod.clone()], Mode::Stop).is_empty());
        assert!(select(vec![marked(pod)], Mode::Prune).is_empty());
    }

    #[test]
    fn non_running_pods_are_never_selected() {
        for phase in [
            PodPhase::Pending,
            PodPhase::Succeeded,
            PodPhase::Failed,
            PodPhase::Unknown,
        ] {
            let mut pod = stuck("ws-g");
            pod.status = Some(
                corev1::PodStatus::with_phase(phase).container(WORKSPACE_CONTAINER, false),
            );

            assert!(select(vec![pod.clone()], Mode::Stop).is_empty(), "{phase}");
            assert!(select(vec![marked(pod)], Mode::Prune).is_empty(), "{phase}");
        }
    }

    #[test]
    fn partially_marked_pod_matches_neither_mode() {
        let mut gone = stuck("ws-h");
        gone.metadata = gone.metadata.annotate(CONTAINER_IS_GONE_ANNOTATION, "true");
        let mut disposing = stuck("ws-i");
        disposing.metadata = disposing.metadata.annotate(DISPOSAL_STATUS_ANNOTATION, "{}");

        let pods = vec![gone, disposing];
        assert!(select(pods.clone(), Mode::Stop).is_empty());
        assert!(select(pods, Mode::Prune).is_empty());
    }

    #[test]
    fn modes_are_disjoint_and_preserve_order() {
        let pods = vec![
            stuck("ws-1"),
            marked(stuck("ws-2")),
            stuck("ws-3"),
            marked(stuck("ws-4")),
        ];

        let stop = select(pods.clone(), Mode::Stop);
        let prune = select(pods, Mode::Prune);

        assert_eq!(stop, ["ws-1", "ws-3"]);
        assert_eq!(prune, ["ws-2", "ws-4"]);
        assert!(stop.iter().all(|name| !prune.contains(name)));
    }

    #[test]
    fn custom_min_deletion_age() {
        let config = ReclaimConfig {
            min_deletion_age: std::time::Duration::from_secs(5 * 60),
            ..ReclaimConfig::default()
        };
        let recent = workspace("ws-c", Some(SignedDuration::from_mins(10)), false);

        let selected = select_candidates(vec![recent], Mode::Stop, &config, now());
        assert_eq!(names(&selected), ["ws-c"]);
    }

    #[test]
    fn custom_annotation_keys() {
        let config = ReclaimConfig {
            container_is_gone_annotation: "example.com/gone".to_string(),
            disposal_status_annotation: "example.com/disposal".to_string(),
            ..ReclaimConfig::default()
        };
        let mut pod = stuck("ws-j");
        pod.metadata = pod
            .metadata
            .annotate("example.com/gone", "true")
            .annotate("example.com/disposal", "{}");

        let prune = select_candidates(vec![pod.clone()], Mode::Prune, &config, now());
        let stop = select_candidates(vec![pod], Mode::Stop, &config, now());
        assert_eq!(names(&prune), ["ws-j"]);
        assert!(stop.is_empty());
    }
}
