use std::time::Duration;

use constcat::concat;
use time::ext::NumericalStdDuration as _;

use super::*;

pub const DEFAULT_NAMESPACE: &str = "default";
pub const COMPONENT_LABEL: &str = "component";
pub const WORKSPACE_COMPONENT: &str = "workspace";
pub const WORKSPACE_LABEL_SELECTOR: &str = concat!(COMPONENT_LABEL, "=", WORKSPACE_COMPONENT);
pub const WORKSPACE_CONTAINER: &str = "workspace";

pub const ANNOTATION_PREFIX: &str = "gitpod.io/";
pub const CONTAINER_IS_GONE_ANNOTATION: &str = concat!(ANNOTATION_PREFIX, "containerIsGone");
pub const DISPOSAL_STATUS_ANNOTATION: &str = concat!(ANNOTATION_PREFIX, "disposalStatus");

pub const DEFAULT_MAX_PODS_PER_RUN: usize = 50;

/// Settings shared by the selector and the actions.
///
/// `Default` reproduces the values the workspace cluster uses.
#[derive(Clone, Debug, PartialEq)]
pub struct ReclaimConfig {
    pub namespace: String,
    pub label_selector: String,
    pub workspace_container: String,
    pub container_is_gone_annotation: String,
    pub disposal_status_annotation: String,
    /// Pods whose graceful delete is younger than this are left to the normal teardown.
    pub min_deletion_age: Duration,
    pub max_pods_per_run: usize,
    pub retry: RetryPolicy,
}

impl Default for ReclaimConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            label_selector: WORKSPACE_LABEL_SELECTOR.to_string(),
            workspace_container: WORKSPACE_CONTAINER.to_string(),
            container_is_gone_annotation: CONTAINER_IS_GONE_ANNOTATION.to_string(),
            disposal_status_annotation: DISPOSAL_STATUS_ANNOTATION.to_string(),
            min_deletion_age: 1.std_hours(),
            max_pods_per_run: DEFAULT_MAX_PODS_PER_RUN,
            retry: RetryPolicy::default(),
        }
    }
}
