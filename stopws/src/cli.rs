use std::time::Duration;

use clap::{Parser, Subcommand};
use stopws_reclaimer::{
    Action, Mode, ReclaimConfig, CONTAINER_IS_GONE_ANNOTATION, DEFAULT_MAX_PODS_PER_RUN,
    DEFAULT_NAMESPACE, DISPOSAL_STATUS_ANNOTATION, WORKSPACE_CONTAINER, WORKSPACE_LABEL_SELECTOR,
};

#[derive(Debug, Parser)]
#[command(name = "stopws")]
#[command(version, about = "Stops and prunes workspace pods stuck in graceful deletion")]
pub(crate) struct Cli {
    /// Namespace the workspace pods run in
    #[arg(long, global = true, env = "STOPWS_NAMESPACE", default_value = DEFAULT_NAMESPACE)]
    namespace: String,

    /// Label selector identifying workspace pods
    #[arg(long, global = true, env = "STOPWS_LABEL_SELECTOR", default_value = WORKSPACE_LABEL_SELECTOR)]
    label_selector: String,

    /// Name of the container whose readiness decides if a pod is still in use
    #[arg(long, global = true, env = "STOPWS_WORKSPACE_CONTAINER", default_value = WORKSPACE_CONTAINER)]
    workspace_container: String,

    /// Annotation telling the disposal system the workspace container is gone
    #[arg(long, global = true, env = "STOPWS_CONTAINER_IS_GONE_ANNOTATION", default_value = CONTAINER_IS_GONE_ANNOTATION)]
    container_is_gone_annotation: String,

    /// Annotation set by the disposal system once it picked the pod up
    #[arg(long, global = true, env = "STOPWS_DISPOSAL_STATUS_ANNOTATION", default_value = DISPOSAL_STATUS_ANNOTATION)]
    disposal_status_annotation: String,

    /// Only pods whose graceful delete is at least this old are touched (e.g. 1h, 90m)
    #[arg(long, global = true, env = "STOPWS_MIN_DELETION_AGE", default_value = "1h", value_parser = parse_duration)]
    min_deletion_age: Duration,

    /// Maximum number of pods mutated by a single run
    #[arg(long, global = true, env = "STOPWS_MAX_PODS", default_value_t = DEFAULT_MAX_PODS_PER_RUN)]
    max_pods: usize,

    /// Overall deadline for the run
    #[arg(long, global = true, env = "STOPWS_TIMEOUT", default_value = "10m", value_parser = parse_duration)]
    pub(crate) timeout: Duration,

    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    /// Lists affected pods
    List {
        /// List pods that were already marked but are stuck
        #[arg(long)]
        prune: bool,
    },
    /// Marks all affected pods, up to the per-run limit
    All {
        /// Force delete instead of marking the container as gone
        #[arg(long)]
        force: bool,
    },
    /// Marks a single pod, regardless of its state
    Single {
        /// Name of the pod
        pod: String,
    },
    /// Force deletes marked pods that never went away, up to the per-run limit
    Prune,
}

impl Cli {
    pub(crate) fn config(&self) -> ReclaimConfig {
        ReclaimConfig {
            namespace: self.namespace.clone(),
            label_selector: self.label_selector.clone(),
            workspace_container: self.workspace_container.clone(),
            container_is_gone_annotation: self.container_is_gone_annotation.clone(),
            disposal_status_annotation: self.disposal_status_annotation.clone(),
            min_deletion_age: self.min_deletion_age,
            max_pods_per_run: self.max_pods,
            ..ReclaimConfig::default()
        }
    }
}

impl Command {
    pub(crate) fn list_mode(prune: bool) -> Mode {
        if prune { Mode::Prune } else { Mode::Stop }
    }

    pub(crate) fn stop_action(force: bool) -> Action {
        if force {
            Action::ForceDelete
        } else {
            Action::MarkContainerGone
        }
    }
}

/// Parses a Go-style duration such as `1h`, `90m` or `1h30m`.
fn parse_duration(text: &str) -> Result<Duration, String> {
    let nanos = go_parse_duration::parse_duration(text)
        .map_err(|err| format!("invalid duration {text:?}: {err:?}"))?;
    u64::try_from(nanos)
        .map(Duration::from_nanos)
        .map_err(|_| format!("duration {text:?} must not be negative"))
}
