use stopws_kubeapi::ApiError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReclaimError {
    #[error("failed to list workspace pods: {0}")]
    List(#[source] ApiError),

    #[error("failed to get pod {name:?}: {source}")]
    Get { name: String, source: ApiError },

    #[error("setting annotation on pod {name:?} failed after {attempts} attempt(s): {source}")]
    Update {
        name: String,
        attempts: u32,
        source: ApiError,
    },

    #[error("force deleting pod {name:?} failed: {source}")]
    Delete { name: String, source: ApiError },
}

impl ReclaimError {
    /// Listing and lookup failures abort the whole run; everything else is per pod.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::List(_) | Self::Get { .. })
    }

    pub fn pod_name(&self) -> Option<&str> {
        match self {
            Self::List(_) => None,
            Self::Get { name, .. } | Self::Update { name, .. } | Self::Delete { name, .. } => {
                Some(name)
            }
        }
    }
}
