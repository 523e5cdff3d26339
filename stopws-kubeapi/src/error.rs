use thiserror::Error;

/// Errors returned by [`PodClient`](crate::PodClient) implementations.
///
/// Conflicts and missing pods are split out of the generic kube error so
/// callers can retry or skip without inspecting HTTP status codes.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The write carried a stale `resource_version` (HTTP 409).
    #[error("pod {name:?} was modified concurrently: {message}")]
    Conflict { name: String, message: String },
    /// HTTP 404.
    #[error("pod {name:?} not found")]
    NotFound { name: String },
    #[error("cluster API request failed: {0}")]
    Kube(#[source] kube::Error),
}

impl ApiError {
    pub(crate) fn from_kube(name: &str, err: kube::Error) -> Self {
        match err {
            kube::Error::Api(ref response) if response.code == 409 => Self::Conflict {
                name: name.to_string(),
                message: response.message.clone(),
            },
            kube::Error::Api(ref response) if response.code == 404 => Self::NotFound {
                name: name.to_string(),
            },
            err => Self::Kube(err),
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
