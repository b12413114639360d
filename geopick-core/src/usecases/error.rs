use thiserror::Error;

/// Everything that can go wrong while resolving a location.
///
/// None of these is fatal: each state machine stays usable
/// after publishing an error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Location provider unavailable: {0}")]
    ProviderUnavailable(String),
    #[error("No result found")]
    NoResultFound,
    #[error("Network or provider fault: {0}")]
    NetworkOrProviderFault(String),
}

impl Error {
    pub(crate) fn provider_unavailable(err: &anyhow::Error) -> Self {
        Self::ProviderUnavailable(format!("{err:#}"))
    }

    pub(crate) fn provider_fault(err: &anyhow::Error) -> Self {
        Self::NetworkOrProviderFault(format!("{err:#}"))
    }
}
