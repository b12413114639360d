use super::Error;

/// Progress of one asynchronous lookup.
///
/// Each cycle runs `Idle -> Loading -> (Success | Error)`,
/// a new request starts over at `Loading`.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseState<T> {
    Idle,
    Loading,
    Success(T),
    Error(Error),
}

impl<T> Default for ResponseState<T> {
    fn default() -> Self {
        Self::Idle
    }
}

impl<T> ResponseState<T> {
    pub const fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// Either `Success` or `Error`.
    pub const fn is_done(&self) -> bool {
        matches!(self, Self::Success(_) | Self::Error(_))
    }

    pub const fn success(&self) -> Option<&T> {
        match self {
            Self::Success(value) => Some(value),
            _ => None,
        }
    }

    pub const fn error(&self) -> Option<&Error> {
        match self {
            Self::Error(err) => Some(err),
            _ => None,
        }
    }
}

impl<T> From<Result<T, Error>> for ResponseState<T> {
    fn from(from: Result<T, Error>) -> Self {
        match from {
            Ok(value) => Self::Success(value),
            Err(err) => Self::Error(err),
        }
    }
}
