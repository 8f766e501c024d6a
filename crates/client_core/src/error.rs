use shared::{domain::SelectionOutOfRange, protocol::Endpoint};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    Status,
    InvalidResponse,
    Validation,
    Storage,
}

/// Failure of a controller operation or backend call.
///
/// Holds rendered messages rather than source errors so it can live in
/// per-call UI state and be broadcast to shells.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("network error calling {endpoint}: {message}")]
    Network { endpoint: Endpoint, message: String },
    #[error("{endpoint} failed with HTTP {status}: {message}")]
    Status {
        endpoint: Endpoint,
        status: u16,
        message: String,
    },
    #[error("invalid {endpoint} response: {reason}")]
    InvalidResponse { endpoint: Endpoint, reason: String },
    #[error("Add some personalization first")]
    PersonalizationRequired,
    #[error("unknown sub-task: {0}")]
    UnknownSubTask(String),
    #[error("no sub-task is open")]
    NoActiveTask,
    #[error(transparent)]
    SelectionOutOfRange(#[from] SelectionOutOfRange),
    #[error("storage error: {0}")]
    Storage(String),
}

impl ClientError {
    pub fn network(endpoint: Endpoint, err: &reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            format!("request timed out: {err}")
        } else if err.is_connect() {
            format!("failed to connect: {err}")
        } else {
            err.to_string()
        };
        Self::Network { endpoint, message }
    }

    pub fn invalid_response(endpoint: Endpoint, reason: impl Into<String>) -> Self {
        Self::InvalidResponse {
            endpoint,
            reason: reason.into(),
        }
    }

    pub fn storage(err: anyhow::Error) -> Self {
        Self::Storage(format!("{err:#}"))
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::Network { .. } => ErrorKind::Network,
            ClientError::Status { .. } => ErrorKind::Status,
            ClientError::InvalidResponse { .. } => ErrorKind::InvalidResponse,
            ClientError::PersonalizationRequired
            | ClientError::UnknownSubTask(_)
            | ClientError::NoActiveTask
            | ClientError::SelectionOutOfRange(_) => ErrorKind::Validation,
            ClientError::Storage(_) => ErrorKind::Storage,
        }
    }

    /// Whether re-issuing the same action may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Network { .. } => true,
            ClientError::Status { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    pub fn endpoint(&self) -> Option<Endpoint> {
        match self {
            ClientError::Network { endpoint, .. }
            | ClientError::Status { endpoint, .. }
            | ClientError::InvalidResponse { endpoint, .. } => Some(*endpoint),
            _ => None,
        }
    }
}
