use shared_types::{ScriptId, ValidationError};

/// Every way a script operation can fail.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScriptError {
    /// The request never reached the backend or no response came back
    /// (connection refused, DNS, timeout).
    #[error("network error: {0}")]
    Network(String),

    /// The backend answered with a non-2xx status.
    #[error("HTTP error: {status} ({message})")]
    Http { status: u16, message: String },

    /// A 2xx response whose body could not be decoded.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Required fields missing; caught before any network call.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Import-from-URL failed or produced nothing usable.
    #[error("import failed: {0}")]
    Import(String),

    #[error("script {0} not found")]
    NotFound(ScriptId),
}

/// Lightweight classification of [`ScriptError`] for UI state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    Http(u16),
    MalformedResponse,
    Validation,
    Import,
    NotFound,
}

impl ScriptError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Network(_) => ErrorKind::Network,
            Self::Http { status, .. } => ErrorKind::Http(*status),
            Self::MalformedResponse(_) => ErrorKind::MalformedResponse,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Import(_) => ErrorKind::Import,
            Self::NotFound(_) => ErrorKind::NotFound,
        }
    }

    /// Re-label a failure of the import call as an import failure.
    pub(crate) fn into_import(self) -> Self {
        match self {
            Self::Import(_) => self,
            other => Self::Import(other.to_string()),
        }
    }
}
