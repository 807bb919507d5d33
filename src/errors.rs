use thiserror::Error;

/// Error type that captures common ledger failures.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Unknown split strategy type: {0}")]
    UnknownStrategy(String),
    #[error("Persistence error: {0}")]
    Persistence(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Coarse classification surfaced to callers alongside the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    UnknownStrategy,
    Persistence,
}

impl ErrorKind {
    pub fn label(self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::UnknownStrategy => "unknown-strategy",
            ErrorKind::Persistence => "persistence",
        }
    }
}

impl LedgerError {
    pub fn validation(message: impl Into<String>) -> Self {
        LedgerError::Validation(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::Validation(_) => ErrorKind::Validation,
            LedgerError::UnknownStrategy(_) => ErrorKind::UnknownStrategy,
            LedgerError::Persistence(_) | LedgerError::Io(_) | LedgerError::Serde(_) => {
                ErrorKind::Persistence
            }
        }
    }
}
