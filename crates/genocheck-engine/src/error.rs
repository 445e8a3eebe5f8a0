//! Engine error types

use genocheck_core::FindingCode;
use genocheck_session::SessionError;

/// Why a check (or one of its assertions) could not be verified
#[derive(Debug, Clone, thiserror::Error)]
pub enum CheckError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid SQL identifier: {0:?}")]
    InvalidIdentifier(String),
}

impl CheckError {
    /// Finding code recorded when this error reaches the report
    pub fn code(&self) -> FindingCode {
        match self {
            Self::Session(SessionError::Query { .. }) => FindingCode::QueryFailed,
            Self::Session(_) => FindingCode::ConnectionFailed,
            Self::Configuration(_) | Self::InvalidIdentifier(_) => FindingCode::MissingConfiguration,
        }
    }
}

/// Errors building a check registry
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("Check registered twice: {0}")]
    DuplicateCheck(String),
}
