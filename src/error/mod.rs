//! Error types for handoff.

pub mod unified;

pub use unified::{ErrorCategory, RecoverySuggestion};

use thiserror::Error;

use crate::auth::error::{DelegationError, DelegationErrorKind};

/// Primary error type for handoff operations outside a single delegation
/// (configuration loading, I/O) and for callers that want one error type.
#[derive(Error, Debug)]
pub enum HandoffError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Delegation failed: {0}")]
    Delegation(DelegationError),

    #[error("Timeout after {0}ms")]
    Timeout(u64),
}

impl From<toml::de::Error> for HandoffError {
    fn from(error: toml::de::Error) -> Self {
        Self::Configuration(error.to_string())
    }
}

impl HandoffError {
    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Configuration(_) => ErrorCategory::Configuration,
            Self::Io(_) => ErrorCategory::Io,
            Self::Timeout(_) => ErrorCategory::Timeout,
            Self::Delegation(err) => match err.kind() {
                DelegationErrorKind::BrokerUnavailable => ErrorCategory::Availability,
                DelegationErrorKind::AccountNotFound => ErrorCategory::Account,
                DelegationErrorKind::InstallRequired => ErrorCategory::Installation,
                DelegationErrorKind::UserCanceled => ErrorCategory::Canceled,
                DelegationErrorKind::SilentFlowUnsupported => ErrorCategory::InteractionRequired,
                DelegationErrorKind::ExternalFailure => ErrorCategory::Broker,
                DelegationErrorKind::Timeout => ErrorCategory::Timeout,
            },
        }
    }

    /// Whether the caller may sensibly retry without changing anything.
    ///
    /// This crate never retries on its own.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Availability | ErrorCategory::Timeout | ErrorCategory::Broker
        )
    }

    /// Suggest recovery actions.
    pub fn recovery_suggestion(&self) -> RecoverySuggestion {
        match self.category() {
            ErrorCategory::Availability | ErrorCategory::Broker => {
                RecoverySuggestion::RetryLater
            }
            ErrorCategory::Timeout => RecoverySuggestion::IncreaseTimeout,
            ErrorCategory::Account => RecoverySuggestion::RegisterAccount,
            ErrorCategory::Installation => RecoverySuggestion::InstallBroker,
            ErrorCategory::Canceled => RecoverySuggestion::NoAction,
            ErrorCategory::InteractionRequired => RecoverySuggestion::RetryInteractively,
            ErrorCategory::Configuration => RecoverySuggestion::CheckConfiguration,
            ErrorCategory::Io => RecoverySuggestion::ContactSupport,
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, HandoffError>;
