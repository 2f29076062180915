//! Unified error classification and recovery.

/// Broad error category for routing recovery logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Availability,
    Account,
    Installation,
    Canceled,
    InteractionRequired,
    Broker,
    Timeout,
    Configuration,
    Io,
}

/// Suggested recovery action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoverySuggestion {
    RetryLater,
    IncreaseTimeout,
    RegisterAccount,
    InstallBroker,
    RetryInteractively,
    CheckConfiguration,
    ContactSupport,
    NoAction,
}
