use strum::Display;
use thiserror::Error;

use crate::error::HandoffError;

/// Classified failures of a broker delegation.
///
/// Every variant is a value the caller inspects; nothing here is thrown for
/// control flow. `InstallRequired` in particular is an ordinary result that
/// tells the caller which link to open before retrying.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DelegationError {
    #[error("Broker unavailable: {0}")]
    BrokerUnavailable(String),
    #[error("No broker account matches {}", describe_identity(.login_hint, .user_id))]
    AccountNotFound {
        login_hint: Option<String>,
        user_id: Option<String>,
    },
    #[error("Broker application must be installed first: {install_link}")]
    InstallRequired { install_link: String },
    #[error("Authentication canceled by the user")]
    UserCanceled,
    #[error("Silent broker flow cannot complete without user interaction")]
    SilentFlowUnsupported,
    #[error("Broker reported an error: {0}")]
    ExternalFailure(String),
    #[error("Timed out after {0}ms waiting for the broker")]
    Timeout(u64),
}

/// Coarse kind of a [`DelegationError`], stable for matching and telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum DelegationErrorKind {
    BrokerUnavailable,
    AccountNotFound,
    InstallRequired,
    UserCanceled,
    SilentFlowUnsupported,
    ExternalFailure,
    Timeout,
}

impl DelegationError {
    pub fn kind(&self) -> DelegationErrorKind {
        match self {
            Self::BrokerUnavailable(_) => DelegationErrorKind::BrokerUnavailable,
            Self::AccountNotFound { .. } => DelegationErrorKind::AccountNotFound,
            Self::InstallRequired { .. } => DelegationErrorKind::InstallRequired,
            Self::UserCanceled => DelegationErrorKind::UserCanceled,
            Self::SilentFlowUnsupported => DelegationErrorKind::SilentFlowUnsupported,
            Self::ExternalFailure(_) => DelegationErrorKind::ExternalFailure,
            Self::Timeout(_) => DelegationErrorKind::Timeout,
        }
    }

    /// The link to open when the broker application is missing.
    pub fn install_link(&self) -> Option<&str> {
        match self {
            Self::InstallRequired { install_link } => Some(install_link),
            _ => None,
        }
    }

    /// Text suitable for showing to an end user.
    ///
    /// Transport and availability problems collapse into one generic message;
    /// cancellation and missing accounts each get their own actionable text.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::AccountNotFound { .. } => {
                "Add the requested account as a work account in the device settings, or sign in without the broker."
            }
            Self::InstallRequired { .. } => {
                "Install the authenticator app, then try signing in again."
            }
            Self::UserCanceled => "Sign-in was canceled.",
            Self::SilentFlowUnsupported => {
                "Sign-in needs your interaction. Try again with an interactive sign-in."
            }
            Self::BrokerUnavailable(_) | Self::ExternalFailure(_) | Self::Timeout(_) => {
                "The authentication broker is unavailable. Please try again later."
            }
        }
    }
}

fn describe_identity(login_hint: &Option<String>, user_id: &Option<String>) -> String {
    match (login_hint, user_id) {
        (Some(hint), Some(id)) => format!("login hint {hint} / user id {id}"),
        (Some(hint), None) => format!("login hint {hint}"),
        (None, Some(id)) => format!("user id {id}"),
        (None, None) => "the requested identity".to_string(),
    }
}

impl From<DelegationError> for HandoffError {
    fn from(error: DelegationError) -> Self {
        match error {
            DelegationError::Timeout(ms) => HandoffError::Timeout(ms),
            other => HandoffError::Delegation(other),
        }
    }
}
