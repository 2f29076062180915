//! Tests for error classification and user-facing messages.

use handoff::auth::{DelegationError, DelegationErrorKind};
use handoff::error::{ErrorCategory, HandoffError, RecoverySuggestion};

#[test]
fn delegation_errors_classify_by_kind() {
    let cases = [
        (
            DelegationError::BrokerUnavailable("x".into()),
            ErrorCategory::Availability,
            RecoverySuggestion::RetryLater,
        ),
        (
            DelegationError::AccountNotFound {
                login_hint: Some("a@x.com".into()),
                user_id: None,
            },
            ErrorCategory::Account,
            RecoverySuggestion::RegisterAccount,
        ),
        (
            DelegationError::InstallRequired {
                install_link: "foo".into(),
            },
            ErrorCategory::Installation,
            RecoverySuggestion::InstallBroker,
        ),
        (
            DelegationError::UserCanceled,
            ErrorCategory::Canceled,
            RecoverySuggestion::NoAction,
        ),
        (
            DelegationError::SilentFlowUnsupported,
            ErrorCategory::InteractionRequired,
            RecoverySuggestion::RetryInteractively,
        ),
        (
            DelegationError::ExternalFailure("boom".into()),
            ErrorCategory::Broker,
            RecoverySuggestion::RetryLater,
        ),
    ];

    for (delegation, category, suggestion) in cases {
        let err = HandoffError::from(delegation.clone());
        assert_eq!(err.category(), category, "{delegation:?}");
        assert_eq!(err.recovery_suggestion(), suggestion, "{delegation:?}");
    }
}

#[test]
fn delegation_timeout_becomes_crate_timeout() {
    let err = HandoffError::from(DelegationError::Timeout(1_500));
    assert!(matches!(err, HandoffError::Timeout(1_500)));
    assert_eq!(err.category(), ErrorCategory::Timeout);
    assert_eq!(err.recovery_suggestion(), RecoverySuggestion::IncreaseTimeout);
    assert!(err.is_retryable());
}

#[test]
fn user_actionable_failures_are_not_retryable() {
    for err in [
        DelegationError::UserCanceled,
        DelegationError::SilentFlowUnsupported,
        DelegationError::AccountNotFound {
            login_hint: None,
            user_id: Some("oid".into()),
        },
    ] {
        assert!(!HandoffError::from(err).is_retryable());
    }
}

#[test]
fn cancellation_and_missing_account_have_distinct_messages() {
    let canceled = DelegationError::UserCanceled;
    let missing = DelegationError::AccountNotFound {
        login_hint: Some("a@x.com".into()),
        user_id: None,
    };
    let unavailable = DelegationError::BrokerUnavailable("gone".into());

    assert_ne!(canceled.user_message(), missing.user_message());
    assert_ne!(canceled.user_message(), unavailable.user_message());
    assert_ne!(missing.user_message(), unavailable.user_message());
}

#[test]
fn display_includes_context() {
    let err = HandoffError::from(DelegationError::InstallRequired {
        install_link: "market://details?id=app".into(),
    });
    assert_eq!(
        err.to_string(),
        "Delegation failed: Broker application must be installed first: market://details?id=app"
    );
    assert_eq!(
        DelegationError::Timeout(10).kind(),
        DelegationErrorKind::Timeout
    );
}

#[test]
fn config_errors_suggest_checking_configuration() {
    let err = HandoffError::Configuration("bad".into());
    assert_eq!(err.category(), ErrorCategory::Configuration);
    assert_eq!(err.recovery_suggestion(), RecoverySuggestion::CheckConfiguration);
    assert!(!err.is_retryable());
}
