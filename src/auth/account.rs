//! Account verifier: is the requested identity registered with the broker?

use super::broker::BrokerProxy;
use super::error::DelegationError;
use super::request::DelegationRequest;

/// Whether the broker knows the account this request is for.
///
/// A request without a login hint or user id matches the broker's default
/// account. A `false` answer is final: the caller fails with
/// [`DelegationError::AccountNotFound`] and must not retry.
pub async fn verify_account(
    broker: &dyn BrokerProxy,
    request: &DelegationRequest,
) -> Result<bool, DelegationError> {
    if !request.has_identity() {
        tracing::debug!("no identity requested, using the broker's default account");
        return Ok(true);
    }
    broker
        .is_account_registered(request.login_hint(), request.user_id())
        .await
}

/// [`verify_account`] as a gate: the verified request, bound to its broker
/// account, or `AccountNotFound`.
pub async fn require_account(
    broker: &dyn BrokerProxy,
    request: &DelegationRequest,
) -> Result<DelegationRequest, DelegationError> {
    if !verify_account(broker, request).await? {
        tracing::info!(
            login_hint = ?request.login_hint(),
            user_id = ?request.user_id(),
            "requested account is not registered with the broker"
        );
        return Err(DelegationError::AccountNotFound {
            login_hint: request.login_hint().map(str::to_string),
            user_id: request.user_id().map(str::to_string),
        });
    }
    Ok(request.with_broker_account(request.login_hint().map(str::to_string)))
}
