//! Background attempt and interactive hand-off.

use std::sync::Arc;

use super::broker::BrokerProxy;
use super::completion::{CompletionGate, CompletionTicket};
use super::error::DelegationError;
use super::request::DelegationRequest;
use super::token::AuthenticationResult;
use super::translate::translate;

/// Try to get a token from the broker without any UI.
///
/// Skipped (`Ok(None)`) when the request names no identity or asks for a
/// forced prompt, since the broker would prompt anyway. A broker answer
/// without a usable access token is also `Ok(None)`: the caller falls
/// through to [`dispatch_interactive`]. Completes synchronously and never
/// touches the completion gate.
pub async fn try_background(
    broker: &dyn BrokerProxy,
    request: &DelegationRequest,
) -> Result<Option<AuthenticationResult>, DelegationError> {
    if !request.has_identity() {
        tracing::debug!("user is not specified for background token request");
        return Ok(None);
    }
    if request.flags().prompt.forces_prompt() {
        tracing::debug!(prompt = %request.flags().prompt, "prompt forced, skipping background request");
        return Ok(None);
    }

    tracing::debug!("user is specified for background token request");
    let Some(response) = broker.acquire_token_silently(request).await? else {
        tracing::debug!("broker has no cached credential for this user");
        return Ok(None);
    };

    if !response.has_usable_token() {
        tracing::debug!(code = %response.code, "background response carried no usable token");
        return Ok(None);
    }

    match translate(&response) {
        Ok(result) => {
            tracing::debug!("token returned from background call");
            Ok(Some(result))
        }
        Err(err) => {
            tracing::debug!(error = %err, "background response not usable");
            Ok(None)
        }
    }
}

/// Launch the broker's interactive flow and return the ticket to wait on.
///
/// Refused with [`DelegationError::SilentFlowUnsupported`] before anything
/// is dispatched when the request is silent-only. Fails with
/// `BrokerUnavailable` if another delegation is outstanding or the broker
/// cannot be launched; in the latter case the slot is already torn down
/// when this returns.
pub async fn dispatch_interactive(
    broker: &dyn BrokerProxy,
    gate: &Arc<CompletionGate>,
    request: &DelegationRequest,
) -> Result<CompletionTicket, DelegationError> {
    if request.flags().silent_only {
        tracing::debug!("silent broker flow requested, refusing interactive hand-off");
        return Err(DelegationError::SilentFlowUnsupported);
    }

    let ticket = gate.begin()?;
    let channel = ticket.channel();
    tracing::info!(channel = %channel, "launching broker for interactive sign-in");

    if let Err(err) = broker.launch_interactive(request, channel).await {
        tracing::error!(channel = %channel, error = %err, "broker could not be launched");
        drop(ticket);
        return Err(match err {
            DelegationError::BrokerUnavailable(message) => {
                DelegationError::BrokerUnavailable(message)
            }
            other => DelegationError::BrokerUnavailable(format!(
                "broker could not be launched: {other}"
            )),
        });
    }

    Ok(ticket)
}
