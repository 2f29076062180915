use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use super::account::require_account;
use super::broker::BrokerProxy;
use super::capability::can_delegate;
use super::completion::CompletionGate;
use super::error::DelegationError;
use super::request::DelegationRequest;
use super::strategy::{dispatch_interactive, try_background};
use super::AuthenticationOutcome;
use crate::config::HandoffConfig;

/// Coordinator facade for broker-delegated token requests.
///
/// All I/O decisions (opening install links, showing messages, retrying)
/// belong to the caller. `DelegationService` only returns typed results and
/// errors.
///
/// # Example
/// ```no_run
/// use std::collections::HashMap;
/// use std::sync::Arc;
/// use handoff::auth::{BrokerProxy, DelegationService};
/// use handoff::config::HandoffConfig;
///
/// # async fn example(broker: Arc<dyn BrokerProxy>) {
/// let service = DelegationService::new(broker, HandoffConfig::global().clone());
/// let payload = HashMap::from([("login_hint".to_string(), "a@x.com".to_string())]);
/// match service.acquire_token(&payload).await {
///     Ok(result) => println!("token expires {:?}", result.expires_on),
///     Err(err) => eprintln!("{}", err.user_message()),
/// }
/// # }
/// ```
pub struct DelegationService {
    broker: Arc<dyn BrokerProxy>,
    gate: Arc<CompletionGate>,
    config: HandoffConfig,
}

impl DelegationService {
    pub fn new(broker: Arc<dyn BrokerProxy>, config: HandoffConfig) -> Self {
        Self {
            broker,
            gate: CompletionGate::shared(),
            config,
        }
    }

    /// Use an existing completion gate, e.g. one shared by several services
    /// that talk to the same broker.
    pub fn with_gate(mut self, gate: Arc<CompletionGate>) -> Self {
        self.gate = gate;
        self
    }

    pub fn config(&self) -> &HandoffConfig {
        &self.config
    }

    /// Gate the broker boundary adapter reports completions to.
    pub fn completion_gate(&self) -> Arc<CompletionGate> {
        Arc::clone(&self.gate)
    }

    /// Whether requests from this service may be delegated.
    pub fn can_delegate(&self) -> bool {
        can_delegate(&self.config, self.broker.as_ref())
    }

    /// Acquire a token through the broker, waiting at most the configured
    /// completion timeout for an interactive answer.
    pub async fn acquire_token(&self, payload: &HashMap<String, String>) -> AuthenticationOutcome {
        self.acquire_token_with_deadline(payload, self.config.completion_timeout())
            .await
    }

    /// Acquire a token through the broker with an explicit deadline for the
    /// interactive completion (`None` waits indefinitely).
    pub async fn acquire_token_with_deadline(
        &self,
        payload: &HashMap<String, String>,
        deadline: Option<Duration>,
    ) -> AuthenticationOutcome {
        if !self.can_delegate() {
            return Err(DelegationError::BrokerUnavailable(
                "broker delegation is disabled or no broker is available".to_string(),
            ));
        }

        let request = DelegationRequest::from_payload(payload)?;
        let request = require_account(self.broker.as_ref(), &request).await?;
        tracing::debug!(
            broker_account = ?request.broker_account_name(),
            "switched to broker"
        );

        if let Some(result) = try_background(self.broker.as_ref(), &request).await? {
            return Ok(result);
        }
        tracing::debug!("token not returned from background call, falling back to interactive");

        let ticket = dispatch_interactive(self.broker.as_ref(), &self.gate, &request).await?;
        match deadline {
            Some(deadline) => ticket.wait_with_deadline(deadline).await,
            None => ticket.wait().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{BrokerResponse, ChannelId};
    use async_trait::async_trait;

    struct Unreachable;

    #[async_trait]
    impl BrokerProxy for Unreachable {
        fn can_switch_to_broker(&self) -> bool {
            false
        }

        async fn is_account_registered(
            &self,
            _login_hint: Option<&str>,
            _user_id: Option<&str>,
        ) -> Result<bool, DelegationError> {
            panic!("account lookup must not happen without capability")
        }

        async fn acquire_token_silently(
            &self,
            _request: &DelegationRequest,
        ) -> Result<Option<BrokerResponse>, DelegationError> {
            panic!("background call must not happen without capability")
        }

        async fn launch_interactive(
            &self,
            _request: &DelegationRequest,
            _channel: ChannelId,
        ) -> Result<(), DelegationError> {
            panic!("dispatch must not happen without capability")
        }
    }

    #[tokio::test]
    async fn disabled_capability_fails_before_any_broker_call() {
        let service = DelegationService::new(
            Arc::new(Unreachable),
            HandoffConfig::new().with_broker_enabled(true),
        );
        let payload = HashMap::from([("login_hint".to_string(), "a@x.com".to_string())]);
        let err = service.acquire_token(&payload).await.unwrap_err();
        assert!(matches!(err, DelegationError::BrokerUnavailable(_)));
        assert!(service.completion_gate().is_idle());
    }

    #[test]
    fn with_gate_shares_the_slot() {
        let gate = CompletionGate::shared();
        let service = DelegationService::new(Arc::new(Unreachable), HandoffConfig::default())
            .with_gate(Arc::clone(&gate));
        let _ticket = gate.begin().unwrap();
        assert!(!service.completion_gate().is_idle());
    }
}
