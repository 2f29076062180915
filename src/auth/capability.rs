//! Capability gate: may this request be delegated at all?

use super::broker::BrokerProxy;
use crate::config::HandoffConfig;

/// Whether token requests may be handed to the broker.
///
/// True only when delegation is enabled, not skipped, and the environment
/// reports a broker it can switch to. The environment is not queried when
/// configuration already rules delegation out.
pub fn can_delegate(config: &HandoffConfig, broker: &dyn BrokerProxy) -> bool {
    config.broker_enabled && !config.skip_broker && broker.can_switch_to_broker()
}
