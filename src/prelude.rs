//! Convenience re-exports.

pub use crate::auth::{
    AuthenticationOutcome, AuthenticationResult, BrokerProxy, BrokerResponse, ChannelId,
    CompletionAck, CompletionGate, DelegationError, DelegationRequest, DelegationService,
    ResponseCode,
};
pub use crate::config::HandoffConfig;
pub use crate::error::{HandoffError, Result};
