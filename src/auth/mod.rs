//! Broker-delegated token acquisition.
//!
//! Flow: capability gate, request builder, account verifier, background
//! attempt, then an interactive hand-off whose answer arrives out of band
//! through the [`CompletionGate`].

pub mod account;
pub mod broker;
pub mod capability;
pub mod completion;
pub mod error;
pub mod request;
pub mod service;
pub mod strategy;
pub mod token;
pub mod translate;

pub use broker::{BrokerProxy, BrokerResponse, ResponseCode};
pub use completion::{ChannelId, CompletionAck, CompletionGate, CompletionTicket, GateState};
pub use error::{DelegationError, DelegationErrorKind};
pub use request::{DelegationRequest, FlowFlags, PromptBehavior};
pub use service::DelegationService;
pub use token::{AuthenticationResult, UserIdentity, BEARER};

/// Normalized result of a delegation: a token or a classified failure.
pub type AuthenticationOutcome = Result<AuthenticationResult, DelegationError>;
