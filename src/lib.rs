//! Handoff: broker-delegated authentication coordinator.
//!
//! Decides whether a token request should be handled by an external, trusted
//! broker process, builds the delegation request, tries a silent background
//! call first and otherwise hands control to the broker's interactive flow,
//! then waits for exactly one out-of-band completion and turns it into a
//! normalized result or a classified error.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::collections::HashMap;
//! use std::sync::Arc;
//! use handoff::prelude::*;
//!
//! # async fn example(broker: Arc<dyn BrokerProxy>) -> handoff::error::Result<()> {
//! let config = HandoffConfig::from_env()?;
//! let service = DelegationService::new(broker, config);
//!
//! // Hand this to whatever receives the broker's answer.
//! let gate = service.completion_gate();
//!
//! let payload = HashMap::from([("login_hint".to_string(), "a@x.com".to_string())]);
//! let result = service.acquire_token(&payload).await?;
//! println!("{}", result.token_type);
//! # drop(gate);
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod prelude;
pub mod util;
