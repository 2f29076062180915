//! Single-slot completion gate.
//!
//! One interactive delegation may be outstanding per gate. The coordinator
//! opens the slot with [`CompletionGate::begin`], hands the returned
//! [`ChannelId`] to the broker, and waits on the [`CompletionTicket`]. The
//! broker's answer arrives from another context through
//! [`CompletionGate::complete`]; the outcome travels through a oneshot
//! channel, so it is fully written before the waiter can observe it.
//!
//! The slot mutex is only held for bookkeeping and never across an `.await`,
//! so a completion callback can always make progress while the waiter is
//! parked.
//!
//! State machine: `Idle -> Dispatched -> Completed -> Idle`. Dropping the
//! ticket (after a result, a timeout, a failed launch or caller
//! cancellation) returns the gate to `Idle`; completions that arrive after
//! that are logged and ignored.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::oneshot;
use uuid::Uuid;

use super::broker::{BrokerResponse, ResponseCode};
use super::error::DelegationError;
use super::translate::translate;
use super::AuthenticationOutcome;
use crate::util::timeout::with_timeout;

/// Identifier handed to the broker so its answer can be routed back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelId(Uuid);

impl ChannelId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::str::FromStr for ChannelId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Observable state of a gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Idle,
    Dispatched,
    Completed,
}

/// What happened to a completion handed to the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionAck {
    /// The outcome reached the waiting coordinator.
    Delivered,
    /// The slot was already completed; the call was ignored.
    Duplicate,
    /// A different delegation owns the slot; the call was ignored.
    UnknownChannel,
    /// Nothing is outstanding; the call was ignored.
    NoPending,
    /// The slot was open but its waiter had already gone away.
    WaiterGone,
}

struct PendingCompletion {
    channel: ChannelId,
    created_at: DateTime<Utc>,
    sender: Option<oneshot::Sender<AuthenticationOutcome>>,
}

/// Coordinator for the single outstanding broker delegation.
///
/// Share it with the boundary adapter that receives broker callbacks:
///
/// ```
/// use handoff::auth::{CompletionAck, CompletionGate, ResponseCode};
/// use std::collections::HashMap;
///
/// let gate = CompletionGate::shared();
/// let ticket = gate.begin().unwrap();
/// let ack = gate.complete(ticket.channel(), ResponseCode::Canceled, &HashMap::new());
/// assert_eq!(ack, CompletionAck::Delivered);
/// ```
#[derive(Default)]
pub struct CompletionGate {
    slot: Mutex<Option<PendingCompletion>>,
}

impl fmt::Debug for CompletionGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionGate")
            .field("state", &self.state())
            .finish()
    }
}

impl CompletionGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    pub fn state(&self) -> GateState {
        match self.lock().as_ref() {
            None => GateState::Idle,
            Some(pending) if pending.sender.is_some() => GateState::Dispatched,
            Some(_) => GateState::Completed,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.state() == GateState::Idle
    }

    /// When the outstanding delegation was opened, if any.
    pub fn pending_since(&self) -> Option<DateTime<Utc>> {
        self.lock().as_ref().map(|pending| pending.created_at)
    }

    /// Open the slot for a new delegation.
    ///
    /// Fails without touching the existing slot when another delegation is
    /// still outstanding.
    pub fn begin(self: &Arc<Self>) -> Result<CompletionTicket, DelegationError> {
        let mut slot = self.lock();
        if let Some(pending) = slot.as_ref() {
            tracing::warn!(
                outstanding = %pending.channel,
                since = %pending.created_at,
                "refusing to start a delegation while another is in flight"
            );
            return Err(DelegationError::BrokerUnavailable(format!(
                "delegation {} is already in flight",
                pending.channel
            )));
        }

        let channel = ChannelId::new();
        let (sender, receiver) = oneshot::channel();
        *slot = Some(PendingCompletion {
            channel,
            created_at: Utc::now(),
            sender: Some(sender),
        });
        tracing::debug!(channel = %channel, "completion slot opened");

        Ok(CompletionTicket {
            channel,
            receiver,
            gate: Arc::clone(self),
        })
    }

    /// Out-of-band completion entry point for the broker boundary.
    ///
    /// A non-success code always yields [`DelegationError::UserCanceled`],
    /// whatever else the broker sent.
    pub fn complete(
        &self,
        channel: ChannelId,
        code: ResponseCode,
        fields: &HashMap<String, String>,
    ) -> CompletionAck {
        self.deliver(channel, BrokerResponse::from_fields(code, fields))
    }

    /// Like [`complete`](Self::complete) for an already parsed response.
    pub fn deliver(&self, channel: ChannelId, response: BrokerResponse) -> CompletionAck {
        let outcome = if response.code.is_success() {
            translate(&response)
        } else {
            Err(DelegationError::UserCanceled)
        };

        let sender = {
            let mut slot = self.lock();
            match slot.as_mut() {
                None => {
                    tracing::warn!(channel = %channel, "ignoring broker completion with nothing pending");
                    return CompletionAck::NoPending;
                }
                Some(pending) if pending.channel != channel => {
                    tracing::warn!(
                        channel = %channel,
                        outstanding = %pending.channel,
                        "ignoring broker completion for an unknown channel"
                    );
                    return CompletionAck::UnknownChannel;
                }
                Some(pending) => match pending.sender.take() {
                    Some(sender) => sender,
                    None => {
                        tracing::warn!(channel = %channel, "ignoring duplicate broker completion");
                        return CompletionAck::Duplicate;
                    }
                },
            }
        };

        let succeeded = outcome.is_ok();
        if sender.send(outcome).is_err() {
            tracing::warn!(channel = %channel, "broker completed after the waiter left");
            return CompletionAck::WaiterGone;
        }
        tracing::info!(channel = %channel, succeeded, "broker completion delivered");
        CompletionAck::Delivered
    }

    fn release(&self, channel: ChannelId) {
        let mut slot = self.lock();
        if slot.as_ref().is_some_and(|pending| pending.channel == channel) {
            *slot = None;
            tracing::debug!(channel = %channel, "completion slot cleared");
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<PendingCompletion>> {
        // The slot holds plain data; a panic elsewhere cannot leave it torn.
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Exclusive handle on the outstanding delegation.
///
/// Dropping the ticket clears the gate's slot.
#[derive(Debug)]
pub struct CompletionTicket {
    channel: ChannelId,
    receiver: oneshot::Receiver<AuthenticationOutcome>,
    gate: Arc<CompletionGate>,
}

impl CompletionTicket {
    pub fn channel(&self) -> ChannelId {
        self.channel
    }

    /// Wait for the broker's completion with no upper bound.
    pub async fn wait(mut self) -> AuthenticationOutcome {
        (&mut self.receiver).await.unwrap_or_else(|_| {
            Err(DelegationError::BrokerUnavailable(
                "completion channel closed before the broker answered".to_string(),
            ))
        })
    }

    /// Wait for the broker's completion, giving up after `deadline`.
    ///
    /// On timeout the slot is cleared, so a late completion is ignored
    /// instead of leaking into the next delegation.
    pub async fn wait_with_deadline(self, deadline: Duration) -> AuthenticationOutcome {
        let channel = self.channel;
        let outcome = with_timeout(deadline, self.wait()).await;
        if let Err(DelegationError::Timeout(ms)) = &outcome {
            tracing::warn!(channel = %channel, waited_ms = ms, "broker did not complete in time");
        }
        outcome
    }
}

impl Drop for CompletionTicket {
    fn drop(&mut self) {
        self.gate.release(self.channel);
    }
}
