#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use handoff::auth::{
    BrokerProxy, BrokerResponse, ChannelId, CompletionGate, DelegationError, DelegationRequest,
    ResponseCode,
};

/// Every call the coordinator made into the broker, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrokerCall {
    AccountLookup {
        login_hint: Option<String>,
        user_id: Option<String>,
    },
    Silent {
        payload: BTreeMap<String, String>,
    },
    Launch {
        channel: ChannelId,
        payload: BTreeMap<String, String>,
    },
}

/// What the broker does when asked to launch its interactive flow.
pub enum LaunchScript {
    /// Record the launch and never answer.
    Record,
    /// Refuse to launch.
    Fail(DelegationError),
    /// Answer through `gate` from a separate task.
    Reply {
        gate: Arc<CompletionGate>,
        code: ResponseCode,
        fields: HashMap<String, String>,
    },
}

/// In-memory broker driven by a script.
pub struct ScriptedBroker {
    switchable: bool,
    accounts: Vec<String>,
    silent: Mutex<Option<BrokerResponse>>,
    launch: Mutex<LaunchScript>,
    calls: Mutex<Vec<BrokerCall>>,
}

impl ScriptedBroker {
    pub fn new() -> Self {
        Self {
            switchable: true,
            accounts: Vec::new(),
            silent: Mutex::new(None),
            launch: Mutex::new(LaunchScript::Record),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn unswitchable(mut self) -> Self {
        self.switchable = false;
        self
    }

    /// Register an account known by login hint or user id.
    pub fn with_account(mut self, id: &str) -> Self {
        self.accounts.push(id.to_string());
        self
    }

    pub fn with_silent_response(self, response: BrokerResponse) -> Self {
        *self.silent.lock().expect("broker lock poisoned") = Some(response);
        self
    }

    pub fn set_launch(&self, script: LaunchScript) {
        *self.launch.lock().expect("broker lock poisoned") = script;
    }

    pub fn calls(&self) -> Vec<BrokerCall> {
        self.calls.lock().expect("broker lock poisoned").clone()
    }

    pub fn launches(&self) -> Vec<(ChannelId, BTreeMap<String, String>)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                BrokerCall::Launch { channel, payload } => Some((channel, payload)),
                _ => None,
            })
            .collect()
    }

    pub fn silent_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, BrokerCall::Silent { .. }))
            .count()
    }

    fn record(&self, call: BrokerCall) {
        self.calls.lock().expect("broker lock poisoned").push(call);
    }
}

#[async_trait]
impl BrokerProxy for ScriptedBroker {
    fn can_switch_to_broker(&self) -> bool {
        self.switchable
    }

    async fn is_account_registered(
        &self,
        login_hint: Option<&str>,
        user_id: Option<&str>,
    ) -> Result<bool, DelegationError> {
        self.record(BrokerCall::AccountLookup {
            login_hint: login_hint.map(str::to_string),
            user_id: user_id.map(str::to_string),
        });
        let known = |id: Option<&str>| {
            id.is_some_and(|id| self.accounts.iter().any(|a| a.eq_ignore_ascii_case(id)))
        };
        Ok(known(login_hint) || known(user_id))
    }

    async fn acquire_token_silently(
        &self,
        request: &DelegationRequest,
    ) -> Result<Option<BrokerResponse>, DelegationError> {
        self.record(BrokerCall::Silent {
            payload: request.to_payload(),
        });
        Ok(self.silent.lock().expect("broker lock poisoned").clone())
    }

    async fn launch_interactive(
        &self,
        request: &DelegationRequest,
        channel: ChannelId,
    ) -> Result<(), DelegationError> {
        self.record(BrokerCall::Launch {
            channel,
            payload: request.to_payload(),
        });
        match &*self.launch.lock().expect("broker lock poisoned") {
            LaunchScript::Record => Ok(()),
            LaunchScript::Fail(err) => Err(err.clone()),
            LaunchScript::Reply { gate, code, fields } => {
                let gate = Arc::clone(gate);
                let code = *code;
                let fields = fields.clone();
                tokio::spawn(async move {
                    tokio::task::yield_now().await;
                    gate.complete(channel, code, &fields);
                });
                Ok(())
            }
        }
    }
}

pub fn payload(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

pub fn token_fields(token: &str, expires_on: i64) -> HashMap<String, String> {
    payload(&[
        ("account.access.token", token),
        ("account.expiredate", expires_on.to_string().as_str()),
    ])
}
