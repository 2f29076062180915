//! Delegation request model and the inbound-payload builder.

use std::collections::{BTreeMap, HashMap};

use bon::Builder;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use url::Url;

use super::error::DelegationError;

pub const LOGIN_HINT_KEY: &str = "login_hint";
pub const USER_ID_KEY: &str = "user_id";
pub const SILENT_FLOW_KEY: &str = "silent_broker_flow";
pub const INSTALL_URL_KEY: &str = "broker_install_url";
pub const PROMPT_KEY: &str = "prompt";
pub const BROKER_ACCOUNT_NAME_KEY: &str = "broker_account_name";
const APP_LINK_PARAM: &str = "app_link";

/// How strongly the caller asked for a user prompt.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum PromptBehavior {
    #[default]
    Auto,
    Always,
    RefreshSession,
    Never,
}

impl PromptBehavior {
    /// Whether the broker will prompt regardless of any cached credential.
    pub fn forces_prompt(self) -> bool {
        matches!(self, Self::Always | Self::RefreshSession)
    }
}

/// Flow flags carried by a delegation request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowFlags {
    /// No UI may be shown; interactive hand-off is refused.
    ///
    /// Set whenever `silent_broker_flow` is present in the payload, unless its
    /// value is an explicit `false`, `0`, `no` or `off`.
    pub silent_only: bool,
    pub prompt: PromptBehavior,
}

/// Immutable description of one token request handed to the broker.
///
/// Built either from an inbound key/value payload with
/// [`DelegationRequest::from_payload`] or programmatically:
///
/// ```
/// use handoff::auth::DelegationRequest;
///
/// let request = DelegationRequest::builder()
///     .login_hint("a@x.com")
///     .build();
/// assert!(request.has_identity());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Builder)]
pub struct DelegationRequest {
    #[builder(into)]
    login_hint: Option<String>,
    #[builder(into)]
    user_id: Option<String>,
    #[builder(default)]
    flags: FlowFlags,
    #[builder(default)]
    extra: BTreeMap<String, String>,
    #[builder(into)]
    broker_account_name: Option<String>,
}

impl DelegationRequest {
    /// Build a request from the caller's inbound parameters.
    ///
    /// Fails with [`DelegationError::InstallRequired`] when the payload says
    /// the broker application is missing. Keys this crate does not interpret
    /// are kept and forwarded untouched.
    pub fn from_payload(payload: &HashMap<String, String>) -> Result<Self, DelegationError> {
        if let Some(url) = payload.get(INSTALL_URL_KEY) {
            return Err(DelegationError::InstallRequired {
                install_link: extract_install_link(url),
            });
        }

        let mut extra: BTreeMap<String, String> = payload
            .iter()
            .filter(|(key, _)| !is_core_key(key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        // Prompt values the broker understands but this crate does not are
        // forwarded as-is.
        let prompt = match non_empty(payload.get(PROMPT_KEY)) {
            Some(raw) => match raw.parse::<PromptBehavior>() {
                Ok(prompt) => prompt,
                Err(_) => {
                    tracing::debug!(prompt = %raw, "unknown prompt behavior, forwarding as-is");
                    extra.insert(PROMPT_KEY.to_string(), raw);
                    PromptBehavior::Auto
                }
            },
            None => PromptBehavior::Auto,
        };

        Ok(Self {
            login_hint: non_empty(payload.get(LOGIN_HINT_KEY)),
            user_id: non_empty(payload.get(USER_ID_KEY)),
            flags: FlowFlags {
                silent_only: flag_set(payload.get(SILENT_FLOW_KEY)),
                prompt,
            },
            extra,
            broker_account_name: None,
        })
    }

    pub fn login_hint(&self) -> Option<&str> {
        self.login_hint.as_deref()
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn flags(&self) -> FlowFlags {
        self.flags
    }

    pub fn extra(&self) -> &BTreeMap<String, String> {
        &self.extra
    }

    pub fn broker_account_name(&self) -> Option<&str> {
        self.broker_account_name.as_deref()
    }

    /// Whether the request names a login hint or a user id.
    pub fn has_identity(&self) -> bool {
        self.login_hint.is_some() || self.user_id.is_some()
    }

    /// Copy of this request bound to the broker account it was verified for.
    pub fn with_broker_account(&self, account_name: Option<String>) -> Self {
        Self {
            broker_account_name: account_name,
            ..self.clone()
        }
    }

    /// Key/value payload forwarded to the broker.
    pub fn to_payload(&self) -> BTreeMap<String, String> {
        let mut payload = self.extra.clone();
        let core = [
            (LOGIN_HINT_KEY, self.login_hint.as_ref()),
            (USER_ID_KEY, self.user_id.as_ref()),
            (BROKER_ACCOUNT_NAME_KEY, self.broker_account_name.as_ref()),
        ];
        for (key, value) in core {
            if let Some(value) = value {
                payload.insert(key.to_string(), value.clone());
            }
        }
        if self.flags.prompt != PromptBehavior::Auto {
            payload.insert(PROMPT_KEY.to_string(), self.flags.prompt.to_string());
        }
        if self.flags.silent_only {
            payload.insert(SILENT_FLOW_KEY.to_string(), "true".to_string());
        }
        payload
    }
}

/// Pull the `app_link` query parameter out of a broker install URL.
///
/// Falls back to the URL itself when it cannot be parsed or carries no
/// `app_link`, so the caller always has something to open.
pub fn extract_install_link(raw: &str) -> String {
    let trimmed = raw.trim();
    match Url::parse(trimmed) {
        Ok(url) => url
            .query_pairs()
            .find(|(name, _)| name == APP_LINK_PARAM)
            .map(|(_, value)| value.into_owned())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| trimmed.to_string()),
        Err(err) => {
            tracing::warn!(error = %err, "broker install url is not a valid url");
            trimmed.to_string()
        }
    }
}

fn is_core_key(key: &str) -> bool {
    matches!(
        key,
        LOGIN_HINT_KEY
            | USER_ID_KEY
            | SILENT_FLOW_KEY
            | INSTALL_URL_KEY
            | PROMPT_KEY
            | BROKER_ACCOUNT_NAME_KEY
    )
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

// Presence enables the flag; only an explicit false-like value disables it.
fn flag_set(value: Option<&String>) -> bool {
    match value {
        None => false,
        Some(raw) => !matches!(
            raw.trim().to_ascii_lowercase().as_str(),
            "false" | "0" | "no" | "off"
        ),
    }
}
