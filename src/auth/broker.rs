//! Boundary with the external broker process.
//!
//! The broker itself (its UI, its account storage, its transport) lives
//! outside this crate. [`BrokerProxy`] is the seam an integration layer
//! implements; [`BrokerResponse`] is the raw answer it hands back.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::completion::ChannelId;
use super::error::DelegationError;
use super::request::DelegationRequest;
use super::token::UserIdentity;

pub const ACCESS_TOKEN_KEY: &str = "account.access.token";
pub const EXPIRES_ON_KEY: &str = "account.expiredate";
pub const USER_ID_KEY: &str = "account.userinfo.userid";
pub const DISPLAYABLE_ID_KEY: &str = "account.userinfo.userid.displayable";
pub const GIVEN_NAME_KEY: &str = "account.userinfo.given.name";
pub const FAMILY_NAME_KEY: &str = "account.userinfo.family.name";
pub const IDENTITY_PROVIDER_KEY: &str = "account.userinfo.identity.provider";
pub const TENANT_ID_KEY: &str = "account.userinfo.tenantid";
pub const ERROR_CODE_KEY: &str = "errorCode";
pub const ERROR_MESSAGE_KEY: &str = "errorMessage";

/// Platform result code for a delivered broker response.
pub const PLATFORM_RESPONSE_RECEIVED: i32 = 2004;
/// Platform result code for a user-canceled broker activity.
pub const PLATFORM_USER_CANCEL: i32 = 2001;

/// Integration seam for the external broker process.
#[async_trait]
pub trait BrokerProxy: Send + Sync {
    /// Whether a broker is installed and the app may switch to it.
    ///
    /// Polled per request, so it must be cheap and free of side effects.
    fn can_switch_to_broker(&self) -> bool;

    /// Whether the broker has an account registered for this identity.
    async fn is_account_registered(
        &self,
        login_hint: Option<&str>,
        user_id: Option<&str>,
    ) -> Result<bool, DelegationError>;

    /// Ask the broker for a token without showing any UI.
    ///
    /// `Ok(None)` means the broker holds no cached or refreshable credential.
    async fn acquire_token_silently(
        &self,
        request: &DelegationRequest,
    ) -> Result<Option<BrokerResponse>, DelegationError>;

    /// Launch the broker's interactive surface and return immediately.
    ///
    /// The broker reports back out of band through
    /// [`super::CompletionGate::complete`] using `channel`, from any context
    /// and possibly before this call returns.
    async fn launch_interactive(
        &self,
        request: &DelegationRequest,
        channel: ChannelId,
    ) -> Result<(), DelegationError>;
}

/// Response code of a broker answer.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ResponseCode {
    Success,
    #[strum(to_string = "canceled", serialize = "cancelled")]
    Canceled,
    Error,
}

impl ResponseCode {
    /// Map an integer activity result code onto a response code.
    pub fn from_platform_code(code: i32) -> Self {
        match code {
            PLATFORM_RESPONSE_RECEIVED => Self::Success,
            PLATFORM_USER_CANCEL => Self::Canceled,
            _ => Self::Error,
        }
    }

    pub fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}

/// Raw data a broker delivers on completion.
///
/// Fields are read permissively: anything missing or malformed is left as
/// `None` rather than rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokerResponse {
    pub code: ResponseCode,
    pub access_token: Option<String>,
    /// Expiry as epoch seconds.
    pub expires_on: Option<i64>,
    pub user: UserIdentity,
    pub error_code: Option<String>,
    pub error_message: Option<String>,
}

impl BrokerResponse {
    pub fn new(code: ResponseCode) -> Self {
        Self {
            code,
            access_token: None,
            expires_on: None,
            user: UserIdentity::default(),
            error_code: None,
            error_message: None,
        }
    }

    /// A success response carrying `token` and an optional epoch expiry.
    pub fn success(token: impl Into<String>, expires_on: Option<i64>) -> Self {
        Self {
            access_token: Some(token.into()),
            expires_on,
            ..Self::new(ResponseCode::Success)
        }
    }

    /// Parse the flat field set delivered at the completion boundary.
    pub fn from_fields(code: ResponseCode, fields: &HashMap<String, String>) -> Self {
        let text = |key: &str| {
            fields
                .get(key)
                .map(|value| value.trim())
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        };

        let expires_on = text(EXPIRES_ON_KEY).and_then(|raw| match raw.parse::<i64>() {
            Ok(0) => None,
            Ok(secs) => Some(secs),
            Err(_) => {
                tracing::warn!(value = %raw, "ignoring unparsable broker expiry");
                None
            }
        });

        Self {
            code,
            access_token: text(ACCESS_TOKEN_KEY),
            expires_on,
            user: UserIdentity {
                unique_id: text(USER_ID_KEY),
                displayable_id: text(DISPLAYABLE_ID_KEY),
                given_name: text(GIVEN_NAME_KEY),
                family_name: text(FAMILY_NAME_KEY),
                identity_provider: text(IDENTITY_PROVIDER_KEY),
                tenant_id: text(TENANT_ID_KEY),
            },
            error_code: text(ERROR_CODE_KEY),
            error_message: text(ERROR_MESSAGE_KEY),
        }
    }

    /// Whether this is a success response with a non-empty access token.
    pub fn has_usable_token(&self) -> bool {
        self.code.is_success()
            && self
                .access_token
                .as_deref()
                .is_some_and(|token| !token.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn response_code_parses_both_spellings_of_canceled() {
        assert_eq!("canceled".parse::<ResponseCode>().unwrap(), ResponseCode::Canceled);
        assert_eq!("Cancelled".parse::<ResponseCode>().unwrap(), ResponseCode::Canceled);
        assert_eq!("SUCCESS".parse::<ResponseCode>().unwrap(), ResponseCode::Success);
        assert!("maybe".parse::<ResponseCode>().is_err());
    }

    #[test]
    fn platform_codes_map_to_response_codes() {
        assert_eq!(ResponseCode::from_platform_code(2004), ResponseCode::Success);
        assert_eq!(ResponseCode::from_platform_code(2001), ResponseCode::Canceled);
        assert_eq!(ResponseCode::from_platform_code(2002), ResponseCode::Error);
        assert_eq!(ResponseCode::from_platform_code(-1), ResponseCode::Error);
    }

    #[test]
    fn from_fields_reads_token_expiry_and_identity() {
        let response = BrokerResponse::from_fields(
            ResponseCode::Success,
            &fields(&[
                (ACCESS_TOKEN_KEY, "tok1"),
                (EXPIRES_ON_KEY, "1700000000"),
                (USER_ID_KEY, "oid-1"),
                (DISPLAYABLE_ID_KEY, "a@x.com"),
                ("unrelated", "ignored"),
            ]),
        );
        assert_eq!(response.access_token.as_deref(), Some("tok1"));
        assert_eq!(response.expires_on, Some(1_700_000_000));
        assert_eq!(response.user.unique_id.as_deref(), Some("oid-1"));
        assert_eq!(response.user.displayable_id.as_deref(), Some("a@x.com"));
        assert!(response.user.given_name.is_none());
    }

    #[test]
    fn from_fields_is_permissive_about_bad_values() {
        let response = BrokerResponse::from_fields(
            ResponseCode::Success,
            &fields(&[(ACCESS_TOKEN_KEY, "  "), (EXPIRES_ON_KEY, "soon")]),
        );
        assert!(response.access_token.is_none());
        assert!(response.expires_on.is_none());
        assert!(response.user.is_empty());
    }

    #[test]
    fn zero_expiry_is_treated_as_absent() {
        let response = BrokerResponse::from_fields(
            ResponseCode::Success,
            &fields(&[(ACCESS_TOKEN_KEY, "tok"), (EXPIRES_ON_KEY, "0")]),
        );
        assert!(response.expires_on.is_none());
    }

    #[test]
    fn usable_token_requires_success_and_content() {
        assert!(BrokerResponse::success("tok", None).has_usable_token());
        assert!(!BrokerResponse::success("", None).has_usable_token());
        let mut canceled = BrokerResponse::success("tok", None);
        canceled.code = ResponseCode::Canceled;
        assert!(!canceled.has_usable_token());
    }
}
