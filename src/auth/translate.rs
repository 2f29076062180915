//! Pure mapping from raw broker responses to normalized outcomes.

use chrono::{DateTime, Utc};

use super::broker::{BrokerResponse, ResponseCode};
use super::error::DelegationError;
use super::token::{AuthenticationResult, BEARER};
use super::AuthenticationOutcome;

/// Translate a broker response into an outcome.
///
/// A success code without a usable access token is not a success: it maps to
/// [`DelegationError::ExternalFailure`]. Callers on the background path check
/// [`BrokerResponse::has_usable_token`] first and fall through to the
/// interactive hand-off instead.
pub fn translate(response: &BrokerResponse) -> AuthenticationOutcome {
    match response.code {
        ResponseCode::Canceled => Err(DelegationError::UserCanceled),
        ResponseCode::Error => Err(DelegationError::ExternalFailure(describe_error(response))),
        ResponseCode::Success => {
            let access_token = match response.access_token.as_deref() {
                Some(token) if !token.is_empty() => token.to_string(),
                _ => {
                    return Err(DelegationError::ExternalFailure(
                        "broker reported success without an access token".to_string(),
                    ))
                }
            };
            Ok(AuthenticationResult {
                token_type: BEARER.to_string(),
                access_token,
                expires_on: response.expires_on.and_then(epoch_to_timestamp),
                user: (!response.user.is_empty()).then(|| response.user.clone()),
            })
        }
    }
}

/// Convert broker epoch seconds into a UTC timestamp.
pub fn epoch_to_timestamp(secs: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0)
}

fn describe_error(response: &BrokerResponse) -> String {
    match (&response.error_code, &response.error_message) {
        (Some(code), Some(message)) => format!("{code}: {message}"),
        (Some(code), None) => code.clone(),
        (None, Some(message)) => message.clone(),
        (None, None) => "unspecified broker error".to_string(),
    }
}
