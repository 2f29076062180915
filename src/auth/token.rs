use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Token type reported for every broker-issued access token.
pub const BEARER: &str = "Bearer";

/// Identity of the account a broker token was issued for.
///
/// Every field is optional; brokers populate whatever they know.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub unique_id: Option<String>,
    pub displayable_id: Option<String>,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub identity_provider: Option<String>,
    pub tenant_id: Option<String>,
}

impl UserIdentity {
    pub fn is_empty(&self) -> bool {
        self.unique_id.is_none()
            && self.displayable_id.is_none()
            && self.given_name.is_none()
            && self.family_name.is_none()
            && self.identity_provider.is_none()
            && self.tenant_id.is_none()
    }
}

/// Successful result of a delegation.
///
/// # Example
/// ```
/// use handoff::auth::{AuthenticationResult, BEARER};
///
/// let result = AuthenticationResult {
///     token_type: BEARER.to_string(),
///     access_token: "tok1".to_string(),
///     expires_on: chrono::DateTime::from_timestamp(1_700_000_000, 0),
///     user: None,
/// };
/// assert!(result.expires_on.is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticationResult {
    pub token_type: String,
    pub access_token: String,
    pub expires_on: Option<DateTime<Utc>>,
    pub user: Option<UserIdentity>,
}

impl AuthenticationResult {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_on.map(|exp| exp <= now).unwrap_or(false)
    }
}
