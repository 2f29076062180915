//! Deadline helper for broker waits.

use std::future::Future;
use std::time::Duration;

use crate::auth::error::DelegationError;

/// Wrap a future with a deadline, mapping expiry to [`DelegationError::Timeout`].
///
/// Expiry is reported as a delegation outcome so a waiter sees it on the same
/// channel as a broker reply; it becomes [`crate::error::HandoffError::Timeout`]
/// only when converted at the crate boundary.
///
/// The wrapped future is dropped on expiry, which runs any cleanup it owns,
/// such as releasing the completion slot.
pub async fn with_timeout<T>(
    duration: Duration,
    future: impl Future<Output = Result<T, DelegationError>>,
) -> Result<T, DelegationError> {
    match tokio::time::timeout(duration, future).await {
        Ok(result) => result,
        Err(_) => Err(DelegationError::Timeout(duration.as_millis() as u64)),
    }
}
