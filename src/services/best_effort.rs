use std::{fmt::Display, future::Future, time::Duration};

/// Awaits an external call, turning failure or timeout into `None`
///
/// `call` names the operation and `subject` what it was about; both only
/// appear in the log line emitted when no data comes back.
pub async fn best_effort<T, E, F>(limit: Duration, call: &str, subject: &str, fut: F) -> Option<T>
where
    E: Display,
    F: Future<Output = Result<T, E>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(Ok(value)) => Some(value),
        Ok(Err(e)) => {
            tracing::warn!(
                call,
                subject,
                error = %e,
                "External call failed, continuing without data"
            );
            None
        }
        Err(_) => {
            tracing::warn!(
                call,
                subject,
                timeout_ms = limit.as_millis() as u64,
                "External call timed out, continuing without data"
            );
            None
        }
    }
}
