//! Optimistic-concurrency retry for channel updates.
//!
//! # Protocol
//! ```text
//! FirstAttempt (override=false)
//!     ├─ 409 Conflict → Retried (override=true) → terminal
//!     └─ anything else → terminal
//! ```
//!
//! At most one retry per request. A conflict on the retried attempt is
//! returned to the caller as-is.

use std::future::Future;

use axum::http::StatusCode;

use crate::observability::metrics;
use crate::upstream::UpstreamReply;

/// Query parameter carrying the override flag.
pub const OVERRIDE_PARAM: &str = "override";

/// Which attempt of the protocol is being made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempt {
    FirstAttempt,
    Retried,
}

impl Attempt {
    /// Value of the override flag for this attempt.
    pub fn override_flag(self) -> bool {
        matches!(self, Attempt::Retried)
    }

    pub fn override_param(self) -> &'static str {
        if self.override_flag() {
            "true"
        } else {
            "false"
        }
    }
}

/// Outcome that may signal an optimistic-concurrency conflict.
pub trait ConflictOutcome {
    fn is_conflict(&self) -> bool;
}

impl ConflictOutcome for UpstreamReply {
    fn is_conflict(&self) -> bool {
        UpstreamReply::is_conflict(self)
    }
}

impl ConflictOutcome for StatusCode {
    fn is_conflict(&self) -> bool {
        *self == StatusCode::CONFLICT
    }
}

/// Run `send` once without override and, only on conflict, once more with it.
///
/// Transport errors end the protocol immediately.
pub async fn send_with_override<T, E, F, Fut>(mut send: F) -> Result<T, E>
where
    T: ConflictOutcome,
    F: FnMut(Attempt) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let first = send(Attempt::FirstAttempt).await?;
    if !first.is_conflict() {
        return Ok(first);
    }

    tracing::info!("Conflict detected, retrying with override=true");
    metrics::record_override_retry();
    send(Attempt::Retried).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    async fn run(script: Vec<StatusCode>) -> (Result<StatusCode, ()>, Vec<Attempt>) {
        let script = Mutex::new(script.into_iter());
        let seen = Mutex::new(Vec::new());
        let result = send_with_override(|attempt| {
            seen.lock().unwrap().push(attempt);
            let next = script.lock().unwrap().next().ok_or(());
            async move { next }
        })
        .await;
        (result, seen.into_inner().unwrap())
    }

    #[tokio::test]
    async fn test_success_needs_one_attempt() {
        let (result, seen) = run(vec![StatusCode::OK]).await;
        assert_eq!(result, Ok(StatusCode::OK));
        assert_eq!(seen, vec![Attempt::FirstAttempt]);
    }

    #[tokio::test]
    async fn test_conflict_retries_with_override() {
        let (result, seen) = run(vec![StatusCode::CONFLICT, StatusCode::OK]).await;
        assert_eq!(result, Ok(StatusCode::OK));
        assert_eq!(seen, vec![Attempt::FirstAttempt, Attempt::Retried]);
        assert!(seen[1].override_flag());
    }

    #[tokio::test]
    async fn test_second_conflict_is_terminal() {
        let (result, seen) = run(vec![
            StatusCode::CONFLICT,
            StatusCode::CONFLICT,
            StatusCode::OK,
        ])
        .await;
        assert_eq!(result, Ok(StatusCode::CONFLICT));
        assert_eq!(seen.len(), 2);
    }

    #[tokio::test]
    async fn test_other_failures_are_not_retried() {
        let (result, seen) = run(vec![StatusCode::INTERNAL_SERVER_ERROR]).await;
        assert_eq!(result, Ok(StatusCode::INTERNAL_SERVER_ERROR));
        assert_eq!(seen.len(), 1);
    }

    #[tokio::test]
    async fn test_transport_error_stops_protocol() {
        let (result, seen) = run(vec![]).await;
        assert_eq!(result, Err(()));
        assert_eq!(seen.len(), 1);
    }

    #[test]
    fn test_override_params() {
        assert_eq!(Attempt::FirstAttempt.override_param(), "false");
        assert_eq!(Attempt::Retried.override_param(), "true");
    }
}
