//! Resilience subsystem.
//!
//! # Components
//! - override_retry.rs: bounded 409 → override retry for channel updates
//!
//! # Design Decisions
//! - No blanket retries: engine errors are relayed, not retried
//! - The only retry is the documented conflict override, at most once
//! - Upstream timeouts are opt-in configuration, not a default

pub mod override_retry;

pub use override_retry::{send_with_override, Attempt, ConflictOutcome, OVERRIDE_PARAM};
