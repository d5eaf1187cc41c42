//! Upstream engine subsystem.
//!
//! # Data Flow
//! ```text
//! inbound headers
//!     → headers.rs (HeaderSpec: directive or synthesized, cookie carried)
//!     → multipart.rs (MultipartSpec → planned parts → reqwest Form)
//!     → client.rs (UpstreamRequest → engine)
//!     → reply.rs (UpstreamReply: status, headers, buffered body)
//! ```
//!
//! # Design Decisions
//! - One outbound call per inbound request (two for a conflicting channel update)
//! - Bodies are buffered so a retry can resend identical bytes
//! - Header directives are typed before they reach the wire

pub mod client;
pub mod headers;
pub mod multipart;
pub mod reply;

pub use client::{OutboundBody, UpstreamClient, UpstreamRequest};
pub use headers::HeaderSpec;
pub use multipart::{MultipartSpec, PlannedPart};
pub use reply::UpstreamReply;
