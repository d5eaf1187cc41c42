//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! Browser request
//!     → server.rs (Axum router, CORS, request ID, tracing)
//!     → request.rs (classify the inbound body)
//!     → forward.rs / form.rs / alerts.rs / channels.rs (build the engine call)
//!     → upstream (HeaderSpec, multipart form, reqwest)
//!     → response.rs (status, Set-Cookie, body classification)
//!     → Browser response
//! ```

pub mod alerts;
pub mod channels;
pub mod cors;
pub mod form;
pub mod forward;
pub mod request;
pub mod response;
pub mod server;

pub use request::InboundBody;
pub use server::{AppState, HttpServer};
