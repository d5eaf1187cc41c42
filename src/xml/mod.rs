//! XML payload subsystem.
//!
//! # Data Flow
//! ```text
//! JSON request body (serde_json::Value)
//!     → node.rs (explicit mapping into XmlValue: Null | Scalar | Record | Sequence)
//!     → element.rs (XmlElement tree, attributes before children)
//!     → element.rs writer (quick-xml, optional pretty print)
//!     → upstream engine
//!
//! Engine XML response
//!     → element.rs reader
//!     → element.rs JSON view (for the browser)
//! ```
//!
//! # Design Decisions
//! - The `@` attribute prefix is only interpreted at the JSON boundary;
//!   everything past `XmlValue::from_json` is typed
//! - Building never fails for JSON input; only writing/reading can error
//! - Domain templates (alert, channel) are thin callers of the builder

pub mod alert;
pub mod channel;
pub mod element;
pub mod node;

use thiserror::Error;

pub use alert::build_alert_xml;
pub use channel::build_channel_xml;
pub use element::{Declaration, XmlDocument, XmlElement};
pub use node::{build, XmlRecord, XmlValue};

/// Errors raised while writing or reading XML text.
#[derive(Debug, Error)]
pub enum XmlError {
    /// Serializing the element tree failed.
    #[error("XML write error: {0}")]
    Write(String),

    /// The input could not be tokenized.
    #[error("XML parse error: {0}")]
    Parse(#[from] quick_xml::Error),

    /// The input tokenized but does not form a single element tree.
    #[error("Malformed XML: {0}")]
    Malformed(String),
}

/// Result type for XML operations.
pub type XmlResult<T> = Result<T, XmlError>;
