//! Domain entities
//!
//! - Thread records and stack traces embedded in reports
//! - Delivery outcome and request parameters
//! - Domain-specific error types

pub mod delivery;
pub mod errors;
pub mod thread;

pub use delivery::{
    DeliveryOutcome, DeliveryParams, PayloadDisposition, StatusPolicy, HEADER_API_KEY,
    HEADER_INTEGRITY, HEADER_PAYLOAD_VERSION, HEADER_SENT_AT,
};
pub use errors::DomainError;
pub use thread::{Stackframe, Stacktrace, Thread, ThreadSendPolicy, ThreadType};
