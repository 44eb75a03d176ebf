//! Telemetry and structured logging for deskflow.
//!
//! Log redaction, console plus rolling NDJSON output, and one structured
//! record per dispatch decision.

pub mod event_logger;
pub mod logger;
pub mod redact;

pub use event_logger::{DispatchEvent, DispatchEventLogger, EventLogEntry};
pub use logger::init_logger;
pub use redact::{mask_phone, redact_sensitive_data};
