//! Dispatch Event Logger
//!
//! One structured record per dispatch decision (handled, delegated, failed,
//! global command, unhandled), written through `tracing` so the JSON file
//! layer turns it into an NDJSON line.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::redact::{mask_phone, redact_sensitive_data};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DispatchEvent {
    GlobalCommand {
        command: String,
    },
    FlowHandled {
        flow: String,
    },
    FlowDelegated {
        flow: String,
        target: Option<String>,
    },
    FlowFailed {
        flow: String,
        error: String,
    },
    Unhandled {
        /// Hand-off hint that no later flow picked up.
        dropped_hint: Option<String>,
    },
}

#[derive(Debug, Serialize)]
pub struct EventLogEntry {
    pub phone: String,
    pub timestamp: DateTime<Utc>,
    pub event: DispatchEvent,
}

impl EventLogEntry {
    /// Build the entry with the phone masked and free text scrubbed.
    pub fn new(phone: &str, mut event: DispatchEvent) -> Self {
        if let DispatchEvent::FlowFailed { error, .. } = &mut event {
            *error = redact_sensitive_data(error);
        }
        Self {
            phone: mask_phone(phone),
            timestamp: Utc::now(),
            event,
        }
    }
}

pub struct DispatchEventLogger;

impl DispatchEventLogger {
    pub fn log_event(phone: &str, event: DispatchEvent) {
        let entry = EventLogEntry::new(phone, event);
        let json = serde_json::to_string(&entry).unwrap_or_default();
        info!(target: "dispatch_events", event = %json, "Dispatch event");
    }
}
