use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::user::CustomerInfo;

/// Outbound channel to the user (WhatsApp Cloud API in production).
#[async_trait]
pub trait MessageSender: Send + Sync {
    /// Send a plain text message.
    async fn send_text(&self, phone: &str, text: &str) -> Result<()>;

    /// Send the interactive main menu.
    async fn send_main_menu(&self, phone: &str) -> Result<()>;
}

/// Ticketing backend.
#[async_trait]
pub trait TicketApi: Send + Sync {
    /// Open a ticket and return its id.
    async fn create_ticket(&self, request: &TicketRequest) -> Result<String>;
}

/// CRM lookup by phone number.
#[async_trait]
pub trait CustomerDirectory: Send + Sync {
    async fn get_customer(&self, phone: &str) -> Result<Option<CustomerInfo>>;
}

/// Free-text completion provider.
#[async_trait]
pub trait AiProvider: Send + Sync {
    /// Provider name (e.g., "openai", "gemini").
    fn name(&self) -> &str;

    /// Reply to `prompt` given a system `context`.
    async fn get_reply(&self, prompt: &str, context: &str) -> Result<String>;
}

/// Network probe against a customer's service (router ping).
#[async_trait]
pub trait ConnectivityProbe: Send + Sync {
    async fn ping(&self, service_id: &str) -> Result<ProbeReport>;
}

/// Priority attached to a ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TicketPriority {
    Low,
    #[default]
    Medium,
    High,
}

/// Everything the ticketing backend needs to open a ticket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    pub phone: String,
    pub category: String,
    pub subject: String,
    pub description: String,
    #[serde(default)]
    pub priority: TicketPriority,
}

/// Result of a connectivity probe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeReport {
    pub reachable: bool,
    pub packets_sent: u32,
    pub packets_received: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u32>,
}

impl ProbeReport {
    /// Packet loss as a whole percentage.
    pub fn packet_loss_pct(&self) -> u32 {
        if self.packets_sent == 0 {
            return 100;
        }
        let lost = self.packets_sent.saturating_sub(self.packets_received);
        lost * 100 / self.packets_sent
    }
}

/// The external services a flow may call, bundled for construction.
#[derive(Clone)]
pub struct Collaborators {
    pub sender: Arc<dyn MessageSender>,
    pub tickets: Arc<dyn TicketApi>,
    pub customers: Arc<dyn CustomerDirectory>,
    pub ai: Arc<dyn AiProvider>,
    pub probe: Arc<dyn ConnectivityProbe>,
}
