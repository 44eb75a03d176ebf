//! In-memory collaborator implementations.
//!
//! Used by tests across the workspace and by the CLI's offline chat mode.
//! Each fake records what it was asked to do and can be switched into a
//! failing mode to exercise fallback paths.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::{bail, Result};
use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::traits::{
    AiProvider, Collaborators, ConnectivityProbe, CustomerDirectory, MessageSender, ProbeReport,
    TicketApi, TicketRequest,
};
use crate::user::CustomerInfo;

// ---------------------------------------------------------------------------
// Sender
// ---------------------------------------------------------------------------

/// Something the router sent to a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Text { phone: String, text: String },
    MainMenu { phone: String },
}

impl Outbound {
    pub fn text(&self) -> Option<&str> {
        match self {
            Outbound::Text { text, .. } => Some(text),
            Outbound::MainMenu { .. } => None,
        }
    }
}

#[derive(Default)]
pub struct RecordingSender {
    sent: Mutex<Vec<Outbound>>,
    fail: AtomicBool,
}

impl RecordingSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub async fn sent(&self) -> Vec<Outbound> {
        self.sent.lock().await.clone()
    }

    /// Text of the most recent text message.
    pub async fn last_text(&self) -> Option<String> {
        self.sent
            .lock()
            .await
            .iter()
            .rev()
            .find_map(|m| m.text().map(str::to_string))
    }

    pub async fn menus_sent(&self) -> usize {
        self.sent
            .lock()
            .await
            .iter()
            .filter(|m| matches!(m, Outbound::MainMenu { .. }))
            .count()
    }

    pub async fn clear(&self) {
        self.sent.lock().await.clear();
    }
}

#[async_trait]
impl MessageSender for RecordingSender {
    async fn send_text(&self, phone: &str, text: &str) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            bail!("sender offline");
        }
        self.sent.lock().await.push(Outbound::Text {
            phone: phone.to_string(),
            text: text.to_string(),
        });
        Ok(())
    }

    async fn send_main_menu(&self, phone: &str) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            bail!("sender offline");
        }
        self.sent.lock().await.push(Outbound::MainMenu {
            phone: phone.to_string(),
        });
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tickets
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct InMemoryTickets {
    created: Mutex<Vec<(String, TicketRequest)>>,
    next_id: AtomicU64,
    fail: AtomicBool,
}

impl InMemoryTickets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub async fn created(&self) -> Vec<(String, TicketRequest)> {
        self.created.lock().await.clone()
    }
}

#[async_trait]
impl TicketApi for InMemoryTickets {
    async fn create_ticket(&self, request: &TicketRequest) -> Result<String> {
        if self.fail.load(Ordering::SeqCst) {
            bail!("ticket API returned 503");
        }
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let id = format!("TK-{n:05}");
        self.created.lock().await.push((id.clone(), request.clone()));
        Ok(id)
    }
}

// ---------------------------------------------------------------------------
// Customers
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct StaticCustomers {
    by_phone: HashMap<String, CustomerInfo>,
}

impl StaticCustomers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, phone: impl Into<String>, customer: CustomerInfo) -> Self {
        self.by_phone.insert(phone.into(), customer);
        self
    }
}

#[async_trait]
impl CustomerDirectory for StaticCustomers {
    async fn get_customer(&self, phone: &str) -> Result<Option<CustomerInfo>> {
        Ok(self.by_phone.get(phone).cloned())
    }
}

// ---------------------------------------------------------------------------
// AI
// ---------------------------------------------------------------------------

/// Returns a fixed reply, or fails when no reply is scripted.
pub struct ScriptedAi {
    reply: Option<String>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedAi {
    pub fn replying(reply: impl Into<String>) -> Self {
        Self {
            reply: Some(reply.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub async fn prompts(&self) -> Vec<String> {
        self.prompts.lock().await.clone()
    }
}

#[async_trait]
impl AiProvider for ScriptedAi {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn get_reply(&self, prompt: &str, _context: &str) -> Result<String> {
        self.prompts.lock().await.push(prompt.to_string());
        match &self.reply {
            Some(reply) => Ok(reply.clone()),
            None => bail!("completion provider timed out"),
        }
    }
}

// ---------------------------------------------------------------------------
// Probe
// ---------------------------------------------------------------------------

pub struct ScriptedProbe {
    report: Option<ProbeReport>,
}

impl ScriptedProbe {
    pub fn healthy() -> Self {
        Self {
            report: Some(ProbeReport {
                reachable: true,
                packets_sent: 4,
                packets_received: 4,
                latency_ms: Some(8),
            }),
        }
    }

    pub fn with_report(report: ProbeReport) -> Self {
        Self {
            report: Some(report),
        }
    }

    pub fn failing() -> Self {
        Self { report: None }
    }
}

#[async_trait]
impl ConnectivityProbe for ScriptedProbe {
    async fn ping(&self, service_id: &str) -> Result<ProbeReport> {
        match &self.report {
            Some(report) => Ok(report.clone()),
            None => bail!("probe task for service {service_id} failed"),
        }
    }
}

// ---------------------------------------------------------------------------
// Bundle
// ---------------------------------------------------------------------------

/// Concrete fakes kept alongside the trait-object bundle, so tests can
/// inspect what was sent and created.
#[derive(Clone)]
pub struct FakeServices {
    pub sender: Arc<RecordingSender>,
    pub tickets: Arc<InMemoryTickets>,
    pub customers: Arc<StaticCustomers>,
    pub ai: Arc<ScriptedAi>,
    pub probe: Arc<ScriptedProbe>,
}

impl FakeServices {
    pub fn new() -> Self {
        Self {
            sender: Arc::new(RecordingSender::new()),
            tickets: Arc::new(InMemoryTickets::new()),
            customers: Arc::new(StaticCustomers::new()),
            ai: Arc::new(ScriptedAi::replying("¡Con gusto te ayudo a elegir tu plan!")),
            probe: Arc::new(ScriptedProbe::healthy()),
        }
    }

    pub fn with_customers(mut self, customers: StaticCustomers) -> Self {
        self.customers = Arc::new(customers);
        self
    }

    pub fn with_ai(mut self, ai: ScriptedAi) -> Self {
        self.ai = Arc::new(ai);
        self
    }

    pub fn with_probe(mut self, probe: ScriptedProbe) -> Self {
        self.probe = Arc::new(probe);
        self
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            sender: self.sender.clone(),
            tickets: self.tickets.clone(),
            customers: self.customers.clone(),
            ai: self.ai.clone(),
            probe: self.probe.clone(),
        }
    }
}

impl Default for FakeServices {
    fn default() -> Self {
        Self::new()
    }
}
