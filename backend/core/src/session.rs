//! Per-user conversation state.
//!
//! A `Session` is the only state that survives between inbound messages.
//! Which flow owns the conversation is a single tagged value (`ActiveFlow`),
//! so activating one flow's state necessarily discards every other flow's
//! in-progress data. The boolean views (`creating_ticket()`, `contracting_plan()`,
//! ...) are derived from that value and can never disagree with each other.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default number of history entries retained per session.
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

// ---------------------------------------------------------------------------
// Contracting wizard state
// ---------------------------------------------------------------------------

/// Step pointer of the plan-contracting wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractStep {
    /// Awaiting the customer's full name.
    Name,
    Email,
    Address,
    /// Awaiting an alternate contact number; a literal "no" skips it.
    Phone,
    /// Awaiting yes/no on the summary.
    Confirm,
}

impl ContractStep {
    /// The step that follows this one, or `None` after confirmation.
    pub fn next(self) -> Option<Self> {
        match self {
            ContractStep::Name => Some(ContractStep::Email),
            ContractStep::Email => Some(ContractStep::Address),
            ContractStep::Address => Some(ContractStep::Phone),
            ContractStep::Phone => Some(ContractStep::Confirm),
            ContractStep::Confirm => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ContractStep::Name => "name",
            ContractStep::Email => "email",
            ContractStep::Address => "address",
            ContractStep::Phone => "phone",
            ContractStep::Confirm => "confirm",
        }
    }
}

/// Working data collected field-by-field by the contracting wizard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractData {
    pub plan_name: String,
    /// Monthly price in whole pesos.
    pub plan_price: u64,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternative_phone: Option<String>,
}

impl ContractData {
    pub fn new(plan_name: impl Into<String>, plan_price: u64, started_at: DateTime<Utc>) -> Self {
        Self {
            plan_name: plan_name.into(),
            plan_price,
            started_at,
            name: None,
            email: None,
            address: None,
            alternative_phone: None,
        }
    }
}

/// An in-progress contracting wizard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contracting {
    pub step: ContractStep,
    pub data: ContractData,
}

/// State of the AI sales conversation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract: Option<Contracting>,
}

// ---------------------------------------------------------------------------
// Ticket intake state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TicketStep {
    /// Flag set by a hand-off; nothing has been asked yet.
    #[default]
    Start,
    /// The fault-description prompt was sent.
    AwaitingDescription,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketIntake {
    pub step: TicketStep,
}

// ---------------------------------------------------------------------------
// Active flow
// ---------------------------------------------------------------------------

/// Which flow currently owns the conversation, together with that flow's
/// private payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "flow", rename_all = "camelCase")]
pub enum ActiveFlow {
    #[default]
    Idle,
    #[serde(rename = "ipDiagnostic")]
    Diagnostic {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        task_id: Option<String>,
    },
    TicketIntake(TicketIntake),
    Sales(SalesState),
    Invoices,
    DebtInquiry,
    PaymentPoints,
    PasswordChange,
    PlanUpgrade,
    PaymentReceipt,
}

impl ActiveFlow {
    /// The registered name of the owning flow, `None` when idle.
    pub fn name(&self) -> Option<&'static str> {
        match self {
            ActiveFlow::Idle => None,
            ActiveFlow::Diagnostic { .. } => Some("ipDiagnostic"),
            ActiveFlow::TicketIntake(_) => Some("ticketIntake"),
            ActiveFlow::Sales(_) => Some("sales"),
            ActiveFlow::Invoices => Some("invoices"),
            ActiveFlow::DebtInquiry => Some("debtInquiry"),
            ActiveFlow::PaymentPoints => Some("paymentPoints"),
            ActiveFlow::PasswordChange => Some("passwordChange"),
            ActiveFlow::PlanUpgrade => Some("planUpgrade"),
            ActiveFlow::PaymentReceipt => Some("paymentReceipt"),
        }
    }
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

/// One exchanged turn: what the user said and what was answered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub user_text: String,
    pub reply_text: String,
    pub at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub phone_number: String,
    #[serde(default)]
    active: ActiveFlow,
    #[serde(default)]
    history: Vec<HistoryEntry>,
    #[serde(default = "default_history_limit")]
    history_limit: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    contract_completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_activity: Option<DateTime<Utc>>,
}

fn default_history_limit() -> usize {
    DEFAULT_HISTORY_LIMIT
}

impl Session {
    pub fn new(phone_number: impl Into<String>) -> Self {
        Self {
            phone_number: phone_number.into(),
            active: ActiveFlow::Idle,
            history: Vec::new(),
            history_limit: DEFAULT_HISTORY_LIMIT,
            contract_completed_at: None,
            last_activity: None,
        }
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit.max(1);
        self
    }

    // -- routing ----------------------------------------------------------

    pub fn active(&self) -> &ActiveFlow {
        &self.active
    }

    pub fn active_mut(&mut self) -> &mut ActiveFlow {
        &mut self.active
    }

    /// Hand the conversation to a flow, discarding any other flow's state.
    pub fn activate(&mut self, state: ActiveFlow) {
        debug!(
            phone = %self.phone_number,
            from = self.active.name().unwrap_or("idle"),
            to = state.name().unwrap_or("idle"),
            "Session ownership change"
        );
        self.active = state;
    }

    /// Drop every routing flag. History and markers are kept.
    pub fn clear_routing(&mut self) {
        self.activate(ActiveFlow::Idle);
    }

    /// Drop routing, history and markers, as on logout.
    pub fn forget(&mut self) {
        self.clear_routing();
        self.history.clear();
        self.contract_completed_at = None;
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.active, ActiveFlow::Idle)
    }

    /// Name of the flow that owns the conversation (`flowActive`).
    pub fn flow_active(&self) -> Option<&'static str> {
        self.active.name()
    }

    pub fn creating_ticket(&self) -> bool {
        matches!(self.active, ActiveFlow::TicketIntake(_))
    }

    pub fn diagnostic_in_progress(&self) -> bool {
        matches!(self.active, ActiveFlow::Diagnostic { .. })
    }

    pub fn in_sales(&self) -> bool {
        matches!(self.active, ActiveFlow::Sales(_))
    }

    pub fn contracting_plan(&self) -> bool {
        self.contracting().is_some()
    }

    pub fn contracting_step(&self) -> Option<ContractStep> {
        self.contracting().map(|c| c.step)
    }

    pub fn contract_data(&self) -> Option<&ContractData> {
        self.contracting().map(|c| &c.data)
    }

    pub fn contracting(&self) -> Option<&Contracting> {
        match &self.active {
            ActiveFlow::Sales(sales) => sales.contract.as_ref(),
            _ => None,
        }
    }

    pub fn contracting_mut(&mut self) -> Option<&mut Contracting> {
        match &mut self.active {
            ActiveFlow::Sales(sales) => sales.contract.as_mut(),
            _ => None,
        }
    }

    /// Start the contracting wizard inside the sales conversation.
    pub fn begin_contracting(&mut self, data: ContractData) {
        self.activate(ActiveFlow::Sales(SalesState {
            contract: Some(Contracting {
                step: ContractStep::Name,
                data,
            }),
        }));
    }

    /// Abandon the wizard, leaving the sales conversation itself in place.
    /// Returns `false` when no wizard was running.
    pub fn cancel_contracting(&mut self) -> bool {
        match &mut self.active {
            ActiveFlow::Sales(sales) => sales.contract.take().is_some(),
            _ => false,
        }
    }

    // -- history ----------------------------------------------------------

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// The last `n` turns, oldest first.
    pub fn recent_history(&self, n: usize) -> &[HistoryEntry] {
        let start = self.history.len().saturating_sub(n);
        &self.history[start..]
    }

    /// Append a turn, dropping the oldest entries past the retention limit.
    pub fn push_history(
        &mut self,
        user_text: impl Into<String>,
        reply_text: impl Into<String>,
        at: DateTime<Utc>,
    ) {
        self.history.push(HistoryEntry {
            user_text: user_text.into(),
            reply_text: reply_text.into(),
            at,
        });
        if self.history.len() > self.history_limit {
            let excess = self.history.len() - self.history_limit;
            self.history.drain(..excess);
        }
    }

    /// Scan history newest-first and return the first hit.
    pub fn find_in_history<T>(&self, f: impl FnMut(&HistoryEntry) -> Option<T>) -> Option<T> {
        self.history.iter().rev().find_map(f)
    }

    // -- time-boxed markers ----------------------------------------------

    pub fn contract_completed_at(&self) -> Option<DateTime<Utc>> {
        self.contract_completed_at
    }

    pub fn mark_contract_completed(&mut self, at: DateTime<Utc>) {
        self.contract_completed_at = Some(at);
    }

    /// Whether `now` falls inside the courtesy window after a completed contract.
    pub fn courtesy_window_open(&self, now: DateTime<Utc>, window: Duration) -> bool {
        match self.contract_completed_at {
            Some(at) => now.signed_duration_since(at) < window,
            None => false,
        }
    }

    /// Discard markers whose window has elapsed. Returns `true` if one was cleared.
    pub fn expire_stale_markers(&mut self, now: DateTime<Utc>, window: Duration) -> bool {
        if self.contract_completed_at.is_some() && !self.courtesy_window_open(now, window) {
            debug!(phone = %self.phone_number, "Courtesy window elapsed; clearing marker");
            self.contract_completed_at = None;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contract() -> ContractData {
        ContractData::new("50 Mbps", 50_000, Utc::now())
    }

    #[test]
    fn new_session_is_idle() {
        let s = Session::new("573001112233");
        assert!(s.is_idle());
        assert_eq!(s.flow_active(), None);
        assert!(!s.creating_ticket());
        assert!(!s.contracting_plan());
    }

    #[test]
    fn activating_one_flow_discards_the_other() {
        let mut s = Session::new("573001112233");
        s.begin_contracting(contract());
        assert!(s.contracting_plan());

        s.activate(ActiveFlow::TicketIntake(TicketIntake::default()));
        assert!(s.creating_ticket());
        assert!(!s.contracting_plan());
        assert!(s.contract_data().is_none());
        assert_eq!(s.flow_active(), Some("ticketIntake"));
    }

    #[test]
    fn cancel_contracting_keeps_sales_ownership() {
        let mut s = Session::new("573001112233");
        s.begin_contracting(contract());
        assert!(s.cancel_contracting());
        assert!(s.in_sales());
        assert!(!s.contracting_plan());
        assert!(!s.cancel_contracting());
    }

    #[test]
    fn contract_steps_advance_in_order() {
        let mut step = ContractStep::Name;
        let mut seen = vec![step.as_str()];
        while let Some(next) = step.next() {
            step = next;
            seen.push(step.as_str());
        }
        assert_eq!(seen, ["name", "email", "address", "phone", "confirm"]);
    }

    #[test]
    fn history_is_capped() {
        let mut s = Session::new("1").with_history_limit(3);
        for i in 0..5 {
            s.push_history(format!("u{i}"), format!("r{i}"), Utc::now());
        }
        assert_eq!(s.history().len(), 3);
        assert_eq!(s.history()[0].user_text, "u2");
        assert_eq!(s.recent_history(2)[1].reply_text, "r4");
    }

    #[test]
    fn find_in_history_prefers_newest() {
        let mut s = Session::new("1");
        s.push_history("plan 30", "te recomiendo 30 Mbps", Utc::now());
        s.push_history("y el de 100?", "el plan 100 Mbps cuesta", Utc::now());
        let hit = s.find_in_history(|e| e.reply_text.contains("Mbps").then(|| e.user_text.clone()));
        assert_eq!(hit.as_deref(), Some("y el de 100?"));
    }

    #[test]
    fn courtesy_window_boundaries() {
        let window = Duration::seconds(120);
        let now = Utc::now();
        let mut s = Session::new("1");
        assert!(!s.courtesy_window_open(now, window));

        s.mark_contract_completed(now - Duration::seconds(119));
        assert!(s.courtesy_window_open(now, window));
        assert!(!s.expire_stale_markers(now, window));

        s.mark_contract_completed(now - Duration::seconds(121));
        assert!(!s.courtesy_window_open(now, window));
        assert!(s.expire_stale_markers(now, window));
        assert!(s.contract_completed_at().is_none());
    }

    #[test]
    fn clear_routing_keeps_history_and_marker() {
        let mut s = Session::new("1");
        s.push_history("hola", "hola!", Utc::now());
        s.mark_contract_completed(Utc::now());
        s.activate(ActiveFlow::Diagnostic { task_id: None });
        s.clear_routing();
        assert!(s.is_idle());
        assert_eq!(s.history().len(), 1);
        assert!(s.contract_completed_at().is_some());
    }

    #[test]
    fn forget_drops_everything_but_the_phone() {
        let mut s = Session::new("1");
        s.push_history("hola", "hola!", Utc::now());
        s.mark_contract_completed(Utc::now());
        s.activate(ActiveFlow::PasswordChange);
        s.forget();
        assert!(s.is_idle());
        assert!(s.history().is_empty());
        assert!(s.contract_completed_at().is_none());
        assert_eq!(s.phone_number, "1");
    }

    #[test]
    fn session_survives_serde() {
        let mut s = Session::new("1");
        s.begin_contracting(contract());
        let json = serde_json::to_string(&s).unwrap();
        let back: Session = serde_json::from_str(&json).unwrap();
        assert_eq!(back.contracting_step(), Some(ContractStep::Name));
        assert_eq!(back.flow_active(), Some("sales"));
    }
}
