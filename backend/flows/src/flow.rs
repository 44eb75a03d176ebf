use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use deskflow_commands::{normalize, Command};
use deskflow_core::{Session, User};

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// One inbound message as every flow in a pass sees it. The canonical token
/// is computed once per pass.
#[derive(Debug, Clone)]
pub struct FlowInput {
    pub user: User,
    pub raw: String,
    pub token: String,
    pub received_at: DateTime<Utc>,
}

impl FlowInput {
    pub fn new(user: &User, raw: &str, received_at: DateTime<Utc>) -> Self {
        Self {
            user: user.clone(),
            raw: raw.to_string(),
            token: normalize(raw),
            received_at,
        }
    }

    pub fn phone(&self) -> &str {
        &self.user.phone_number
    }

    /// The token as a known command, if it is one.
    pub fn command(&self) -> Option<Command> {
        self.token.parse().ok()
    }
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowOutcome {
    /// The message is fully answered; stop the pass.
    Resolved,
    /// Session state was handed to another flow; keep walking the registry
    /// with the same message. The hint names the flow expected to pick it up.
    Delegate(Option<&'static str>),
}

// ---------------------------------------------------------------------------
// Flow
// ---------------------------------------------------------------------------

#[async_trait]
pub trait Flow: Send + Sync {
    /// Registry name, matching `ActiveFlow::name` for flows that own state.
    fn name(&self) -> &'static str;

    /// Side-effect free predicate; called for every flow the pass reaches.
    fn can_handle(&self, input: &FlowInput, session: &Session) -> bool;

    /// Answer the message. An `Err` makes the dispatcher skip this flow for
    /// the rest of the pass.
    async fn handle(&self, input: &FlowInput, session: &mut Session) -> Result<FlowOutcome>;
}
