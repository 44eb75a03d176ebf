/// Cascading dispatcher: one registry walk per inbound message.
///
/// Global escapes are answered before the registry is consulted. While a
/// flow owns the session an escape must be the whole message (or the menu
/// row title), so free text that merely mentions "inicio" stays with the
/// flow. Otherwise
/// flows are visited in registration order; a flow that returns
/// `Delegate` lets the walk continue forward with the same message, so a
/// flow registered later can pick up the state it was handed.
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, error, info, warn};

use deskflow_commands::{detect_exact, Command};
use deskflow_core::{DeskError, MessageSender, Session, User};
use logging::{mask_phone, DispatchEvent, DispatchEventLogger};

use crate::flow::{Flow, FlowInput, FlowOutcome};

/// Flow name reported when a global command answered the message.
pub const GLOBAL_FLOW: &str = "global";

pub const FAREWELL_TEXT: &str = "👋 ¡Gracias por comunicarte con Conecta2 Telecomunicaciones! \
Cuando necesites algo más, escribe *menu*.";

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Handled { flow: String },
    /// No flow resolved the message; the caller decides what the user sees.
    Unhandled,
}

impl DispatchOutcome {
    pub fn is_handled(&self) -> bool {
        matches!(self, DispatchOutcome::Handled { .. })
    }

    pub fn flow(&self) -> Option<&str> {
        match self {
            DispatchOutcome::Handled { flow } => Some(flow),
            DispatchOutcome::Unhandled => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

pub struct FlowDispatcher {
    flows: Vec<Arc<dyn Flow>>,
    sender: Arc<dyn MessageSender>,
    courtesy_window: Duration,
}

impl FlowDispatcher {
    pub fn new(sender: Arc<dyn MessageSender>) -> Self {
        Self {
            flows: Vec::new(),
            sender,
            courtesy_window: Duration::seconds(120),
        }
    }

    pub fn with_courtesy_window(mut self, window: Duration) -> Self {
        self.courtesy_window = window;
        self
    }

    /// Append a flow. A flow registered twice under the same name replaces
    /// the earlier one in place.
    pub fn register(&mut self, flow: Arc<dyn Flow>) {
        if let Some(slot) = self.flows.iter_mut().find(|f| f.name() == flow.name()) {
            warn!("[Dispatcher] Replacing already registered flow {}", flow.name());
            *slot = flow;
            return;
        }
        debug!("[Dispatcher] Registered flow {}", flow.name());
        self.flows.push(flow);
    }

    /// Keep only the named flows, in the given order.
    pub fn with_order<S: AsRef<str>>(mut self, names: &[S]) -> Result<Self, DeskError> {
        let mut ordered = Vec::with_capacity(names.len());
        for name in names {
            let name = name.as_ref();
            if ordered.iter().any(|f: &Arc<dyn Flow>| f.name() == name) {
                return Err(DeskError::ConfigError(format!("flow '{name}' listed twice")));
            }
            let flow = self
                .flows
                .iter()
                .find(|f| f.name() == name)
                .cloned()
                .ok_or_else(|| DeskError::ConfigError(format!("unknown flow '{name}'")))?;
            ordered.push(flow);
        }
        for dropped in self.flows.iter().filter(|f| !ordered.iter().any(|o| o.name() == f.name())) {
            info!("[Dispatcher] Flow {} not in configured order; disabled", dropped.name());
        }
        self.flows = ordered;
        Ok(self)
    }

    pub fn flow_names(&self) -> Vec<&'static str> {
        self.flows.iter().map(|f| f.name()).collect()
    }

    pub async fn dispatch(&self, user: &User, raw: &str, session: &mut Session) -> DispatchOutcome {
        self.dispatch_at(user, raw, session, Utc::now()).await
    }

    /// Run one pass as of `now`.
    pub async fn dispatch_at(
        &self,
        user: &User,
        raw: &str,
        session: &mut Session,
        now: DateTime<Utc>,
    ) -> DispatchOutcome {
        let phone = user.phone_number.as_str();
        session.expire_stale_markers(now, self.courtesy_window);

        let input = FlowInput::new(user, raw, now);
        debug!(phone = %mask_phone(phone), token = %input.token, "[Dispatcher] Inbound message");

        let escape = if session.is_idle() {
            input.command()
        } else {
            detect_exact(raw)
        };
        if let Some(cmd) = escape.filter(|c| c.is_global()) {
            self.run_global(cmd, phone, session).await;
            DispatchEventLogger::log_event(
                phone,
                DispatchEvent::GlobalCommand {
                    command: cmd.to_string(),
                },
            );
            return DispatchOutcome::Handled {
                flow: GLOBAL_FLOW.to_string(),
            };
        }

        let mut pending: Option<(&'static str, Option<&'static str>)> = None;

        for (idx, flow) in self.flows.iter().enumerate() {
            if !flow.can_handle(&input, session) {
                continue;
            }

            match flow.handle(&input, session).await {
                Ok(FlowOutcome::Resolved) => {
                    debug!(flow = flow.name(), "[Dispatcher] Message resolved");
                    DispatchEventLogger::log_event(
                        phone,
                        DispatchEvent::FlowHandled {
                            flow: flow.name().to_string(),
                        },
                    );
                    return DispatchOutcome::Handled {
                        flow: flow.name().to_string(),
                    };
                }
                Ok(FlowOutcome::Delegate(hint)) => {
                    if let Some(target) = hint {
                        let reachable = self.flows[idx + 1..].iter().any(|f| f.name() == target);
                        if !reachable {
                            warn!(
                                from = flow.name(),
                                to = target,
                                "[Dispatcher] Hand-off target is not registered after the delegating flow"
                            );
                        }
                    }
                    DispatchEventLogger::log_event(
                        phone,
                        DispatchEvent::FlowDelegated {
                            flow: flow.name().to_string(),
                            target: hint.map(str::to_string),
                        },
                    );
                    pending = Some((flow.name(), hint));
                }
                Err(e) => {
                    error!(flow = flow.name(), error = %format!("{e:#}"), "[Dispatcher] Flow failed; skipping");
                    DispatchEventLogger::log_event(
                        phone,
                        DispatchEvent::FlowFailed {
                            flow: flow.name().to_string(),
                            error: format!("{e:#}"),
                        },
                    );
                }
            }
        }

        let dropped_hint = match pending {
            Some((from, hint)) => {
                warn!(
                    from,
                    to = hint.unwrap_or("-"),
                    "[Dispatcher] Hand-off was not picked up; message unhandled"
                );
                if let Some(target) = hint {
                    self.release_orphaned(target, session);
                }
                hint.map(str::to_string)
            }
            None => None,
        };
        DispatchEventLogger::log_event(phone, DispatchEvent::Unhandled { dropped_hint });
        DispatchOutcome::Unhandled
    }

    /// A session handed to a flow that is not registered at all would never
    /// be picked up again; give it back. A target registered earlier in the
    /// order keeps the state and answers the next message.
    fn release_orphaned(&self, target: &str, session: &mut Session) {
        if self.flows.iter().any(|f| f.name() == target) || session.flow_active() != Some(target) {
            return;
        }
        warn!(to = target, "[Dispatcher] Hand-off target is not registered; session returned to idle");
        session.clear_routing();
    }

    async fn run_global(&self, cmd: Command, phone: &str, session: &mut Session) {
        session.clear_routing();
        let sent = match cmd {
            Command::Finalizar => self.sender.send_text(phone, FAREWELL_TEXT).await,
            _ => self.sender.send_main_menu(phone).await,
        };
        if let Err(e) = sent {
            warn!(command = %cmd, error = %e, "[Dispatcher] Global command reply failed");
        }
    }
}
