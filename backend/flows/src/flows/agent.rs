//! Hand the conversation to a human advisor.
//!
//! Opens a ticket carrying the last exchanged turns so the advisor picks up
//! with context, then releases the session.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tracing::{info, warn};

use deskflow_commands::Command;
use deskflow_core::{Collaborators, MessageSender, Session, TicketApi, TicketPriority};

use crate::flow::{Flow, FlowInput, FlowOutcome};
use crate::flows::{reply, ticket_for, AGENT_HANDOVER};

const CONTEXT_TURNS: usize = 5;

const FAILURE_TEXT: &str = "❌ En este momento no pudimos registrar tu solicitud. \
También puedes llamarnos a la línea de atención en horario de oficina.";

pub struct AgentHandoverFlow {
    sender: Arc<dyn MessageSender>,
    tickets: Arc<dyn TicketApi>,
}

impl AgentHandoverFlow {
    pub fn new(collabs: &Collaborators) -> Self {
        Self {
            sender: collabs.sender.clone(),
            tickets: collabs.tickets.clone(),
        }
    }
}

fn transcript(input: &FlowInput, session: &Session) -> String {
    let mut text = format!("Solicitud: {}", input.raw.trim());
    let recent = session.recent_history(CONTEXT_TURNS);
    if !recent.is_empty() {
        text.push_str("\n\nÚltimos mensajes:");
        for turn in recent {
            text.push_str(&format!("\nCliente: {}\nBot: {}", turn.user_text, turn.reply_text));
        }
    }
    text
}

#[async_trait]
impl Flow for AgentHandoverFlow {
    fn name(&self) -> &'static str {
        AGENT_HANDOVER
    }

    fn can_handle(&self, input: &FlowInput, session: &Session) -> bool {
        input.command() == Some(Command::HablarAgente) && !session.contracting_plan()
    }

    async fn handle(&self, input: &FlowInput, session: &mut Session) -> Result<FlowOutcome> {
        let priority = if input.user.authenticated {
            TicketPriority::High
        } else {
            TicketPriority::Medium
        };
        let request = ticket_for(
            input,
            "atencion_asesor",
            "Solicitud de asesor humano",
            transcript(input, session),
            priority,
        );
        let text = match self.tickets.create_ticket(&request).await {
            Ok(id) => {
                info!(ticket = %id, "[Flows] Conversation handed to an advisor");
                format!(
                    "👨‍💼 {}, un asesor continuará la conversación contigo en breve \
                     (solicitud *{id}*).\n\nHorario de atención: lunes a sábado de 8:00 a 18:00.",
                    input.user.first_name()
                )
            }
            Err(e) => {
                warn!(error = %e, "[Flows] Ticket API failed during advisor hand-over");
                FAILURE_TEXT.to_string()
            }
        };
        reply(self.sender.as_ref(), input.phone(), &text).await;
        session.clear_routing();
        Ok(FlowOutcome::Resolved)
    }
}
