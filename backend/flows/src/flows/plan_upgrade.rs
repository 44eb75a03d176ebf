//! Plan upgrade for existing customers: shows the catalogue and files the
//! chosen plan for the sales desk.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tracing::{info, warn};

use deskflow_commands::Command;
use deskflow_config::PlanConfig;
use deskflow_core::{ActiveFlow, Collaborators, MessageSender, Session, TicketApi, TicketPriority};

use crate::flow::{Flow, FlowInput, FlowOutcome};
use crate::flows::{format_price, reply, ticket_for, PLAN_UPGRADE};
use crate::settings::FlowSettings;

const FAILURE_TEXT: &str = "❌ No pudimos registrar tu solicitud en este momento. \
Intenta más tarde o escribe *hablar con agente*.";

pub struct PlanUpgradeFlow {
    sender: Arc<dyn MessageSender>,
    tickets: Arc<dyn TicketApi>,
    plans: Vec<PlanConfig>,
}

impl PlanUpgradeFlow {
    pub fn new(collabs: &Collaborators, settings: &FlowSettings) -> Self {
        Self {
            sender: collabs.sender.clone(),
            tickets: collabs.tickets.clone(),
            plans: settings.plans.clone(),
        }
    }

    fn catalogue(&self) -> String {
        let mut text = String::from("⬆️ *Mejora tu plan*\n");
        for plan in &self.plans {
            text.push_str(&format!("\n• {}: {}/mes", plan.name, format_price(plan.price)));
        }
        text.push_str("\n\nResponde con el plan que quieres (por ejemplo: *100 megas*) o escribe *menu* para cancelar.");
        text
    }

    async fn request_upgrade(&self, input: &FlowInput, session: &mut Session, plan: &PlanConfig) {
        let request = ticket_for(
            input,
            "mejora_plan",
            format!("Mejora de plan a {}", plan.name),
            format!(
                "El cliente solicita cambiar su plan a {} ({}/mes).\nMensaje: {}",
                plan.name,
                format_price(plan.price),
                input.raw.trim()
            ),
            TicketPriority::Medium,
        );
        let text = match self.tickets.create_ticket(&request).await {
            Ok(id) => {
                info!(ticket = %id, plan = %plan.name, "[Flows] Plan upgrade requested");
                format!(
                    "✅ Registramos tu solicitud de cambio a *{}* con el número *{id}*.\n\n\
                     Un asesor confirmará la fecha de activación. El nuevo valor se verá en tu próxima factura.",
                    plan.name
                )
            }
            Err(e) => {
                warn!(error = %e, "[Flows] Ticket API failed during plan upgrade");
                FAILURE_TEXT.to_string()
            }
        };
        reply(self.sender.as_ref(), input.phone(), &text).await;
        session.clear_routing();
    }
}

#[async_trait]
impl Flow for PlanUpgradeFlow {
    fn name(&self) -> &'static str {
        PLAN_UPGRADE
    }

    fn can_handle(&self, input: &FlowInput, session: &Session) -> bool {
        input.user.authenticated
            && (matches!(session.active(), ActiveFlow::PlanUpgrade)
                || (session.is_idle() && input.command() == Some(Command::MejorarPlan)))
    }

    async fn handle(&self, input: &FlowInput, session: &mut Session) -> Result<FlowOutcome> {
        let chosen = self.plans.iter().find(|p| p.mentioned_in(&input.raw));
        match chosen {
            Some(plan) if matches!(session.active(), ActiveFlow::PlanUpgrade) => {
                self.request_upgrade(input, session, plan).await;
            }
            _ => {
                session.activate(ActiveFlow::PlanUpgrade);
                reply(self.sender.as_ref(), input.phone(), &self.catalogue()).await;
            }
        }
        Ok(FlowOutcome::Resolved)
    }
}
