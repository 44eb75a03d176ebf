//! Fault-report intake: asks for a description and opens a support ticket.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tracing::{info, warn};

use deskflow_commands::is_menu_command;
use deskflow_core::{
    ActiveFlow, Collaborators, CustomerDirectory, MessageSender, Session, TicketApi,
    TicketIntake, TicketPriority, TicketRequest, TicketStep,
};

use crate::flow::{Flow, FlowInput, FlowOutcome};
use crate::flows::{reply, TICKET_INTAKE};

/// Direct triggers. Menu taps on "Soporte Técnico" arrive through the menu
/// hand-off instead.
const TRIGGERS: &[&str] = &["crear_ticket", "ticket_creation"];

const MIN_DESCRIPTION_CHARS: usize = 10;

const PROMPT_TEXT: &str = "🔧 *Soporte técnico*\n\nCuéntanos qué problema presenta tu servicio \
(por ejemplo: sin internet, lentitud, cortes intermitentes). Describe la falla con el mayor detalle posible.";
const TOO_SHORT_TEXT: &str =
    "✍️ Necesitamos un poco más de detalle para ayudarte. Describe la falla en al menos 10 caracteres.";
const FAILURE_TEXT: &str = "❌ No pudimos registrar tu reporte en este momento. \
Un asesor revisará tu caso y te contactará pronto.";

pub struct TicketIntakeFlow {
    sender: Arc<dyn MessageSender>,
    tickets: Arc<dyn TicketApi>,
    customers: Arc<dyn CustomerDirectory>,
}

impl TicketIntakeFlow {
    pub fn new(collabs: &Collaborators) -> Self {
        Self {
            sender: collabs.sender.clone(),
            tickets: collabs.tickets.clone(),
            customers: collabs.customers.clone(),
        }
    }

    fn step(session: &Session) -> TicketStep {
        match session.active() {
            ActiveFlow::TicketIntake(intake) => intake.step,
            _ => TicketStep::Start,
        }
    }

    async fn open_ticket(&self, input: &FlowInput, session: &mut Session, description: &str) {
        let request = TicketRequest {
            customer_id: input.user.customer_id.clone(),
            phone: input.phone().to_string(),
            category: "soporte_tecnico".to_string(),
            subject: "Falla reportada por WhatsApp".to_string(),
            description: description.to_string(),
            priority: TicketPriority::Medium,
        };

        match self.tickets.create_ticket(&request).await {
            Ok(id) => {
                info!(ticket = %id, "[Flows] Support ticket created");
                let text = format!(
                    "✅ Registramos tu reporte con el número *{id}*.\n\n\
                     Nuestro equipo técnico lo revisará y te contactará. \
                     Escribe *menu* para volver al menú principal."
                );
                reply(self.sender.as_ref(), input.phone(), &text).await;
            }
            Err(e) => {
                warn!(error = %e, "[Flows] Ticket API failed during intake");
                reply(self.sender.as_ref(), input.phone(), FAILURE_TEXT).await;
            }
        }
        session.clear_routing();
    }
}

#[async_trait]
impl Flow for TicketIntakeFlow {
    fn name(&self) -> &'static str {
        TICKET_INTAKE
    }

    fn can_handle(&self, input: &FlowInput, session: &Session) -> bool {
        input.user.authenticated
            && (session.creating_ticket() || is_menu_command(&input.raw, TRIGGERS))
    }

    async fn handle(&self, input: &FlowInput, session: &mut Session) -> Result<FlowOutcome> {
        match self.customers.get_customer(input.phone()).await {
            Ok(Some(customer)) if !customer.is_active() => {
                let text = format!(
                    "⚠️ Tu servicio se encuentra *{}*. Para reportar fallas primero debes \
                     regularizar tu cuenta. Escribe *menu* para ver las opciones de pago.",
                    customer.status
                );
                reply(self.sender.as_ref(), input.phone(), &text).await;
                session.clear_routing();
                return Ok(FlowOutcome::Resolved);
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "[Flows] Customer lookup failed; continuing intake"),
        }

        match Self::step(session) {
            TicketStep::Start => {
                session.activate(ActiveFlow::TicketIntake(TicketIntake {
                    step: TicketStep::AwaitingDescription,
                }));
                reply(self.sender.as_ref(), input.phone(), PROMPT_TEXT).await;
            }
            TicketStep::AwaitingDescription => {
                let description = input.raw.trim();
                if description.chars().count() < MIN_DESCRIPTION_CHARS {
                    reply(self.sender.as_ref(), input.phone(), TOO_SHORT_TEXT).await;
                } else {
                    self.open_ticket(input, session, description).await;
                }
            }
        }
        Ok(FlowOutcome::Resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use deskflow_core::fakes::{FakeServices, StaticCustomers};
    use deskflow_core::{CustomerInfo, ServiceStatus, User};

    fn customer() -> User {
        User::customer("573001112233", "c-9", "svc-9")
    }

    fn input(raw: &str) -> FlowInput {
        FlowInput::new(&customer(), raw, Utc::now())
    }

    fn awaiting() -> Session {
        let mut s = Session::new("573001112233");
        s.activate(ActiveFlow::TicketIntake(TicketIntake {
            step: TicketStep::AwaitingDescription,
        }));
        s
    }

    #[test]
    fn menu_title_alone_does_not_trigger() {
        let fakes = FakeServices::new();
        let flow = TicketIntakeFlow::new(&fakes.collaborators());
        let session = Session::new("573001112233");
        assert!(!flow.can_handle(&input("🔧 Soporte Técnico"), &session));
        assert!(flow.can_handle(&input("crear_ticket"), &session));
        assert!(flow.can_handle(&input("lo que sea"), &awaiting()));
    }

    #[tokio::test]
    async fn short_description_reprompts() {
        let fakes = FakeServices::new();
        let flow = TicketIntakeFlow::new(&fakes.collaborators());
        let mut session = awaiting();

        flow.handle(&input("no sirve"), &mut session).await.unwrap();
        assert!(session.creating_ticket());
        assert_eq!(fakes.sender.last_text().await.as_deref(), Some(TOO_SHORT_TEXT));
        assert!(fakes.tickets.created().await.is_empty());
    }

    #[tokio::test]
    async fn description_opens_ticket_and_clears() {
        let fakes = FakeServices::new();
        let flow = TicketIntakeFlow::new(&fakes.collaborators());
        let mut session = awaiting();

        let outcome = flow
            .handle(&input("No tengo internet desde ayer en la noche"), &mut session)
            .await
            .unwrap();
        assert_eq!(outcome, FlowOutcome::Resolved);
        assert!(session.is_idle());

        let created = fakes.tickets.created().await;
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].1.customer_id.as_deref(), Some("c-9"));
        assert!(fakes.sender.last_text().await.unwrap().contains("TK-00001"));
    }

    #[tokio::test]
    async fn api_failure_sends_fallback_and_clears() {
        let fakes = FakeServices::new();
        fakes.tickets.set_failing(true);
        let flow = TicketIntakeFlow::new(&fakes.collaborators());
        let mut session = awaiting();

        let outcome = flow
            .handle(&input("El router parpadea en rojo todo el día"), &mut session)
            .await
            .unwrap();
        assert_eq!(outcome, FlowOutcome::Resolved);
        assert!(session.is_idle());
        assert_eq!(fakes.sender.last_text().await.as_deref(), Some(FAILURE_TEXT));
    }

    #[tokio::test]
    async fn inactive_customer_is_refused() {
        let suspended = CustomerInfo {
            id: "c-9".into(),
            name: "Ana Gómez".into(),
            status: ServiceStatus::Suspended,
            balance: 120_000,
            pending_invoices: 2,
            next_due_date: None,
        };
        let fakes = FakeServices::new()
            .with_customers(StaticCustomers::new().with("573001112233", suspended));
        let flow = TicketIntakeFlow::new(&fakes.collaborators());
        let mut session = Session::new("573001112233");
        session.activate(ActiveFlow::TicketIntake(TicketIntake::default()));

        flow.handle(&input("ticket"), &mut session).await.unwrap();
        assert!(session.is_idle());
        assert!(fakes.sender.last_text().await.unwrap().contains("regularizar"));
    }
}
