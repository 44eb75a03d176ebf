//! Payment validation: the customer reports a payment made outside the
//! automatic channels and billing confirms it against the bank.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tracing::{info, warn};

use deskflow_commands::Command;
use deskflow_core::{ActiveFlow, Collaborators, MessageSender, Session, TicketApi, TicketPriority};

use crate::flow::{Flow, FlowInput, FlowOutcome};
use crate::flows::{reply, ticket_for, PAYMENT_RECEIPT};

const MIN_DETAIL_CHARS: usize = 8;

const PROMPT_TEXT: &str = "💳 *Validar pago*\n\n\
Envíanos en un solo mensaje los datos de tu pago:\n\
• Medio (Nequi, Bancolombia, corresponsal...)\n\
• Fecha\n\
• Valor\n\
• Número de referencia o aprobación\n\n\
Escribe *menu* para cancelar.";
const INCOMPLETE_TEXT: &str = "✍️ Necesitamos al menos el valor y el número de referencia del pago \
para poder validarlo. Intenta de nuevo o escribe *menu* para cancelar.";
const FAILURE_TEXT: &str = "❌ No pudimos registrar tu comprobante en este momento. \
Intenta más tarde o escribe *hablar con agente*.";

pub struct PaymentReceiptFlow {
    sender: Arc<dyn MessageSender>,
    tickets: Arc<dyn TicketApi>,
}

impl PaymentReceiptFlow {
    pub fn new(collabs: &Collaborators) -> Self {
        Self {
            sender: collabs.sender.clone(),
            tickets: collabs.tickets.clone(),
        }
    }
}

/// A usable report carries some figure (amount or reference).
fn looks_like_payment(text: &str) -> bool {
    text.chars().count() >= MIN_DETAIL_CHARS && text.chars().any(|c| c.is_ascii_digit())
}

#[async_trait]
impl Flow for PaymentReceiptFlow {
    fn name(&self) -> &'static str {
        PAYMENT_RECEIPT
    }

    fn can_handle(&self, input: &FlowInput, session: &Session) -> bool {
        input.user.authenticated
            && (matches!(session.active(), ActiveFlow::PaymentReceipt)
                || (session.is_idle() && input.command() == Some(Command::ValidarPago)))
    }

    async fn handle(&self, input: &FlowInput, session: &mut Session) -> Result<FlowOutcome> {
        if input.command() == Some(Command::ValidarPago) {
            session.activate(ActiveFlow::PaymentReceipt);
            reply(self.sender.as_ref(), input.phone(), PROMPT_TEXT).await;
            return Ok(FlowOutcome::Resolved);
        }

        let details = input.raw.trim();
        if !looks_like_payment(details) {
            reply(self.sender.as_ref(), input.phone(), INCOMPLETE_TEXT).await;
            return Ok(FlowOutcome::Resolved);
        }

        let request = ticket_for(
            input,
            "validacion_pago",
            "Validación de pago reportado por WhatsApp",
            details.to_string(),
            TicketPriority::Medium,
        );
        let text = match self.tickets.create_ticket(&request).await {
            Ok(id) => {
                info!(ticket = %id, "[Flows] Payment report filed");
                format!(
                    "✅ Recibimos los datos de tu pago (radicado *{id}*).\n\n\
                     Facturación lo validará en máximo 24 horas hábiles y tu saldo se actualizará."
                )
            }
            Err(e) => {
                warn!(error = %e, "[Flows] Ticket API failed during payment validation");
                FAILURE_TEXT.to_string()
            }
        };
        reply(self.sender.as_ref(), input.phone(), &text).await;
        session.clear_routing();
        Ok(FlowOutcome::Resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use deskflow_core::fakes::FakeServices;
    use deskflow_core::User;

    fn input(raw: &str) -> FlowInput {
        FlowInput::new(&User::customer("1", "c-1", "s"), raw, Utc::now())
    }

    #[tokio::test]
    async fn asks_for_details_then_files_them() {
        let fakes = FakeServices::new();
        let flow = PaymentReceiptFlow::new(&fakes.collaborators());
        let mut session = Session::new("1");
        session.activate(ActiveFlow::PaymentReceipt);

        flow.handle(&input("💳 Validar Pago"), &mut session).await.unwrap();
        assert_eq!(fakes.sender.last_text().await.as_deref(), Some(PROMPT_TEXT));

        flow.handle(&input("ya pagué"), &mut session).await.unwrap();
        assert_eq!(fakes.sender.last_text().await.as_deref(), Some(INCOMPLETE_TEXT));
        assert_eq!(session.flow_active(), Some(PAYMENT_RECEIPT));

        let report = "Nequi 14/10 $50.000 ref M123456";
        flow.handle(&input(report), &mut session).await.unwrap();
        let created = fakes.tickets.created().await;
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].1.category, "validacion_pago");
        assert_eq!(created[0].1.description, report);
        assert!(session.is_idle());
    }
}
