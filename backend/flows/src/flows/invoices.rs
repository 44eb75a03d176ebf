//! Invoice summary for the logged-in customer.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tracing::warn;

use deskflow_commands::Command;
use deskflow_core::{ActiveFlow, Collaborators, CustomerDirectory, CustomerInfo, MessageSender, Session};

use crate::flow::{Flow, FlowInput, FlowOutcome};
use crate::flows::{format_price, reply, INVOICES};

const NOT_FOUND_TEXT: &str = "🔎 No encontramos facturas asociadas a este número. \
Escribe *hablar con agente* si necesitas una copia.";
const FAILURE_TEXT: &str =
    "❌ No pudimos consultar tus facturas en este momento. Intenta de nuevo en unos minutos.";

pub struct InvoicesFlow {
    sender: Arc<dyn MessageSender>,
    customers: Arc<dyn CustomerDirectory>,
}

impl InvoicesFlow {
    pub fn new(collabs: &Collaborators) -> Self {
        Self {
            sender: collabs.sender.clone(),
            customers: collabs.customers.clone(),
        }
    }
}

fn summary(customer: &CustomerInfo) -> String {
    let mut text = format!(
        "📄 *Tus facturas*\n\nCliente: {}\nEstado del servicio: {}",
        customer.name, customer.status
    );
    if customer.pending_invoices == 0 {
        text.push_str("\n\n✅ No tienes facturas pendientes.");
    } else {
        text.push_str(&format!(
            "\nFacturas pendientes: {}\nTotal a pagar: {}",
            customer.pending_invoices,
            format_price(customer.balance)
        ));
        if let Some(due) = customer.next_due_date {
            text.push_str(&format!("\nFecha límite: {}", due.format("%d/%m/%Y")));
        }
    }
    text.push_str(
        "\n\nLa factura en PDF llega a tu correo registrado cada mes. \
         Escribe *puntos de pago* para ver dónde pagar o *validar pago* si ya pagaste.",
    );
    text
}

#[async_trait]
impl Flow for InvoicesFlow {
    fn name(&self) -> &'static str {
        INVOICES
    }

    fn can_handle(&self, input: &FlowInput, session: &Session) -> bool {
        input.user.authenticated
            && (matches!(session.active(), ActiveFlow::Invoices)
                || (session.is_idle() && input.command() == Some(Command::Factura)))
    }

    async fn handle(&self, input: &FlowInput, session: &mut Session) -> Result<FlowOutcome> {
        let text = match self.customers.get_customer(input.phone()).await {
            Ok(Some(customer)) => summary(&customer),
            Ok(None) => NOT_FOUND_TEXT.to_string(),
            Err(e) => {
                warn!(error = %e, "[Flows] Customer lookup failed");
                FAILURE_TEXT.to_string()
            }
        };
        reply(self.sender.as_ref(), input.phone(), &text).await;
        session.clear_routing();
        Ok(FlowOutcome::Resolved)
    }
}
