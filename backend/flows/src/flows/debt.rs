//! Outstanding balance lookup.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tracing::warn;

use deskflow_commands::Command;
use deskflow_core::{ActiveFlow, Collaborators, CustomerDirectory, CustomerInfo, MessageSender, Session};

use crate::flow::{Flow, FlowInput, FlowOutcome};
use crate::flows::{format_price, reply, DEBT_INQUIRY};

const NOT_FOUND_TEXT: &str = "🔎 No encontramos una cuenta asociada a este número. \
Si crees que es un error, escribe *menu* y elige *Hablar con un asesor*.";
const FAILURE_TEXT: &str =
    "❌ No pudimos consultar tu saldo en este momento. Intenta de nuevo en unos minutos.";

pub struct DebtInquiryFlow {
    sender: Arc<dyn MessageSender>,
    customers: Arc<dyn CustomerDirectory>,
}

impl DebtInquiryFlow {
    pub fn new(collabs: &Collaborators) -> Self {
        Self {
            sender: collabs.sender.clone(),
            customers: collabs.customers.clone(),
        }
    }
}

fn statement(customer: &CustomerInfo) -> String {
    if customer.balance == 0 {
        return format!("✅ *{}*, estás al día. No tienes saldo pendiente.", customer.name);
    }

    let mut text = format!(
        "💰 *Estado de cuenta*\n\n\
         Cliente: {}\n\
         Saldo pendiente: {}\n\
         Facturas pendientes: {}",
        customer.name,
        format_price(customer.balance),
        customer.pending_invoices
    );
    if let Some(due) = customer.next_due_date {
        text.push_str(&format!("\nPróximo vencimiento: {}", due.format("%d/%m/%Y")));
    }
    text.push_str("\n\nEscribe *puntos de pago* para ver dónde pagar.");
    text
}

#[async_trait]
impl Flow for DebtInquiryFlow {
    fn name(&self) -> &'static str {
        DEBT_INQUIRY
    }

    fn can_handle(&self, input: &FlowInput, session: &Session) -> bool {
        input.user.authenticated
            && (matches!(session.active(), ActiveFlow::DebtInquiry)
                || input.command() == Some(Command::Deuda))
    }

    async fn handle(&self, input: &FlowInput, session: &mut Session) -> Result<FlowOutcome> {
        let text = match self.customers.get_customer(input.phone()).await {
            Ok(Some(customer)) => statement(&customer),
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

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use deskflow_core::fakes::{FakeServices, StaticCustomers};
    use deskflow_core::{ServiceStatus, User};

    fn customer(balance: u64) -> CustomerInfo {
        CustomerInfo {
            id: "c-1".into(),
            name: "Ana Gómez".into(),
            status: ServiceStatus::Active,
            balance,
            pending_invoices: 2,
            next_due_date: NaiveDate::from_ymd_opt(2026, 11, 15),
        }
    }

    #[tokio::test]
    async fn replies_with_statement() {
        let fakes = FakeServices::new()
            .with_customers(StaticCustomers::new().with("1", customer(95_000)));
        let flow = DebtInquiryFlow::new(&fakes.collaborators());
        let user = User::customer("1", "c-1", "s");
        let mut session = Session::new("1");
        session.activate(ActiveFlow::DebtInquiry);

        let input = FlowInput::new(&user, "deuda", Utc::now());
        assert!(flow.can_handle(&input, &session));
        flow.handle(&input, &mut session).await.unwrap();

        let text = fakes.sender.last_text().await.unwrap();
        assert!(text.contains("$95.000"));
        assert!(text.contains("15/11/2026"));
        assert!(session.is_idle());
    }

    #[tokio::test]
    async fn zero_balance_and_unknown_customer() {
        let fakes = FakeServices::new()
            .with_customers(StaticCustomers::new().with("1", customer(0)));
        let flow = DebtInquiryFlow::new(&fakes.collaborators());
        let mut session = Session::new("1");

        let input = FlowInput::new(&User::customer("1", "c-1", "s"), "deuda", Utc::now());
        flow.handle(&input, &mut session).await.unwrap();
        assert!(fakes.sender.last_text().await.unwrap().contains("al día"));

        let input = FlowInput::new(&User::customer("2", "c-2", "s"), "deuda", Utc::now());
        flow.handle(&input, &mut session).await.unwrap();
        assert_eq!(fakes.sender.last_text().await.as_deref(), Some(NOT_FOUND_TEXT));
    }
}
