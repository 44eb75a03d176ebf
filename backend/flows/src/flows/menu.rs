//! Main-menu router.
//!
//! Turns a menu selection into a hand-off: clears whatever flow owned the
//! session, gives ownership to the selected flow and delegates so that flow
//! answers within the same pass.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

use deskflow_commands::Command;
use deskflow_core::{ActiveFlow, Collaborators, MessageSender, Session, TicketIntake};

use crate::flow::{Flow, FlowInput, FlowOutcome};
use crate::flows::{reply, CLIENT_MENU};

const MENU_OPTIONS: &[Command] = &[
    Command::Ping,
    Command::Ticket,
    Command::Factura,
    Command::Deuda,
    Command::PuntosPago,
    Command::CambiarClave,
    Command::MejorarPlan,
    Command::ValidarPago,
    Command::Ayuda,
    // Answered by the dispatcher before any flow runs.
    Command::Menu,
    Command::Inicio,
];

const HELP_TEXT: &str = "ℹ️ Elige una opción del menú para continuar. \
En cualquier momento puedes escribir *menu* para volver aquí o *salir* para terminar.";

pub struct ClientMenuFlow {
    sender: Arc<dyn MessageSender>,
}

impl ClientMenuFlow {
    pub fn new(collabs: &Collaborators) -> Self {
        Self {
            sender: collabs.sender.clone(),
        }
    }

    /// Session state that hands a selection to its flow.
    fn target_state(cmd: Command) -> Option<ActiveFlow> {
        let state = match cmd {
            Command::Ping => ActiveFlow::Diagnostic { task_id: None },
            Command::Ticket => ActiveFlow::TicketIntake(TicketIntake::default()),
            Command::Deuda => ActiveFlow::DebtInquiry,
            Command::PuntosPago => ActiveFlow::PaymentPoints,
            Command::Factura => ActiveFlow::Invoices,
            Command::CambiarClave => ActiveFlow::PasswordChange,
            Command::MejorarPlan => ActiveFlow::PlanUpgrade,
            Command::ValidarPago => ActiveFlow::PaymentReceipt,
            _ => return None,
        };
        Some(state)
    }
}

#[async_trait]
impl Flow for ClientMenuFlow {
    fn name(&self) -> &'static str {
        CLIENT_MENU
    }

    fn can_handle(&self, input: &FlowInput, session: &Session) -> bool {
        let free = session.is_idle() || (session.in_sales() && !session.contracting_plan());
        input.user.authenticated
            && free
            && input.command().is_some_and(|c| MENU_OPTIONS.contains(&c))
    }

    async fn handle(&self, input: &FlowInput, session: &mut Session) -> Result<FlowOutcome> {
        let Some(cmd) = input.command() else {
            return Ok(FlowOutcome::Delegate(None));
        };

        match Self::target_state(cmd) {
            Some(state) => {
                session.clear_routing();
                let target = state.name();
                session.activate(state);
                debug!(selection = %cmd, to = target.unwrap_or("-"), "[Flows] Menu hand-off");
                Ok(FlowOutcome::Delegate(target))
            }
            None => {
                if cmd == Command::Ayuda {
                    reply(self.sender.as_ref(), input.phone(), HELP_TEXT).await;
                }
                if let Err(e) = self.sender.send_main_menu(input.phone()).await {
                    tracing::warn!(error = %e, "[Flows] Main menu could not be delivered");
                }
                Ok(FlowOutcome::Resolved)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use deskflow_core::fakes::FakeServices;
    use deskflow_core::{ContractData, User};

    fn input(user: &User, raw: &str) -> FlowInput {
        FlowInput::new(user, raw, Utc::now())
    }

    #[test]
    fn requires_authentication_and_a_free_session() {
        let fakes = FakeServices::new();
        let flow = ClientMenuFlow::new(&fakes.collaborators());
        let customer = User::customer("1", "c", "s");
        let mut session = Session::new("1");

        assert!(flow.can_handle(&input(&customer, "📡 Test de Conexión"), &session));
        assert!(!flow.can_handle(&input(&User::anonymous("1"), "ping"), &session));
        assert!(!flow.can_handle(&input(&customer, "hola"), &session));

        session.activate(ActiveFlow::Diagnostic { task_id: None });
        assert!(!flow.can_handle(&input(&customer, "ping"), &session));

        session.begin_contracting(ContractData::new("Pack Básico", 60_000, Utc::now()));
        assert!(!flow.can_handle(&input(&customer, "ping"), &session));
        session.cancel_contracting();
        assert!(flow.can_handle(&input(&customer, "ping"), &session));
    }

    #[tokio::test]
    async fn selection_hands_off_with_target_hint() {
        let fakes = FakeServices::new();
        let flow = ClientMenuFlow::new(&fakes.collaborators());
        let customer = User::customer("1", "c", "s");
        let mut session = Session::new("1");

        let outcome = flow
            .handle(&input(&customer, "💳 Validar Pago"), &mut session)
            .await
            .unwrap();
        assert_eq!(outcome, FlowOutcome::Delegate(Some("paymentReceipt")));
        assert_eq!(session.flow_active(), Some("paymentReceipt"));
        assert!(fakes.sender.sent().await.is_empty());
    }

    #[tokio::test]
    async fn help_shows_the_menu() {
        let fakes = FakeServices::new();
        let flow = ClientMenuFlow::new(&fakes.collaborators());
        let customer = User::customer("1", "c", "s");
        let mut session = Session::new("1");

        let outcome = flow.handle(&input(&customer, "ayuda"), &mut session).await.unwrap();
        assert_eq!(outcome, FlowOutcome::Resolved);
        assert_eq!(fakes.sender.menus_sent().await, 1);
        assert_eq!(fakes.sender.last_text().await.as_deref(), Some(HELP_TEXT));
    }
}
