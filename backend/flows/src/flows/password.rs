//! WiFi password change: collects the new key and files it for the field team.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tracing::{info, warn};

use deskflow_commands::Command;
use deskflow_core::{ActiveFlow, Collaborators, MessageSender, Session, TicketApi, TicketPriority};

use crate::flow::{Flow, FlowInput, FlowOutcome};
use crate::flows::{reply, ticket_for, PASSWORD_CHANGE};

/// WPA2 passphrase bounds.
const MIN_LEN: usize = 8;
const MAX_LEN: usize = 63;

const PROMPT_TEXT: &str = "🔑 *Cambio de clave WiFi*\n\n\
Escribe la nueva contraseña para tu red. Debe tener entre 8 y 63 caracteres y no llevar espacios.\n\n\
Escribe *menu* para cancelar.";
const INVALID_TEXT: &str = "⚠️ La contraseña debe tener entre 8 y 63 caracteres, sin espacios. \
Intenta de nuevo o escribe *menu* para cancelar.";
const FAILURE_TEXT: &str = "❌ No pudimos registrar el cambio de clave en este momento. \
Intenta más tarde o escribe *hablar con agente*.";

pub struct PasswordChangeFlow {
    sender: Arc<dyn MessageSender>,
    tickets: Arc<dyn TicketApi>,
}

impl PasswordChangeFlow {
    pub fn new(collabs: &Collaborators) -> Self {
        Self {
            sender: collabs.sender.clone(),
            tickets: collabs.tickets.clone(),
        }
    }
}

fn valid_passphrase(text: &str) -> bool {
    let len = text.chars().count();
    (MIN_LEN..=MAX_LEN).contains(&len) && !text.contains(char::is_whitespace)
}

#[async_trait]
impl Flow for PasswordChangeFlow {
    fn name(&self) -> &'static str {
        PASSWORD_CHANGE
    }

    fn can_handle(&self, input: &FlowInput, session: &Session) -> bool {
        input.user.authenticated
            && (matches!(session.active(), ActiveFlow::PasswordChange)
                || (session.is_idle() && input.command() == Some(Command::CambiarClave)))
    }

    async fn handle(&self, input: &FlowInput, session: &mut Session) -> Result<FlowOutcome> {
        if input.command() == Some(Command::CambiarClave) {
            session.activate(ActiveFlow::PasswordChange);
            reply(self.sender.as_ref(), input.phone(), PROMPT_TEXT).await;
            return Ok(FlowOutcome::Resolved);
        }

        let passphrase = input.raw.trim();
        if !valid_passphrase(passphrase) {
            reply(self.sender.as_ref(), input.phone(), INVALID_TEXT).await;
            return Ok(FlowOutcome::Resolved);
        }

        let request = ticket_for(
            input,
            "cambio_clave",
            "Cambio de clave WiFi",
            format!("El cliente solicita cambiar la clave de su red WiFi.\nNueva clave: {passphrase}"),
            TicketPriority::High,
        );
        let text = match self.tickets.create_ticket(&request).await {
            Ok(id) => {
                info!(ticket = %id, "[Flows] Password change requested");
                format!(
                    "✅ Recibimos tu solicitud con el número *{id}*.\n\n\
                     Aplicaremos la nueva clave en las próximas horas; tus equipos se \
                     desconectarán y deberás conectarlos con la clave nueva."
                )
            }
            Err(e) => {
                warn!(error = %e, "[Flows] Ticket API failed during password change");
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
    async fn prompts_then_files_the_new_key() {
        let fakes = FakeServices::new();
        let flow = PasswordChangeFlow::new(&fakes.collaborators());
        let mut session = Session::new("1");

        flow.handle(&input("🔑 Cambiar Clave"), &mut session).await.unwrap();
        assert_eq!(fakes.sender.last_text().await.as_deref(), Some(PROMPT_TEXT));
        assert_eq!(session.flow_active(), Some(PASSWORD_CHANGE));

        flow.handle(&input("corta"), &mut session).await.unwrap();
        assert_eq!(fakes.sender.last_text().await.as_deref(), Some(INVALID_TEXT));
        assert!(flow.can_handle(&input("Conecta2Casa!"), &session));

        flow.handle(&input("Conecta2Casa!"), &mut session).await.unwrap();
        let created = fakes.tickets.created().await;
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].1.category, "cambio_clave");
        assert_eq!(created[0].1.priority, TicketPriority::High);
        assert!(created[0].1.description.contains("Conecta2Casa!"));
        assert!(fakes.sender.last_text().await.unwrap().contains(created[0].0.as_str()));
        assert!(session.is_idle());
    }

    #[tokio::test]
    async fn ticket_failure_still_releases_the_session() {
        let fakes = FakeServices::new();
        fakes.tickets.set_failing(true);
        let flow = PasswordChangeFlow::new(&fakes.collaborators());
        let mut session = Session::new("1");
        session.activate(ActiveFlow::PasswordChange);

        flow.handle(&input("otraClave2026"), &mut session).await.unwrap();
        assert_eq!(fakes.sender.last_text().await.as_deref(), Some(FAILURE_TEXT));
        assert!(session.is_idle());
    }

    #[test]
    fn passphrase_rules() {
        assert!(valid_passphrase("12345678"));
        assert!(!valid_passphrase("1234567"));
        assert!(!valid_passphrase("mi clave segura"));
        assert!(!valid_passphrase(&"x".repeat(64)));
    }
}
