//! Logout: forget everything the session holds for this phone.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

use deskflow_commands::Command;
use deskflow_core::{Collaborators, MessageSender, Session};

use crate::flow::{Flow, FlowInput, FlowOutcome};
use crate::flows::{reply, LOGOUT};

const GOODBYE_TEXT: &str = "👋 *¡Sesión finalizada!*\n\n\
Cerraste tu sesión correctamente y borramos el historial de esta conversación.\n\n\
Escribe *soporte* cuando quieras volver a usar nuestros servicios.";

pub struct LogoutFlow {
    sender: Arc<dyn MessageSender>,
}

impl LogoutFlow {
    pub fn new(collabs: &Collaborators) -> Self {
        Self {
            sender: collabs.sender.clone(),
        }
    }
}

#[async_trait]
impl Flow for LogoutFlow {
    fn name(&self) -> &'static str {
        LOGOUT
    }

    fn can_handle(&self, input: &FlowInput, _session: &Session) -> bool {
        input.user.authenticated && input.command() == Some(Command::CerrarSesion)
    }

    async fn handle(&self, input: &FlowInput, session: &mut Session) -> Result<FlowOutcome> {
        session.forget();
        info!("[Flows] Session closed by the customer");
        reply(self.sender.as_ref(), input.phone(), GOODBYE_TEXT).await;
        Ok(FlowOutcome::Resolved)
    }
}
