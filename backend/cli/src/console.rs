//! Offline stand-ins for the external services, so a conversation can be
//! driven from the terminal.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use deskflow_core::fakes::{InMemoryTickets, ScriptedAi, ScriptedProbe, StaticCustomers};
use deskflow_core::{Collaborators, CustomerInfo, MessageSender, ServiceStatus};

use crate::terminal_output::{paint, BOLD, CYAN, DIM};

/// Rows of the interactive main menu, as the channel shows them.
pub const MAIN_MENU_ROWS: &[(&str, &str)] = &[
    ("📡 Test de Conexión", "Verificar estado de tu conexión"),
    ("🔧 Soporte Técnico", "Reportar problemas técnicos"),
    ("📄 Mi Factura", "Consultar y descargar facturas"),
    ("💰 Consultar Deuda", "Ver saldo pendiente"),
    ("📍 Puntos de Pago", "Ubicaciones para pagar"),
    ("🔑 Cambiar Clave", "Cambiar contraseña del WiFi"),
    ("⬆️ Mejorar Plan", "Upgrade de velocidad"),
    ("💳 Validar Pago", "Subir comprobante de pago"),
    ("👨‍💼 Hablar con Agente", "Soporte humano"),
    ("🚪 Cerrar Sesión", "Finalizar sesión"),
];

const OFFLINE_AI_REPLY: &str = "¡Hola! Soy Andrea de Conecta2. Tenemos planes de internet \
desde 30 Mbps y paquetes con TV. Cuéntame qué velocidad necesitas o escribe *contratar*.";

pub fn render_reply(text: &str) -> String {
    let mut out = String::new();
    for (i, line) in text.lines().enumerate() {
        let prefix = if i == 0 { "bot› " } else { "     " };
        out.push_str(&paint(CYAN, prefix));
        out.push_str(line);
        out.push('\n');
    }
    out
}

pub fn render_main_menu() -> String {
    let mut out = paint(BOLD, "bot› Menú principal\n");
    for (i, (title, description)) in MAIN_MENU_ROWS.iter().enumerate() {
        out.push_str(&format!("  {:>2}. {title}  {}\n", i + 1, paint(DIM, description)));
    }
    out
}

/// Replies are printed to stdout instead of being delivered.
pub struct ConsoleSender;

#[async_trait]
impl MessageSender for ConsoleSender {
    async fn send_text(&self, _phone: &str, text: &str) -> Result<()> {
        print!("{}", render_reply(text));
        Ok(())
    }

    async fn send_main_menu(&self, _phone: &str) -> Result<()> {
        print!("{}", render_main_menu());
        Ok(())
    }
}

/// Console sender plus in-memory services. An authenticated phone is known
/// to the directory as an active customer with nothing owed.
pub fn offline_collaborators(phone: &str, authenticated: bool) -> Collaborators {
    let mut customers = StaticCustomers::new();
    if authenticated {
        customers = customers.with(
            phone,
            CustomerInfo {
                id: "demo-1".to_string(),
                name: "Cliente Demo".to_string(),
                status: ServiceStatus::Active,
                balance: 0,
                pending_invoices: 0,
                next_due_date: None,
            },
        );
    }

    Collaborators {
        sender: Arc::new(ConsoleSender),
        tickets: Arc::new(InMemoryTickets::new()),
        customers: Arc::new(customers),
        ai: Arc::new(ScriptedAi::replying(OFFLINE_AI_REPLY)),
        probe: Arc::new(ScriptedProbe::healthy()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deskflow_commands::detect_command;

    #[test]
    fn every_menu_row_selects_a_command() {
        for (title, description) in MAIN_MENU_ROWS {
            assert!(detect_command(title).is_some(), "{title}");
            assert!(detect_command(&format!("{title}\n{description}")).is_some(), "{title}");
        }
    }

    #[test]
    fn multi_line_replies_are_indented() {
        std::env::set_var("NO_COLOR", "1");
        let out = render_reply("uno\ndos");
        assert_eq!(out, "bot› uno\n     dos\n");
    }

    #[tokio::test]
    async fn authenticated_phone_is_a_known_customer() {
        let collabs = offline_collaborators("573001112233", true);
        let customer = collabs.customers.get_customer("573001112233").await.unwrap();
        assert!(customer.is_some_and(|c| c.is_active()));

        let collabs = offline_collaborators("573001112233", false);
        assert!(collabs.customers.get_customer("573001112233").await.unwrap().is_none());
    }
}
