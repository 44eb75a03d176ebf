/// Phrase table mapping menu titles and free-text synonyms to commands.
///
/// Order matters: substring matching returns the first entry whose phrase
/// occurs in the message. Groups follow the main menu (technical, billing,
/// account, sales), then session and agent requests, then the global
/// escapes last so a stray "salir" inside a longer sentence is only taken
/// when nothing more specific matched. Inside a group, longer phrases come
/// before the shorter words they contain (`soporte humano` before `soporte`).
use once_cell::sync::Lazy;

use crate::types::Command;

const BUILTIN_PHRASES: &[(&str, Command)] = &[
    // Technical
    ("ping", Command::Ping),
    ("test_conexion", Command::Ping),
    ("📡 test de conexión", Command::Ping),
    ("📡 test de conexion", Command::Ping),
    ("test de conexión", Command::Ping),
    ("test de conexion", Command::Ping),
    ("verificar estado de tu conexión", Command::Ping),
    ("verificar estado", Command::Ping),
    ("conexión", Command::Ping),
    ("conexion", Command::Ping),
    ("ticket", Command::Ticket),
    ("🔧 soporte técnico", Command::Ticket),
    ("🔧 soporte tecnico", Command::Ticket),
    ("soporte técnico", Command::Ticket),
    ("soporte tecnico", Command::Ticket),
    ("reportar problemas técnicos", Command::Ticket),
    ("reportar problemas", Command::Ticket),
    ("reportar problema", Command::Ticket),
    ("reportar falla", Command::Ticket),
    ("crear ticket", Command::Ticket),
    // Billing
    ("factura", Command::Factura),
    ("mi factura", Command::Factura),
    ("facturas", Command::Factura),
    ("consultar factura", Command::Factura),
    ("consultar y descargar facturas", Command::Factura),
    ("deuda", Command::Deuda),
    ("consultar deuda", Command::Deuda),
    ("ver saldo pendiente", Command::Deuda),
    ("saldo pendiente", Command::Deuda),
    ("puntos_pago", Command::PuntosPago),
    ("puntos de pago", Command::PuntosPago),
    ("ubicaciones para pagar", Command::PuntosPago),
    ("lugares de pago", Command::PuntosPago),
    ("validar_pago", Command::ValidarPago),
    ("comprobante_pago", Command::ValidarPago),
    ("💳 validar pago", Command::ValidarPago),
    ("validar pago", Command::ValidarPago),
    ("💳 subir comprobante", Command::ValidarPago),
    ("subir comprobante", Command::ValidarPago),
    ("comprobante de pago", Command::ValidarPago),
    // Account
    ("cambiar_clave", Command::CambiarClave),
    ("cambiar contraseña", Command::CambiarClave),
    ("actualizar clave", Command::CambiarClave),
    ("cambiar clave", Command::CambiarClave),
    // Sales
    ("mejorar_plan", Command::MejorarPlan),
    ("⬆️ mejorar plan", Command::MejorarPlan),
    ("⬆ mejorar plan", Command::MejorarPlan),
    ("mejorar plan", Command::MejorarPlan),
    ("mejorar mi plan", Command::MejorarPlan),
    ("upgrade de velocidad", Command::MejorarPlan),
    ("upgrade plan", Command::MejorarPlan),
    ("ventas", Command::Ventas),
    ("nuevo cliente", Command::Ventas),
    // Session
    ("cerrar_sesion", Command::CerrarSesion),
    ("cerrar sesión", Command::CerrarSesion),
    ("cerrar sesion", Command::CerrarSesion),
    ("finalizar sesión", Command::CerrarSesion),
    ("finalizar sesion", Command::CerrarSesion),
    ("terminar sesión", Command::CerrarSesion),
    ("terminar sesion", Command::CerrarSesion),
    ("logout", Command::CerrarSesion),
    // Human agents
    ("hablar_agente", Command::HablarAgente),
    ("👨‍💼 hablar con agente", Command::HablarAgente),
    ("hablar con agente", Command::HablarAgente),
    ("agente humano", Command::HablarAgente),
    ("soporte humano", Command::HablarAgente),
    ("contactar agente", Command::HablarAgente),
    ("persona real", Command::HablarAgente),
    ("representante", Command::HablarAgente),
    ("operador", Command::HablarAgente),
    ("asesor", Command::HablarAgente),
    ("agente", Command::HablarAgente),
    ("soporte", Command::Ticket),
    // Global escapes
    ("menu", Command::Menu),
    ("menú", Command::Menu),
    ("menú principal", Command::Menu),
    ("menu principal", Command::Menu),
    ("volver", Command::Menu),
    ("regresar", Command::Menu),
    ("inicio", Command::Inicio),
    ("finalizar", Command::Finalizar),
    ("terminar", Command::Finalizar),
    ("salir", Command::Finalizar),
    ("ayuda", Command::Ayuda),
    ("help", Command::Ayuda),
];

/// Process-wide registry built from the builtin phrase table.
pub static DEFAULT_REGISTRY: Lazy<CommandRegistry> = Lazy::new(CommandRegistry::new);

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

pub struct CommandRegistry {
    phrases: Vec<(String, Command)>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self {
            phrases: BUILTIN_PHRASES
                .iter()
                .map(|(p, c)| (p.to_string(), *c))
                .collect(),
        }
    }

    /// Append a phrase. Appended phrases lose substring ties to builtin ones.
    pub fn register(&mut self, phrase: &str, command: Command) {
        self.phrases.push((phrase.to_lowercase(), command));
    }

    pub fn all(&self) -> &[(String, Command)] {
        &self.phrases
    }

    /// Exact lookup of an already-lowercased, trimmed phrase.
    pub fn find_exact(&self, normalized: &str) -> Option<Command> {
        self.phrases
            .iter()
            .find(|(p, _)| p == normalized)
            .map(|(_, c)| *c)
    }

    /// First phrase, in table order, that occurs inside `text`.
    pub fn find_contained(&self, text: &str) -> Option<Command> {
        self.phrases
            .iter()
            .find(|(p, _)| text.contains(p.as_str()))
            .map(|(_, c)| *c)
    }

    /// Phrases that map to `command`, in table order.
    pub fn phrases_for(&self, command: Command) -> impl Iterator<Item = &str> {
        self.phrases
            .iter()
            .filter(move |(_, c)| *c == command)
            .map(|(p, _)| p.as_str())
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_token_maps_to_itself() {
        let registry = CommandRegistry::new();
        for cmd in Command::ALL {
            assert_eq!(registry.find_exact(cmd.as_str()), Some(cmd), "{cmd}");
        }
    }

    #[test]
    fn phrases_are_lowercase_and_trimmed() {
        for (phrase, _) in CommandRegistry::new().all() {
            assert_eq!(phrase, &phrase.to_lowercase());
            assert_eq!(phrase, phrase.trim());
        }
    }

    #[test]
    fn specific_phrase_wins_over_contained_word() {
        let registry = CommandRegistry::new();
        assert_eq!(
            registry.find_contained("necesito soporte humano por favor"),
            Some(Command::HablarAgente)
        );
        assert_eq!(
            registry.find_contained("necesito soporte"),
            Some(Command::Ticket)
        );
        assert_eq!(
            registry.find_contained("quiero finalizar sesión"),
            Some(Command::CerrarSesion)
        );
    }

    #[test]
    fn registered_phrase_is_found() {
        let mut registry = CommandRegistry::new();
        assert_eq!(registry.find_exact("wifi lento"), None);
        registry.register("WiFi Lento", Command::Ticket);
        assert_eq!(registry.find_exact("wifi lento"), Some(Command::Ticket));
        assert!(registry.phrases_for(Command::Ticket).any(|p| p == "wifi lento"));
    }
}
