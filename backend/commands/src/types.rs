/// Canonical command vocabulary.
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandCategory {
    /// Connectivity and fault reporting.
    Technical,
    Billing,
    Account,
    Sales,
    /// Escapes that are handled before any flow runs.
    Global,
}

// ---------------------------------------------------------------------------
// Command
// ---------------------------------------------------------------------------

/// A canonical token the normalizer can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    Ping,
    Ticket,
    Factura,
    Deuda,
    PuntosPago,
    CambiarClave,
    MejorarPlan,
    ValidarPago,
    Menu,
    Inicio,
    Ventas,
    Finalizar,
    CerrarSesion,
    HablarAgente,
    Ayuda,
}

impl Command {
    pub const ALL: [Command; 15] = [
        Command::Ping,
        Command::Ticket,
        Command::Factura,
        Command::Deuda,
        Command::PuntosPago,
        Command::CambiarClave,
        Command::MejorarPlan,
        Command::ValidarPago,
        Command::Menu,
        Command::Inicio,
        Command::Ventas,
        Command::Finalizar,
        Command::CerrarSesion,
        Command::HablarAgente,
        Command::Ayuda,
    ];

    /// The token string flows compare against.
    pub fn as_str(self) -> &'static str {
        match self {
            Command::Ping => "ping",
            Command::Ticket => "ticket",
            Command::Factura => "factura",
            Command::Deuda => "deuda",
            Command::PuntosPago => "puntos_pago",
            Command::CambiarClave => "cambiar_clave",
            Command::MejorarPlan => "mejorar_plan",
            Command::ValidarPago => "validar_pago",
            Command::Menu => "menu",
            Command::Inicio => "inicio",
            Command::Ventas => "ventas",
            Command::Finalizar => "finalizar",
            Command::CerrarSesion => "cerrar_sesion",
            Command::HablarAgente => "hablar_agente",
            Command::Ayuda => "ayuda",
        }
    }

    pub fn category(self) -> CommandCategory {
        match self {
            Command::Ping | Command::Ticket => CommandCategory::Technical,
            Command::Factura | Command::Deuda | Command::PuntosPago | Command::ValidarPago => {
                CommandCategory::Billing
            }
            Command::CambiarClave | Command::CerrarSesion | Command::HablarAgente | Command::Ayuda => {
                CommandCategory::Account
            }
            Command::MejorarPlan | Command::Ventas => CommandCategory::Sales,
            Command::Menu | Command::Inicio | Command::Finalizar => CommandCategory::Global,
        }
    }

    /// Reserved commands that pre-empt every flow.
    pub fn is_global(self) -> bool {
        self.category() == CommandCategory::Global
    }

    pub fn description(self) -> &'static str {
        match self {
            Command::Ping => "Test de conexión",
            Command::Ticket => "Soporte técnico / reportar falla",
            Command::Factura => "Consultar y descargar facturas",
            Command::Deuda => "Ver saldo pendiente",
            Command::PuntosPago => "Ubicaciones y medios de pago",
            Command::CambiarClave => "Cambiar contraseña del WiFi",
            Command::MejorarPlan => "Mejorar plan",
            Command::ValidarPago => "Subir comprobante de pago",
            Command::Menu => "Menú principal",
            Command::Inicio => "Volver al inicio",
            Command::Ventas => "Conocer planes",
            Command::Finalizar => "Finalizar conversación",
            Command::CerrarSesion => "Cerrar sesión",
            Command::HablarAgente => "Hablar con un asesor",
            Command::Ayuda => "Ayuda",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown command token: {0}")]
pub struct UnknownCommand(pub String);

impl FromStr for Command {
    type Err = UnknownCommand;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Command::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UnknownCommand(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_parse_back() {
        for cmd in Command::ALL {
            assert_eq!(cmd.as_str().parse::<Command>().unwrap(), cmd);
        }
        assert!("contratar".parse::<Command>().is_err());
    }

    #[test]
    fn only_escapes_are_global() {
        let globals: Vec<_> = Command::ALL.into_iter().filter(|c| c.is_global()).collect();
        assert_eq!(globals, [Command::Menu, Command::Inicio, Command::Finalizar]);
    }
}
