//! Connectivity check against the customer's service.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tracing::{info, warn};
use uuid::Uuid;

use deskflow_commands::{is_menu_command, Command};
use deskflow_core::{ActiveFlow, Collaborators, ConnectivityProbe, MessageSender, ProbeReport, Session};

use crate::flow::{Flow, FlowInput, FlowOutcome};
use crate::flows::{reply, IP_DIAGNOSTIC};

const SYNONYMS: &[&str] = &[
    "test_conexion",
    "diagnostico ip",
    "diagnóstico ip",
    "ping ip",
    "estado de conexion",
    "estado de conexión",
    "verificar conexion",
    "verificar conexión",
];

const RUNNING_TEXT: &str = "🔍 Estamos verificando tu conexión, esto toma unos segundos...";
const NO_SERVICE_TEXT: &str = "⚠️ No encontramos un servicio asociado a tu cuenta para diagnosticar. \
Escribe *menu* y elige *Soporte Técnico* para que un técnico lo revise.";
const FAILURE_TEXT: &str = "❌ No pudimos completar el diagnóstico en este momento. \
Intenta de nuevo en unos minutos o reporta la falla desde el menú.";

pub struct IpDiagnosticFlow {
    sender: Arc<dyn MessageSender>,
    probe: Arc<dyn ConnectivityProbe>,
}

impl IpDiagnosticFlow {
    pub fn new(collabs: &Collaborators) -> Self {
        Self {
            sender: collabs.sender.clone(),
            probe: collabs.probe.clone(),
        }
    }
}

fn summarize(report: &ProbeReport) -> String {
    let latency = report
        .latency_ms
        .map(|ms| format!("{ms} ms"))
        .unwrap_or_else(|| "sin respuesta".to_string());

    if report.reachable {
        format!(
            "✅ *Tu conexión está activa*\n\n\
             • Paquetes recibidos: {}/{}\n\
             • Pérdida: {}%\n\
             • Latencia: {latency}",
            report.packets_received,
            report.packets_sent,
            report.packet_loss_pct()
        )
    } else {
        format!(
            "⚠️ *No logramos comunicarnos con tu equipo*\n\n\
             • Pérdida: {}%\n\n\
             Reinicia tu router (desconéctalo 30 segundos) y vuelve a intentarlo. \
             Si la falla continúa, elige *Soporte Técnico* en el menú.",
            report.packet_loss_pct()
        )
    }
}

#[async_trait]
impl Flow for IpDiagnosticFlow {
    fn name(&self) -> &'static str {
        IP_DIAGNOSTIC
    }

    fn can_handle(&self, input: &FlowInput, session: &Session) -> bool {
        input.user.authenticated
            && (session.diagnostic_in_progress()
                || input.command() == Some(Command::Ping)
                || is_menu_command(&input.raw, SYNONYMS))
    }

    async fn handle(&self, input: &FlowInput, session: &mut Session) -> Result<FlowOutcome> {
        let Some(service_id) = input.user.service_id.as_deref() else {
            reply(self.sender.as_ref(), input.phone(), NO_SERVICE_TEXT).await;
            session.clear_routing();
            return Ok(FlowOutcome::Resolved);
        };

        let task_id = Uuid::new_v4().to_string();
        session.activate(ActiveFlow::Diagnostic {
            task_id: Some(task_id.clone()),
        });
        reply(self.sender.as_ref(), input.phone(), RUNNING_TEXT).await;

        match self.probe.ping(service_id).await {
            Ok(report) => {
                info!(
                    task = %task_id,
                    reachable = report.reachable,
                    loss = report.packet_loss_pct(),
                    "[Flows] Diagnostic finished"
                );
                reply(self.sender.as_ref(), input.phone(), &summarize(&report)).await;
            }
            Err(e) => {
                warn!(task = %task_id, error = %e, "[Flows] Connectivity probe failed");
                reply(self.sender.as_ref(), input.phone(), FAILURE_TEXT).await;
            }
        }

        session.clear_routing();
        Ok(FlowOutcome::Resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use deskflow_core::fakes::{FakeServices, ScriptedProbe};
    use deskflow_core::User;

    fn input(user: &User, raw: &str) -> FlowInput {
        FlowInput::new(user, raw, Utc::now())
    }

    #[test]
    fn triggers_on_token_synonym_or_flag() {
        let fakes = FakeServices::new();
        let flow = IpDiagnosticFlow::new(&fakes.collaborators());
        let user = User::customer("1", "c", "s");
        let mut session = Session::new("1");

        assert!(flow.can_handle(&input(&user, "ping"), &session));
        assert!(flow.can_handle(&input(&user, "Diagnóstico IP por favor"), &session));
        assert!(!flow.can_handle(&input(&user, "hola"), &session));
        assert!(!flow.can_handle(&input(&User::anonymous("1"), "ping"), &session));

        session.activate(ActiveFlow::Diagnostic { task_id: None });
        assert!(flow.can_handle(&input(&user, "hola"), &session));
    }

    #[tokio::test]
    async fn reports_probe_summary_and_clears() {
        let fakes = FakeServices::new().with_probe(ScriptedProbe::with_report(ProbeReport {
            reachable: true,
            packets_sent: 4,
            packets_received: 3,
            latency_ms: Some(21),
        }));
        let flow = IpDiagnosticFlow::new(&fakes.collaborators());
        let user = User::customer("1", "c", "s");
        let mut session = Session::new("1");
        session.activate(ActiveFlow::Diagnostic { task_id: None });

        flow.handle(&input(&user, "ping"), &mut session).await.unwrap();
        assert!(session.is_idle());

        let sent = fakes.sender.sent().await;
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].text(), Some(RUNNING_TEXT));
        let summary = sent[1].text().unwrap();
        assert!(summary.contains("25%"));
        assert!(summary.contains("21 ms"));
    }

    #[tokio::test]
    async fn probe_failure_sends_fallback() {
        let fakes = FakeServices::new().with_probe(ScriptedProbe::failing());
        let flow = IpDiagnosticFlow::new(&fakes.collaborators());
        let mut session = Session::new("1");

        let outcome = flow
            .handle(&input(&User::customer("1", "c", "s"), "ping"), &mut session)
            .await
            .unwrap();
        assert_eq!(outcome, FlowOutcome::Resolved);
        assert!(session.is_idle());
        assert_eq!(fakes.sender.last_text().await.as_deref(), Some(FAILURE_TEXT));
    }

    #[tokio::test]
    async fn missing_service_id_is_an_error_reply() {
        let fakes = FakeServices::new();
        let flow = IpDiagnosticFlow::new(&fakes.collaborators());
        let mut user = User::customer("1", "c", "s");
        user.service_id = None;
        let mut session = Session::new("1");
        session.activate(ActiveFlow::Diagnostic { task_id: None });

        flow.handle(&input(&user, "ping"), &mut session).await.unwrap();
        assert!(session.is_idle());
        assert_eq!(fakes.sender.last_text().await.as_deref(), Some(NO_SERVICE_TEXT));
    }
}
