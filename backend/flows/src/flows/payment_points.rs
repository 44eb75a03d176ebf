//! Where and how to pay.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use deskflow_commands::Command;
use deskflow_config::PaymentPointConfig;
use deskflow_core::{ActiveFlow, Collaborators, MessageSender, Session};

use crate::flow::{Flow, FlowInput, FlowOutcome};
use crate::flows::{reply, PAYMENT_POINTS};
use crate::settings::FlowSettings;

pub struct PaymentPointsFlow {
    sender: Arc<dyn MessageSender>,
    text: String,
}

impl PaymentPointsFlow {
    pub fn new(collabs: &Collaborators, settings: &FlowSettings) -> Self {
        Self {
            sender: collabs.sender.clone(),
            text: render(&settings.payment_points, settings.payment_notice.as_deref()),
        }
    }
}

fn render(points: &[PaymentPointConfig], notice: Option<&str>) -> String {
    let mut text = String::from("💳 *Medios y puntos de pago*\n");
    if points.is_empty() {
        text.push_str("\nComunícate con un asesor para conocer los medios de pago disponibles.");
    }
    for point in points {
        text.push_str(&format!("\n• *{}*: {}", point.name, point.details));
        if let Some(hours) = &point.hours {
            text.push_str(&format!(" ({hours})"));
        }
    }
    if let Some(notice) = notice {
        text.push_str(&format!("\n\n⚠️ {notice}"));
    }
    text
}

#[async_trait]
impl Flow for PaymentPointsFlow {
    fn name(&self) -> &'static str {
        PAYMENT_POINTS
    }

    fn can_handle(&self, input: &FlowInput, session: &Session) -> bool {
        matches!(session.active(), ActiveFlow::PaymentPoints)
            || input.command() == Some(Command::PuntosPago)
    }

    async fn handle(&self, input: &FlowInput, session: &mut Session) -> Result<FlowOutcome> {
        reply(self.sender.as_ref(), input.phone(), &self.text).await;
        if matches!(session.active(), ActiveFlow::PaymentPoints) {
            session.clear_routing();
        }
        Ok(FlowOutcome::Resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use deskflow_core::fakes::FakeServices;
    use deskflow_core::User;

    #[test]
    fn renders_points_and_notice() {
        let points = vec![PaymentPointConfig {
            name: "Oficina".into(),
            details: "Calle 5 No. 4-20".into(),
            hours: Some("8am - 6pm".into()),
        }];
        let text = render(&points, Some("Reconexión $7.000"));
        assert!(text.contains("• *Oficina*: Calle 5 No. 4-20 (8am - 6pm)"));
        assert!(text.ends_with("⚠️ Reconexión $7.000"));
    }

    #[tokio::test]
    async fn anyone_can_ask_for_payment_points() {
        let fakes = FakeServices::new();
        let flow = PaymentPointsFlow::new(&fakes.collaborators(), &FlowSettings::default());
        let mut session = Session::new("1");

        let input = FlowInput::new(&User::anonymous("1"), "Puntos de pago", Utc::now());
        assert!(flow.can_handle(&input, &session));
        flow.handle(&input, &mut session).await.unwrap();
        assert!(fakes.sender.last_text().await.unwrap().contains("Nequi"));
    }
}
