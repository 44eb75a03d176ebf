//! Sales conversation.
//!
//! Three behaviours share the `Sales` session state:
//!
//! * free conversation answered by the AI provider with the plan catalogue
//!   as context,
//! * the contracting wizard (name, email, address, alternate phone,
//!   confirmation) that ends by opening a sales ticket,
//! * a short courtesy window after a completed contract in which "gracias"
//!   or "ok" gets a closing remark instead of falling through.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Duration;
use tracing::{debug, error, info, warn};

use deskflow_commands::{contains_keywords, Command};
use deskflow_config::PlanConfig;
use deskflow_core::{
    ActiveFlow, AiProvider, Collaborators, ContractData, ContractStep, DeskError, MessageSender,
    SalesState, Session, TicketApi, TicketPriority, TicketRequest,
};

use crate::flow::{Flow, FlowInput, FlowOutcome};
use crate::flows::{format_price, reply, SALES};
use crate::settings::FlowSettings;

const CONTRACT_KEYWORDS: &[&str] = &["contratar", "quiero el plan", "adquirir"];

const COURTESY_PHRASES: &[&str] = &[
    "gracias",
    "muchas gracias",
    "mil gracias",
    "ok",
    "okay",
    "vale",
    "listo",
    "perfecto",
    "genial",
    "excelente",
    "thanks",
];

const AFFIRMATIVE: &[&str] = &["sí", "si", "yes", "confirmo", "acepto", "correcto", "dale"];

/// Turns of history included in the AI context.
const CONTEXT_TURNS: usize = 3;

const CLOSING_TEXT: &str = "😊 ¡Con mucho gusto! Nuestro equipo te contactará pronto para \
agendar la instalación. Si necesitas algo más, escribe *menu*.";
const FALLBACK_TEXT: &str = "😊 ¡Gracias por tu interés en Conecta2! En este momento no puedo \
responder tu consulta. Escribe *contratar* si ya elegiste un plan, o *menu* para ver más opciones.";
const HANDOFF_TEXT: &str =
    "❌ Lo siento, ha ocurrido un error. Te conectaré con un asesor humano en breve.";
const CANCELLED_TEXT: &str = "👌 Cancelamos la solicitud de contratación. \
Si quieres retomarla, escribe *contratar* cuando quieras.";
const NO_PLANS_TEXT: &str =
    "En este momento no tenemos planes disponibles para contratar. Un asesor te contactará.";

const PROMPT_EMAIL: &str = "📧 Gracias. ¿Cuál es tu correo electrónico?";
const PROMPT_ADDRESS: &str = "🏠 ¿En qué dirección quieres la instalación? (barrio y dirección completa)";
const PROMPT_PHONE: &str = "📱 ¿Tienes un número de contacto alternativo? Si no, responde *no*.";
const RETRY_NAME: &str = "Por favor escribe tu nombre completo (mínimo 3 caracteres).";
const RETRY_EMAIL: &str = "Ese correo no parece válido. Escríbelo de nuevo, por ejemplo *nombre@correo.com*.";
const RETRY_ADDRESS: &str = "Necesitamos una dirección más completa (mínimo 5 caracteres).";

pub struct SalesFlow {
    sender: Arc<dyn MessageSender>,
    tickets: Arc<dyn TicketApi>,
    ai: Arc<dyn AiProvider>,
    plans: Vec<PlanConfig>,
    default_plan: Option<PlanConfig>,
    courtesy_window: Duration,
}

// ---------------------------------------------------------------------------
// Text classification
// ---------------------------------------------------------------------------

fn words(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty())
}

fn is_courtesy(text: &str) -> bool {
    let lower = text.to_lowercase();
    let cleaned = lower.trim_matches(|c: char| !c.is_alphanumeric() && !c.is_whitespace()).trim();
    COURTESY_PHRASES.contains(&cleaned) || cleaned.starts_with("gracias") || cleaned.starts_with("muchas gracias")
}

/// Whole-word affirmative check. Anything else counts as a "no".
fn is_affirmative(text: &str) -> bool {
    let lower = text.to_lowercase();
    let hit = words(&lower).any(|w| AFFIRMATIVE.contains(&w));
    hit
}

fn is_email(text: &str) -> bool {
    text.contains('@') && text.contains('.') && !text.contains(char::is_whitespace)
}

impl SalesFlow {
    pub fn new(collabs: &Collaborators, settings: &FlowSettings) -> Self {
        Self {
            sender: collabs.sender.clone(),
            tickets: collabs.tickets.clone(),
            ai: collabs.ai.clone(),
            plans: settings.plans.clone(),
            default_plan: settings.default_plan.clone(),
            courtesy_window: settings.courtesy_window,
        }
    }

    fn plan_in(&self, text: &str) -> Option<&PlanConfig> {
        self.plans.iter().find(|p| p.mentioned_in(text))
    }

    /// Plan named in the message, else the last one discussed, else the default.
    fn choose_plan(&self, input: &FlowInput, session: &Session) -> Option<PlanConfig> {
        self.plan_in(&input.raw)
            .or_else(|| {
                session.find_in_history(|turn| {
                    self.plan_in(&turn.user_text)
                        .or_else(|| self.plan_in(&turn.reply_text))
                })
            })
            .or(self.default_plan.as_ref())
            .cloned()
    }

    async fn say(&self, input: &FlowInput, text: &str) {
        reply(self.sender.as_ref(), input.phone(), text).await;
    }

    // -- contracting wizard ------------------------------------------------

    async fn start_contracting(&self, input: &FlowInput, session: &mut Session) {
        let Some(plan) = self.choose_plan(input, session) else {
            self.say(input, NO_PLANS_TEXT).await;
            return;
        };

        info!(plan = %plan.name, "[Flows] Contracting wizard started");
        session.begin_contracting(ContractData::new(&plan.name, plan.price, input.received_at));
        let text = format!(
            "🎉 ¡Excelente elección! Vamos a contratar el *{}* por {}/mes.\n\n\
             Para comenzar, ¿cuál es tu nombre completo?",
            plan.name,
            format_price(plan.price)
        );
        self.say(input, &text).await;
    }

    /// Run one wizard step; any failure apologises and abandons the wizard.
    async fn continue_contracting(&self, input: &FlowInput, session: &mut Session) {
        if let Err(e) = self.advance(input, session).await {
            error!(error = %format!("{e:#}"), "[Flows] Contracting step failed; cancelling");
            session.cancel_contracting();
            self.say(input, HANDOFF_TEXT).await;
        }
    }

    async fn advance(&self, input: &FlowInput, session: &mut Session) -> Result<()> {
        let text = input.raw.trim();
        let step = session
            .contracting_step()
            .ok_or_else(|| DeskError::InvalidTransition("no contracting wizard in progress".into()))?;
        debug!(step = step.as_str(), "[Flows] Contracting step");

        if step == ContractStep::Confirm {
            if is_affirmative(text) {
                return self.commit(input, session).await;
            }
            session.cancel_contracting();
            self.say(input, CANCELLED_TEXT).await;
            return Ok(());
        }

        let contracting = session
            .contracting_mut()
            .ok_or_else(|| DeskError::InvalidTransition("contracting state vanished".into()))?;
        let data = &mut contracting.data;

        let retry = match step {
            ContractStep::Name if text.chars().count() < 3 => Some(RETRY_NAME),
            ContractStep::Name => {
                data.name = Some(text.to_string());
                None
            }
            ContractStep::Email if !is_email(text) => Some(RETRY_EMAIL),
            ContractStep::Email => {
                data.email = Some(text.to_string());
                None
            }
            ContractStep::Address if text.chars().count() < 5 => Some(RETRY_ADDRESS),
            ContractStep::Address => {
                data.address = Some(text.to_string());
                None
            }
            ContractStep::Phone => {
                data.alternative_phone = (!text.eq_ignore_ascii_case("no")).then(|| text.to_string());
                None
            }
            ContractStep::Confirm => None,
        };
        if let Some(retry) = retry {
            self.say(input, retry).await;
            return Ok(());
        }

        let next = step.next().ok_or_else(|| {
            DeskError::InvalidTransition(format!("no step after {}", step.as_str()))
        })?;
        contracting.step = next;

        let prompt = match next {
            ContractStep::Email => PROMPT_EMAIL.to_string(),
            ContractStep::Address => PROMPT_ADDRESS.to_string(),
            ContractStep::Phone => PROMPT_PHONE.to_string(),
            ContractStep::Confirm => summary(&contracting.data),
            ContractStep::Name => {
                return Err(DeskError::InvalidTransition("wizard moved back to name".into()).into())
            }
        };
        self.say(input, &prompt).await;
        Ok(())
    }

    async fn commit(&self, input: &FlowInput, session: &mut Session) -> Result<()> {
        let data = session
            .contract_data()
            .cloned()
            .ok_or_else(|| DeskError::InvalidTransition("no contract data to commit".into()))?;

        let request = TicketRequest {
            customer_id: input.user.customer_id.clone(),
            phone: input.phone().to_string(),
            category: "ventas".to_string(),
            subject: format!("Contratación {}", data.plan_name),
            description: describe(&data),
            priority: TicketPriority::High,
        };
        let id = self
            .tickets
            .create_ticket(&request)
            .await
            .map_err(|e| DeskError::collaborator("tickets", format!("{e:#}")))?;

        info!(ticket = %id, plan = %data.plan_name, "[Flows] Contract committed");
        session.clear_routing();
        session.mark_contract_completed(input.received_at);

        let text = format!(
            "✅ ¡Listo! Registramos tu solicitud del *{}* con el número *{id}*.\n\n\
             Un asesor te llamará para agendar la instalación. ¡Bienvenido a Conecta2! 🎉",
            data.plan_name
        );
        self.say(input, &text).await;
        Ok(())
    }

    // -- conversation ------------------------------------------------------

    fn context(&self, input: &FlowInput, session: &Session) -> String {
        let mut ctx = String::from(
            "Eres Andrea, asesora comercial de Conecta2 Telecomunicaciones en Piendamó, Cauca. \
             Vendes internet y televisión por fibra óptica. Responde en español, de forma breve \
             y cálida, y cuando el cliente esté listo invítalo a escribir *contratar*.\n\n\
             PLANES DISPONIBLES:\n",
        );
        for plan in &self.plans {
            ctx.push_str(&format!("• {}: {}/mes\n", plan.name, format_price(plan.price)));
        }
        ctx.push_str(&format!("\nCliente: {}\n", input.user.first_name()));

        let recent = session.recent_history(CONTEXT_TURNS);
        if !recent.is_empty() {
            ctx.push_str("\nCONVERSACIÓN RECIENTE:\n");
            for turn in recent {
                ctx.push_str(&format!("Cliente: {}\nAndrea: {}\n", turn.user_text, turn.reply_text));
            }
        }
        ctx
    }

    async fn converse(&self, input: &FlowInput, session: &mut Session) {
        if !session.in_sales() {
            session.activate(ActiveFlow::Sales(SalesState::default()));
        }

        let context = self.context(input, session);
        let answer = match self.ai.get_reply(&input.raw, &context).await {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => {
                warn!(provider = self.ai.name(), "[Flows] AI provider returned an empty reply");
                FALLBACK_TEXT.to_string()
            }
            Err(e) => {
                warn!(provider = self.ai.name(), error = %e, "[Flows] AI provider failed");
                FALLBACK_TEXT.to_string()
            }
        };

        self.say(input, &answer).await;
        session.push_history(input.raw.clone(), answer, input.received_at);
    }
}

fn summary(data: &ContractData) -> String {
    format!(
        "📋 *Confirma tu solicitud*\n\n\
         • Plan: {} ({}/mes)\n\
         • Nombre: {}\n\
         • Correo: {}\n\
         • Dirección: {}\n\
         • Teléfono alterno: {}\n\n\
         ¿Los datos son correctos? Responde *sí* para confirmar o *no* para cancelar.",
        data.plan_name,
        format_price(data.plan_price),
        data.name.as_deref().unwrap_or("-"),
        data.email.as_deref().unwrap_or("-"),
        data.address.as_deref().unwrap_or("-"),
        data.alternative_phone.as_deref().unwrap_or("ninguno"),
    )
}

fn describe(data: &ContractData) -> String {
    format!(
        "Solicitud de contratación por WhatsApp\nPlan: {} ({})\nNombre: {}\nCorreo: {}\nDirección: {}\nTeléfono alterno: {}",
        data.plan_name,
        format_price(data.plan_price),
        data.name.as_deref().unwrap_or("-"),
        data.email.as_deref().unwrap_or("-"),
        data.address.as_deref().unwrap_or("-"),
        data.alternative_phone.as_deref().unwrap_or("-"),
    )
}

#[async_trait]
impl Flow for SalesFlow {
    fn name(&self) -> &'static str {
        SALES
    }

    fn can_handle(&self, input: &FlowInput, session: &Session) -> bool {
        if session.courtesy_window_open(input.received_at, self.courtesy_window) && is_courtesy(&input.raw) {
            return true;
        }
        if session.in_sales() {
            // advisor requests leave the AI chat unless a contract is half filled
            return session.contracting_plan() || input.command() != Some(Command::HablarAgente);
        }
        session.is_idle()
            && (input.command() == Some(Command::Ventas)
                || contains_keywords(&input.raw, CONTRACT_KEYWORDS))
    }

    async fn handle(&self, input: &FlowInput, session: &mut Session) -> Result<FlowOutcome> {
        if session.contracting_plan() {
            self.continue_contracting(input, session).await;
        } else if session.courtesy_window_open(input.received_at, self.courtesy_window)
            && is_courtesy(&input.raw)
        {
            self.say(input, CLOSING_TEXT).await;
        } else if contains_keywords(&input.raw, CONTRACT_KEYWORDS) {
            self.start_contracting(input, session).await;
        } else {
            self.converse(input, session).await;
        }
        Ok(FlowOutcome::Resolved)
    }
}
