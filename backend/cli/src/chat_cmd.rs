//! `deskflow chat`: drive the router from stdin as a single user.

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};

use deskflow_config::DeskflowConfig;
use deskflow_core::{SessionStore, User};
use deskflow_flows::{build_default_dispatcher, ConversationRouter, DispatchOutcome, FlowSettings};

use crate::console::offline_collaborators;
use crate::terminal_output::{note_info, note_warn, paint, DIM};

pub struct ChatOptions {
    pub phone: String,
    pub authenticated: bool,
    pub name: Option<String>,
}

impl ChatOptions {
    fn user(&self) -> User {
        let user = if self.authenticated {
            User::customer(&self.phone, "demo-1", "svc-demo-1")
        } else {
            User::anonymous(&self.phone)
        };
        match &self.name {
            Some(name) => user.with_display_name(name),
            None => user,
        }
    }
}

pub async fn run(config: &DeskflowConfig, opts: ChatOptions) -> Result<()> {
    let settings = FlowSettings::from_config(config);
    let collabs = offline_collaborators(&opts.phone, opts.authenticated);
    let dispatcher = build_default_dispatcher(&collabs, &settings)?;
    let router = ConversationRouter::new(SessionStore::with_history_limit(config.history_limit()), dispatcher);
    let user = opts.user();

    note_info(&format!("Flows: {}", router.dispatcher().flow_names().join(" → ")));

    note_info(&format!(
        "Chatting as {} ({}). /session shows state, /quit exits.",
        user.phone_number,
        if user.authenticated { "customer" } else { "prospect" }
    ));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let text = line.trim();
        match text {
            "" => continue,
            "/quit" | "/exit" => break,
            "/session" => {
                if let Some(session) = router.store().snapshot(&user.phone_number).await {
                    println!("{}", paint(DIM, &serde_json::to_string_pretty(&session)?));
                }
                continue;
            }
            _ => {}
        }

        if let DispatchOutcome::Unhandled = router.handle_inbound(&user, text).await {
            note_warn("[unhandled]");
        }
    }
    Ok(())
}
