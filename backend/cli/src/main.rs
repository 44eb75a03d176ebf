mod chat_cmd;
mod check_config_cmd;
mod console;
mod terminal_output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;

use deskflow_commands::{detect_command, normalize};
use deskflow_config::{config_dir, config_file_path, load_and_prepare};

use chat_cmd::ChatOptions;

#[derive(Parser)]
#[command(name = "deskflow")]
#[command(about = "Conversation router for ISP customer service over WhatsApp")]
#[command(version)]
struct Cli {
    /// Config file (defaults to $DESKFLOW_CONFIG_DIR/config.yaml or ~/.deskflow/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Talk to the router from the terminal
    Chat {
        /// Sender phone number
        #[arg(long, default_value = "573001112233")]
        phone: String,
        /// Treat the sender as a logged-in customer
        #[arg(long)]
        authenticated: bool,
        /// Display name used in greetings
        #[arg(long)]
        name: Option<String>,
    },
    /// Print the canonical token for a message
    Normalize {
        #[arg(required = true)]
        text: Vec<String>,
    },
    /// Validate the config file and print a summary
    CheckConfig {
        /// Also print the redacted effective config
        #[arg(long)]
        show: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let path = cli
        .config
        .unwrap_or_else(|| config_file_path(&config_dir()));

    match cli.command {
        Commands::Chat {
            phone,
            authenticated,
            name,
        } => {
            let config = load_and_prepare(&path).await?;
            logging::init_logger(config.log_dir(), config.log_level());
            info!(config = %path.display(), "Starting console chat");
            chat_cmd::run(
                &config,
                ChatOptions {
                    phone,
                    authenticated,
                    name,
                },
            )
            .await?;
        }
        Commands::Normalize { text } => {
            let text = text.join(" ");
            let token = normalize(&text);
            match detect_command(&text) {
                Some(cmd) => println!("{token}\t{:?}\t{}", cmd.category(), cmd.description()),
                None => println!("{token}"),
            }
        }
        Commands::CheckConfig { show } => {
            check_config_cmd::run(&path, show).await?;
        }
    }

    Ok(())
}
