pub mod cli;
pub mod core;
pub mod providers;

use crate::core::ConversionController;
use crate::core::config::{API_KEY_ENV, AppConfig};
use crate::providers::FreeCurrencyClient;
use anyhow::Result;
use tokio::io::BufReader;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    Convert {
        amount: String,
        from: String,
        to: String,
    },
    Session,
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("fxconv starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!(
        currencies = config.currencies.len(),
        history_capacity = config.history_capacity,
        base_url = config.freecurrency_base_url(),
        "Loaded config"
    );

    let api_key = config.resolve_api_key(std::env::var(API_KEY_ENV).ok());
    let client = FreeCurrencyClient::new(config.freecurrency_base_url(), &api_key);
    let controller = ConversionController::new(
        client,
        config.supported_currencies(),
        config.history_capacity,
    )?;

    let mut stdout = std::io::stdout();
    match command {
        AppCommand::Convert { amount, from, to } => {
            cli::convert::run(&controller, &amount, &from, &to, &mut stdout).await
        }
        AppCommand::Session => {
            let stdin = BufReader::new(tokio::io::stdin());
            cli::session::run(&controller, stdin, &mut stdout).await
        }
    }
}
