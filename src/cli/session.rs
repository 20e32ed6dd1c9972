//! Interactive conversion session.
//!
//! Each input line is one command, parsed with clap in multicall mode so the
//! first word selects the command. The session keeps running on bad input;
//! only `quit` or end of input stops it.

use super::ui;
use crate::core::{ConversionController, RateLookupClient, RecordKey};
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::debug;

const PROMPT: &str = "fxconv> ";

#[derive(Parser, Debug)]
#[command(multicall = true)]
struct SessionLine {
    #[command(subcommand)]
    command: SessionCommand,
}

#[derive(Subcommand, Debug, PartialEq)]
enum SessionCommand {
    /// Set the amount to convert (no value clears it)
    Amount {
        #[arg(allow_hyphen_values = true)]
        value: Option<String>,
    },
    /// Select the currency to convert from
    From { code: String },
    /// Select the currency to convert to
    To { code: String },
    /// Convert the current amount
    Convert,
    /// Show past conversions
    History,
    /// Delete one conversion from the history
    Delete { key: u64 },
    /// Delete all conversions from the history
    Clear,
    /// List the supported currencies
    Currencies,
    /// Show the current input and last error
    Status,
    /// Leave the session
    #[command(alias = "exit")]
    Quit,
}

enum Flow {
    Continue,
    Quit,
}

/// Reads commands from `input` until `quit` or end of input.
pub async fn run<C, R, W>(controller: &ConversionController<C>, input: R, out: &mut W) -> Result<()>
where
    C: RateLookupClient,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    writeln!(
        out,
        "{} (type 'help' for commands)",
        ui::style_text("Currency converter", ui::StyleType::Title)
    )?;

    let mut lines = input.lines();
    loop {
        write!(out, "{PROMPT}")?;
        out.flush()?;

        let Some(line) = lines.next_line().await? else {
            writeln!(out)?;
            break;
        };
        let words: Vec<&str> = line.split_whitespace().collect();
        if words.is_empty() {
            continue;
        }

        let command = match SessionLine::try_parse_from(words) {
            Ok(parsed) => parsed.command,
            Err(e) => {
                write!(out, "{}", e.render())?;
                continue;
            }
        };
        debug!(?command, "Session command");

        if let Flow::Quit = execute(controller, command, out).await? {
            break;
        }
    }
    Ok(())
}

async fn execute<C, W>(
    controller: &ConversionController<C>,
    command: SessionCommand,
    out: &mut W,
) -> Result<Flow>
where
    C: RateLookupClient,
    W: Write,
{
    match command {
        SessionCommand::Amount { value } => {
            // A rejected edit leaves the old amount in place without complaint.
            controller.set_amount(value.as_deref().unwrap_or("")).await;
            let state = controller.state().await;
            writeln!(out, "Amount: {}", display_amount(state.amount.as_str()))?;
        }
        SessionCommand::From { code } => match controller.set_from_currency(&code).await {
            Ok(code) => writeln!(out, "From: {code}")?,
            Err(e) => writeln!(out, "{}", ui::style_text(&e.to_string(), ui::StyleType::Error))?,
        },
        SessionCommand::To { code } => match controller.set_to_currency(&code).await {
            Ok(code) => writeln!(out, "To: {code}")?,
            Err(e) => writeln!(out, "{}", ui::style_text(&e.to_string(), ui::StyleType::Error))?,
        },
        SessionCommand::Convert => {
            if !controller.is_data_valid().await {
                writeln!(
                    out,
                    "{}",
                    ui::style_text("Enter an amount before converting", ui::StyleType::Subtle)
                )?;
                return Ok(Flow::Continue);
            }

            let pb = ui::new_spinner("Fetching exchange rate...");
            let record = controller.convert().await;
            pb.finish_and_clear();

            match record {
                Some(record) => {
                    writeln!(out, "{}", ui::history_table(std::slice::from_ref(&record)))?;
                }
                None => {
                    let state = controller.state().await;
                    writeln!(out, "{}", ui::style_text(&state.error, ui::StyleType::Error))?;
                }
            }
        }
        SessionCommand::History => {
            let records = controller.history().await;
            if records.is_empty() {
                writeln!(out, "{}", ui::style_text("History is empty", ui::StyleType::Subtle))?;
            } else {
                writeln!(out, "{}", ui::history_table(&records))?;
            }
        }
        SessionCommand::Delete { key } => {
            if controller.remove_record(RecordKey(key)).await {
                writeln!(out, "Deleted {key}")?;
            } else {
                writeln!(
                    out,
                    "{}",
                    ui::style_text(&format!("No record with key {key}"), ui::StyleType::Subtle)
                )?;
            }
        }
        SessionCommand::Clear => {
            controller.clear_history().await;
            writeln!(out, "History cleared")?;
        }
        SessionCommand::Currencies => {
            let codes: Vec<&str> = controller
                .currencies()
                .codes()
                .iter()
                .map(|c| c.as_str())
                .collect();
            writeln!(out, "{}", codes.join(" "))?;
        }
        SessionCommand::Status => {
            let state = controller.state().await;
            writeln!(
                out,
                "Amount: {}\nFrom: {}\nTo: {}\nHistory: {} record(s)",
                display_amount(state.amount.as_str()),
                state.from_currency,
                state.to_currency,
                controller.history_len().await
            )?;
            if state.has_error() {
                writeln!(
                    out,
                    "Error: {}",
                    ui::style_text(&state.error, ui::StyleType::Error)
                )?;
            }
        }
        SessionCommand::Quit => return Ok(Flow::Quit),
    }
    Ok(Flow::Continue)
}

fn display_amount(amount: &str) -> String {
    if amount.is_empty() {
        ui::style_text("(none)", ui::StyleType::Subtle)
    } else {
        ui::style_text(amount, ui::StyleType::Value)
    }
}
