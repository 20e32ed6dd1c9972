use super::ui;
use crate::core::{ConversionController, RateLookupClient};
use anyhow::{Result, bail};
use std::io::Write;

/// Converts a single amount and prints the resulting record.
pub async fn run<C: RateLookupClient>(
    controller: &ConversionController<C>,
    amount: &str,
    from: &str,
    to: &str,
    out: &mut impl Write,
) -> Result<()> {
    if !controller.set_amount(amount).await {
        bail!("Invalid amount '{amount}': expected digits with at most two decimals");
    }
    controller.set_from_currency(from).await?;
    controller.set_to_currency(to).await?;

    if !controller.is_data_valid().await {
        bail!("Nothing to convert: enter an amount");
    }

    let pb = ui::new_spinner("Fetching exchange rate...");
    let record = controller.convert().await;
    pb.finish_and_clear();

    match record {
        Some(record) => {
            writeln!(out, "{}", ui::history_table(std::slice::from_ref(&record)))?;
            Ok(())
        }
        None => bail!("{}", controller.state().await.error),
    }
}
