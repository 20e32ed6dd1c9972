use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use crate::core::ConversionRecord;

/// Defines different styles for text elements.
pub enum StyleType {
    Title,
    Value,
    Error,
    Subtle,
}

/// Applies a consistent style to a string.
pub fn style_text(text: &str, style_type: StyleType) -> String {
    let styled = match style_type {
        StyleType::Title => style(text).bold().underlined(),
        StyleType::Value => style(text).green().bold(),
        StyleType::Error => style(text).red(),
        StyleType::Subtle => style(text).dim(),
    };
    styled.to_string()
}

/// Creates a new `comfy_table::Table` with standard styling.
pub fn new_styled_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Creates a styled header cell for a table.
pub fn header_cell(text: &str) -> Cell {
    Cell::new(text)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

/// Right aligned number. NaN is shown as is, in red.
pub fn number_cell(value: f64, precision: usize) -> Cell {
    if value.is_nan() {
        Cell::new("NaN")
            .fg(Color::Red)
            .set_alignment(CellAlignment::Right)
    } else {
        Cell::new(format!("{value:.precision$}")).set_alignment(CellAlignment::Right)
    }
}

/// Renders records oldest first, one row each.
pub fn history_table(records: &[ConversionRecord]) -> Table {
    let mut table = new_styled_table();
    table.set_header(vec![
        header_cell("Key"),
        header_cell("Amount"),
        header_cell("From"),
        header_cell("To"),
        header_cell("Rate"),
        header_cell("Result"),
        header_cell("Time"),
    ]);

    for record in records {
        let amount = if record.amount.is_empty() {
            Cell::new("(empty)").fg(Color::DarkGrey)
        } else {
            Cell::new(record.amount.as_str()).set_alignment(CellAlignment::Right)
        };
        table.add_row(vec![
            Cell::new(record.key.to_string()),
            amount,
            Cell::new(record.from_currency.as_str()),
            Cell::new(record.to_currency.as_str()),
            number_cell(record.rate, 4),
            number_cell(record.conversion_result, 2).add_attribute(Attribute::Bold),
            Cell::new(record.created_at.format("%H:%M:%S").to_string()).fg(Color::DarkGrey),
        ]);
    }
    table
}

/// A spinner shown while a lookup is in flight.
pub fn new_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(spinner_style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(spinner_style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
