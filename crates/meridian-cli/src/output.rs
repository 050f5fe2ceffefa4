//! Output formatting utilities.

use colored::Colorize;
use serde::Serialize;
use tabled::{
    settings::{object::Columns, Alignment, Modify, Style},
    Table, Tabled,
};

use meridian_portfolio::Weights;

use crate::cli::OutputFormat;

/// Formats and prints output based on the specified format.
pub fn print_output<T: Serialize + Tabled>(data: &[T], format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Table => print_table(data),
        OutputFormat::Json => print_json(data),
        OutputFormat::Csv => print_csv(data),
        OutputFormat::Minimal => print_minimal(data),
    }
}

/// Prints a single result as pretty JSON.
pub fn print_single<T: Serialize>(data: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(data)?);
    Ok(())
}

/// Prints data as a formatted table.
fn print_table<T: Tabled>(data: &[T]) -> anyhow::Result<()> {
    if data.is_empty() {
        println!("No results.");
        return Ok(());
    }

    let table = Table::new(data)
        .with(Style::rounded())
        .with(Modify::new(Columns::first()).with(Alignment::left()))
        .to_string();

    println!("{}", table);
    Ok(())
}

/// Prints data as JSON.
fn print_json<T: Serialize>(data: &[T]) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(data)?);
    Ok(())
}

/// Prints data as CSV.
fn print_csv<T: Serialize>(data: &[T]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_writer(std::io::stdout());
    for item in data {
        wtr.serialize(item)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Prints minimal output (first value only).
fn print_minimal<T: Serialize>(data: &[T]) -> anyhow::Result<()> {
    if let Some(first) = data.first() {
        println!("{}", serde_json::to_string(first)?);
    }
    Ok(())
}

/// Formats a rate as a percentage string.
pub fn format_percent(value: f64) -> String {
    format!("{:.4}%", value * 100.0)
}

/// Table cell for a rate.
pub fn display_rate(value: &f64) -> String {
    format_percent(*value)
}

/// Table cell for an optional rate.
pub fn display_percent(value: &Option<f64>) -> String {
    value.map(format_percent).unwrap_or_else(|| "-".to_string())
}

/// Prints a warning message.
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow(), message);
}

/// A key-value pair for display.
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct KeyValue {
    #[tabled(rename = "Metric")]
    pub key: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

impl KeyValue {
    /// Creates a new key-value pair.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Creates a key-value pair from a float.
    pub fn from_f64(key: impl Into<String>, value: f64, precision: usize) -> Self {
        Self {
            key: key.into(),
            value: format!("{:.prec$}", value, prec = precision),
        }
    }

    /// Creates a key-value pair formatted as percentage.
    pub fn from_percent(key: impl Into<String>, value: f64) -> Self {
        Self {
            key: key.into(),
            value: format_percent(value),
        }
    }
}

/// One asset's weight.
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct WeightRow {
    #[tabled(rename = "Asset")]
    pub asset: String,
    #[tabled(rename = "Weight", display_with = "display_rate")]
    pub weight: f64,
}

/// Rows for a weight vector in universe order.
pub fn weight_rows(weights: &Weights) -> Vec<WeightRow> {
    weights
        .iter()
        .map(|(asset, weight)| WeightRow {
            asset: asset.to_string(),
            weight,
        })
        .collect()
}

/// Prints a header for a section.
pub fn print_header(title: &str) {
    println!("\n{}", title.bold().underline());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(0.0825), "8.2500%");
        assert_eq!(display_percent(&None), "-");
        assert_eq!(display_percent(&Some(-0.01)), "-1.0000%");
    }

    #[test]
    fn test_weight_rows_keep_order() {
        let weights = Weights::from_pairs([("B", 0.4), ("A", 0.6)]).unwrap();
        let rows = weight_rows(&weights);
        assert_eq!(rows[0].asset, "B");
        assert_eq!(rows[1].weight, 0.6);
    }

    #[test]
    fn test_key_value_precision() {
        assert_eq!(KeyValue::from_f64("x", 1.0 / 3.0, 3).value, "0.333");
    }
}
