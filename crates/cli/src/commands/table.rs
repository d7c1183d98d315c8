//! Table command: render an inventory CSV as a fixed-width ASCII table

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tabled::{builder::Builder, settings::Style};

use crate::inventory::{load_raw_rows, sibling_path};
use crate::output::{print_json, print_success, print_warning, OutputFormat};

const NO_DATA: &str = "No data found in CSV file.";

#[derive(Serialize)]
struct TableOutput {
    path: PathBuf,
    rows: usize,
}

/// Render CSV headers and rows as an ASCII grid
pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    if rows.is_empty() {
        return NO_DATA.to_string();
    }

    let mut builder = Builder::default();
    builder.push_record(headers.iter().cloned());
    for row in rows {
        builder.push_record(row.iter().cloned());
    }
    builder.build().with(Style::ascii()).to_string()
}

/// Write `<stem>_table.txt` next to the CSV
pub fn convert_to_table(input: &Path, format: OutputFormat) -> Result<PathBuf> {
    let (headers, rows) = load_raw_rows(input)?;
    let output = sibling_path(input, "_table.txt");

    let mut text = render_table(&headers, &rows);
    text.push('\n');
    fs::write(&output, text)
        .with_context(|| format!("Failed to write table: {}", output.display()))?;

    match format {
        OutputFormat::Json => print_json(&TableOutput {
            path: output.clone(),
            rows: rows.len(),
        })?,
        OutputFormat::Table if rows.is_empty() => {
            print_warning(&format!("{} Wrote {}", NO_DATA, output.display()))
        }
        OutputFormat::Table => print_success(&format!(
            "Table with {} rows written to {}",
            rows.len(),
            output.display()
        )),
    }

    Ok(output)
}
