//! Summary and live-set rendering

use crate::cli::OutputFormat;
use anyhow::{Context, Result};
use camino::Utf8Path;
use console::style;
use janitor_core::summary::ClassSummary;
use janitor_core::{LiveImageTable, SummaryTable};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use tabled::{settings::Style, Table, Tabled};

/// Print a success message
pub fn success(msg: &str) {
    eprintln!("{} {}", style("✓").green().bold(), msg);
}

/// Print a warning message
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("⚠").yellow().bold(), msg);
}

/// Stdout, or a freshly created file
pub fn sink(path: Option<&Utf8Path>) -> Result<Box<dyn Write>> {
    Ok(match path {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Failed to create {}", path))?,
        )),
        None => Box::new(io::stdout().lock()),
    })
}

/// Formats bytes as a human-readable string
pub fn human_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.2} {}", size, UNITS[unit_index])
    }
}

fn count(images: u64, size: u64) -> String {
    format!("{} ({})", images, human_bytes(size))
}

#[derive(Tabled)]
struct SummaryRow {
    repository: String,
    #[tabled(rename = "type")]
    class: String,
    total: String,
    expired: String,
    keep: String,
}

impl From<&ClassSummary> for SummaryRow {
    fn from(row: &ClassSummary) -> Self {
        Self {
            repository: row.repository.clone(),
            class: row.class.clone(),
            total: count(row.total_images, row.total_image_size),
            expired: count(row.expired_images, row.expired_image_size),
            keep: count(row.kept_images(), row.kept_image_size()),
        }
    }
}

pub fn render_summary(summary: &SummaryTable, format: OutputFormat, out: &mut dyn Write) -> Result<()> {
    let rows = summary.printable_rows();
    match format {
        OutputFormat::Table => {
            let mut table = Table::new(rows.into_iter().map(SummaryRow::from));
            table.with(Style::sharp());
            writeln!(out, "{}", table)?;
        }
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, &rows)?;
            writeln!(out)?;
        }
    }
    out.flush()?;
    Ok(())
}

#[derive(Tabled)]
struct LiveRow {
    image: String,
    #[tabled(rename = "used by")]
    consumers: String,
}

pub fn render_live(live: &LiveImageTable, format: OutputFormat, out: &mut dyn Write) -> Result<()> {
    match format {
        OutputFormat::Json => live.write_json(&mut *out)?,
        OutputFormat::Table => {
            let rows = live.iter().map(|(reference, consumers)| LiveRow {
                image: reference.to_string(),
                consumers: consumers.sorted().join("\n"),
            });
            let mut table = Table::new(rows);
            table.with(Style::sharp());
            writeln!(out, "{}", table)?;
        }
    }
    out.flush()?;
    Ok(())
}
