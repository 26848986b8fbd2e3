//! File writing utilities for report export.
//!
//! This module writes generated report payloads to files in CSV or JSON
//! format with consistent naming, matching the original export structure
//! (`reporte_<kind>_<date>_<time>.<ext>`).

use crate::error::Result;
use crate::models::ReportKind;
use crate::reports::ReportData;
use chrono::{DateTime, Utc};
use csv::Writer;
use std::fs::{create_dir_all, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

/// Output format for exported reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    /// Comma-separated values format
    Csv,
    /// JSON format
    Json,
}

impl ReportFormat {
    /// Get the file extension for this format
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }

    /// The format name recorded on report history entries
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }
}

impl std::str::FromStr for ReportFormat {
    type Err = String;

    fn from_str(input: &str) -> std::result::Result<Self, Self::Err> {
        match input.to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            other => Err(format!("Unknown report format: {other}. Use csv or json")),
        }
    }
}

/// File name for an exported report, `reporte_<kind>_<date>_<time>`.
#[must_use]
pub fn report_file_name(kind: ReportKind, format: ReportFormat, now: DateTime<Utc>) -> String {
    format!(
        "reporte_{}_{}_{}.{}",
        kind,
        now.format("%Y-%m-%d"),
        now.format("%H-%M"),
        format.extension()
    )
}

/// Write a report into the output directory with its standard file name.
///
/// Returns the path of the created file.
pub fn write_report_to_dir(
    report: &ReportData,
    kind: ReportKind,
    format: ReportFormat,
    output_dir: &Path,
    now: DateTime<Utc>,
) -> Result<PathBuf> {
    create_dir_all(output_dir)?;
    let path = output_dir.join(report_file_name(kind, format, now));
    write_report_to_file(report, format, &path)?;
    Ok(path)
}

/// Write a report to a file in the specified format.
pub fn write_report_to_file(report: &ReportData, format: ReportFormat, path: &Path) -> Result<()> {
    match format {
        ReportFormat::Csv => write_csv_report(report, path),
        ReportFormat::Json => write_json_report(report, path),
    }
}

/// Write a report as CSV: one row per category, then a total row.
fn write_csv_report(report: &ReportData, path: &Path) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = Writer::from_writer(file);

    writer.write_record([report.title.as_str(), ""])?;
    writer.write_record(["Concepto", "Valor"])?;

    if let Some(entries) = report.data.as_object() {
        for (key, value) in entries {
            writer.write_record([key.as_str(), plain_number(value).as_str()])?;
        }
    }

    writer.write_record(["Total", plain_number(&report.total).as_str()])?;
    writer.flush()?;
    Ok(())
}

/// Write a report as pretty-printed JSON.
fn write_json_report(report: &ReportData, path: &Path) -> Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, report)?;
    Ok(())
}

/// Render a JSON number without quotes or nulls for CSV cells.
fn plain_number(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
