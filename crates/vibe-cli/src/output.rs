//! Output formatting and writing utilities
//!
//! Records and admin resources are printed as tables in human mode and
//! serialized as-is in JSON and YAML modes.

use crate::cli::OutputFormat;
use crate::error::Result;
use crate::logging::redaction;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use serde_json::Value;
use std::io::{self, IsTerminal, Write};
use std::time::Duration;
use tracing::{debug, trace};
use vibe_core::Pagination;

/// Trait for formatting serializable values
pub trait OutputFormatter {
    /// Format a serializable value
    fn format<T: Serialize>(&self, value: &T) -> Result<String>;
}

impl OutputFormatter for OutputFormat {
    fn format<T: Serialize>(&self, value: &T) -> Result<String> {
        match self {
            OutputFormat::Json => Ok(serde_json::to_string(value)?),
            OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(value)?),
            OutputFormat::Yaml => Ok(serde_yaml::to_string(value)?),
            OutputFormat::Human => Ok(serde_json::to_string_pretty(value)?),
        }
    }
}

/// Limits applied when rendering records as a table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableLimits {
    pub max_columns: usize,
    pub max_cell_width: usize,
}

impl From<&crate::config::OutputConfig> for TableLimits {
    fn from(config: &crate::config::OutputConfig) -> Self {
        Self {
            max_columns: config.max_columns.max(1),
            max_cell_width: config.max_cell_width.max(4),
        }
    }
}

/// Output writer that handles different output formats and colors
pub struct OutputWriter {
    format: OutputFormat,
    use_color: bool,
    show_progress: bool,
    quiet: bool,
    verbose: u8,
    writer: Box<dyn Write>,
}

impl OutputWriter {
    /// Create a new output writer on stdout
    pub fn new(format: OutputFormat, use_color: bool, quiet: bool, verbose: u8) -> Self {
        Self {
            format,
            use_color,
            show_progress: !quiet && std::io::stdout().is_terminal(),
            quiet,
            verbose,
            writer: Box::new(io::stdout()),
        }
    }

    /// Create an output writer with a custom writer
    pub fn with_writer(
        format: OutputFormat,
        use_color: bool,
        quiet: bool,
        verbose: u8,
        writer: Box<dyn Write>,
    ) -> Self {
        Self {
            format,
            use_color,
            show_progress: false,
            quiet,
            verbose,
            writer,
        }
    }

    pub fn is_human(&self) -> bool {
        self.format == OutputFormat::Human
    }

    /// Write raw output
    pub fn write(&mut self, content: &str) -> Result<()> {
        write!(self.writer, "{}", content)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Write a line of output
    pub fn writeln(&mut self, content: &str) -> Result<()> {
        writeln!(self.writer, "{}", content)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Write an info message
    pub fn info(&mut self, message: &str) -> Result<()> {
        debug!("Output info: {}", message);

        if self.quiet || !self.is_human() {
            return Ok(());
        }

        if self.use_color {
            self.writeln(&format!("{} {}", "ℹ".blue(), message))
        } else {
            self.writeln(&format!("INFO: {}", message))
        }
    }

    /// Write a success message
    pub fn success(&mut self, message: &str) -> Result<()> {
        if self.quiet || !self.is_human() {
            return Ok(());
        }

        if self.use_color {
            self.writeln(&message.green().to_string())
        } else {
            self.writeln(message)
        }
    }

    /// Write a warning message
    pub fn warning(&mut self, message: &str) -> Result<()> {
        if !self.is_human() {
            return Ok(());
        }

        if self.use_color {
            self.writeln(&message.yellow().to_string())
        } else {
            self.writeln(&format!("WARNING: {}", message))
        }
    }

    /// Write a section header
    pub fn section(&mut self, title: &str) -> Result<()> {
        if self.quiet || !self.is_human() {
            return Ok(());
        }

        self.writeln("")?;
        if self.use_color {
            self.writeln(&format!("═══ {} ═══", title).bright_blue().to_string())
        } else {
            self.writeln(&format!("=== {} ===", title))
        }
    }

    /// Write a `key: value` line in human mode
    pub fn field(&mut self, key: &str, value: &str) -> Result<()> {
        if !self.is_human() {
            return Ok(());
        }

        if self.use_color {
            self.writeln(&format!("  {:<18} {}", format!("{}:", key).bold(), value))
        } else {
            self.writeln(&format!("  {:<18} {}", format!("{}:", key), value))
        }
    }

    /// Write data in the configured format
    pub fn data<T: Serialize>(&mut self, value: &T) -> Result<()> {
        if self.verbose > 1 {
            let mut value_json = serde_json::to_value(value)?;
            redaction::redact_json_value(&mut value_json);
            trace!(
                "Outputting data: {}",
                serde_json::to_string(&value_json).unwrap_or_else(|_| "[failed to serialize]".to_string())
            );
        }

        let formatted = self.format.format(value)?;

        if self.format == OutputFormat::Yaml {
            // already newline-terminated
            self.write(&formatted)
        } else {
            self.writeln(&formatted)
        }
    }

    /// Write a list of records
    ///
    /// Human mode renders a table followed by a pagination line; the other
    /// formats serialize `{data, pagination}` or the bare array.
    pub fn records(
        &mut self,
        records: &[Value],
        pagination: Option<&Pagination>,
        limits: TableLimits,
    ) -> Result<()> {
        if !self.is_human() {
            return match pagination {
                Some(pagination) => self.data(&serde_json::json!({
                    "data": records,
                    "pagination": pagination,
                })),
                None => self.data(&records),
            };
        }

        if records.is_empty() {
            self.info("No records")?;
        } else {
            let (headers, rows) = records_table(records, limits);
            let headers: Vec<&str> = headers.iter().map(String::as_str).collect();
            self.table(&headers, rows)?;
        }

        if let Some(p) = pagination {
            let shown = records.len() as u64;
            let line = if shown == 0 {
                format!("0 of {} (offset {})", p.total, p.offset)
            } else {
                format!(
                    "{}-{} of {}{}",
                    p.offset + 1,
                    p.offset + shown,
                    p.total,
                    if p.has_more { ", more available" } else { "" }
                )
            };
            if self.use_color {
                self.writeln(&line.dimmed().to_string())?;
            } else {
                self.writeln(&line)?;
            }
        }

        Ok(())
    }

    /// Write a single record; human mode prints one field per line
    pub fn record(&mut self, record: &Value, limits: TableLimits) -> Result<()> {
        match record {
            Value::Object(map) if self.is_human() => {
                for (key, value) in map {
                    self.field(key, &cell_text(value, limits.max_cell_width.saturating_mul(2)))?;
                }
                Ok(())
            }
            _ => self.data(record),
        }
    }

    /// Write the record a create or update returned, if it returned one
    pub fn written(&mut self, record: Option<&Value>, limits: TableLimits) -> Result<()> {
        match record {
            Some(record) => self.record(record, limits),
            None if self.is_human() => self.info("No record returned"),
            None => self.data(&Value::Null),
        }
    }

    /// Create a spinner for indeterminate progress
    pub fn spinner(&self, message: &str) -> Option<ProgressBar> {
        if !self.show_progress || !self.is_human() {
            return None;
        }

        let pb = ProgressBar::new_spinner();
        pb.set_style(default_spinner_style());
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    }

    /// Write a table (for human format)
    pub fn table(&mut self, headers: &[&str], rows: Vec<Vec<String>>) -> Result<()> {
        if self.quiet || !self.is_human() {
            return Ok(());
        }

        let mut widths = headers.iter().map(|h| h.chars().count()).collect::<Vec<_>>();
        for row in &rows {
            for (i, cell) in row.iter().enumerate() {
                if i < widths.len() {
                    widths[i] = widths[i].max(cell.chars().count());
                }
            }
        }

        let header_row = headers
            .iter()
            .enumerate()
            .map(|(i, h)| format!("{:width$}", h, width = widths[i]))
            .collect::<Vec<_>>()
            .join(" │ ");

        if self.use_color {
            self.writeln(&header_row.bold().to_string())?;
        } else {
            self.writeln(&header_row)?;
        }

        let separator = widths
            .iter()
            .map(|w| "─".repeat(*w))
            .collect::<Vec<_>>()
            .join("─┼─");
        self.writeln(&separator)?;

        for row in rows {
            let row_str = row
                .iter()
                .enumerate()
                .map(|(i, cell)| match widths.get(i) {
                    Some(width) => format!("{:width$}", cell, width = *width),
                    None => cell.clone(),
                })
                .collect::<Vec<_>>()
                .join(" │ ");
            self.writeln(row_str.trim_end())?;
        }

        Ok(())
    }
}

/// Build table headers and rows from a list of JSON records
///
/// `id` leads when present; remaining keys follow in first-seen order.
/// Non-object records land in a single `value` column.
pub fn records_table(records: &[Value], limits: TableLimits) -> (Vec<String>, Vec<Vec<String>>) {
    let mut headers: Vec<String> = Vec::new();
    let has_id = records
        .iter()
        .any(|r| r.as_object().is_some_and(|m| m.contains_key("id")));
    if has_id {
        headers.push("id".to_string());
    }

    for record in records {
        match record.as_object() {
            Some(map) => {
                for key in map.keys() {
                    if !headers.iter().any(|h| h == key) {
                        headers.push(key.clone());
                    }
                }
            }
            None => {
                if !headers.iter().any(|h| h == "value") {
                    headers.push("value".to_string());
                }
            }
        }
    }
    headers.truncate(limits.max_columns);

    let rows = records
        .iter()
        .map(|record| {
            headers
                .iter()
                .map(|header| {
                    let cell = match record {
                        Value::Object(map) => map.get(header),
                        other if header == "value" => Some(other),
                        _ => None,
                    };
                    cell.map(|v| cell_text(v, limits.max_cell_width))
                        .unwrap_or_default()
                })
                .collect()
        })
        .collect();

    (headers, rows)
}

/// Render one JSON value as a table cell, truncated to `max_width` characters
pub fn cell_text(value: &Value, max_width: usize) -> String {
    let text = match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    let text = text.replace(['\n', '\r'], " ");

    if text.chars().count() <= max_width {
        return text;
    }
    let kept: String = text.chars().take(max_width.saturating_sub(1)).collect();
    format!("{}…", kept)
}

/// Helper function to create a spinner style
pub fn default_spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}
