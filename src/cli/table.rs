//! Table formatting utilities for CLI list commands
//!
//! This module provides a unified table output system that eliminates
//! duplicated formatting code across the entity commands. Cells carry a
//! typed value so each output format can decide how to color, truncate
//! or escape it.

use chrono::{DateTime, Local, NaiveDate, Utc};
use console::style;

use crate::analytics::health::{HealthStatus, RiskLevel};
use crate::analytics::zones::Zone;
use crate::cli::helpers::{escape_csv, truncate_str};
use crate::cli::OutputFormat;
use crate::core::entity::{Criticality, Status};
use crate::core::shortid::ShortIdIndex;

/// Configuration for table output
#[derive(Debug, Clone)]
pub struct TableConfig {
    /// Show summary line after table (e.g., "5 equipment(s) found")
    pub show_summary: bool,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self { show_summary: true }
    }
}

impl TableConfig {
    /// Create config optimized for piping (no summary)
    pub fn for_pipe() -> Self {
        Self {
            show_summary: false,
        }
    }
}

/// A typed cell value with semantic meaning for formatting
#[derive(Debug, Clone)]
pub enum CellValue {
    /// Entity ID (truncated, cyan colored)
    Id(String),
    /// Plain text, optionally truncated
    Text(String),
    /// Operational status with color coding
    Status(Status),
    /// Equipment criticality with color coding
    Criticality(Criticality),
    /// Vibration severity zone with color coding (A=green .. D=red)
    Zone(Option<Zone>),
    /// Health status with color coding
    Health(Option<HealthStatus>),
    /// Risk level with color coding
    Risk(Option<RiskLevel>),
    /// Entity type or category
    Type(String),
    /// Calendar date
    Day(NaiveDate),
    /// DateTime displayed as date only
    Date(DateTime<Utc>),
    /// DateTime displayed with time
    DateTime(DateTime<Utc>),
    /// Numeric value
    Number(i64),
    /// Float value with precision
    Float(f64, usize),
    /// Optional float value with precision ("-" if None)
    OptionalFloat(Option<f64>, usize),
    /// Tags/labels as comma-separated
    Tags(Vec<String>),
    /// Empty/placeholder
    Empty,
}

impl CellValue {
    /// Format for TSV output (with colors if terminal)
    pub fn format_tsv(&self, width: usize) -> String {
        match self {
            CellValue::Id(id) => {
                let display = if id.len() > 16 {
                    format!("{}...", &id[..13])
                } else {
                    id.clone()
                };
                format!("{:<width$}", style(&display).cyan(), width = width)
            }
            CellValue::Text(s) => {
                let truncated = truncate_str(s, width.saturating_sub(2));
                format!("{:<width$}", truncated, width = width)
            }
            CellValue::Status(status) => {
                let s = status.to_string();
                let styled = match status {
                    Status::Active => style(&s).green(),
                    Status::Standby => style(&s).dim(),
                    Status::Maintenance => style(&s).yellow(),
                    Status::Decommissioned => style(&s).red().dim(),
                };
                format!("{:<width$}", styled, width = width)
            }
            CellValue::Criticality(criticality) => {
                let s = criticality.to_string();
                let styled = match criticality {
                    Criticality::Low => style(&s).dim(),
                    Criticality::Medium => style(&s).white(),
                    Criticality::High => style(&s).yellow(),
                    Criticality::Critical => style(&s).red().bold(),
                };
                format!("{:<width$}", styled, width = width)
            }
            CellValue::Zone(opt) => {
                let styled = match opt {
                    Some(Zone::A) => style("A".to_string()).green(),
                    Some(Zone::B) => style("B".to_string()).yellow(),
                    Some(Zone::C) => style("C".to_string()).magenta(),
                    Some(Zone::D) => style("D".to_string()).red().bold(),
                    None => style("-".to_string()).dim(),
                };
                format!("{:<width$}", styled, width = width)
            }
            CellValue::Health(opt) => {
                let styled = match opt {
                    Some(HealthStatus::Excellent) => style("excellent".to_string()).green().bold(),
                    Some(HealthStatus::Good) => style("good".to_string()).green(),
                    Some(HealthStatus::Fair) => style("fair".to_string()).yellow(),
                    Some(HealthStatus::Poor) => style("poor".to_string()).red(),
                    Some(HealthStatus::Critical) => style("critical".to_string()).red().bold(),
                    None => style("-".to_string()).dim(),
                };
                format!("{:<width$}", styled, width = width)
            }
            CellValue::Risk(opt) => {
                let styled = match opt {
                    Some(RiskLevel::Low) => style("low".to_string()).green(),
                    Some(RiskLevel::Medium) => style("medium".to_string()).yellow(),
                    Some(RiskLevel::High) => style("high".to_string()).red(),
                    Some(RiskLevel::Critical) => style("critical".to_string()).red().bold(),
                    None => style("-".to_string()).dim(),
                };
                format!("{:<width$}", styled, width = width)
            }
            CellValue::Type(t) => {
                format!(
                    "{:<width$}",
                    truncate_str(t, width.saturating_sub(2)),
                    width = width
                )
            }
            CellValue::Day(d) => {
                format!("{:<width$}", d.format("%Y-%m-%d"), width = width)
            }
            CellValue::Date(dt) => {
                let local: DateTime<Local> = dt.with_timezone(&Local);
                format!("{:<width$}", local.format("%Y-%m-%d"), width = width)
            }
            CellValue::DateTime(dt) => {
                let local: DateTime<Local> = dt.with_timezone(&Local);
                format!("{:<width$}", local.format("%Y-%m-%d %H:%M"), width = width)
            }
            CellValue::Number(n) => {
                format!("{:>width$}", n, width = width)
            }
            CellValue::Float(f, precision) => {
                format!("{:>width$.prec$}", f, width = width, prec = precision)
            }
            CellValue::OptionalFloat(opt, precision) => match opt {
                Some(f) => format!("{:>width$.prec$}", f, width = width, prec = precision),
                None => format!("{:>width$}", "-", width = width),
            },
            CellValue::Tags(tags) => {
                let joined = tags.join(", ");
                format!(
                    "{:<width$}",
                    truncate_str(&joined, width.saturating_sub(2)),
                    width = width
                )
            }
            CellValue::Empty => format!("{:<width$}", "-", width = width),
        }
    }

    /// Format for CSV output (RFC 4180, no colors)
    pub fn format_csv(&self) -> String {
        match self {
            CellValue::Id(id) => escape_csv(id),
            CellValue::Text(s) => escape_csv(s),
            CellValue::Status(status) => status.to_string(),
            CellValue::Criticality(criticality) => criticality.to_string(),
            CellValue::Zone(opt) => opt.map(|z| z.to_string()).unwrap_or_default(),
            CellValue::Health(opt) => opt.map(|h| h.to_string()).unwrap_or_default(),
            CellValue::Risk(opt) => opt.map(|r| r.to_string()).unwrap_or_default(),
            CellValue::Type(t) => escape_csv(t),
            CellValue::Day(d) => d.format("%Y-%m-%d").to_string(),
            CellValue::Date(dt) => {
                let local: DateTime<Local> = dt.with_timezone(&Local);
                local.format("%Y-%m-%d").to_string()
            }
            CellValue::DateTime(dt) => {
                let local: DateTime<Local> = dt.with_timezone(&Local);
                local.format("%Y-%m-%dT%H:%M:%S").to_string()
            }
            CellValue::Number(n) => n.to_string(),
            CellValue::Float(f, precision) => format!("{:.prec$}", f, prec = precision),
            CellValue::OptionalFloat(opt, precision) => opt
                .map(|f| format!("{:.prec$}", f, prec = precision))
                .unwrap_or_default(),
            CellValue::Tags(tags) => escape_csv(&tags.join(", ")),
            CellValue::Empty => String::new(),
        }
    }

    /// Format for Markdown output (no colors, escaped pipes)
    pub fn format_md(&self) -> String {
        let raw = match self {
            CellValue::Id(id) => id.clone(),
            CellValue::Text(s) => s.clone(),
            CellValue::Status(status) => status.to_string(),
            CellValue::Criticality(criticality) => criticality.to_string(),
            CellValue::Zone(opt) => opt.map(|z| z.to_string()).unwrap_or_else(|| "-".to_string()),
            CellValue::Health(opt) => opt.map(|h| h.to_string()).unwrap_or_else(|| "-".to_string()),
            CellValue::Risk(opt) => opt.map(|r| r.to_string()).unwrap_or_else(|| "-".to_string()),
            CellValue::Type(t) => t.clone(),
            CellValue::Day(d) => d.format("%Y-%m-%d").to_string(),
            CellValue::Date(dt) => {
                let local: DateTime<Local> = dt.with_timezone(&Local);
                local.format("%Y-%m-%d").to_string()
            }
            CellValue::DateTime(dt) => {
                let local: DateTime<Local> = dt.with_timezone(&Local);
                local.format("%Y-%m-%d %H:%M").to_string()
            }
            CellValue::Number(n) => n.to_string(),
            CellValue::Float(f, precision) => format!("{:.prec$}", f, prec = precision),
            CellValue::OptionalFloat(opt, precision) => opt
                .map(|f| format!("{:.prec$}", f, prec = precision))
                .unwrap_or_else(|| "-".to_string()),
            CellValue::Tags(tags) => tags.join(", "),
            CellValue::Empty => "-".to_string(),
        };
        // Escape pipe characters for markdown tables
        raw.replace('|', "\\|")
    }

    /// Get raw string value (no formatting, for ID output)
    pub fn raw(&self) -> String {
        match self {
            CellValue::Id(id) => id.clone(),
            CellValue::Text(s) => s.clone(),
            CellValue::Status(status) => status.to_string(),
            CellValue::Criticality(criticality) => criticality.to_string(),
            CellValue::Zone(opt) => opt.map(|z| z.to_string()).unwrap_or_default(),
            CellValue::Health(opt) => opt.map(|h| h.to_string()).unwrap_or_default(),
            CellValue::Risk(opt) => opt.map(|r| r.to_string()).unwrap_or_default(),
            CellValue::Type(t) => t.clone(),
            CellValue::Day(d) => d.format("%Y-%m-%d").to_string(),
            CellValue::Date(dt) => {
                let local: DateTime<Local> = dt.with_timezone(&Local);
                local.format("%Y-%m-%d").to_string()
            }
            CellValue::DateTime(dt) => {
                let local: DateTime<Local> = dt.with_timezone(&Local);
                local.format("%Y-%m-%dT%H:%M:%S").to_string()
            }
            CellValue::Number(n) => n.to_string(),
            CellValue::Float(f, precision) => format!("{:.prec$}", f, prec = precision),
            CellValue::OptionalFloat(opt, precision) => opt
                .map(|f| format!("{:.prec$}", f, prec = precision))
                .unwrap_or_default(),
            CellValue::Tags(tags) => tags.join(", "),
            CellValue::Empty => String::new(),
        }
    }

    /// Get the display width of this cell's content (for dynamic column sizing)
    pub fn display_width(&self) -> usize {
        match self {
            CellValue::Id(id) => id.len().min(16), // IDs are truncated to 16
            CellValue::Text(s) => s.len(),
            CellValue::Status(status) => status.to_string().len(),
            CellValue::Criticality(criticality) => criticality.to_string().len(),
            CellValue::Zone(_) => 1,
            CellValue::Health(opt) => opt.map_or(1, |h| h.to_string().len()),
            CellValue::Risk(opt) => opt.map_or(1, |r| r.to_string().len()),
            CellValue::Type(t) => t.len(),
            CellValue::Day(_) => 10,      // "YYYY-MM-DD"
            CellValue::Date(_) => 10,     // "YYYY-MM-DD"
            CellValue::DateTime(_) => 16, // "YYYY-MM-DD HH:MM"
            CellValue::Number(n) => n.to_string().len(),
            CellValue::Float(f, precision) => format!("{:.prec$}", f, prec = precision).len(),
            CellValue::OptionalFloat(opt, precision) => {
                opt.map_or(1, |f| format!("{:.prec$}", f, prec = precision).len())
            }
            CellValue::Tags(tags) => tags.join(", ").len(),
            CellValue::Empty => 1,
        }
    }
}

/// Column definition with header label and width
#[derive(Debug, Clone)]
pub struct ColumnDef {
    pub key: &'static str,
    pub header: &'static str,
    pub width: usize,
}

impl ColumnDef {
    pub const fn new(key: &'static str, header: &'static str, width: usize) -> Self {
        Self { key, header, width }
    }
}

/// A row of cell values for table output
pub struct TableRow {
    pub short_id: String,
    pub full_id: String,
    pub cells: Vec<(&'static str, CellValue)>,
}

impl TableRow {
    pub fn new(full_id: String, short_ids: &ShortIdIndex) -> Self {
        let short_id = short_ids
            .get_short_id(&full_id)
            .map(|n| format!("@{}", n))
            .unwrap_or_default();
        Self {
            short_id,
            full_id,
            cells: Vec::new(),
        }
    }

    pub fn cell(mut self, key: &'static str, value: CellValue) -> Self {
        self.cells.push((key, value));
        self
    }

    pub fn get(&self, key: &str) -> Option<&CellValue> {
        self.cells.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }
}

/// Table formatter that outputs rows in various formats
pub struct TableFormatter<'a> {
    columns: &'a [ColumnDef],
    entity_name: &'static str,
    entity_prefix: &'static str,
    config: TableConfig,
}

impl<'a> TableFormatter<'a> {
    pub fn new(
        columns: &'a [ColumnDef],
        entity_name: &'static str,
        entity_prefix: &'static str,
    ) -> Self {
        Self {
            columns,
            entity_name,
            entity_prefix,
            config: TableConfig::default(),
        }
    }

    /// Configure the formatter with custom settings
    pub fn with_config(mut self, config: TableConfig) -> Self {
        self.config = config;
        self
    }

    /// Output rows in the specified format
    pub fn output<I>(&self, rows: I, format: OutputFormat, visible_columns: &[&str])
    where
        I: IntoIterator<Item = TableRow>,
    {
        let rows: Vec<TableRow> = rows.into_iter().collect();

        match format {
            OutputFormat::Tsv => self.output_tsv(&rows, visible_columns),
            OutputFormat::Csv => self.output_csv(&rows, visible_columns),
            OutputFormat::Md => self.output_md(&rows, visible_columns),
            OutputFormat::Id => self.output_ids(&rows),
            _ => self.output_tsv(&rows, visible_columns),
        }
    }

    /// Calculate dynamic column widths based on actual content
    fn calculate_widths(&self, rows: &[TableRow], visible_columns: &[&str]) -> Vec<usize> {
        let mut widths = Vec::new();

        // SHORT column - find max short ID length, min 5 for header
        let short_width = rows
            .iter()
            .map(|r| r.short_id.len())
            .max()
            .unwrap_or(5)
            .max(5); // "SHORT" header
        widths.push(short_width);

        // Other columns
        for col in self.columns {
            if visible_columns.contains(&col.key) {
                let header_len = col.header.len();
                let max_content = rows
                    .iter()
                    .filter_map(|r| r.get(col.key))
                    .map(|v| v.display_width())
                    .max()
                    .unwrap_or(0);

                // Truncation keeps 2 chars of slack, so size content+2 but
                // cap at the defined width to prevent excessive expansion
                let content_with_buffer = max_content.saturating_add(2);
                let natural_width = header_len.max(content_with_buffer);
                let width = natural_width.min(col.width);
                widths.push(width);
            }
        }

        widths
    }

    fn output_tsv(&self, rows: &[TableRow], visible_columns: &[&str]) {
        let widths = self.calculate_widths(rows, visible_columns);

        // Header row - always start with SHORT
        let mut header_parts = vec![format!(
            "{:<width$}",
            style("SHORT").bold().dim(),
            width = widths[0]
        )];
        let mut width_idx = 1;

        for col in self.columns {
            if visible_columns.contains(&col.key) {
                header_parts.push(format!(
                    "{:<width$}",
                    style(col.header).bold(),
                    width = widths[width_idx]
                ));
                width_idx += 1;
            }
        }
        println!("{}", header_parts.join(" "));

        // Separator
        let total_width: usize = widths.iter().sum::<usize>() + widths.len() - 1;
        println!("{}", "-".repeat(total_width));

        // Data rows
        for row in rows {
            let mut row_parts = vec![format!(
                "{:<width$}",
                style(&row.short_id).cyan(),
                width = widths[0]
            )];
            let mut width_idx = 1;

            for col in self.columns {
                if visible_columns.contains(&col.key) {
                    let w = widths[width_idx];
                    if let Some(value) = row.get(col.key) {
                        row_parts.push(value.format_tsv(w));
                    } else {
                        row_parts.push(format!("{:<width$}", "-", width = w));
                    }
                    width_idx += 1;
                }
            }
            println!("{}", row_parts.join(" "));
        }

        // Summary (unless disabled for piping)
        if self.config.show_summary {
            println!();
            println!(
                "{} {}(s) found. Use {} to reference by short ID.",
                style(rows.len()).cyan(),
                self.entity_name,
                style(format!("{}@N", self.entity_prefix)).cyan()
            );
        }
    }

    fn output_csv(&self, rows: &[TableRow], visible_columns: &[&str]) {
        // Header row
        let mut headers = vec!["short_id".to_string(), "id".to_string()];
        for col in self.columns {
            if visible_columns.contains(&col.key) {
                headers.push(col.key.to_string());
            }
        }
        println!("{}", headers.join(","));

        // Data rows
        for row in rows {
            let mut values = vec![escape_csv(&row.short_id), escape_csv(&row.full_id)];
            for col in self.columns {
                if visible_columns.contains(&col.key) {
                    if let Some(value) = row.get(col.key) {
                        values.push(value.format_csv());
                    } else {
                        values.push(String::new());
                    }
                }
            }
            println!("{}", values.join(","));
        }
    }

    fn output_md(&self, rows: &[TableRow], visible_columns: &[&str]) {
        // Header row
        let mut headers = vec!["Short".to_string(), "ID".to_string()];
        for col in self.columns {
            if visible_columns.contains(&col.key) {
                headers.push(col.header.to_string());
            }
        }
        println!("| {} |", headers.join(" | "));

        // Separator
        let separators: Vec<&str> = headers.iter().map(|_| "---").collect();
        println!("|{}|", separators.join("|"));

        // Data rows
        for row in rows {
            let mut values = vec![row.short_id.clone(), row.full_id.clone()];
            for col in self.columns {
                if visible_columns.contains(&col.key) {
                    if let Some(value) = row.get(col.key) {
                        values.push(value.format_md());
                    } else {
                        values.push("-".to_string());
                    }
                }
            }
            println!("| {} |", values.join(" | "));
        }
    }

    fn output_ids(&self, rows: &[TableRow]) {
        for row in rows {
            println!("{}", row.full_id);
        }
    }
}
