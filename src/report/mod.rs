//! Executive report rendering.

pub mod export;
pub mod generator;

pub use export::{render_html, ExportOptions};
pub use generator::{generate_json_report, generate_markdown_report, write_report};

use crate::services::reports::ExecutiveReport;
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
    /// Print-ready HTML document
    Html,
}

impl ReportFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            ReportFormat::Markdown => "text/markdown; charset=utf-8",
            ReportFormat::Json => "application/json",
            ReportFormat::Html => "text/html; charset=utf-8",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Markdown => "md",
            ReportFormat::Json => "json",
            ReportFormat::Html => "html",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "markdown" | "md" => Some(ReportFormat::Markdown),
            "json" => Some(ReportFormat::Json),
            "html" => Some(ReportFormat::Html),
            _ => None,
        }
    }
}

/// Render a report in the requested format.
pub fn render(
    report: &ExecutiveReport,
    format: ReportFormat,
    options: &ExportOptions,
) -> Result<String> {
    match format {
        ReportFormat::Markdown => Ok(generate_markdown_report(report)),
        ReportFormat::Json => generate_json_report(report),
        ReportFormat::Html => Ok(render_html(report, options)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_format() {
        assert_eq!(ReportFormat::parse("MD"), Some(ReportFormat::Markdown));
        assert_eq!(ReportFormat::parse(" html "), Some(ReportFormat::Html));
        assert_eq!(ReportFormat::parse("pdf"), None);
    }
}
