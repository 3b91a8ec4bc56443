//! Output format modules for knot

pub mod json;
pub mod mermaid;
pub mod plain;

use anyhow::Result;
use std::io::Write;

use crate::config::OutputFormat;
use crate::core::{AnalysisReport, CycleRecord, HubRecord, SemanticResult};

pub trait Formatter {
    fn write_header(&mut self, output: &mut dyn Write, report: &AnalysisReport) -> Result<()>;

    fn write_cycles(&mut self, output: &mut dyn Write, cycles: &[CycleRecord]) -> Result<()>;

    fn write_hubs(&mut self, output: &mut dyn Write, hubs: &[HubRecord]) -> Result<()>;

    fn write_semantic(&mut self, output: &mut dyn Write, semantic: &SemanticResult)
    -> Result<()>;

    fn write_footer(&mut self, output: &mut dyn Write, report: &AnalysisReport) -> Result<()>;

    /// Writes every section in order.
    fn write_report(&mut self, output: &mut dyn Write, report: &AnalysisReport) -> Result<()> {
        self.write_header(output, report)?;
        self.write_cycles(output, &report.heuristic.cycles)?;
        self.write_hubs(output, &report.heuristic.hubs)?;
        self.write_semantic(output, &report.semantic)?;
        self.write_footer(output, report)
    }
}

pub fn create_formatter(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Plain => Box::new(plain::PlainFormatter),
        OutputFormat::Json => Box::new(json::JsonFormatter::new()),
        OutputFormat::Mermaid => Box::new(mermaid::MermaidFormatter::default()),
    }
}

/// Renders a whole report into a string.
pub fn render(format: OutputFormat, report: &AnalysisReport) -> Result<String> {
    let mut buffer = Vec::new();
    create_formatter(format).write_report(&mut buffer, report)?;
    Ok(String::from_utf8(buffer)?)
}
