//! JSON output format for knot

use anyhow::Result;
use serde::Serialize;
use serde_json::{Map, Value};
use std::io::Write;

use super::Formatter;
use crate::core::{AnalysisReport, CycleRecord, HubRecord, SemanticResult};

/// Collects the sections into one object and writes it in the footer, so the
/// output is always a single valid JSON document.
pub struct JsonFormatter {
    document: Map<String, Value>,
}

impl Default for JsonFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonFormatter {
    pub fn new() -> Self {
        Self {
            document: Map::new(),
        }
    }

    fn insert(&mut self, key: &str, value: impl Serialize) -> Result<()> {
        self.document
            .insert(key.to_string(), serde_json::to_value(value)?);
        Ok(())
    }
}

impl Formatter for JsonFormatter {
    fn write_header(&mut self, _output: &mut dyn Write, report: &AnalysisReport) -> Result<()> {
        self.insert("run", report.run)?;
        self.insert("generated_at", report.generated_at)?;
        self.insert("stats", report.stats)?;
        self.insert("graph", &report.graph)
    }

    fn write_cycles(&mut self, _output: &mut dyn Write, cycles: &[CycleRecord]) -> Result<()> {
        self.insert("cycles", cycles)
    }

    fn write_hubs(&mut self, _output: &mut dyn Write, hubs: &[HubRecord]) -> Result<()> {
        self.insert("hubs", hubs)
    }

    fn write_semantic(
        &mut self,
        _output: &mut dyn Write,
        semantic: &SemanticResult,
    ) -> Result<()> {
        self.insert("semantic", semantic)
    }

    fn write_footer(&mut self, output: &mut dyn Write, report: &AnalysisReport) -> Result<()> {
        self.insert("skipped", &report.skipped)?;
        let document = Value::Object(std::mem::take(&mut self.document));
        serde_json::to_writer_pretty(&mut *output, &document)?;
        writeln!(output)?;
        Ok(())
    }
}
