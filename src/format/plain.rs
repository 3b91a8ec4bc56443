//! Plain text output format for knot

use anyhow::Result;
use std::io::Write;

use super::Formatter;
use crate::core::{AnalysisReport, CycleRecord, HubRecord, SemanticResult};

pub struct PlainFormatter;

impl Formatter for PlainFormatter {
    fn write_header(&mut self, output: &mut dyn Write, report: &AnalysisReport) -> Result<()> {
        writeln!(output, "=== DEPENDENCY ANALYSIS (run {}) ===", report.run)?;
        writeln!(output, "Generated: {}", report.generated_at.to_rfc3339())?;
        writeln!(
            output,
            "Modules: {}  Edges: {}  Unscanned targets: {}",
            report.stats.modules, report.stats.edges, report.stats.dangling
        )?;
        writeln!(output)?;
        Ok(())
    }

    fn write_cycles(&mut self, output: &mut dyn Write, cycles: &[CycleRecord]) -> Result<()> {
        writeln!(output, "=== CIRCULAR DEPENDENCIES ({}) ===", cycles.len())?;
        if cycles.is_empty() {
            writeln!(output, "None found.")?;
        }
        for cycle in cycles {
            writeln!(output, "- {}", cycle)?;
        }
        writeln!(output)?;
        Ok(())
    }

    fn write_hubs(&mut self, output: &mut dyn Write, hubs: &[HubRecord]) -> Result<()> {
        writeln!(output, "=== HUB MODULES ({}) ===", hubs.len())?;
        if hubs.is_empty() {
            writeln!(output, "None found.")?;
        }
        for hub in hubs {
            writeln!(
                output,
                "- {} <- {} importers",
                hub.module,
                hub.importer_count()
            )?;
            for importer in &hub.importers {
                writeln!(output, "    {}", importer)?;
            }
        }
        writeln!(output)?;
        Ok(())
    }

    fn write_semantic(
        &mut self,
        output: &mut dyn Write,
        semantic: &SemanticResult,
    ) -> Result<()> {
        if semantic.is_empty() {
            return Ok(());
        }
        writeln!(output, "=== SEMANTIC REVIEW ===")?;
        for cycle in &semantic.cycles {
            writeln!(output, "Cycle {}", cycle.path.join(" -> "))?;
            writeln!(output, "  {}", cycle.reason)?;
        }
        for hub in &semantic.hubs {
            writeln!(output, "Hub {}", hub.module)?;
            writeln!(output, "  {}", hub.recommendation)?;
        }
        if !semantic.suggestions.is_empty() {
            writeln!(output, "Suggestions:")?;
            for suggestion in &semantic.suggestions {
                writeln!(output, "  * {}", suggestion)?;
            }
        }
        writeln!(output)?;
        Ok(())
    }

    fn write_footer(&mut self, output: &mut dyn Write, report: &AnalysisReport) -> Result<()> {
        if !report.skipped.is_empty() {
            writeln!(output, "=== SKIPPED FILES ===")?;
            for file in &report.skipped {
                writeln!(output, "- {} ({})", file.id, file.reason)?;
            }
            writeln!(output)?;
        }
        writeln!(output, "=== END OF REPORT ===")?;
        Ok(())
    }
}
