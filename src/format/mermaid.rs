use anyhow::Result;
use std::collections::{HashMap, HashSet};
use std::io::Write;

use super::Formatter;
use crate::core::{AnalysisReport, CycleRecord, HubRecord, ModuleId, SemanticResult};
use crate::graph::DependencyGraph;

const MAX_NODES: usize = 200;

/// Mermaid flowchart of the import graph. Edges on a reported cycle are drawn
/// red, hub modules get a highlighted node style.
#[derive(Default)]
pub struct MermaidFormatter {
    graph: DependencyGraph,
    cycle_edges: HashSet<(ModuleId, ModuleId)>,
    hubs: HashSet<ModuleId>,
}

impl Formatter for MermaidFormatter {
    fn write_header(&mut self, _output: &mut dyn Write, report: &AnalysisReport) -> Result<()> {
        self.graph = report.graph.clone();
        Ok(())
    }

    fn write_cycles(&mut self, _output: &mut dyn Write, cycles: &[CycleRecord]) -> Result<()> {
        for cycle in cycles {
            for pair in cycle.path().windows(2) {
                self.cycle_edges.insert((pair[0].clone(), pair[1].clone()));
            }
        }
        Ok(())
    }

    fn write_hubs(&mut self, _output: &mut dyn Write, hubs: &[HubRecord]) -> Result<()> {
        self.hubs = hubs.iter().map(|h| h.module.clone()).collect();
        Ok(())
    }

    fn write_semantic(
        &mut self,
        _output: &mut dyn Write,
        _semantic: &SemanticResult,
    ) -> Result<()> {
        Ok(())
    }

    fn write_footer(&mut self, output: &mut dyn Write, _report: &AnalysisReport) -> Result<()> {
        writeln!(output, "{}", self.diagram())?;
        Ok(())
    }
}

impl MermaidFormatter {
    fn diagram(&self) -> String {
        let nodes = self.graph.nodes();

        // Safeguard: Limit node count
        if nodes.len() > MAX_NODES {
            return format!(
                "%% Graph too large to display ({} nodes). Limit is {}.",
                nodes.len(),
                MAX_NODES
            );
        }

        let mut lines = vec!["graph TD;".to_string()];

        let mut sorted_nodes = nodes;
        sorted_nodes.sort();
        let ids: HashMap<&ModuleId, String> = sorted_nodes
            .iter()
            .enumerate()
            .map(|(i, module)| (*module, format!("N{}", i)))
            .collect();

        for module in &sorted_nodes {
            lines.push(format!("    {}[\"{}\"];", ids[*module], escape(module)));
        }

        // Deduplicated; mermaid would draw repeated imports as parallel arrows
        let mut seen = HashSet::new();
        let mut red_links = Vec::new();
        for (from, targets) in self.graph.get_edges() {
            for to in targets {
                if !seen.insert((from, to)) {
                    continue;
                }
                if self.cycle_edges.contains(&(from.clone(), to.clone())) {
                    red_links.push(seen.len() - 1);
                }
                lines.push(format!("    {} --> {};", ids[from], ids[to]));
            }
        }

        if !red_links.is_empty() {
            let indices: Vec<String> = red_links.iter().map(usize::to_string).collect();
            lines.push(format!(
                "    linkStyle {} stroke:#d33,stroke-width:2px;",
                indices.join(",")
            ));
        }

        if !self.hubs.is_empty() {
            lines.push("    classDef hub fill:#fde68a,stroke:#b45309;".to_string());
            let mut hub_ids: Vec<&String> = self
                .hubs
                .iter()
                .filter_map(|h| ids.get(h))
                .collect();
            hub_ids.sort();
            let hub_ids: Vec<&str> = hub_ids.into_iter().map(String::as_str).collect();
            lines.push(format!("    class {} hub;", hub_ids.join(",")));
        }

        lines.join("\n")
    }
}

fn escape(label: &str) -> String {
    label.replace('"', "#quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::fixtures;

    #[test]
    fn test_mermaid_diagram() {
        let mut output = Vec::new();
        MermaidFormatter::default()
            .write_report(&mut output, &fixtures::report())
            .unwrap();
        let result = String::from_utf8(output).unwrap();

        assert!(result.starts_with("graph TD;"));
        // Nodes sorted: a=N0, b=N1, c=N2, util=N3
        assert!(result.contains("N0[\"src/a.ts\"];"));
        assert!(result.contains("N0 --> N1;"));
        assert!(result.contains("N1 --> N0;"));
        // Links in order: a->b (0), a->util (1), b->a (2), b->util (3), c->util (4)
        assert!(result.contains("linkStyle 0,2 stroke:#d33"));
        assert!(result.contains("class N3 hub;"));
    }

    #[test]
    fn test_large_graph_is_not_drawn() {
        let mut report = fixtures::report();
        let mut graph = DependencyGraph::new();
        for i in 0..=MAX_NODES {
            graph.add_module(format!("m{}.ts", i));
        }
        report.graph = graph;

        let mut output = Vec::new();
        MermaidFormatter::default()
            .write_report(&mut output, &report)
            .unwrap();
        assert!(String::from_utf8(output).unwrap().contains("Graph too large"));
    }
}
