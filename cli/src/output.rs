//! Table formatting helpers for CLI output.

use comfy_table::{Cell, Color, ContentArrangement, Table};
use layerscan_engine::{ImageAnalysis, Severity};

/// Create a styled table with the given headers.
pub fn new_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.load_preset(comfy_table::presets::NOTHING);
    table.set_header(headers);
    table
}

/// Terminal color for a severity.
pub fn severity_color(severity: Severity) -> Color {
    match severity {
        Severity::Defcon1 | Severity::Critical => Color::Red,
        Severity::High => Color::DarkRed,
        Severity::Medium => Color::Yellow,
        Severity::Low => Color::Blue,
        Severity::Negligible | Severity::Unknown => Color::Grey,
    }
}

/// One row per analyzed layer, most recent first.
pub fn layers_table(analysis: &ImageAnalysis) -> Table {
    let mut table = new_table(&["LAYER", "PARENT", "FEATURES", "VULNERABILITIES"]);
    for layer in &analysis.layers {
        let vulnerabilities: usize = layer
            .features()
            .iter()
            .map(|f| f.vulnerabilities.len())
            .sum();
        table.add_row([
            layer.layer_name().to_string(),
            layer.parent_name().to_string(),
            layer.features().len().to_string(),
            vulnerabilities.to_string(),
        ]);
    }
    table
}

/// Distinct vulnerability count per severity, most severe first.
pub fn severity_table(analysis: &ImageAnalysis) -> Table {
    let mut table = new_table(&["SEVERITY", "COUNT"]);
    for (severity, count) in analysis.severity_counts() {
        table.add_row(vec![
            Cell::new(severity).fg(severity_color(severity)),
            Cell::new(count),
        ]);
    }
    table
}
