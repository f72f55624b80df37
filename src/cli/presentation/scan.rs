//! Plan and scan presentation.

use crate::cli::presentation::shared::{format_section_heading, preview};
use crate::engine::{Action, Decision, ScanReport};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use serde_json::json;

fn action_label(action: Action) -> &'static str {
    match action {
        Action::Ignore => "ignore",
        Action::Classify => "classify",
        Action::Recurse => "recurse",
    }
}

pub fn format_plan_text(decisions: &[Decision<'_>]) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Node", "Role", "Length", "Rule", "Action"]);
    for decision in decisions {
        table.add_row(vec![
            format!("{}{}", "  ".repeat(decision.depth), decision.node.handle),
            decision.node.role.clone(),
            decision.node.content_len().to_string(),
            decision.reason.label().to_string(),
            action_label(decision.action()).to_string(),
        ]);
    }
    let calls = decisions
        .iter()
        .filter(|d| d.action() == Action::Classify)
        .count();
    format!(
        "{}\n\n{}\n\n{} node(s) visited, {} classification call(s)",
        format_section_heading("Redaction plan"),
        table,
        decisions.len(),
        calls
    )
}

pub fn format_plan_json(decisions: &[Decision<'_>]) -> String {
    let nodes: Vec<_> = decisions
        .iter()
        .map(|d| {
            json!({
                "handle": d.node.handle,
                "role": d.node.role,
                "depth": d.depth,
                "length": d.node.content_len(),
                "action": d.action(),
                "reason": d.reason,
            })
        })
        .collect();
    serde_json::to_string_pretty(&json!({ "decisions": nodes })).unwrap_or_else(|_| "{}".to_string())
}

pub fn format_scan_text(report: &ScanReport, snippets: &[(String, String)]) -> String {
    let mut out = format!("{}\n\n", format_section_heading("Scan"));
    out.push_str(&format!(
        "  Visited: {}\n  Classification calls: {}\n  Failed calls: {}\n  Duration: {} ms\n\n",
        report.visited, report.classified, report.failed, report.duration_ms
    ));
    if report.redacted.is_empty() {
        out.push_str("Nothing to redact.");
    } else {
        let mut table = Table::new();
        table.load_preset(UTF8_BORDERS_ONLY);
        table.set_header(vec!["Redacted node", "Content"]);
        for (handle, content) in snippets {
            table.add_row(vec![handle.clone(), preview(content, 60)]);
        }
        out.push_str(&table.to_string());
    }
    if !report.oversized.is_empty() {
        out.push_str(&format!(
            "\n\n{} leaf node(s) too large to classify: {}",
            report.oversized.len(),
            report
                .oversized
                .iter()
                .map(|h| h.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        ));
    }
    out
}

pub fn format_scan_json(report: &ScanReport) -> String {
    serde_json::to_string_pretty(report).unwrap_or_else(|_| "{}".to_string())
}
