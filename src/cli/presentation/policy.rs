//! Policy, history, flag and status presentation.

use crate::cli::presentation::shared::{format_section_heading, preview};
use crate::ingest::FlagOutcome;
use crate::policy::{FlaggedSample, FoldStats};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;
use serde::Serialize;
use serde_json::json;

pub fn format_policy_text(policy: &str, is_default: bool) -> String {
    let source = if is_default {
        "built-in default"
    } else {
        "learned"
    };
    format!(
        "{} ({})\n\n{}",
        format_section_heading("Policy"),
        source,
        policy
    )
}

pub fn format_history_text(samples: &[FlaggedSample]) -> String {
    if samples.is_empty() {
        return "No flagged samples.".to_string();
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Flagged at", "Length", "Content"]);
    for sample in samples {
        table.add_row(vec![
            sample.timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            sample.content.chars().count().to_string(),
            preview(&sample.content, 60),
        ]);
    }
    format!("{}\n\nTotal: {} sample(s)", table, samples.len())
}

pub fn format_history_json(samples: &[FlaggedSample]) -> String {
    serde_json::to_string_pretty(&json!({ "samples": samples, "total": samples.len() }))
        .unwrap_or_else(|_| "{}".to_string())
}

pub fn format_flag_result(outcome: &FlagOutcome, stats: &FoldStats, policy: &str) -> String {
    if !outcome.enqueued {
        return "Nothing to flag (selection is blank).".to_string();
    }
    let mut out = String::new();
    out.push_str(if outcome.recorded {
        "Sample recorded in history and queued for folding.\n"
    } else {
        "Sample queued for folding (too short to keep in history).\n"
    });
    if stats.abandoned > 0 {
        out.push_str(&format!(
            "{} {} sample(s) could not be folded; policy unchanged by them.\n",
            "warning:".yellow().bold(),
            stats.abandoned
        ));
    }
    out.push_str(&format!("\n{}\n\n{}", format_section_heading("Policy"), policy));
    out
}

/// Data for `veil status`
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub policy_chars: usize,
    pub policy_is_default: bool,
    pub flagged_samples: usize,
    pub api_url: String,
    pub api_key_configured: bool,
    pub classify_model: String,
    pub policy_model: String,
    pub state_path: String,
}

pub fn format_status_text(status: &StatusReport) -> String {
    let mut out = format!("{}\n\n", format_section_heading("Status"));
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.add_row(vec![
        "Policy".to_string(),
        format!(
            "{} chars ({})",
            status.policy_chars,
            if status.policy_is_default {
                "default"
            } else {
                "learned"
            }
        ),
    ]);
    table.add_row(vec![
        "Flagged samples".to_string(),
        status.flagged_samples.to_string(),
    ]);
    table.add_row(vec!["Endpoint".to_string(), status.api_url.clone()]);
    let key = if status.api_key_configured {
        format!("{}", "configured".green())
    } else {
        format!("{}", "missing".red())
    };
    table.add_row(vec!["API key".to_string(), key]);
    table.add_row(vec![
        "Classify model".to_string(),
        status.classify_model.clone(),
    ]);
    table.add_row(vec!["Policy model".to_string(), status.policy_model.clone()]);
    table.add_row(vec!["State".to_string(), status.state_path.clone()]);
    out.push_str(&table.to_string());
    out
}

pub fn format_status_json(status: &StatusReport) -> String {
    serde_json::to_string_pretty(status).unwrap_or_else(|_| "{}".to_string())
}
