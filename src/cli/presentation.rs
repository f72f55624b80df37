//! CLI presentation: text and json formatters per command family.

mod policy;
mod scan;
mod shared;

pub use policy::{
    format_flag_result, format_history_json, format_history_text, format_policy_text,
    format_status_json, format_status_text, StatusReport,
};
pub use scan::{format_plan_json, format_plan_text, format_scan_json, format_scan_text};
