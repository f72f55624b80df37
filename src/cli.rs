//! CLI domain: parse, route, help, output, and presentation only.
//! No domain orchestration; single route table dispatches to domain services.

mod help;
mod output;
mod parse;
mod presentation;
mod route;

pub use help::{command_name, policy_command_name};
pub use output::map_error;
pub use parse::{Cli, Commands, PolicyCommands};
pub use presentation::{
    format_flag_result, format_history_json, format_history_text, format_plan_json,
    format_plan_text, format_policy_text, format_scan_json, format_scan_text, format_status_json,
    format_status_text, StatusReport,
};
pub use route::RunContext;
