//! Command-name contract for logging spans.

use crate::cli::parse::{Commands, PolicyCommands};

/// Dotted command name (e.g. "scan", "policy.set").
pub fn command_name(command: &Commands) -> String {
    match command {
        Commands::Plan { .. } => "plan".to_string(),
        Commands::Scan { .. } => "scan".to_string(),
        Commands::Watch { .. } => "watch".to_string(),
        Commands::Select { .. } => "select".to_string(),
        Commands::Flag { .. } => "flag".to_string(),
        Commands::Policy { command } => format!("policy.{}", policy_command_name(command)),
        Commands::History { .. } => "history".to_string(),
        Commands::Status { .. } => "status".to_string(),
        Commands::Config => "config".to_string(),
    }
}

pub fn policy_command_name(command: &PolicyCommands) -> &'static str {
    match command {
        PolicyCommands::Show => "show",
        PolicyCommands::Set { .. } => "set",
        PolicyCommands::Reset => "reset",
    }
}
