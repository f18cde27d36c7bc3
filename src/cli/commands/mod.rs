//! Command execution coordinating the publish flow.
//!
//! Each subcommand maps to one executor; this module dispatches, translates
//! errors into exit codes, and surfaces recovery suggestions.

mod check;
mod helpers;
mod info;
mod publish;

use crate::cli::{Args, Command, RuntimeConfig};
use crate::error::Result;

use check::execute_check;
use info::execute_info;
use publish::execute_publish;

/// Execute the main command based on parsed arguments
pub async fn execute_command(args: Args) -> Result<i32> {
    // Validate arguments
    if let Err(validation_error) = args.validate() {
        // Create output for validation errors (never quiet)
        let output = super::OutputManager::new(false, false);
        output.error(&format!("Invalid arguments: {validation_error}"));
        return Ok(1);
    }

    let config = RuntimeConfig::from(&args);

    let result = match &args.command {
        Command::Check { .. } => execute_check(&args, &config).await,
        Command::Publish { .. } => execute_publish(&args, &config).await,
        Command::Info { .. } => execute_info(&args, &config).await,
    };

    match result {
        Ok(exit_code) => Ok(exit_code),
        Err(e) => {
            config.error_println(&format!("Command '{}' failed: {e}", args.command.name()));

            if e.is_recoverable() && !config.is_quiet() {
                let suggestions = e.recovery_suggestions();
                if !suggestions.is_empty() {
                    config.println("\n💡 Recovery suggestions:");
                    for suggestion in suggestions {
                        config.indent(&format!("• {suggestion}"));
                    }
                }
            }

            Ok(1)
        }
    }
}
