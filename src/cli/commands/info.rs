//! Info command implementation.
//!
//! Shows how a manifest parses and what the registry currently has.

use crate::cli::{Args, Command, RuntimeConfig};
use crate::error::Result;
use crate::publish;

use super::helpers::load_context;

/// Execute info command
pub(super) async fn execute_info(args: &Args, config: &RuntimeConfig) -> Result<i32> {
    if let Command::Info { .. } = &args.command {
        let ctx = load_context(args, config, &[], None, false).await?;
        let current = publish::registry_version(&ctx.registry, &ctx.pkg).await?;

        config.println(&format!("package:  {}", ctx.pkg.package_name));
        config.println(&format!("manifest: {}", ctx.pkg.path));
        config.println(&format!("access:   {}", ctx.pkg.publish_config_access));
        config.println(&format!(
            "latest:   {}",
            current.as_deref().unwrap_or("(not published)")
        ));
        if config.is_verbose() {
            config.println(&format!("registry: {}", args.registry));
        }
        if ctx.pkg.not_to_be_published {
            config.warning_println("This package is marked private and will not be published");
        }
        Ok(0)
    } else {
        unreachable!("execute_info called with non-Info command");
    }
}
