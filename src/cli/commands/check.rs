//! Check command implementation.
//!
//! Runs the pre-publish checks and a registry dry run without publishing.

use crate::cli::{Args, Command, RuntimeConfig};
use crate::error::Result;
use crate::publish::{self, PrePublishResult};

use super::helpers::load_context;

/// Execute check command
pub(super) async fn execute_check(args: &Args, config: &RuntimeConfig) -> Result<i32> {
    if let Command::Check {
        new_version,
        set_versions,
        canary,
        ..
    } = &args.command
    {
        let ctx = load_context(args, config, set_versions, canary.clone(), false).await?;
        config.verbose_println(&format!(
            "Checking {} {} against {}",
            ctx.pkg.package_name, new_version, args.registry
        ));

        let result = publish::prepublish(
            &ctx.config,
            &ctx.pkg,
            new_version,
            &ctx.package_versions,
            &ctx.registry,
            &ctx.store,
        )
        .await?;

        match result {
            PrePublishResult::Ok => {
                config.success_println(&format!(
                    "{} {} is clear to publish",
                    ctx.pkg.package_name, new_version
                ));
                Ok(0)
            }
            PrePublishResult::Failed { reason } => {
                config.error_println(&reason);
                Ok(1)
            }
        }
    } else {
        unreachable!("execute_check called with non-Check command");
    }
}
