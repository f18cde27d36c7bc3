//! Publish command implementation.
//!
//! Runs the pre-publish checks, then publishes through the registry under a
//! temporarily rewritten manifest.

use crate::cli::{Args, Command, RuntimeConfig};
use crate::error::Result;
use crate::publish::{self, PrePublishResult};

use super::helpers::load_context;

/// Execute publish command
pub(super) async fn execute_publish(args: &Args, config: &RuntimeConfig) -> Result<i32> {
    if let Command::Publish {
        new_version,
        set_versions,
        canary,
        dry_run,
        ..
    } = &args.command
    {
        let ctx = load_context(args, config, set_versions, canary.clone(), *dry_run).await?;
        config.info_println(&format!(
            "Publishing {} {}",
            ctx.pkg.package_name, new_version
        ));
        if *dry_run {
            config.warning_println("Dry run: nothing will be persisted to the registry");
        }

        let checked = publish::prepublish(
            &ctx.config,
            &ctx.pkg,
            new_version,
            &ctx.package_versions,
            &ctx.registry,
            &ctx.store,
        )
        .await?;
        if let PrePublishResult::Failed { reason } = checked {
            config.error_println(&reason);
            return Ok(1);
        }
        config.verbose_println("Pre-publish checks passed");

        publish::publish(
            &ctx.config,
            &ctx.pkg,
            new_version,
            &ctx.package_versions,
            &ctx.registry,
            &ctx.store,
        )
        .await?;

        if *dry_run {
            config.success_println(&format!(
                "{} {} passed a dry-run publish",
                ctx.pkg.package_name, new_version
            ));
        } else {
            config.success_println(&format!(
                "Published {} {}",
                ctx.pkg.package_name, new_version
            ));
        }
        Ok(0)
    } else {
        unreachable!("execute_publish called with non-Publish command");
    }
}
