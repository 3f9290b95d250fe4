//! `ca-admin health` - Backend health and version.

use anyhow::Result;
use colored::Colorize;

use super::Context;
use crate::output::render;

pub async fn execute(ctx: Context) -> Result<()> {
    let client = ctx.anonymous_client()?;
    let health = client.common().health_check().await?;

    render(ctx.output_format, &health, || {
        let status = if health.ok {
            "ok".green().bold()
        } else {
            "degraded".red().bold()
        };
        println!("{} {}", "Status:".bold(), status);
        println!("{} {}", "Version:".bold(), health.version);
        if let Some(keycloak) = &health.keycloak_version {
            println!("{} {}", "Keycloak:".bold(), keycloak);
        }
        if let Some(detail) = &health.status {
            println!("{} {}", "Detail:".bold(), detail);
        }

        let initialized = if health.is_initialized() {
            "yes".green()
        } else {
            "no".yellow()
        };
        println!("{} {}", "Initialized:".bold(), initialized);

        if !health.is_initialized() {
            println!();
            println!(
                "{}",
                "Tip: run `ca-admin root generate --out root.pem` to set up the authority".dimmed()
            );
        }
        Ok(())
    })
}
