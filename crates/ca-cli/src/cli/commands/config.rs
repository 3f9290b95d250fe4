//! `ca-admin config` - CLI configuration management.

use anyhow::Result;
use colored::Colorize;

use super::Context;
use crate::cli::args::{ConfigArgs, ConfigCommands};
use crate::config::Config;
use crate::output::{render, OutputFormat};

pub fn execute(ctx: Context, args: ConfigArgs) -> Result<()> {
    match args.command {
        ConfigCommands::Show => show_config(&ctx),
        ConfigCommands::Set { key, value } => set_config(&key, &value),
        ConfigCommands::Path => show_path(),
    }
}

fn show_config(ctx: &Context) -> Result<()> {
    let config = &ctx.config;

    render(ctx.output_format, config, || {
        println!("{}", "Current Configuration:".bold());
        println!();

        let fields = [
            ("api_url", config.api_url.as_deref()),
            ("keycloak_url", config.keycloak_url.as_deref()),
            ("realm", config.realm.as_deref()),
            ("client_id", config.client_id.as_deref()),
            ("username", config.username.as_deref()),
        ];
        for (key, value) in fields {
            let value = value.map_or_else(|| "(not set)".dimmed().to_string(), str::to_string);
            println!("  {} {}", format!("{key}:").bold(), value);
        }
        println!(
            "  {} {}",
            "output_format:".bold(),
            config.output_format.unwrap_or(OutputFormat::Pretty)
        );
        Ok(())
    })
}

fn set_config(key: &str, value: &str) -> Result<()> {
    let mut config = Config::load()?;
    config.set(key, value)?;
    config.save()?;

    println!("{} {} set to {}.", "Success:".green().bold(), key, value.cyan());
    Ok(())
}

fn show_path() -> Result<()> {
    let path = Config::path()?;
    println!("{}", path.display());
    Ok(())
}
