//! `ca-admin login`, `logout` and `whoami` - Identity session.

use anyhow::Result;
use ca::InitMode;
use colored::Colorize;

use super::Context;
use crate::cli::args::LoginArgs;
use crate::output::render;

pub async fn login(ctx: Context, args: LoginArgs) -> Result<()> {
    let auth = ctx.auth(args.username)?;

    // A resumable session is reused; otherwise this prompts
    let session = match auth.init(InitMode::CheckSso).await? {
        Some(session) => session,
        None => auth
            .init(InitMode::LoginRequired)
            .await
            .map_err(super::login_error)?
            .ok_or_else(|| anyhow::anyhow!("Login did not produce a session"))?,
    };

    render(ctx.output_format, &session, || {
        println!(
            "{} Logged in as {}.",
            "Success:".green().bold(),
            session.username.as_deref().unwrap_or("(unknown)").cyan()
        );
        Ok(())
    })
}

pub async fn logout(ctx: Context) -> Result<()> {
    let auth = ctx.auth(None)?;

    if auth.init(InitMode::CheckSso).await?.is_none() {
        println!("Not logged in.");
        return Ok(());
    }

    auth.logout().await?;
    println!("{} Logged out.", "Success:".green().bold());
    Ok(())
}

pub async fn whoami(ctx: Context) -> Result<()> {
    let auth = ctx.auth(None)?;
    let session = auth.init(InitMode::CheckSso).await?;

    render(ctx.output_format, &session, || {
        match &session {
            Some(session) => {
                println!(
                    "{} {}",
                    "User:".bold(),
                    session.username.as_deref().unwrap_or("(unknown)").cyan()
                );
                let roles = if session.roles.is_empty() {
                    "(none)".dimmed().to_string()
                } else {
                    session.roles.join(", ")
                };
                println!("{} {}", "Roles:".bold(), roles);
                println!(
                    "{} {}",
                    "Token expires:".bold(),
                    session.expires_at.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M")
                );
            }
            None => {
                println!("Not logged in.");
                println!();
                println!("Log in with: {} login", "ca-admin".cyan());
            }
        }
        Ok(())
    })
}
