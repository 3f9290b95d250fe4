//! `ca-admin signing-request` - Issued certificates.

use anyhow::Result;
use colored::Colorize;
use tabled::{settings::Style, Table};

use super::client::SigningRequestRow;
use super::{not_authorized, Context};
use crate::cli::args::{SigningRequestArgs, SigningRequestCommands};
use crate::output::render;

pub async fn execute(ctx: Context, args: SigningRequestArgs) -> Result<()> {
    let home = ctx.home().await?;

    let (title, requests) = match args.command {
        SigningRequestCommands::List => (
            "Signing Requests:".to_string(),
            home.loaders
                .signing_requests_page(&home.data)
                .await?
                .ok_or_else(not_authorized)?,
        ),
        SigningRequestCommands::Client { id } => (
            format!("Signing Requests of {id}:"),
            home.loaders.client().signing_requests().by_client_id(&id).await?,
        ),
    };

    render(ctx.output_format, &requests, || {
        println!("{}", title.bold());
        println!();
        if requests.is_empty() {
            println!("  None issued yet.");
        } else {
            let rows: Vec<SigningRequestRow> = requests.iter().map(SigningRequestRow::from).collect();
            println!("{}", Table::new(&rows).with(Style::rounded()));
        }
        Ok(())
    })
}
