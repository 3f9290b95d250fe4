//! `ca-admin client` - Machine clients.

use anyhow::{Context as _, Result};
use ca::pages::util::{add_days, format_timestamp};
use ca::pages::{PreferenceKey, PreferenceStore};
use ca::{ClientDto, SigningRequestDto};
use chrono::{DateTime, Utc};
use colored::Colorize;
use dialoguer::Confirm;
use tabled::{settings::Style, Table, Tabled};

use super::{not_authorized, Context};
use crate::cli::args::{ClientArgs, ClientCommands};
use crate::output::render;

#[derive(Tabled)]
struct ClientRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Active")]
    active: String,
    #[tabled(rename = "Valid Until")]
    valid_until: String,
}

impl From<&ClientDto> for ClientRow {
    fn from(client: &ClientDto) -> Self {
        Self {
            id: client.id.clone(),
            name: client.display_name.clone(),
            active: if client.active { "yes" } else { "no" }.to_string(),
            valid_until: client
                .valid_until
                .as_deref()
                .map_or_else(|| "-".to_string(), format_timestamp),
        }
    }
}

#[derive(Tabled)]
pub(crate) struct SigningRequestRow {
    #[tabled(rename = "Serial")]
    serial: String,
    #[tabled(rename = "Subject")]
    subject: String,
    #[tabled(rename = "Issued")]
    issued: String,
}

impl From<&SigningRequestDto> for SigningRequestRow {
    fn from(request: &SigningRequestDto) -> Self {
        Self {
            serial: request.serial_number.clone(),
            subject: request.subject_name.clone(),
            issued: format_timestamp(&request.issued_at),
        }
    }
}

pub async fn execute(ctx: Context, args: ClientArgs) -> Result<()> {
    match args.command {
        ClientCommands::List { include_inactive } => list_clients(ctx, include_inactive).await,
        ClientCommands::Get { id } => get_client(ctx, &id).await,
        ClientCommands::Create { name, days } => create_client(ctx, &name, days).await,
        ClientCommands::Regenerate { id, days } => regenerate_token(ctx, &id, days).await,
        ClientCommands::Delete { id, purge, yes } => delete_client(ctx, &id, purge, yes).await,
    }
}

async fn list_clients(ctx: Context, include_inactive: bool) -> Result<()> {
    let mut prefs = PreferenceStore::new(ctx.storage()?);
    prefs.load()?;
    let include_inactive = include_inactive || prefs.get(PreferenceKey::IncludeInactive);

    let home = ctx.home().await?;
    let clients = home
        .loaders
        .clients_page(&home.data, include_inactive)
        .await?
        .ok_or_else(not_authorized)?;

    render(ctx.output_format, &clients, || {
        println!("{}", "Your Clients:".bold());
        println!();

        if clients.is_empty() {
            println!("  No clients yet.");
            println!();
            println!("  Create one with: {} client create <NAME>", "ca-admin".cyan());
            return Ok(());
        }

        let rows: Vec<ClientRow> = clients.iter().map(ClientRow::from).collect();
        println!("{}", Table::new(&rows).with(Style::rounded()));
        if !include_inactive {
            println!();
            println!("{}", "Tip: add --include-inactive to show deactivated clients".dimmed());
        }
        Ok(())
    })
}

async fn get_client(ctx: Context, id: &str) -> Result<()> {
    let home = ctx.home().await?;
    let page = home.loaders.client_page(&home.data, id).await?;

    let (Some(client), Some(signing_requests)) = (page.client, page.signing_requests) else {
        return Err(not_authorized());
    };

    let output = serde_json::json!({
        "client": &client,
        "signingRequests": &signing_requests,
    });

    render(ctx.output_format, &output, || {
        print_client(&client);

        println!();
        println!("{}", "Signing Requests:".bold().underline());
        if !client.active {
            println!("  {}", "Client is inactive.".dimmed());
        } else if signing_requests.is_empty() {
            println!("  None issued yet.");
        } else {
            let rows: Vec<SigningRequestRow> =
                signing_requests.iter().map(SigningRequestRow::from).collect();
            println!("{}", Table::new(&rows).with(Style::rounded()));
        }
        Ok(())
    })
}

fn expiry(days: i64) -> Result<DateTime<Utc>> {
    add_days(Utc::now(), days).with_context(|| format!("{days} days is out of range"))
}

async fn create_client(ctx: Context, name: &str, days: i64) -> Result<()> {
    let home = ctx.home().await?;
    let valid_until = expiry(days)?;
    let client = home.loaders.client().clients().create(name, valid_until).await?;

    render(ctx.output_format, &client, || {
        println!("{}", "Client created!".green().bold());
        println!();
        print_client(&client);
        print_token(&client);
        Ok(())
    })
}

async fn regenerate_token(ctx: Context, id: &str, days: i64) -> Result<()> {
    let home = ctx.home().await?;
    let valid_until = expiry(days)?;
    let client = home
        .loaders
        .client()
        .clients()
        .regenerate_token(id, valid_until)
        .await?;

    render(ctx.output_format, &client, || {
        println!("{}", "Token regenerated!".green().bold());
        println!();
        print_client(&client);
        print_token(&client);
        Ok(())
    })
}

async fn delete_client(ctx: Context, id: &str, purge: bool, yes: bool) -> Result<()> {
    let action = if purge { "Permanently delete" } else { "Deactivate" };
    if !yes
        && !Confirm::new()
            .with_prompt(format!("{action} client {id}?"))
            .default(false)
            .interact()?
    {
        println!("Aborted.");
        return Ok(());
    }

    let home = ctx.home().await?;
    home.loaders.client().clients().delete(id, purge).await?;

    let done = if purge { "deleted" } else { "deactivated" };
    println!("{} Client {} {}.", "Success:".green().bold(), id.cyan(), done);
    Ok(())
}

fn print_client(client: &ClientDto) {
    println!("{} {}", "Client:".bold(), client.display_name.cyan());
    println!("  {} {}", "ID:".bold(), client.id);
    println!("  {} {}", "Name:".bold(), client.name);
    let status = if client.active {
        "active".green()
    } else {
        "inactive".dimmed()
    };
    println!("  {} {}", "Status:".bold(), status);
    if let Some(until) = &client.valid_until {
        let until = format_timestamp(until);
        if client.is_expired_at(Utc::now()) {
            println!("  {} {}", "Valid until:".bold(), format!("{until} (expired)").red());
        } else {
            println!("  {} {}", "Valid until:".bold(), until);
        }
    }
    println!("  {} {}", "Created:".bold(), format_timestamp(&client.created_at));
}

fn print_token(client: &ClientDto) {
    if let Some(token) = &client.token {
        println!();
        println!("{}", "Token (shown only once):".yellow().bold());
        println!("{token}");
    }
}
