//! `ca-admin user` and `roles` - User administration.

use anyhow::{bail, Result};
use ca::pages::util::{capitalize_first_letter, format_timestamp};
use ca::pages::LoadError;
use ca::{CreateUserDto, UserDto};
use colored::Colorize;
use dialoguer::{Confirm, Password};
use tabled::{settings::Style, Table, Tabled};

use super::{Context, Home};
use crate::cli::args::{UserArgs, UserCommands};
use crate::output::render;

#[derive(Tabled)]
struct UserRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Full Name")]
    full_name: String,
    #[tabled(rename = "Roles")]
    roles: String,
    #[tabled(rename = "Active")]
    active: String,
}

impl From<&UserDto> for UserRow {
    fn from(user: &UserDto) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            full_name: user.full_name(),
            roles: user.roles.join(", "),
            active: if user.active { "yes" } else { "no" }.to_string(),
        }
    }
}

pub async fn execute(ctx: Context, args: UserArgs) -> Result<()> {
    let home = admin(&ctx).await?;

    match args.command {
        UserCommands::List => list_users(&ctx, &home).await,
        UserCommands::Get { id, by_name } => get_user(&ctx, &home, &id, by_name).await,
        UserCommands::Create {
            name,
            email,
            first_name,
            last_name,
            roles,
            password,
        } => {
            let password = match password {
                Some(password) => password,
                None => Password::new()
                    .with_prompt(format!("Password for {name}"))
                    .with_confirmation("Repeat password", "Passwords do not match")
                    .interact()?,
            };
            let user = CreateUserDto {
                name,
                email,
                first_name,
                last_name,
                password,
                roles: (!roles.is_empty()).then_some(roles),
            };
            create_user(&ctx, &home, &user).await
        }
        UserCommands::Delete { id, purge, yes } => delete_user(&home, &id, purge, yes).await,
    }
}

pub async fn roles(ctx: Context) -> Result<()> {
    let home = admin(&ctx).await?;
    let roles = home.loaders.client().admin().list_roles().await?;

    render(ctx.output_format, &roles, || {
        println!("{}", "Roles:".bold());
        for role in &roles {
            println!("  {}", capitalize_first_letter(role));
        }
        Ok(())
    })
}

/// Home layout plus the admin guard
async fn admin(ctx: &Context) -> Result<Home> {
    let home = ctx.home().await?;
    match home.loaders.admin_layout(&home.data) {
        Ok(()) => Ok(home),
        Err(LoadError::Redirect(_)) => bail!("This command requires the admin role."),
        Err(e) => Err(e.into()),
    }
}

async fn list_users(ctx: &Context, home: &Home) -> Result<()> {
    let page = home.loaders.users_page(&home.data).await?;

    render(ctx.output_format, &page.users, || {
        println!("{}", "Users:".bold());
        println!();
        if page.users.is_empty() {
            println!("  No users.");
        } else {
            let rows: Vec<UserRow> = page.users.iter().map(UserRow::from).collect();
            println!("{}", Table::new(&rows).with(Style::rounded()));
        }

        if !page.roles.is_empty() {
            println!();
            let roles: Vec<String> = page.roles.iter().map(|r| capitalize_first_letter(r)).collect();
            println!("{} {}", "Available roles:".dimmed(), roles.join(", ").dimmed());
        }
        Ok(())
    })
}

async fn get_user(ctx: &Context, home: &Home, id: &str, by_name: bool) -> Result<()> {
    let users = home.loaders.client().users();
    let user = if by_name {
        users.by_name(id, true).await?
    } else {
        users.get(id, true).await?
    };

    render(ctx.output_format, &user, || {
        print_user(&user);
        Ok(())
    })
}

async fn create_user(ctx: &Context, home: &Home, user: &CreateUserDto) -> Result<()> {
    let created = home.loaders.client().users().create(user).await?;

    render(ctx.output_format, &created, || {
        println!("{}", "User created!".green().bold());
        println!();
        print_user(&created);
        Ok(())
    })
}

async fn delete_user(home: &Home, id: &str, purge: bool, yes: bool) -> Result<()> {
    let action = if purge { "Permanently delete" } else { "Deactivate" };
    if !yes
        && !Confirm::new()
            .with_prompt(format!("{action} user {id}?"))
            .default(false)
            .interact()?
    {
        println!("Aborted.");
        return Ok(());
    }

    home.loaders.client().users().delete(id, purge).await?;

    let done = if purge { "deleted" } else { "deactivated" };
    println!("{} User {} {}.", "Success:".green().bold(), id.cyan(), done);
    Ok(())
}

fn print_user(user: &UserDto) {
    println!("{} {}", "User:".bold(), user.display_name.cyan());
    println!("  {} {}", "ID:".bold(), user.id);
    println!("  {} {}", "Name:".bold(), user.name);
    let full_name = user.full_name();
    if !full_name.is_empty() {
        println!("  {} {}", "Full name:".bold(), full_name);
    }
    if let Some(email) = &user.email {
        println!("  {} {}", "Email:".bold(), email);
    }
    let roles: Vec<String> = user.roles.iter().map(|r| capitalize_first_letter(r)).collect();
    println!("  {} {}", "Roles:".bold(), roles.join(", "));
    let status = if user.active {
        "active".green()
    } else {
        "inactive".dimmed()
    };
    println!("  {} {}", "Status:".bold(), status);
    println!("  {} {}", "Created:".bold(), format_timestamp(&user.created_at));
}
