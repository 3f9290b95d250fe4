//! CLI argument parsing and command dispatch.

pub mod args;
pub mod commands;

use anyhow::Result;
use args::{Cli, Commands};
use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// Run the CLI application.
pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);
    if cli.no_color {
        colored::control::set_override(false);
    }

    let config = Config::load()?;

    // Flag, then config file, then pretty
    let output_format = cli.output.or(config.output_format).unwrap_or_default();

    let ctx = commands::Context {
        config,
        api_url: cli.api_url,
        output_format,
        verbose: cli.verbose,
        no_color: cli.no_color,
    };

    match cli.command {
        Commands::Health => commands::health::execute(ctx).await,
        Commands::Login(args) => commands::session::login(ctx, args).await,
        Commands::Logout => commands::session::logout(ctx).await,
        Commands::Whoami => commands::session::whoami(ctx).await,
        Commands::Roles => commands::user::roles(ctx).await,
        Commands::Root(args) => commands::certificate::root(ctx, args).await,
        Commands::Intermediate(args) => commands::certificate::intermediate(ctx, args).await,
        Commands::Sign(args) => commands::certificate::sign(ctx, args).await,
        Commands::Client(args) => commands::client::execute(ctx, args).await,
        Commands::SigningRequest(args) => commands::signing_request::execute(ctx, args).await,
        Commands::User(args) => commands::user::execute(ctx, args).await,
        Commands::Prefs(args) => commands::prefs::execute(ctx, args),
        Commands::Config(args) => commands::config::execute(ctx, args),
    }
}

/// Log to stderr; `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let default = if verbose {
        "ca_client=debug,ca_pages=debug,ca_core=debug,ca_cli=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbose);

    // A second init (e.g. in tests) keeps the first subscriber
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}
