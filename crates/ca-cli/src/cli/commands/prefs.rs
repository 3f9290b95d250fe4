//! `ca-admin prefs` - Preferences kept with the session.

use anyhow::Result;
use ca::pages::{PreferenceKey, PreferenceStore};
use colored::Colorize;

use super::Context;
use crate::cli::args::{PrefsArgs, PrefsCommands};
use crate::output::render;

pub fn execute(ctx: Context, args: PrefsArgs) -> Result<()> {
    let mut store = PreferenceStore::new(ctx.storage()?);
    store.load()?;

    match args.command {
        PrefsCommands::Show => {
            let prefs = store.preferences();
            render(ctx.output_format, &prefs, || {
                println!("{}", "Preferences:".bold());
                println!();
                for key in PreferenceKey::ALL {
                    println!("  {} {}", format!("{key}:").bold(), prefs.get(key));
                }
                Ok(())
            })
        }
        PrefsCommands::Set { key, value } => {
            let key: PreferenceKey = key.parse()?;
            store.set(key, value)?;
            println!("{} {} set to {}.", "Success:".green().bold(), key, value);
            Ok(())
        }
    }
}
