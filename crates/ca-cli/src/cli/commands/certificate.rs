//! `ca-admin root`, `intermediate` and `sign` - Certificate authority certificates.

use anyhow::{bail, Context as _, Result};
use ca::pages::util::{download_file, format_timestamp};
use ca::pages::LoadError;
use ca::{CaCertificateDto, CaClient, InitMode, NewSigningRequestDto};
use chrono::Utc;
use colored::Colorize;
use std::path::Path;

use super::{not_authorized, Context};
use crate::cli::args::{
    CertificateArgs, CertificateCommands, IntermediateArgs, IntermediateCommands, SignArgs,
};
use crate::output::render;

pub async fn root(ctx: Context, args: CertificateArgs) -> Result<()> {
    match args.command {
        CertificateCommands::Get { out } => show(ctx, Kind::Root, out.as_deref()).await,
        CertificateCommands::Generate { out } => generate_root(ctx, &out).await,
    }
}

pub async fn intermediate(ctx: Context, args: IntermediateArgs) -> Result<()> {
    match args.command {
        IntermediateCommands::Get { out } => show(ctx, Kind::Intermediate, out.as_deref()).await,
        IntermediateCommands::Generate { root_certificate } => {
            generate_intermediate(ctx, &root_certificate).await
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Kind {
    Root,
    Intermediate,
}

impl Kind {
    const fn label(self) -> &'static str {
        match self {
            Self::Root => "Root certificate",
            Self::Intermediate => "Intermediate certificate",
        }
    }

    const fn generate_hint(self) -> &'static str {
        match self {
            Self::Root => "root generate --out root.pem",
            Self::Intermediate => "intermediate generate --root-certificate root.pem",
        }
    }
}

async fn show(ctx: Context, kind: Kind, out: Option<&str>) -> Result<()> {
    let home = ctx.home().await?;
    if home.data.session.is_none() {
        return Err(not_authorized());
    }

    let page = home.loaders.certificates_page(&home.data).await?;
    let certificate = match kind {
        Kind::Root => page.root,
        Kind::Intermediate => page.intermediate,
    };

    let Some(certificate) = certificate else {
        println!("{} has not been generated yet.", kind.label());
        println!();
        println!("Generate it with: {} {}", "ca-admin".cyan(), kind.generate_hint());
        return Ok(());
    };

    if let Some(out) = out {
        write_pem(out, &certificate.certificate)?;
    }

    render(ctx.output_format, &certificate, || {
        print_certificate(kind.label(), &certificate);
        Ok(())
    })
}

async fn generate_root(ctx: Context, out: &str) -> Result<()> {
    let loaders = setup(&ctx).await?;

    let spinner = ctx.spinner("Generating root certificate...");
    let generated = loaders.client().certificates().generate_root().await;
    spinner.finish_and_clear();
    let certificate = generated?;

    // The response holds the only copy of the root private key
    write_pem(out, &certificate.certificate)?;

    render(ctx.output_format, &certificate, || {
        println!("{}", "Root certificate generated!".green().bold());
        println!();
        println!("  {} {}", "Created:".bold(), format_timestamp(&certificate.created_at));
        println!(
            "  {} {}",
            "Valid until:".bold(),
            format_timestamp(&certificate.valid_until)
        );
        println!();
        println!(
            "{} {} keeps the root private key. Store it offline.",
            "Warning:".yellow().bold(),
            out
        );
        println!();
        println!(
            "Next: {} intermediate generate --root-certificate {}",
            "ca-admin".cyan(),
            out
        );
        Ok(())
    })
}

async fn generate_intermediate(ctx: Context, root_file: &Path) -> Result<()> {
    let root_pem = std::fs::read_to_string(root_file)
        .with_context(|| format!("Could not read {}", root_file.display()))?;

    let loaders = setup(&ctx).await?;
    let certificates = loaders.client().certificates();

    let spinner = ctx.spinner("Generating intermediate certificate...");
    let generated = certificates.generate_intermediate(root_pem).await;
    spinner.finish_and_clear();
    let certificate = generated?;

    render(ctx.output_format, &certificate, || {
        println!("{}", "Intermediate certificate generated!".green().bold());
        println!();
        print_certificate(Kind::Intermediate.label(), &certificate);
        Ok(())
    })
}

/// Log in and pass the setup guard, which refuses an initialized authority.
async fn setup(ctx: &Context) -> Result<ca::pages::Loaders> {
    let auth = ctx.auth(None)?;
    auth.init(InitMode::LoginRequired)
        .await
        .map_err(super::login_error)?;

    let loaders = ctx.loaders(auth)?;
    let root = loaders.root_layout().await?;
    match loaders.setup_layout(&root).await {
        Ok(_) => Ok(loaders),
        Err(LoadError::Redirect(_)) => bail!("The certificate authority is already initialized."),
        Err(e) => Err(e.into()),
    }
}

pub async fn sign(ctx: Context, args: SignArgs) -> Result<()> {
    let request = std::fs::read_to_string(&args.csr)
        .with_context(|| format!("Could not read {}", args.csr.display()))?;
    let request = NewSigningRequestDto::new(request).with_alternative_names(args.alternative_names);

    let client = match args.client_token {
        Some(token) => {
            let env = ctx.environment()?;
            CaClient::builder(env.api_base_url).bearer_token(token).build()?
        }
        None => ctx.home().await?.loaders.client().clone(),
    };

    let signed = client.certificates().sign(&request).await?;

    if let Some(out) = &args.out {
        match &signed.certificate {
            Some(pem) => write_pem(out, pem)?,
            None => bail!("The backend returned no certificate for {}", signed.serial_number),
        }
    }

    render(ctx.output_format, &signed, || {
        println!("{}", "Certificate signed!".green().bold());
        println!();
        println!("  {} {}", "Subject:".bold(), signed.subject_name);
        println!("  {} {}", "Serial:".bold(), signed.serial_number.cyan());
        println!("  {} {}", "Issued:".bold(), format_timestamp(&signed.issued_at));
        if args.out.is_none() {
            if let Some(pem) = &signed.certificate {
                println!();
                println!("{}", pem.trim_end());
            }
        }
        Ok(())
    })
}

fn write_pem(out: &str, pem: &str) -> Result<()> {
    let path = shellexpand::tilde(out);
    download_file([pem], &*path)
        .with_context(|| format!("Could not write {path}"))?;
    eprintln!("{} Wrote {}", "Saved:".green().bold(), path);
    Ok(())
}

fn print_certificate(label: &str, certificate: &CaCertificateDto) {
    println!("{}", label.bold().underline());
    println!();
    println!("  {} {}", "Created:".bold(), format_timestamp(&certificate.created_at));

    let expiry = format_timestamp(&certificate.valid_until);
    let expiry = if certificate.is_expired_at(Utc::now()) {
        format!("{expiry} (expired)").red().to_string()
    } else {
        expiry
    };
    println!("  {} {}", "Valid until:".bold(), expiry);
    println!();
    println!("{}", certificate.certificate.trim_end());
}
