//! Renders the demo components and prints the result.
//!
//! ```text
//! helmet-demo basic --number 2
//! helmet-demo from-file
//! RUST_LOG=helmet=debug helmet-demo deployments --show-documents
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod components;

use components::Input;

#[derive(Parser)]
#[command(name = "helmet-demo", version, about = "Render the Helmet demo components")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Number passed to the component input
    #[arg(long, short, global = true, default_value_t = 2)]
    number: i64,

    /// Directory holding the template files
    #[arg(long, global = true)]
    templates: Option<PathBuf>,

    /// Print the rendered text instead of the decoded values
    #[arg(long, global = true)]
    show_documents: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Inline template with a variable and a callable
    Basic,
    /// The basic template, loaded from a file
    FromFile,
    /// Several Deployments with actions kept for Helm
    Deployments,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();
    let templates = cli
        .templates
        .clone()
        .unwrap_or_else(|| Path::new(env!("CARGO_MANIFEST_DIR")).join("templates"));
    let input = Input { number: cli.number };
    info!(number = input.number, templates = %templates.display(), "rendering demo");

    match cli.command {
        Command::Basic => {
            let (spec, text) = components::basic()?.render(&input)?;
            print(cli.show_documents, &spec, &[text])?;
        }
        Command::FromFile => {
            let component = components::from_file(&templates)
                .with_context(|| format!("loading templates from {}", templates.display()))?;
            let (spec, text) = component.render(&input)?;
            print(cli.show_documents, &spec, &[text])?;
        }
        Command::Deployments => {
            let component = components::deployments(&templates)
                .with_context(|| format!("loading templates from {}", templates.display()))?;
            let (deployments, documents) = component.render(&input)?;
            print(cli.show_documents, &deployments, &documents)?;
        }
    }
    Ok(())
}

fn print<T: serde::Serialize>(show_documents: bool, values: &T, documents: &[String]) -> anyhow::Result<()> {
    if show_documents {
        println!("{}", documents.join("\n---\n"));
    } else {
        println!("{}", serde_json::to_string_pretty(values)?);
    }
    Ok(())
}
