use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod content;
mod server;
mod site;
mod util;

#[derive(Parser)]
#[command(version, about = "Serve a content site from flat files")]
struct Args {
    /// Increase logging verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// The command to execute
    #[command(subcommand)]
    command: FolioCommand,
}

#[derive(Parser)]
struct InitArgs {
    /// The path to initialize the project in
    path: PathBuf,

    /// Whether to create the directory if it doesn't exist
    #[arg(short, long, default_value = "false")]
    create: bool,
}

#[derive(Parser)]
struct ServeArgs {
    /// The address to bind to
    #[arg(short, long, default_value = "0.0.0.0")]
    bind: String,

    /// The port to bind to
    #[arg(short, long, default_value = "3000")]
    port: u16,

    /// Open the site in the default browser
    #[arg(short, long, default_value = "false")]
    open: bool,

    /// The path to the configuration file
    #[arg(short, long, default_value = "folio.yaml")]
    config_file: Option<PathBuf>,

    /// Whether to watch content and templates and refresh automatically
    #[arg(short, long, default_value = "true", action = ArgAction::Set)]
    watch: bool,

    /// Run in development mode: errors are shown instead of the error page
    #[arg(short, long, default_value = "false")]
    dev: bool,
}

#[derive(Subcommand)]
enum FolioCommand {
    /// Initialize a new site
    Init(InitArgs),

    /// Serve the site on a local port
    Serve(ServeArgs),
}

/// Initialize tracing from the verbosity count. `RUST_LOG` wins when set.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("folio={level},tower_http={level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let args = Args::parse();
    init_tracing(args.verbose);

    match args.command {
        FolioCommand::Init(args) => {
            commands::init::run(&args).await?;
        }
        FolioCommand::Serve(args) => {
            commands::serve::run(&args).await?;
        }
    }

    Ok(())
}
