mod client;
mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use console::style;
use tracing_subscriber::EnvFilter;

use crate::client::ApiClient;
use crate::commands::header::HeaderCommand;
use crate::commands::page::PageCommand;
use crate::commands::render::RenderArgs;

#[derive(Parser, Debug)]
#[command(name = "pagesmith", version, about = "Manage and preview Pagesmith pages")]
struct Cli {
    /// Base URL of the Pagesmith server
    #[arg(long, env = "PAGESMITH_SERVER", default_value = "http://127.0.0.1:3000", global = true)]
    server: String,

    /// Bearer token for editing commands
    #[arg(long, env = "PAGESMITH_TOKEN", hide_env_values = true, global = true)]
    token: Option<String>,

    /// Log request traffic to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Read pages
    #[command(subcommand)]
    Page(PageCommand),
    /// Read and edit per-page headers
    #[command(subcommand)]
    Header(HeaderCommand),
    /// Render a JSON block list to HTML
    Render(RenderArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("{} {e:#}", style("error:").red().bold());
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let client = ApiClient::new(&cli.server, cli.token);
    match cli.command {
        Command::Page(command) => commands::page::run(&client, command).await,
        Command::Header(command) => commands::header::run(&client, command).await,
        Command::Render(args) => commands::render::run(&client, args).await,
    }
}
