use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "messboard",
    about = "Messboard: a board of daily mess menus that expire on their own",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// TOML configuration file; MESSBOARD_* environment variables override it
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the HTTP server with the background sweeper
    Serve(ServeArgs),
    /// Show active records
    List,
    /// Purge expired records once
    Sweep,
    /// Print the effective configuration
    Config,
}

#[derive(Args)]
pub struct ServeArgs {
    /// Address to listen on, overriding the configuration
    #[arg(long)]
    pub bind: Option<SocketAddr>,
}
