use crate::server;
use clap::{Args, Parser, Subcommand};
use erights::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "E-rights Backend",
    about = "Run the rights issue submission and review backend",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Registrar register export (CSV) to load into the shareholder
    /// directory before serving
    #[arg(long)]
    pub(crate) register_csv: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
    }
}
