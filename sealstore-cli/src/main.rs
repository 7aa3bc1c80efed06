mod backend;
mod cli;
mod cmd;

use clap::Parser;
use cli::{Cli, Commands};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match &cli.command {
        Commands::Sweep {
            catalog,
            batch_size,
            json,
        } => cmd::sweep::run(&cli.backend, catalog, *batch_size, *json).await,
        Commands::Inspect { key } => cmd::inspect::run(&cli.backend, key).await,
        Commands::Status { catalog } => cmd::status::run(catalog),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
