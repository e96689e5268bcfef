//! Vitrine CLI binary.
//!
//! A local transport over [`vitrine::ImageService`]: the acting principal is
//! passed as `--user`, standing in for an authentication layer.

use clap::Parser;

mod cli;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use cli::{handle_command, Cli};

    // Load .env before reading configuration from the environment
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    vitrine::init_tracing(cli.verbose).map_err(|e| e as Box<dyn std::error::Error>)?;

    handle_command(cli.command, cli.config.as_deref(), cli.format).await
}
