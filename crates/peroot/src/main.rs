//! Peroot CLI binary.
//!
//! - List the backend catalog and which backends the current credentials unlock
//! - Generate text through the quota gate and the fallback chain

use clap::Parser;
use peroot::{Credentials, PerootConfig, init_tracing};

mod cli;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use cli::{Cli, Commands, GenerateArgs, generate, list_backends};

    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match &cli.config {
        Some(path) => PerootConfig::from_file(path)?,
        None => PerootConfig::load()?,
    };
    let credentials = Credentials::from_env();
    tracing::debug!(?credentials, "Loaded credentials");

    match cli.command {
        Commands::Backends => {
            list_backends(&config, &credentials);
        }

        Commands::Generate {
            system,
            prompt,
            temperature,
            caller,
            tier,
        } => {
            let args = GenerateArgs {
                system,
                prompt,
                temperature,
                caller,
                tier,
            };
            generate(&config, credentials, args).await?;
        }
    }

    Ok(())
}
